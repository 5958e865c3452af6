use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::PgStore;
use crate::database::manager::DatabaseError;
use crate::database::models::{NewTask, Task, TaskListQuery, TaskPatch, TaskStatus};
use crate::database::patch::{Patch, PgEnum, SqlValue};
use crate::database::query_builder::{self, QueryBuilder};
use crate::database::repository::TaskRepository;
use crate::database::table::Table;
use crate::filter::{Filter, FilterOp, SortDirection};

#[async_trait]
impl TaskRepository for PgStore {
    async fn list_tasks(&self, organization_id: Uuid, query: &TaskListQuery) -> Result<Vec<Task>, DatabaseError> {
        let mut filter = Filter::scoped(Table::Tasks, organization_id)
            .eq_opt("status", query.status, |v| v.sql_value())
            .eq_opt("priority", query.priority, |v| v.sql_value())
            .eq_opt("assignee_id", query.assignee_id, |v| SqlValue::Uuid(Some(v)))
            .eq_opt("customer_id", query.customer_id, |v| SqlValue::Uuid(Some(v)));

        if let Some(from) = query.due_date_from {
            filter = filter.where_op("due_date", FilterOp::Gte, SqlValue::Timestamp(Some(from)));
        }
        if let Some(to) = query.due_date_to {
            filter = filter.where_op("due_date", FilterOp::Lte, SqlValue::Timestamp(Some(to)));
        }

        let sql = filter
            .order_nulls_last("due_date", SortDirection::Asc)
            .order("created_at", SortDirection::Desc)
            .to_sql()?;
        query_builder::select_all(&self.pool, &sql).await
    }

    async fn find_task(&self, organization_id: Uuid, id: Uuid) -> Result<Option<Task>, DatabaseError> {
        query_builder::select_optional(&self.pool, &QueryBuilder::find_by_id(Table::Tasks, id, organization_id)).await
    }

    async fn create_task(&self, organization_id: Uuid, created_by: Uuid, task: &NewTask) -> Result<Task, DatabaseError> {
        let assignee_id = task.assignee_id.unwrap_or(created_by);
        let completed_at = (task.status == TaskStatus::Complete).then(Utc::now);

        let created: Option<Task> = sqlx::query_as(
            r#"
            INSERT INTO tasks (
                title, description, assignee_id, customer_id, deal_id, priority, status,
                due_date, is_recurring, recurrence_rule, completed_at, created_by
            )
            SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12
            WHERE EXISTS (SELECT 1 FROM users WHERE id = $3 AND organization_id = $13)
            RETURNING *
            "#,
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(assignee_id)
        .bind(task.customer_id)
        .bind(task.deal_id)
        .bind(task.priority)
        .bind(task.status)
        .bind(task.due_date)
        .bind(task.is_recurring)
        .bind(&task.recurrence_rule)
        .bind(completed_at)
        .bind(created_by)
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await?;

        created.ok_or_else(|| DatabaseError::NotFound("Assignee not found".to_string()))
    }

    async fn update_task(&self, organization_id: Uuid, id: Uuid, patch: &TaskPatch) -> Result<Option<Task>, DatabaseError> {
        query_builder::update_scoped(&self.pool, Table::Tasks, id, organization_id, &patch.changes()).await
    }

    async fn delete_task(&self, organization_id: Uuid, id: Uuid) -> Result<bool, DatabaseError> {
        query_builder::delete_scoped(&self.pool, Table::Tasks, id, organization_id).await
    }
}
