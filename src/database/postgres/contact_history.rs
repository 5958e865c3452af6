use async_trait::async_trait;
use uuid::Uuid;

use super::PgStore;
use crate::database::manager::DatabaseError;
use crate::database::models::{ContactHistory, ContactHistoryPatch, ContactType, NewContactHistory};
use crate::database::patch::{Patch, PgEnum, SqlValue};
use crate::database::query_builder::{self, QueryBuilder};
use crate::database::repository::{ContactHistoryFilter, ContactHistoryRepository};
use crate::database::table::Table;
use crate::filter::{Filter, SortDirection};

#[async_trait]
impl ContactHistoryRepository for PgStore {
    async fn list_contact_history(
        &self,
        organization_id: Uuid,
        filter: &ContactHistoryFilter,
    ) -> Result<(Vec<ContactHistory>, i64), DatabaseError> {
        let scoped = Filter::scoped(Table::ContactHistory, organization_id)
            .eq_opt("customer_id", filter.customer_id, |v| SqlValue::Uuid(Some(v)))
            .eq_opt("contact_type", filter.contact_type, |v| v.sql_value());

        let total = query_builder::count(&self.pool, &scoped.to_count_sql()?).await?;

        let sql = scoped
            .order("created_at", SortDirection::Desc)
            .order("id", SortDirection::Desc)
            .limit(filter.limit, Some(filter.offset))?
            .to_sql()?;
        let entries = query_builder::select_all(&self.pool, &sql).await?;

        Ok((entries, total))
    }

    async fn find_contact_history(&self, organization_id: Uuid, id: Uuid) -> Result<Option<ContactHistory>, DatabaseError> {
        query_builder::select_optional(&self.pool, &QueryBuilder::find_by_id(Table::ContactHistory, id, organization_id)).await
    }

    async fn create_contact_history(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        contact_type: ContactType,
        entry: &NewContactHistory,
    ) -> Result<ContactHistory, DatabaseError> {
        let created: Option<ContactHistory> = sqlx::query_as(
            r#"
            INSERT INTO contact_history (customer_id, user_id, contact_type, subject, content, duration_minutes, attachments)
            SELECT $1, $2, $3, $4, $5, $6, $7
            WHERE EXISTS (
                SELECT 1 FROM customers
                WHERE id = $1 AND organization_id = $8 AND deleted_at IS NULL
            )
            RETURNING *
            "#,
        )
        .bind(entry.customer_id)
        .bind(user_id)
        .bind(contact_type)
        .bind(&entry.subject)
        .bind(&entry.content)
        .bind(entry.duration_minutes)
        .bind(&entry.attachments)
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await?;

        created.ok_or_else(|| DatabaseError::NotFound("Customer not found".to_string()))
    }

    async fn update_contact_history(
        &self,
        organization_id: Uuid,
        id: Uuid,
        patch: &ContactHistoryPatch,
    ) -> Result<Option<ContactHistory>, DatabaseError> {
        query_builder::update_scoped(&self.pool, Table::ContactHistory, id, organization_id, &patch.changes()).await
    }

    async fn delete_contact_history(&self, organization_id: Uuid, id: Uuid) -> Result<bool, DatabaseError> {
        query_builder::delete_scoped(&self.pool, Table::ContactHistory, id, organization_id).await
    }
}
