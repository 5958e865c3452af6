use async_trait::async_trait;
use uuid::Uuid;

use super::PgStore;
use crate::database::manager::DatabaseError;
use crate::database::models::{Customer, CustomerListQuery, CustomerPatch, NewCustomer};
use crate::database::patch::{Patch, PgEnum, SqlValue};
use crate::database::query_builder::{self, QueryBuilder};
use crate::database::repository::CustomerRepository;
use crate::database::table::Table;
use crate::filter::{Filter, FilterOp, SortDirection};

#[async_trait]
impl CustomerRepository for PgStore {
    async fn list_customers(&self, organization_id: Uuid, query: &CustomerListQuery) -> Result<Vec<Customer>, DatabaseError> {
        let mut filter = Filter::scoped(Table::Customers, organization_id).eq_opt("status", query.status, |s| s.sql_value());

        if let Some(term) = query.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            filter = filter.search(&["first_name", "last_name", "email", "company"], term);
        }
        if let Some(tag) = &query.tag {
            filter = filter.where_op("tags", FilterOp::Contains, SqlValue::text(tag.clone()));
        }

        let sql = filter.order("created_at", SortDirection::Desc).to_sql()?;
        query_builder::select_all(&self.pool, &sql).await
    }

    async fn find_customer(&self, organization_id: Uuid, id: Uuid) -> Result<Option<Customer>, DatabaseError> {
        query_builder::select_optional(&self.pool, &QueryBuilder::find_by_id(Table::Customers, id, organization_id)).await
    }

    async fn find_customer_including_deleted(&self, organization_id: Uuid, id: Uuid) -> Result<Option<Customer>, DatabaseError> {
        let customer = sqlx::query_as("SELECT * FROM customers WHERE id = $1 AND organization_id = $2")
            .bind(id)
            .bind(organization_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(customer)
    }

    async fn create_customer(&self, organization_id: Uuid, created_by: Uuid, customer: &NewCustomer) -> Result<Customer, DatabaseError> {
        let created = sqlx::query_as(
            r#"
            INSERT INTO customers (
                organization_id, first_name, last_name, email, phone, company, position,
                status, source, tags, notes, assigned_to, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(organization_id)
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.company)
        .bind(&customer.position)
        .bind(customer.status)
        .bind(&customer.source)
        .bind(&customer.tags)
        .bind(&customer.notes)
        .bind(customer.assigned_to)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn update_customer(&self, organization_id: Uuid, id: Uuid, patch: &CustomerPatch) -> Result<Option<Customer>, DatabaseError> {
        query_builder::update_scoped(&self.pool, Table::Customers, id, organization_id, &patch.changes()).await
    }

    async fn delete_customer(&self, organization_id: Uuid, id: Uuid) -> Result<bool, DatabaseError> {
        query_builder::delete_scoped(&self.pool, Table::Customers, id, organization_id).await
    }
}
