use async_trait::async_trait;
use sqlx::types::Json;
use uuid::Uuid;

use super::PgStore;
use crate::database::manager::DatabaseError;
use crate::database::models::deal::clamp_probability;
use crate::database::models::{Deal, DealListQuery, DealPatch, NewDeal};
use crate::database::patch::{Patch, SqlValue};
use crate::database::query_builder::{self, QueryBuilder};
use crate::database::repository::DealRepository;
use crate::database::table::Table;
use crate::filter::{Filter, SortDirection};

#[async_trait]
impl DealRepository for PgStore {
    async fn list_deals(&self, organization_id: Uuid, query: &DealListQuery) -> Result<Vec<Deal>, DatabaseError> {
        let sql = Filter::scoped(Table::Deals, organization_id)
            .eq_opt("pipeline_id", query.pipeline_id, |v| SqlValue::Uuid(Some(v)))
            .eq_opt("stage_id", query.stage_id.clone(), |v| SqlValue::text(v))
            .eq_opt("customer_id", query.customer_id, |v| SqlValue::Uuid(Some(v)))
            .order("created_at", SortDirection::Desc)
            .to_sql()?;
        query_builder::select_all(&self.pool, &sql).await
    }

    async fn find_deal(&self, organization_id: Uuid, id: Uuid) -> Result<Option<Deal>, DatabaseError> {
        query_builder::select_optional(&self.pool, &QueryBuilder::find_by_id(Table::Deals, id, organization_id)).await
    }

    async fn create_deal(&self, organization_id: Uuid, created_by: Uuid, deal: &NewDeal) -> Result<Deal, DatabaseError> {
        // The pipeline must belong to the organization for the row to be inserted.
        let created: Option<Deal> = sqlx::query_as(
            r#"
            INSERT INTO deals (
                customer_id, pipeline_id, stage_id, title, value, currency, probability,
                expected_close_date, products, notes, created_by
            )
            SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11
            WHERE EXISTS (SELECT 1 FROM pipelines WHERE id = $2 AND organization_id = $12)
            RETURNING *
            "#,
        )
        .bind(deal.customer_id)
        .bind(deal.pipeline_id)
        .bind(&deal.stage_id)
        .bind(&deal.title)
        .bind(deal.value)
        .bind(deal.currency.to_uppercase())
        .bind(clamp_probability(deal.probability.unwrap_or(0)))
        .bind(deal.expected_close_date)
        .bind(Json(&deal.products))
        .bind(&deal.notes)
        .bind(created_by)
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await?;

        created.ok_or_else(|| DatabaseError::NotFound("Pipeline not found".to_string()))
    }

    async fn update_deal(&self, organization_id: Uuid, id: Uuid, patch: &DealPatch) -> Result<Option<Deal>, DatabaseError> {
        query_builder::update_scoped(&self.pool, Table::Deals, id, organization_id, &patch.changes()).await
    }

    async fn delete_deal(&self, organization_id: Uuid, id: Uuid) -> Result<bool, DatabaseError> {
        query_builder::delete_scoped(&self.pool, Table::Deals, id, organization_id).await
    }
}
