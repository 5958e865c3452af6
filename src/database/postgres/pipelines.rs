use async_trait::async_trait;
use uuid::Uuid;

use super::PgStore;
use crate::database::manager::DatabaseError;
use crate::database::models::Pipeline;
use crate::database::patch::SqlValue;
use crate::database::query_builder::{self, QueryBuilder};
use crate::database::repository::PipelineRepository;
use crate::database::table::Table;
use crate::filter::{Filter, SortDirection};

#[async_trait]
impl PipelineRepository for PgStore {
    async fn list_pipelines(&self, organization_id: Uuid) -> Result<Vec<Pipeline>, DatabaseError> {
        let sql = Filter::scoped(Table::Pipelines, organization_id)
            .order("is_default", SortDirection::Desc)
            .order("created_at", SortDirection::Asc)
            .to_sql()?;
        query_builder::select_all(&self.pool, &sql).await
    }

    async fn find_pipeline(&self, organization_id: Uuid, id: Uuid) -> Result<Option<Pipeline>, DatabaseError> {
        query_builder::select_optional(&self.pool, &QueryBuilder::find_by_id(Table::Pipelines, id, organization_id)).await
    }

    async fn find_default_pipeline(&self, organization_id: Uuid) -> Result<Option<Pipeline>, DatabaseError> {
        let sql = Filter::scoped(Table::Pipelines, organization_id)
            .eq("is_default", SqlValue::Bool(Some(true)))
            .order("created_at", SortDirection::Desc)
            .limit(1, None)?
            .to_sql()?;
        query_builder::select_optional(&self.pool, &sql).await
    }
}
