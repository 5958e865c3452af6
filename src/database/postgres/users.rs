use async_trait::async_trait;
use sqlx::types::Json;
use tracing::info;
use uuid::Uuid;

use super::PgStore;
use crate::database::manager::DatabaseError;
use crate::database::models::{NewOrganization, NewPipeline, NewUser, Organization, User};
use crate::database::repository::{OrganizationRepository, UserRepository};

#[async_trait]
impl OrganizationRepository for PgStore {
    async fn register(
        &self,
        organization: NewOrganization,
        admin: NewUser,
        pipeline: NewPipeline,
    ) -> Result<(Organization, User), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let organization: Organization = sqlx::query_as(
            r#"
            INSERT INTO organizations (name, max_users)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(&organization.name)
        .bind(NewOrganization::DEFAULT_MAX_USERS)
        .fetch_one(&mut *tx)
        .await?;

        let user: User = sqlx::query_as(
            r#"
            INSERT INTO users (organization_id, email, password_hash, first_name, last_name, role)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(organization.id)
        .bind(&admin.email)
        .bind(&admin.password_hash)
        .bind(&admin.first_name)
        .bind(&admin.last_name)
        .bind(admin.role)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO pipelines (organization_id, name, stages, is_default)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(organization.id)
        .bind(&pipeline.name)
        .bind(Json(&pipeline.stages))
        .bind(pipeline.is_default)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!("Registered organization {} with admin {}", organization.id, user.id);
        Ok((organization, user))
    }

    async fn find_organization(&self, id: Uuid) -> Result<Option<Organization>, DatabaseError> {
        let organization = sqlx::query_as("SELECT * FROM organizations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(organization)
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as("SELECT * FROM users WHERE lower(email) = lower($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_in_org(&self, organization_id: Uuid, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as("SELECT * FROM users WHERE id = $1 AND organization_id = $2")
            .bind(id)
            .bind(organization_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn record_login(&self, id: Uuid) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
