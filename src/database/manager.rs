use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::DatabaseConfig;
use crate::filter::FilterError;

/// Errors from the persistence layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid query: {0}")]
    Query(#[from] FilterError),

    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("Record not found".to_string()),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DatabaseError::Unavailable(err.to_string())
            }
            sqlx::Error::Database(ref db) if db.code().as_deref() == Some("23505") => {
                DatabaseError::Conflict(conflict_message(db.constraint()))
            }
            other => DatabaseError::Sqlx(other),
        }
    }
}

/// Client-facing message for a unique constraint violation.
pub(crate) fn conflict_message(constraint: Option<&str>) -> String {
    match constraint {
        Some("users_email_key") => "Email is already registered".to_string(),
        Some("customers_org_email_unique") => "A customer with this email already exists".to_string(),
        Some("customers_org_phone_unique") => "A customer with this phone number already exists".to_string(),
        Some(other) => format!("Duplicate value violates {}", other),
        None => "Duplicate value".to_string(),
    }
}

/// Connection pool bootstrap for the CRM database
pub struct DatabaseManager;

impl DatabaseManager {
    /// Build the shared pool without touching the network. Connectivity
    /// problems surface on first use rather than at startup.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| DatabaseError::Unavailable("DATABASE_URL is not configured".to_string()))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect_lazy(url)?;

        info!("Database pool configured (max_connections={})", config.max_connections);
        Ok(pool)
    }

    /// Apply the embedded migrations in ./migrations
    pub async fn migrate(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations").run(pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    /// Apply migrations at startup, logging instead of failing when the
    /// database cannot be reached.
    pub async fn migrate_or_warn(pool: &PgPool) {
        if let Err(e) = Self::migrate(pool).await {
            warn!("Skipping startup migrations: {}", e);
        }
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_constraints_have_friendly_messages() {
        assert_eq!(conflict_message(Some("users_email_key")), "Email is already registered");
        assert!(conflict_message(Some("deals_pkey")).contains("deals_pkey"));
    }

    #[test]
    fn row_not_found_becomes_not_found() {
        assert!(matches!(DatabaseError::from(sqlx::Error::RowNotFound), DatabaseError::NotFound(_)));
    }
}
