use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentState {
    Up,
    Down,
    Disabled,
}

#[derive(Debug, Serialize)]
pub struct ComponentStatus {
    pub status: ComponentState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Liveness {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct DetailedHealth {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: DateTime<Utc>,
    pub database: ComponentStatus,
    pub cache: ComponentStatus,
}

pub fn liveness() -> Liveness {
    Liveness {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now(),
    }
}

/// Probe the store and the optional cache. Overall status is `degraded`
/// when either configured dependency is down.
pub async fn detailed(state: &AppState) -> DetailedHealth {
    let database = match state.store.ping().await {
        Ok(()) => ComponentStatus {
            status: ComponentState::Up,
            backend: Some(state.store.backend()),
            error: None,
        },
        Err(e) => {
            tracing::warn!("Database health check failed: {}", e);
            ComponentStatus {
                status: ComponentState::Down,
                backend: Some(state.store.backend()),
                error: Some(e.to_string()),
            }
        }
    };

    let cache = match &state.cache {
        None => ComponentStatus {
            status: ComponentState::Disabled,
            backend: None,
            error: None,
        },
        Some(client) => match client.ping().await {
            Ok(()) => ComponentStatus {
                status: ComponentState::Up,
                backend: Some("redis"),
                error: None,
            },
            Err(e) => {
                tracing::warn!("Cache health check failed: {}", e);
                ComponentStatus {
                    status: ComponentState::Down,
                    backend: Some("redis"),
                    error: Some(e.to_string()),
                }
            }
        },
    };

    let degraded = database.status == ComponentState::Down || cache.status == ComponentState::Down;
    DetailedHealth {
        status: if degraded { "degraded" } else { "ok" },
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now(),
        database,
        cache,
    }
}
