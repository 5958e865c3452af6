//! Optional redis connection. Nothing is cached through it yet; it is
//! opened at startup and pinged by the detailed health check.

use thiserror::Error;
use tracing::{info, warn};

use crate::config::CacheConfig;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error(transparent)]
    Redis(#[from] redis::RedisError),

    #[error("Unexpected PING reply: {0}")]
    UnexpectedReply(String),
}

#[derive(Clone)]
pub struct CacheClient {
    client: redis::Client,
}

impl CacheClient {
    pub fn open(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)?;
        Ok(Self { client })
    }

    /// Open the configured client, if any. An invalid URL is logged and
    /// treated as "no cache".
    pub fn from_config(config: &CacheConfig) -> Option<Self> {
        let url = config.url.as_deref()?;
        match Self::open(url) {
            Ok(client) => {
                info!("Redis client configured");
                Some(client)
            }
            Err(e) => {
                warn!("Ignoring invalid REDIS_URL: {}", e);
                None
            }
        }
    }

    pub async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let reply = redis::cmd("PING").query_async::<String>(&mut conn).await?;
        if reply != "PONG" {
            return Err(CacheError::UnexpectedReply(reply));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_url_means_no_client() {
        assert!(CacheClient::from_config(&CacheConfig { url: None }).is_none());
    }

    #[test]
    fn malformed_url_is_ignored() {
        let config = CacheConfig { url: Some("not a url".to_string()) };
        assert!(CacheClient::from_config(&config).is_none());
    }
}
