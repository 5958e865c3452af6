use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crm_api::cache::CacheClient;
use crm_api::config::{self, AppConfig, StorageBackend};
use crm_api::database::{DatabaseManager, MemoryStore, PgStore, Store};
use crm_api::{app, AppState};

#[derive(Parser)]
#[command(name = "crm-api")]
#[command(about = "Multi-tenant CRM API server")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Run the HTTP server (default)")]
    Serve,

    #[command(about = "Apply database migrations and exit")]
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so DATABASE_URL, JWT_SECRET, etc. are picked up
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("crm_api=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = config::config().clone();
    config.validate().context("invalid configuration")?;
    info!("Starting CRM API in {:?} mode", config.environment);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Migrate => migrate(&config).await,
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let store: Arc<dyn Store> = match config.database.backend {
        StorageBackend::Memory => {
            if crm_api::is_production!() {
                warn!("STORAGE_BACKEND=memory in production; data is lost on shutdown");
            }
            info!("Using in-memory store");
            Arc::new(MemoryStore::new())
        }
        StorageBackend::Postgres => {
            let pool = DatabaseManager::connect_lazy(&config.database)?;
            if config.database.run_migrations {
                DatabaseManager::migrate_or_warn(&pool).await;
            }
            Arc::new(PgStore::new(pool))
        }
    };

    let cache = CacheClient::from_config(&config.cache);
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(store, cache, config);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("CRM API listening on http://{}", bind_addr);

    axum::serve(listener, app(state).into_make_service_with_connect_info::<SocketAddr>())
        .await
        .context("server error")?;
    Ok(())
}

async fn migrate(config: &AppConfig) -> anyhow::Result<()> {
    let pool = DatabaseManager::connect_lazy(&config.database)?;
    DatabaseManager::migrate(&pool).await?;
    Ok(())
}
