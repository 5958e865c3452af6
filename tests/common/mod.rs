#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

use crm_api::auth::hash_password;
use crm_api::config::{AppConfig, StorageBackend};
use crm_api::database::models::{NewUser, UserRole};
use crm_api::database::{DatabaseManager, MemoryStore, PgStore};
use crm_api::{app, AppState};

pub const PASSWORD: &str = "correct-horse-battery";

/// An in-process server. Memory-backed servers keep a handle on their
/// store for seeding fixtures the API cannot create.
pub struct TestServer {
    pub base_url: String,
    memory: Option<Arc<MemoryStore>>,
    pub client: Client,
}

/// A registered admin and their organization.
pub struct Account {
    pub email: String,
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub access_token: String,
    pub refresh_token: String,
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.database.backend = StorageBackend::Memory;
    config.security.jwt_secret = "integration-test-secret".to_string();
    config.security.bcrypt_cost = 4;
    config
}

pub async fn spawn_server() -> Result<TestServer> {
    spawn_with_config(test_config()).await
}

pub async fn spawn_with_config(config: AppConfig) -> Result<TestServer> {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(store.clone(), None, config);
    serve(state, Some(store)).await
}

/// A server on `PgStore` when `DATABASE_URL` is set, `None` otherwise.
/// Migrations run against that database first.
pub async fn spawn_postgres() -> Result<Option<TestServer>> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping postgres test");
        return Ok(None);
    };

    let mut config = test_config();
    config.database.backend = StorageBackend::Postgres;
    config.database.url = Some(url);
    let pool = DatabaseManager::connect_lazy(&config.database)?;
    DatabaseManager::migrate(&pool).await?;

    let state = AppState::new(Arc::new(PgStore::new(pool)), None, config);
    Ok(Some(serve(state, None).await?))
}

async fn serve(state: AppState, memory: Option<Arc<MemoryStore>>) -> Result<TestServer> {
    // Pick an unused port for isolation
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("failed to bind port {}", port))?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app(state).into_make_service_with_connect_info::<SocketAddr>()).await;
    });

    let server = TestServer {
        base_url: format!("http://127.0.0.1:{}", port),
        memory,
        client: Client::new(),
    };
    server.wait_ready(Duration::from_secs(5)).await?;
    Ok(server)
}

impl TestServer {
    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    /// The backing in-memory store. Panics on a postgres-backed server.
    pub fn store(&self) -> &MemoryStore {
        self.memory.as_deref().expect("fixture seeding needs a memory-backed server")
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn register(&self, email: &str, organization: &str) -> Result<Account> {
        let res = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&json!({
                "email": email,
                "password": PASSWORD,
                "firstName": "Test",
                "lastName": "Owner",
                "organizationName": organization,
            }))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::CREATED, "register failed for {}", email);
        let body = res.json::<Value>().await?;
        let data = &body["data"];

        Ok(Account {
            email: email.to_string(),
            user_id: parse_id(&data["user"]["id"])?,
            organization_id: parse_id(&data["organization"]["id"])?,
            access_token: string(&data["accessToken"])?,
            refresh_token: string(&data["refreshToken"])?,
        })
    }

    /// Seed a non-admin member of an existing organization and log them in.
    pub async fn add_member(&self, organization_id: Uuid, email: &str, role: UserRole) -> Result<Account> {
        let user = self
            .store()
            .add_user(
                organization_id,
                NewUser {
                    email: email.to_string(),
                    password_hash: hash_password(PASSWORD, 4)?,
                    first_name: "Team".to_string(),
                    last_name: "Member".to_string(),
                    role,
                },
            )
            .await?;
        let (access_token, refresh_token) = self.login(email, PASSWORD).await?;

        Ok(Account {
            email: email.to_string(),
            user_id: user.id,
            organization_id,
            access_token,
            refresh_token,
        })
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(String, String)> {
        let res = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::OK, "login failed for {}", email);
        let body = res.json::<Value>().await?;
        Ok((string(&body["data"]["accessToken"])?, string(&body["data"]["refreshToken"])?))
    }

    pub async fn get(&self, account: &Account, path: &str) -> Result<Response> {
        Ok(self.client.get(self.url(path)).bearer_auth(&account.access_token).send().await?)
    }

    pub async fn post(&self, account: &Account, path: &str, body: Value) -> Result<Response> {
        Ok(self
            .client
            .post(self.url(path))
            .bearer_auth(&account.access_token)
            .json(&body)
            .send()
            .await?)
    }

    pub async fn put(&self, account: &Account, path: &str, body: Value) -> Result<Response> {
        Ok(self
            .client
            .put(self.url(path))
            .bearer_auth(&account.access_token)
            .json(&body)
            .send()
            .await?)
    }

    pub async fn delete(&self, account: &Account, path: &str) -> Result<Response> {
        Ok(self.client.delete(self.url(path)).bearer_auth(&account.access_token).send().await?)
    }

    /// POST and return `data` from a 201 envelope.
    pub async fn create(&self, account: &Account, path: &str, body: Value) -> Result<Value> {
        let res = self.post(account, path, body).await?;
        let status = res.status();
        let body = res.json::<Value>().await?;
        assert_eq!(status, StatusCode::CREATED, "POST {} failed: {}", path, body);
        Ok(body["data"].clone())
    }

    pub async fn create_customer(&self, account: &Account, first_name: &str) -> Result<Value> {
        self.create(
            account,
            "/api/customers",
            json!({ "firstName": first_name, "lastName": "Customer" }),
        )
        .await
    }

    pub async fn default_pipeline(&self, account: &Account) -> Result<Value> {
        let res = self.get(account, "/api/pipelines/default").await?;
        assert_eq!(res.status(), StatusCode::OK);
        Ok(res.json::<Value>().await?["data"].clone())
    }
}

/// Assert the status and return the parsed envelope.
pub async fn expect_status(res: Response, expected: StatusCode) -> Result<Value> {
    let status = res.status();
    let body = res.json::<Value>().await?;
    assert_eq!(status, expected, "unexpected status {}: {}", status, body);
    Ok(body)
}

pub fn error_code(body: &Value) -> &str {
    body["error"]["code"].as_str().unwrap_or_default()
}

/// Id of the named stage in a pipeline envelope.
pub fn stage_id(pipeline: &Value, name: &str) -> Result<String> {
    pipeline["stages"]
        .as_array()
        .and_then(|stages| stages.iter().find(|s| s["name"] == name))
        .and_then(|stage| stage["id"].as_str())
        .map(str::to_string)
        .with_context(|| format!("pipeline has no stage named {:?}", name))
}

pub fn parse_id(value: &Value) -> Result<Uuid> {
    let raw = value.as_str().context("id is not a string")?;
    Ok(Uuid::parse_str(raw)?)
}

fn string(value: &Value) -> Result<String> {
    Ok(value.as_str().context("expected a string")?.to_string())
}
