use axum::{
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::warn;

use crate::config::SecurityConfig;
use crate::handlers::{protected, public};
use crate::middleware::{jwt_auth_middleware, limiter_from_config, rate_limit_middleware};
use crate::state::AppState;

/// Build the full router. Protected groups share the bearer-token layer;
/// body limits, CORS, tracing and the optional per-client rate limit wrap
/// everything. Serve with connect info so the limiter can key on the peer
/// address.
pub fn app(state: AppState) -> Router {
    let protected = Router::new()
        .merge(auth_routes())
        .merge(customer_routes())
        .merge(deal_routes())
        .merge(pipeline_routes())
        .merge(task_routes())
        .merge(contact_history_routes())
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    let mut router = Router::new()
        .route("/", get(root))
        .merge(health_routes())
        .nest("/api", health_routes())
        .merge(auth_public_routes())
        .merge(protected)
        .layer(RequestBodyLimitLayer::new(state.config.api.max_request_size_bytes))
        .layer(cors_layer(&state.config.security))
        .layer(TraceLayer::new_for_http());

    if state.config.api.enable_rate_limiting {
        let limiter = limiter_from_config(&state.config.api);
        router = router.layer(from_fn_with_state(limiter, rate_limit_middleware));
    }

    router.with_state(state)
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if security.cors_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(public::health::health_get))
        .route("/health/detailed", get(public::health::health_detailed_get))
}

fn auth_public_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/api/auth/register", post(auth::register_post))
        .route("/api/auth/login", post(auth::login_post))
        .route("/api/auth/refresh", post(auth::refresh_post))
}

fn auth_routes() -> Router<AppState> {
    Router::new().route("/api/auth/me", get(protected::auth::me_get))
}

fn customer_routes() -> Router<AppState> {
    use protected::customers;

    Router::new()
        .route("/api/customers", get(customers::list).post(customers::create))
        .route(
            "/api/customers/:id",
            get(customers::show).put(customers::update).delete(customers::delete),
        )
}

fn deal_routes() -> Router<AppState> {
    use protected::deals;

    Router::new()
        .route("/api/deals", get(deals::list).post(deals::create))
        .route("/api/deals/:id", get(deals::show).put(deals::update).delete(deals::delete))
}

fn pipeline_routes() -> Router<AppState> {
    use protected::pipelines;

    // The static segment wins over `:id` in axum's matcher.
    Router::new()
        .route("/api/pipelines", get(pipelines::list))
        .route("/api/pipelines/default", get(pipelines::default))
        .route("/api/pipelines/:id", get(pipelines::show))
}

fn task_routes() -> Router<AppState> {
    use protected::tasks;

    Router::new()
        .route("/api/tasks", get(tasks::list).post(tasks::create))
        .route("/api/tasks/:id", get(tasks::show).put(tasks::update).delete(tasks::delete))
}

fn contact_history_routes() -> Router<AppState> {
    use protected::contact_history;

    Router::new()
        .route(
            "/api/contact-history",
            get(contact_history::list).post(contact_history::create),
        )
        .route(
            "/api/contact-history/:id",
            get(contact_history::show)
                .put(contact_history::update)
                .delete(contact_history::delete),
        )
}

async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "CRM API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Multi-tenant CRM backend: customers, deal pipelines, tasks and contact history",
            "endpoints": {
                "public_auth": "/api/auth/register, /api/auth/login, /api/auth/refresh (public - token acquisition)",
                "health": "/health, /health/detailed (public)",
                "auth": "/api/auth/me (protected)",
                "customers": "/api/customers[/:id] (protected)",
                "deals": "/api/deals[/:id] (protected)",
                "pipelines": "/api/pipelines, /api/pipelines/default, /api/pipelines/:id (protected)",
                "tasks": "/api/tasks[/:id] (protected)",
                "contact_history": "/api/contact-history[/:id] (protected)",
            }
        }
    }))
}
