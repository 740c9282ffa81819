use axum::{
    extract::{DefaultBodyLimit, State},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method, StatusCode,
    },
    middleware::{from_fn, from_fn_with_state},
    response::IntoResponse,
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::SecurityConfig;
use crate::handlers::{elevated, protected, public};
use crate::middleware::{require_admin, require_user};
use crate::state::AppState;

/// The full HTTP surface with middleware applied
pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public_routes())
        .merge(protected_routes(state.clone()))
        .merge(elevated_routes(state.clone()))
        .layer(DefaultBodyLimit::max(state.config.api.max_request_size_bytes));

    if let Some(cors) = cors_layer(&state.config.security) {
        router = router.layer(cors);
    }
    if state.config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(public::auth::register))
        .route("/api/auth/login", post(public::auth::login))
        .route("/api/files/upload", post(public::files::upload))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/auth/user", get(protected::auth::user))
        .route("/api/charts/save", post(protected::charts::save))
        .route("/api/charts/history", get(protected::charts::history))
        .route("/api/charts/delete/:id", delete(protected::charts::delete))
        .route_layer(from_fn_with_state(state, require_user))
}

fn elevated_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/admin/users", get(elevated::users::list))
        .route("/api/admin/users/:id", get(elevated::users::get))
        .route("/api/admin/users/update/:id", patch(elevated::users::update))
        .route("/api/admin/users/delete/:id", delete(elevated::users::delete))
        .route("/api/charts", get(elevated::charts::list_all))
        // Layers run outermost-last, so require_user wraps require_admin
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(state, require_user))
}

/// CORS for the configured client origins; `None` when disabled
fn cors_layer(security: &SecurityConfig) -> Option<CorsLayer> {
    if !security.enable_cors || security.cors_origins.is_empty() {
        return None;
    }

    // Credentials cannot be combined with a wildcard origin
    if security.cors_origins.iter().any(|o| o == "*") {
        return Some(CorsLayer::permissive());
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    Some(
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::DELETE,
                Method::PUT,
                Method::PATCH,
                Method::HEAD,
            ])
            .allow_headers([AUTHORIZATION, CONTENT_TYPE])
            .allow_credentials(true),
    )
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "name": "Chartsheet API",
        "version": version,
        "description": "Accounts, saved charts and spreadsheet parsing for the charting client",
        "endpoints": {
            "home": "/ (public)",
            "health": "/health (public)",
            "auth": "/api/auth/register, /api/auth/login (public), /api/auth/user (protected)",
            "files": "/api/files/upload (public)",
            "charts": "/api/charts/save, /api/charts/history, /api/charts/delete/:id (protected)",
            "admin": "/api/admin/users[/:id], /api/charts (admin)",
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": "unavailable"
                })),
            )
        }
    }
}
