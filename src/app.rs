use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::database::Store;
use crate::handlers::{protected, public};
use crate::middleware::token_auth_middleware;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: AppConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}

/// Build the full router: public routes, token protected routes and the
/// global layers configured in `state.config`
pub fn app(state: AppState) -> Router {
    let config = state.config.clone();

    let mut router = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public_routes())
        .merge(protected_routes(state.clone()))
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes));

    if config.security.enable_cors {
        router = router.layer(cors_layer(&config.security.cors_origins));
    }
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/user/create", post(public::create_post))
        .route("/api/user/token", post(public::token_post))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/user/token", axum::routing::delete(protected::user::token_delete))
        .route("/api/user/me", get(protected::user::me_get).patch(protected::user::me_patch))
        .route(
            "/api/recipe/ingredients",
            get(protected::label::ingredients_get).post(protected::label::ingredients_post),
        )
        .route(
            "/api/recipe/tags",
            get(protected::label::tags_get).post(protected::label::tags_post),
        )
        .route(
            "/api/recipe/recipes",
            get(protected::recipe::recipes_get).post(protected::recipe::recipes_post),
        )
        .route_layer(middleware::from_fn_with_state(state, token_auth_middleware))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(allowed)
}

async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Recipe API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Per-user recipes, ingredients and tags behind token authentication",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "signup": "POST /api/user/create (public)",
                "token": "POST /api/user/token (public), DELETE /api/user/token (protected)",
                "me": "GET, PATCH /api/user/me (protected)",
                "ingredients": "GET, POST /api/recipe/ingredients (protected)",
                "tags": "GET, POST /api/recipe/tags (protected)",
                "recipes": "GET, POST /api/recipe/recipes (protected)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}
