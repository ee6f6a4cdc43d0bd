//! HTTP adapters over the stores.
//!
//! Handlers only unpack requests, call one store operation and wrap the
//! result; every failure leaves as a [`StoreError`] response.

pub mod admin;
pub mod auth;
pub mod health;
pub mod records;

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::Path;
use axum::http::HeaderValue;
use axum::{middleware, Json, Router};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::CorsConfig;
use crate::error::StoreError;
use crate::logging;
use crate::AppState;

/// Full application router: API, health, optional static files, and layers.
pub fn build_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .merge(auth::router(state.clone()))
        .merge(records::router(state.clone()))
        .nest("/admin", admin::router(state.clone()));

    let mut app = Router::new()
        .merge(health::router(state.clone()))
        .nest("/api", api);

    if let Some(dir) = &state.config.server.static_dir {
        tracing::info!("Serving static files from {}", dir);
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(middleware::from_fn(logging::request_logger))
        .layer(cors_layer(&state.config.cors))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins = config.origins.trim();
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins == "*" {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

/// Unwrap a JSON body, turning malformed input into a validation failure.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, StoreError> {
    payload
        .map(|Json(body)| body)
        .map_err(|_| StoreError::Validation("Invalid request body"))
}

/// Unwrap a numeric path identifier.
pub(crate) fn path_id(id: Result<Path<i64>, PathRejection>) -> Result<i64, StoreError> {
    id.map(|Path(id)| id)
        .map_err(|_| StoreError::Validation("Invalid identifier"))
}

/// Run a store call off the async workers. Used where password hashing makes
/// the call CPU bound.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, StoreError>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StoreError::Storage(format!("blocking task failed: {}", e)))?
}
