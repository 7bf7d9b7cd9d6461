//! API route definitions

use std::any::Any;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any as AnyOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use super::{error::ApiError, handlers, state::ServiceState, ServerConfig};

async fn handle_404() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Endpoint not found",
        })),
    )
}

async fn handle_405() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({
            "error": "Method not allowed",
        })),
    )
}

/// Converts a handler panic into the generic 500 body.
fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = handlers::panic_message(payload.as_ref());
    ApiError::Internal(format!("handler panicked: {detail}")).into_response()
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let permissive = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods(AnyOrigin)
        .allow_headers(AnyOrigin);

    match origin {
        Some(origin) if !origin.is_empty() && origin != "*" => match origin.parse::<HeaderValue>() {
            Ok(value) => CorsLayer::new()
                .allow_origin(value)
                .allow_methods(AnyOrigin)
                .allow_headers(AnyOrigin),
            Err(e) => {
                warn!(origin, "Invalid CORS origin, allowing all origins: {e}");
                permissive
            }
        },
        _ => permissive,
    }
}

/// Create the application router
pub fn create_router(state: Arc<ServiceState>, config: &ServerConfig) -> Router {
    Router::new()
        .route("/", get(handlers::health_check))
        .route("/model/info", get(handlers::model_info))
        .route("/predict", post(handlers::predict))
        .route("/predict/batch", post(handlers::predict_batch))
        .fallback(handle_404)
        .method_not_allowed_fallback(handle_405)
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors_layer(config.cors_origin.as_deref()))
        .layer(TraceLayer::new_for_http())
}
