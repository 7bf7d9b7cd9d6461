//! HTTP service for engagement classification.
//!
//! Exposes health, model info, single and batch prediction over JSON.

mod api;
mod error;
mod handlers;
mod state;

pub use api::create_router;
pub use error::ApiError;
pub use handlers::decode_image_field;
pub use state::ServiceState;

use std::sync::Arc;
use tracing::{error, info};

/// Default listen port.
pub const DEFAULT_PORT: u16 = 5000;

/// Default request body limit (16 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_body_bytes: usize,
    /// Allowed CORS origin; `None` or `*` allows every origin.
    pub cors_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            cors_origin: None,
        }
    }
}

/// Start the server and serve until Ctrl+C.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or serving fails.
pub async fn run_server(config: ServerConfig, state: Arc<ServiceState>) -> anyhow::Result<()> {
    let model_loaded = state.model_loaded();
    let app = create_router(state, &config);

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    let addr = listener.local_addr()?;
    info!(
        address = %addr,
        model_loaded,
        max_body_bytes = config.max_body_bytes,
        cors_origin = config.cors_origin.as_deref().unwrap_or("*"),
        "Engagement API listening"
    );
    info!(url = %format!("http://{addr}/"), "Health endpoint available");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install Ctrl+C handler: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, stopping server gracefully");
}
