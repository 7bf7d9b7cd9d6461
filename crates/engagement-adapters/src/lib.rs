//! Engagement Adapters - External adapters for engagement classification.
//!
//! This crate provides adapters for:
//! - The HTTP/JSON prediction service
//! - Filesystem image source
//! - Model artifact resolution and downloading

pub mod fs;
pub mod models;
pub mod server;

pub use fs::FsImageSource;
pub use models::{default_model_path, models_dir, resolve_model_path};
pub use server::{create_router, run_server, ServerConfig, ServiceState};
