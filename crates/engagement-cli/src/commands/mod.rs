//! CLI command definitions and handlers.

pub mod models;
pub mod predict;
pub mod serve;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use engagement_adapters::resolve_model_path;
use engagement_core::{load_model, select_device, DevicePreference, EngagementNet, ModelLoadError};

use crate::config::AppConfig;

/// Engagement - Student engagement classification service
#[derive(Parser)]
#[command(name = "engagement")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Serve the HTTP prediction API
    Serve(serve::ServeArgs),
    /// Classify local image files
    Predict(predict::PredictArgs),
    /// Manage the model artifact
    Models(models::ModelsArgs),
}

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Everything succeeded.
    Success = 0,
    /// The run completed but some images failed.
    Failures = 1,
    /// Fatal error.
    Error = 2,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        Self::from(code as u8)
    }
}

/// Model selection shared by every command that loads the classifier.
#[derive(Args, Clone, Debug, Default)]
pub struct ModelArgs {
    /// Model file (overrides config and the default location)
    #[arg(long, value_name = "FILE")]
    pub model: Option<PathBuf>,

    /// Inference device: auto or cpu
    #[arg(long, value_name = "DEVICE")]
    pub device: Option<DevicePreference>,
}

impl ModelArgs {
    /// Model path after applying CLI > config > default precedence.
    #[must_use]
    pub fn resolve_path(&self, config: &AppConfig) -> PathBuf {
        resolve_model_path(self.model.as_deref(), config.model.path.as_deref())
    }

    /// Device preference: CLI > config > auto.
    #[must_use]
    pub fn device(&self, config: &AppConfig) -> DevicePreference {
        self.device
            .or_else(|| config.model.device.as_deref().and_then(|d| d.parse().ok()))
            .unwrap_or_default()
    }

    /// Loads the classifier from the resolved path.
    ///
    /// # Errors
    ///
    /// Returns [`ModelLoadError`] if the artifact is missing or invalid.
    pub fn load(&self, config: &AppConfig) -> Result<EngagementNet, ModelLoadError> {
        let path = self.resolve_path(config);
        let device = select_device(self.device(config));
        load_model(&path, &device)
    }
}
