//! Models command - manage the model artifact.

use anyhow::Result;
use clap::{Args, Subcommand};
use engagement_adapters::models::{default_model_path, fetch_model, file_sha256, ProgressCallback};
use engagement_core::{Classifier, ModelLoadError};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;

use super::{ExitCode, ModelArgs};
use crate::config::AppConfig;

/// Arguments for the models command
#[derive(Args)]
pub struct ModelsArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    #[command(subcommand)]
    pub command: ModelsCommand,
}

/// Models subcommands
#[derive(Subcommand)]
pub enum ModelsCommand {
    /// Print the resolved model path
    Path,
    /// Verify that the model exists and loads
    Check,
    /// Download the model artifact
    Fetch {
        /// Download URL
        #[arg(long)]
        url: String,

        /// Expected SHA-256 of the artifact (hex)
        #[arg(long, value_name = "HEX")]
        sha256: Option<String>,

        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Run the models command.
pub fn run(args: &ModelsArgs, config: &AppConfig) -> Result<ExitCode> {
    match &args.command {
        ModelsCommand::Path => print_path(&args.model, config),
        ModelsCommand::Check => check_model(&args.model, config),
        ModelsCommand::Fetch { url, sha256, force } => {
            fetch(&args.model, config, url, sha256.as_deref(), *force)
        }
    }
}

#[allow(clippy::unnecessary_wraps)]
fn print_path(model: &ModelArgs, config: &AppConfig) -> Result<ExitCode> {
    println!("{}", model.resolve_path(config).display());
    Ok(ExitCode::Success)
}

fn check_model(model: &ModelArgs, config: &AppConfig) -> Result<ExitCode> {
    let path = model.resolve_path(config);

    match model.load(config) {
        Ok(net) => {
            let digest = file_sha256(&path)?;
            println!("✓ {}", path.display());
            println!("  input shape: {:?}", net.input_shape());
            println!("  sha256: {digest}");
            Ok(ExitCode::Success)
        }
        Err(e @ ModelLoadError::Missing { .. }) => {
            println!("✗ {e}");
            println!("  Run `engagement models fetch --url <URL>` to download it.");
            Ok(ExitCode::Failures)
        }
        Err(e) => {
            println!("✗ {e}");
            Ok(ExitCode::Failures)
        }
    }
}

/// Destination for a download: an explicit path, or the models directory.
fn fetch_destination(model: &ModelArgs, config: &AppConfig) -> PathBuf {
    model
        .model
        .clone()
        .or_else(|| config.model.path.clone())
        .unwrap_or_else(default_model_path)
}

fn fetch(
    model: &ModelArgs,
    config: &AppConfig,
    url: &str,
    sha256: Option<&str>,
    force: bool,
) -> Result<ExitCode> {
    let dest = fetch_destination(model, config);
    if dest.exists() && !force {
        println!("{} already exists (use --force to replace)", dest.display());
        return Ok(ExitCode::Success);
    }

    let pb = Arc::new(ProgressBar::new(0));
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta}) {msg}")
            .map_err(|e| anyhow::anyhow!("Invalid progress template: {e}"))?
            .progress_chars("#>-"),
    );

    let pb_clone = Arc::clone(&pb);
    let progress: ProgressCallback =
        Box::new(move |name: &str, downloaded: u64, total: Option<u64>| {
            if let Some(t) = total {
                pb_clone.set_length(t);
            }
            pb_clone.set_message(name.to_string());
            pb_clone.set_position(downloaded);
        });

    fetch_model(url, sha256, &dest, Some(&progress))?;
    pb.finish_with_message("Model downloaded");

    println!("{}", dest.display());
    Ok(ExitCode::Success)
}
