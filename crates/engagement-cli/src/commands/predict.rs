//! Predict command - classify local image files.

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use engagement_adapters::FsImageSource;
use engagement_core::{classify_source, ImageSource};
use tracing::info;

use super::{ExitCode, ModelArgs};
use crate::config::AppConfig;
use crate::output::{JsonLayout, JsonOutput, ProgressBar};

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// JSON Lines (one JSON object per line)
    #[default]
    Jsonl,
    /// Single JSON array
    Json,
}

/// Arguments for the predict command
#[derive(Args, Clone, Debug)]
pub struct PredictArgs {
    /// Image files or directories to classify
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Recurse into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Pretty-print JSON output (only affects --format json)
    #[arg(long)]
    pub pretty: bool,

    /// Show progress bar
    #[arg(long)]
    pub progress: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    #[command(flatten)]
    pub model: ModelArgs,
}

impl PredictArgs {
    /// Apply configuration file values, respecting CLI precedence.
    ///
    /// Boolean flags can only be switched on by config when not passed.
    #[must_use]
    pub fn with_config(mut self, config: &AppConfig) -> Self {
        if self.format.is_none() {
            self.format = config
                .output
                .format
                .as_deref()
                .and_then(|s| OutputFormat::from_str(s, true).ok());
        }
        if !self.pretty {
            self.pretty = config.output.pretty.unwrap_or(false);
        }
        if !self.progress {
            self.progress = config.output.progress.unwrap_or(false);
        }
        self
    }

    fn layout(&self) -> JsonLayout {
        match self.format.unwrap_or_default() {
            OutputFormat::Jsonl => JsonLayout::Lines,
            OutputFormat::Json => JsonLayout::Array {
                pretty: self.pretty,
            },
        }
    }
}

/// Run the predict command.
///
/// Expects `args` to have been processed through `with_config()` first.
pub fn run(args: &PredictArgs, config: &AppConfig) -> Result<ExitCode> {
    info!("Running predict command on {} paths", args.paths.len());

    let model = args
        .model
        .load(config)
        .context("Cannot classify without a model")?;

    let source = FsImageSource::new(args.paths.clone(), args.recursive);
    let total = source.count_hint();

    let show_progress = !args.quiet && (args.progress || std::io::stderr().is_terminal());
    let progress = ProgressBar::new(total.map(|t| t as u64), args.quiet, show_progress);
    let output = JsonOutput::stdout(args.layout());

    let summary = classify_source(&model, &source, &output, &progress)?;
    info!(
        classified = summary.classified,
        failed = summary.failed,
        "Predict finished"
    );

    Ok(if summary.failed > 0 {
        ExitCode::Failures
    } else {
        ExitCode::Success
    })
}
