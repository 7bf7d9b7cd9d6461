//! Serve command - run the HTTP prediction API.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use engagement_adapters::{run_server, ServerConfig, ServiceState};
use tracing::{info, warn};

use super::ModelArgs;
use crate::config::AppConfig;

/// Arguments for the serve command
#[derive(Args, Clone, Debug)]
pub struct ServeArgs {
    /// Bind address
    #[arg(long)]
    pub host: Option<String>,

    /// Listen port (overrides config and $PORT)
    #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..))]
    pub port: Option<u16>,

    /// Maximum request body size in bytes
    #[arg(long, value_name = "BYTES", value_parser = parse_body_limit)]
    pub max_body_bytes: Option<usize>,

    /// Allowed CORS origin (default: any)
    #[arg(long, value_name = "ORIGIN")]
    pub cors_origin: Option<String>,

    /// Start even if the model cannot be loaded
    #[arg(long)]
    pub allow_missing_model: bool,

    #[command(flatten)]
    pub model: ModelArgs,
}

fn parse_body_limit(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("body limit must be greater than 0".to_string()),
        Ok(n) => Ok(n),
        Err(_) => Err(format!("'{s}' is not a valid byte count")),
    }
}

impl ServeArgs {
    /// Server settings: CLI > config > defaults.
    #[must_use]
    pub fn server_config(&self, config: &AppConfig) -> ServerConfig {
        let defaults = ServerConfig::default();
        ServerConfig {
            host: self
                .host
                .clone()
                .or_else(|| config.server.host.clone())
                .unwrap_or(defaults.host),
            port: self.port.or(config.server.port).unwrap_or(defaults.port),
            max_body_bytes: self
                .max_body_bytes
                .or(config.server.max_body_bytes)
                .unwrap_or(defaults.max_body_bytes),
            cors_origin: self
                .cors_origin
                .clone()
                .or_else(|| config.server.cors_origin.clone()),
        }
    }

    /// Whether a model load failure must abort startup.
    #[must_use]
    pub fn model_required(&self, config: &AppConfig) -> bool {
        !self.allow_missing_model && config.model.required.unwrap_or(true)
    }
}

/// Run the serve command.
pub fn run(args: &ServeArgs, config: &AppConfig) -> Result<()> {
    let server_config = args.server_config(config);

    let state = match args.model.load(config) {
        Ok(model) => ServiceState::new(Arc::new(model)),
        Err(e) if !args.model_required(config) => {
            warn!("{e}");
            eprintln!("warning: {e}; serving without a model");
            ServiceState::without_model()
        }
        Err(e) => {
            return Err(e).context(
                "Refusing to start without a model (use --allow-missing-model to serve anyway)",
            )
        }
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    info!(host = %server_config.host, port = server_config.port, "Starting server");
    runtime.block_on(run_server(server_config, Arc::new(state)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        serve: ServeArgs,
    }

    fn parse(args: &[&str]) -> ServeArgs {
        let argv = std::iter::once("serve").chain(args.iter().copied());
        Wrapper::try_parse_from(argv)
            .unwrap_or_else(|e| panic!("{e}"))
            .serve
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]).server_config(&AppConfig::default());
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn test_cli_overrides_config() {
        let mut file = AppConfig::default();
        file.server.port = Some(7000);
        file.server.host = Some("127.0.0.1".to_string());

        let config = parse(&["--port", "9000"]).server_config(&file);

        assert_eq!(config.port, 9000);
        assert_eq!(config.host, "127.0.0.1");
    }

    #[test]
    fn test_rejects_port_zero() {
        let argv = ["serve", "--port", "0"];
        assert!(Wrapper::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_model_required_by_default() {
        let mut file = AppConfig::default();
        assert!(parse(&[]).model_required(&file));
        assert!(!parse(&["--allow-missing-model"]).model_required(&file));

        file.model.required = Some(false);
        assert!(!parse(&[]).model_required(&file));
    }
}
