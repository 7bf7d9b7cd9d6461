//! Configuration file support for engagement.
//!
//! Supports TOML configuration from:
//! - XDG config: `~/.config/engagement/config.toml` (lowest priority)
//! - Project-local: `.engagement.toml` (searched up directory tree)
//! - `PORT` environment variable
//! - CLI flags (highest priority, applied separately)

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info, warn};

/// Project-local config file name.
pub const PROJECT_CONFIG: &str = ".engagement.toml";

/// Top-level configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server settings.
    pub server: ServerSection,
    /// Model artifact settings.
    pub model: ModelSection,
    /// Output formatting settings.
    pub output: OutputSection,
}

/// HTTP server configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Bind address.
    pub host: Option<String>,
    /// Listen port.
    pub port: Option<u16>,
    /// Maximum request body size in bytes.
    pub max_body_bytes: Option<usize>,
    /// Allowed CORS origin (`*` for any).
    pub cors_origin: Option<String>,
}

/// Model configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ModelSection {
    /// Path to the safetensors artifact.
    pub path: Option<PathBuf>,
    /// Refuse to start the server without a model.
    pub required: Option<bool>,
    /// Inference device: "auto" or "cpu".
    pub device: Option<String>,
}

/// Output formatting configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    /// Output format: "json" or "jsonl".
    pub format: Option<String>,
    /// Pretty-print JSON output.
    pub pretty: Option<bool>,
    /// Show progress bar.
    pub progress: Option<bool>,
}

impl AppConfig {
    /// Load configuration from XDG and project-local files and the environment.
    ///
    /// Priority (lowest to highest):
    /// 1. XDG config: `~/.config/engagement/config.toml`
    /// 2. Project-local: `.engagement.toml` (searched up from cwd)
    /// 3. `PORT` environment variable
    ///
    /// Missing files are silently ignored. Invalid values are logged as
    /// warnings and dropped.
    pub fn load() -> Self {
        let mut config = Self::default();

        // Load XDG config (lowest priority)
        if let Some(xdg_path) = xdg_config_path() {
            if xdg_path.exists() {
                info!("Loading XDG config: {}", xdg_path.display());
                if let Some(xdg_config) = load_file(&xdg_path) {
                    config = xdg_config;
                }
            } else {
                debug!("XDG config not found: {}", xdg_path.display());
            }
        }

        // Load project-local config (higher priority, merged)
        if let Some(project_path) = find_project_config() {
            info!("Loading project config: {}", project_path.display());
            if let Some(project_config) = load_file(&project_path) {
                config.merge(project_config);
            }
        }

        config.apply_port_env(std::env::var("PORT").ok().as_deref());

        for problem in config.sanitize() {
            eprintln!("warning: {problem}");
        }

        config
    }

    /// Applies a `PORT` environment value over the file configuration.
    fn apply_port_env(&mut self, value: Option<&str>) {
        let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return;
        };
        match raw.parse::<u16>() {
            Ok(port) => {
                debug!(port, "Using port from PORT environment variable");
                self.server.port = Some(port);
            }
            Err(e) => warn!("Ignoring invalid PORT '{raw}': {e}"),
        }
    }

    /// Drops values outside their accepted range, returning one message per
    /// dropped value.
    fn sanitize(&mut self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.server.port == Some(0) {
            problems.push("server.port must be 1-65535, got 0".to_string());
            self.server.port = None;
        }
        if self.server.max_body_bytes == Some(0) {
            problems.push("server.max_body_bytes must be greater than 0".to_string());
            self.server.max_body_bytes = None;
        }
        if let Some(ref d) = self.model.device {
            if d != "auto" && d != "cpu" {
                problems.push(format!("model.device must be 'auto' or 'cpu', got '{d}'"));
                self.model.device = None;
            }
        }
        if let Some(ref f) = self.output.format {
            if f != "json" && f != "jsonl" {
                problems.push(format!(
                    "output.format must be 'json' or 'jsonl', got '{f}'"
                ));
                self.output.format = None;
            }
        }

        problems
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` when present.
    fn merge(&mut self, other: Self) {
        // Server
        self.server.host = other.server.host.or_else(|| self.server.host.take());
        self.server.port = other.server.port.or(self.server.port);
        self.server.max_body_bytes = other.server.max_body_bytes.or(self.server.max_body_bytes);
        self.server.cors_origin = other
            .server
            .cors_origin
            .or_else(|| self.server.cors_origin.take());

        // Model
        self.model.path = other.model.path.or_else(|| self.model.path.take());
        self.model.required = other.model.required.or(self.model.required);
        self.model.device = other.model.device.or_else(|| self.model.device.take());

        // Output
        self.output.format = other.output.format.or_else(|| self.output.format.take());
        self.output.pretty = other.output.pretty.or(self.output.pretty);
        self.output.progress = other.output.progress.or(self.output.progress);
    }
}

/// Get the XDG config file path.
fn xdg_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("engagement").join("config.toml"))
}

/// Find project-local config by searching up from current directory.
fn find_project_config() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_in_parents(&cwd)
}

/// Search for `.engagement.toml` in the given directory and its parents.
fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);

    while let Some(dir) = current {
        let config_path = dir.join(PROJECT_CONFIG);
        if config_path.exists() {
            return Some(config_path);
        }
        current = dir.parent();
    }

    None
}

/// Load and parse a TOML config file.
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return None;
        }
    };

    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!("Failed to parse config file {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.server.port.is_none());
        assert!(config.model.path.is_none());
        assert!(config.output.format.is_none());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: AppConfig = toml::from_str("").expect("parse empty config");
        assert!(config.model.required.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r"
[server]
host = '127.0.0.1'
port = 8080
max_body_bytes = 1048576
cors_origin = 'http://dashboard.example'

[model]
path = '/srv/models/student_engagement.safetensors'
required = false
device = 'cpu'

[output]
format = 'json'
pretty = true
progress = false
";
        let config: AppConfig = toml::from_str(toml).expect("parse full config");

        assert_eq!(config.server.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(config.server.port, Some(8080));
        assert_eq!(config.server.max_body_bytes, Some(1_048_576));
        assert_eq!(
            config.server.cors_origin.as_deref(),
            Some("http://dashboard.example")
        );
        assert_eq!(
            config.model.path,
            Some(PathBuf::from("/srv/models/student_engagement.safetensors"))
        );
        assert_eq!(config.model.required, Some(false));
        assert_eq!(config.model.device.as_deref(), Some("cpu"));
        assert_eq!(config.output.format.as_deref(), Some("json"));
        assert_eq!(config.output.pretty, Some(true));
        assert_eq!(config.output.progress, Some(false));
    }

    #[test]
    fn test_merge_configs() {
        let mut base: AppConfig = toml::from_str(
            r"
[server]
port = 7000
host = '127.0.0.1'

[model]
required = false
",
        )
        .expect("parse base");

        let override_config: AppConfig = toml::from_str(
            r"
[server]
port = 9000

[output]
format = 'json'
",
        )
        .expect("parse override");

        base.merge(override_config);

        // Port overridden
        assert_eq!(base.server.port, Some(9000));
        // Host and model preserved from base
        assert_eq!(base.server.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(base.model.required, Some(false));
        // Output added from override
        assert_eq!(base.output.format.as_deref(), Some("json"));
    }

    #[test]
    fn test_merge_empty_override_preserves_base() {
        let mut base: AppConfig = toml::from_str(
            r"
[model]
path = 'a.safetensors'
",
        )
        .expect("parse base");

        base.merge(AppConfig::default());

        assert_eq!(base.model.path, Some(PathBuf::from("a.safetensors")));
    }

    #[test]
    fn test_port_env_overrides_files() {
        let mut config: AppConfig = toml::from_str("[server]\nport = 7000\n").expect("parse");

        config.apply_port_env(Some("8123"));

        assert_eq!(config.server.port, Some(8123));
    }

    #[test]
    fn test_invalid_port_env_is_ignored() {
        let mut config: AppConfig = toml::from_str("[server]\nport = 7000\n").expect("parse");

        config.apply_port_env(Some("eighty"));
        config.apply_port_env(Some(""));
        config.apply_port_env(None);

        assert_eq!(config.server.port, Some(7000));
    }

    // === Invalid TOML Graceful Fallback ===

    #[test]
    fn test_invalid_toml_syntax_handled() {
        let toml = r"
[server
port = 5000
"; // Missing closing bracket
        let result: Result<AppConfig, _> = toml::from_str(toml);
        assert!(result.is_err(), "invalid TOML should return error");
    }

    #[test]
    fn test_invalid_field_type_handled() {
        let toml = r#"
[server]
port = "five thousand"
"#;
        let result: Result<AppConfig, _> = toml::from_str(toml);
        assert!(result.is_err(), "type mismatch should return error");
    }

    #[test]
    fn test_out_of_range_port_is_parse_error() {
        let result: Result<AppConfig, _> = toml::from_str("[server]\nport = 70000\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_section_ignored() {
        let toml = r"
[server]
port = 5001

[unknown_section]
foo = 'bar'
";
        let config: AppConfig = toml::from_str(toml).expect("unknown sections are ignored");
        assert_eq!(config.server.port, Some(5001));
    }

    // === Sanitizing ===

    #[test]
    fn test_sanitize_drops_invalid_values() {
        let mut config = AppConfig::default();
        config.server.port = Some(0);
        config.server.max_body_bytes = Some(0);
        config.model.device = Some("tpu".to_string());
        config.output.format = Some("xml".to_string());

        let problems = config.sanitize();

        assert_eq!(problems.len(), 4);
        assert!(problems[0].contains("server.port"));
        assert!(problems[3].contains("output.format"));
        assert!(config.server.port.is_none());
        assert!(config.server.max_body_bytes.is_none());
        assert!(config.model.device.is_none());
        assert!(config.output.format.is_none());
    }

    #[test]
    fn test_sanitize_keeps_valid_values() {
        let mut config: AppConfig = toml::from_str(
            r"
[server]
port = 5000
max_body_bytes = 1024

[output]
format = 'jsonl'
",
        )
        .expect("parse valid config");

        assert!(config.sanitize().is_empty());
        assert_eq!(config.server.port, Some(5000));
    }

    #[test]
    fn test_find_config_in_parents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).expect("mkdir");
        std::fs::write(dir.path().join(PROJECT_CONFIG), "").expect("write");

        let found = find_config_in_parents(&nested);

        assert_eq!(found, Some(dir.path().join(PROJECT_CONFIG)));
    }
}
