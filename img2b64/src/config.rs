//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `IMG2B64_CONFIG`
//! environment variable. A missing file is fine: every field has a default.
//!
//! ## Loading Priority
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `IMG2B64_` override YAML values
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `IMG2B64_LIMITS__MAX_UPLOAD_SIZE=1048576` sets the `limits.max_upload_size` field.
//!
//! ## Example
//!
//! ```yaml
//! host: 0.0.0.0
//! port: 3000
//! verify_signature: false
//! formats:
//!   supported: [jpeg, png, gif, webp]
//!   default_format: png
//! limits:
//!   max_upload_size: 10485760
//! ui:
//!   default_language: zh
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};

use crate::errors::Error;
use crate::format::ImageFormat;
use crate::page::Language;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "IMG2B64_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Enable OpenTelemetry OTLP export for distributed tracing
    pub enable_otel_export: bool,
    /// Reject uploads whose signature contradicts the declared `format`.
    ///
    /// Off by default: the declared format is trusted and the bytes are encoded as-is.
    pub verify_signature: bool,
    /// Which image formats the service accepts
    pub formats: FormatsConfig,
    /// Upload limits
    pub limits: LimitsConfig,
    /// Page rendering options
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormatsConfig {
    /// Allowlist of formats; a `format` hint outside it is rejected
    pub supported: Vec<ImageFormat>,
    /// Format assumed when an upload carries no `format` field
    pub default_format: ImageFormat,
}

impl Default for FormatsConfig {
    fn default() -> Self {
        Self {
            supported: ImageFormat::ALL.to_vec(),
            default_format: ImageFormat::Png,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Maximum request body size in bytes for uploads.
    /// Set to 0 for unlimited (not recommended for production).
    /// Default: 10MB
    pub max_upload_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_upload_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct UiConfig {
    /// Language used when the request names none
    pub default_language: Language,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            enable_otel_export: false,
            verify_signature: false,
            formats: FormatsConfig::default(),
            limits: LimitsConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.formats.supported.is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: formats.supported cannot be empty. List at least one image format.".to_string(),
            });
        }

        if !self.formats.supported.contains(&self.formats.default_format) {
            return Err(Error::Internal {
                operation: format!(
                    "Config validation: formats.default_format ({}) must be one of formats.supported ({})",
                    self.formats.default_format,
                    self.formats
                        .supported
                        .iter()
                        .map(|f| f.name())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            });
        }

        Ok(())
    }

    /// Whether `format` is enabled by the allowlist
    pub fn is_format_enabled(&self, format: ImageFormat) -> bool {
        self.formats.supported.contains(&format)
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables can still override specific values
            .merge(Env::prefixed("IMG2B64_").ignore(&["CONFIG"]).split("__"))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
