//! Configuration module

use std::path::PathBuf;

use ml_bridge::{LoadPolicy, DEFAULT_MODEL_PATH};
use survival_core::LogFormat;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 12345;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Bind address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Verbose logging when `RUST_LOG` is not set
    pub debug: bool,

    /// Location of the serialized model
    pub model_path: PathBuf,

    /// Keep the model in memory after the first successful load
    pub model_cache: bool,

    /// Log output format
    pub log_format: LogFormat,

    /// Install the Prometheus recorder and serve `/metrics`
    pub metrics_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            debug: true,
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            model_cache: false,
            log_format: LogFormat::Text,
            metrics_enabled: true,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from any key lookup; unset or unparsable values
    /// fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            host: lookup("HOST").unwrap_or(defaults.host),

            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),

            debug: lookup("DEBUG")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.debug),

            model_path: lookup("MODEL_PATH").map_or(defaults.model_path, PathBuf::from),

            model_cache: lookup("MODEL_CACHE")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.model_cache),

            log_format: lookup("LOG_FORMAT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.log_format),

            metrics_enabled: lookup("METRICS_ENABLED")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.metrics_enabled),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub const fn load_policy(&self) -> LoadPolicy {
        if self.model_cache {
            LoadPolicy::Cached
        } else {
            LoadPolicy::EveryRequest
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
