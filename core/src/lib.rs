//! Survival Core Library
//!
//! Provides utilities shared by the survival prediction services:
//! - Tracing initialisation (text or JSON output)
//! - Log format selection

use std::str::FromStr;

use tracing_subscriber::EnvFilter;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

/// Filter directives used when `RUST_LOG` is not set.
pub fn default_filter(service_name: &str, debug: bool) -> String {
    let target = service_name.replace('-', "_");
    if debug {
        format!("{target}=debug,ml_bridge=debug,feature_pipeline=debug,tower_http=debug")
    } else {
        format!("{target}=info,ml_bridge=info,tower_http=info")
    }
}

fn env_filter(service_name: &str, debug: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(service_name, debug)))
}

/// Initialize tracing with standard configuration
pub fn init_tracing(service_name: &str, debug: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(service_name, debug))
        .init();
}

/// Initialize tracing with JSON output (for production)
pub fn init_tracing_json(service_name: &str, debug: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(service_name, debug))
        .json()
        .init();
}

/// Initialize tracing in the given format
pub fn init(service_name: &str, format: LogFormat, debug: bool) {
    match format {
        LogFormat::Text => init_tracing(service_name, debug),
        LogFormat::Json => init_tracing_json(service_name, debug),
    }
}
