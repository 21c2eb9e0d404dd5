use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Rejected monitor settings. Raised before any probing starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("a target URL is required (--url <URL>)")]
    MissingUrl,

    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("'{0}' has no hostname to ping")]
    MissingHost(String),

    #[error("interval must be greater than zero seconds")]
    InvalidInterval,

    #[error("timeout must be greater than zero seconds")]
    InvalidTimeout,

    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ParseFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Why a probe got no usable answer. Never escapes the prober; it is folded
/// into a failed `MonitoringResult`.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    #[error("DNS resolution failed: {0}")]
    Dns(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("no echo reply")]
    NoReply,
}

impl From<reqwest::Error> for ProbeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            ProbeError::Connect(err.to_string())
        } else {
            ProbeError::Request(err.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to format report: {0}")]
    Format(#[from] std::fmt::Error),

    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),

    #[error("no results recorded for {0}")]
    EmptyHistory(String),
}
