use clap::Args;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::models::ProbeMode;

pub const DEFAULT_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Arguments of `pulsewatch monitor`.
#[derive(Debug, Clone, Default, Args)]
pub struct MonitorArgs {
    /// URL to monitor (its hostname is used with --ping)
    #[arg(short, long)]
    pub url: Option<String>,

    /// Seconds between checks [default: 60]
    #[arg(short, long, value_name = "SECONDS")]
    pub interval: Option<u64>,

    /// Seconds before a check is considered failed [default: 10]
    #[arg(short, long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Use an ICMP ping instead of an HTTP GET
    #[arg(long)]
    pub ping: bool,

    /// JSON file providing defaults for the options above
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl MonitorArgs {
    /// Merges flags over the optional config file and validates the result.
    pub fn resolve(self) -> Result<MonitorConfig, ConfigError> {
        let file = match &self.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };

        let url = self.url.or(file.url);
        let interval = self.interval.or(file.interval).unwrap_or(DEFAULT_INTERVAL_SECS);
        let timeout = self.timeout.or(file.timeout).unwrap_or(DEFAULT_TIMEOUT_SECS);
        let mode = if self.ping {
            ProbeMode::Ping
        } else {
            file.mode.unwrap_or_default()
        };

        MonitorConfig::configure(url.as_deref(), interval, timeout, mode)
    }
}

/// On-disk form of the monitor options. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub url: Option<String>,
    pub interval: Option<u64>,
    pub timeout: Option<u64>,
    /// `"http"` or `"ping"`.
    pub mode: Option<ProbeMode>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::ParseFile {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Http(Url),
    Ping { host: String },
}

impl Target {
    pub fn mode(&self) -> ProbeMode {
        match self {
            Target::Http(_) => ProbeMode::Http,
            Target::Ping { .. } => ProbeMode::Ping,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Http(url) => write!(f, "{}", url),
            Target::Ping { host } => f.write_str(host),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    pub target: Target,
    pub interval: Duration,
    pub timeout: Duration,
}

impl MonitorConfig {
    pub fn configure(
        url: Option<&str>,
        interval_secs: u64,
        timeout_secs: u64,
        mode: ProbeMode,
    ) -> Result<Self, ConfigError> {
        let raw = url.map(str::trim).filter(|u| !u.is_empty()).ok_or(ConfigError::MissingUrl)?;
        if interval_secs == 0 {
            return Err(ConfigError::InvalidInterval);
        }
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }

        let target = match mode {
            ProbeMode::Http => Target::Http(parse_http_url(raw)?),
            ProbeMode::Ping => Target::Ping { host: ping_host(raw)? },
        };

        Ok(Self {
            target,
            interval: Duration::from_secs(interval_secs),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn parse_http_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUrl { url: raw.to_string(), reason };

    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".into()));
    }
    Ok(url)
}

/// Accepts a full URL, a bare hostname / IP address, or `host:port`.
fn ping_host(raw: &str) -> Result<String, ConfigError> {
    let url = match Url::parse(raw) {
        Ok(url) if url.has_host() => url,
        // `example.com:8080` parses as scheme `example.com` with path `8080`.
        Ok(url) if is_port(url.path()) => with_http_scheme(raw)?,
        Ok(_) => return Err(ConfigError::MissingHost(raw.to_string())),
        Err(_) => with_http_scheme(raw)?,
    };

    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| ConfigError::MissingHost(raw.to_string()))?;
    // IPv6 literals come back bracketed.
    Ok(host.trim_start_matches('[').trim_end_matches(']').to_string())
}

fn with_http_scheme(raw: &str) -> Result<Url, ConfigError> {
    Url::parse(&format!("http://{}", raw)).map_err(|e| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}

fn is_port(path: &str) -> bool {
    !path.is_empty() && path.chars().all(|c| c.is_ascii_digit())
}
