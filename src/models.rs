use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const STATUS_NO_RESPONSE: u16 = 0;
pub const STATUS_PING_ALIVE: u16 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeMode {
    #[default]
    Http,
    Ping,
}

impl fmt::Display for ProbeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeMode::Http => f.write_str("HTTP GET"),
            ProbeMode::Ping => f.write_str("ICMP ping"),
        }
    }
}

/// `is_up` is fixed at construction from `status`; there are no setters.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitoringResult {
    timestamp: DateTime<Utc>,
    status: u16,
    response_time_ms: f64,
    is_up: bool,
    message: Option<String>,
}

impl MonitoringResult {
    pub fn new(status: u16, response_time_ms: f64) -> Self {
        Self::at(Utc::now(), status, response_time_ms)
    }

    pub fn at(timestamp: DateTime<Utc>, status: u16, response_time_ms: f64) -> Self {
        Self {
            timestamp,
            status,
            response_time_ms: sanitize_millis(response_time_ms),
            is_up: is_success(status),
            message: None,
        }
    }

    pub fn failure(response_time_ms: f64, reason: impl fmt::Display) -> Self {
        Self::new(STATUS_NO_RESPONSE, response_time_ms).with_message(reason.to_string())
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn response_time_ms(&self) -> f64 {
        self.response_time_ms
    }

    pub fn is_up(&self) -> bool {
        self.is_up
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

pub fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

fn sanitize_millis(ms: f64) -> f64 {
    if ms.is_finite() && ms > 0.0 { ms } else { 0.0 }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Aggregate {
    /// Percent, 0-100.
    pub availability: f64,
    pub avg_response_time_ms: f64,
    pub samples: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn up_follows_status_class() {
        assert!(MonitoringResult::new(200, 10.0).is_up());
        assert!(MonitoringResult::new(204, 10.0).is_up());
        assert!(!MonitoringResult::new(301, 10.0).is_up());
        assert!(!MonitoringResult::new(503, 10.0).is_up());
        assert!(!MonitoringResult::new(STATUS_NO_RESPONSE, 0.0).is_up());
    }

    #[test]
    fn failure_keeps_reason_and_is_down() {
        let result = MonitoringResult::failure(42.0, "connection refused");
        assert!(!result.is_up());
        assert_eq!(result.status(), STATUS_NO_RESPONSE);
        assert_eq!(result.response_time_ms(), 42.0);
        assert_eq!(result.message(), Some("connection refused"));
    }

    #[test]
    fn unmeasurable_latency_becomes_zero() {
        assert_eq!(MonitoringResult::new(200, f64::NAN).response_time_ms(), 0.0);
        assert_eq!(MonitoringResult::new(200, -3.0).response_time_ms(), 0.0);
    }
}
