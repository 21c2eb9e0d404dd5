use anyhow::{Context, Result};
use async_trait::async_trait;
use hickory_resolver::config::ResolverConfig;
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::TokioResolver;
use regex::Regex;
use reqwest::Url;
use std::net::IpAddr;
use std::sync::LazyLock;
use std::time::{Duration, Instant};
use surge_ping::{Client as PingClient, Config as PingConfig, PingIdentifier, PingSequence, ICMP};
use tokio::process::Command;
use tracing::{info, warn};

use crate::config::Target;
use crate::error::ProbeError;
use crate::models::{MonitoringResult, STATUS_NO_RESPONSE, STATUS_PING_ALIVE};

/// Extra time granted to the system `ping` process beyond its own deadline.
const SYSTEM_PING_GRACE: Duration = Duration::from_millis(500);

static PING_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"time[=<]\s*([0-9]+(?:\.[0-9]+)?)").expect("static regex"));

/// Runs one check against a target. Implementations must resolve within
/// roughly `timeout` and report failures as a down result, never an error.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, target: &Target, timeout: Duration) -> MonitoringResult;
}

/// Round-trip time as handed back by a ping backend.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportedTime {
    Millis(f64),
    Text(String),
    Missing,
}

impl ReportedTime {
    /// Numeric or textual times are both accepted; anything unparseable is 0.
    pub fn as_millis(&self) -> f64 {
        let ms = match self {
            ReportedTime::Millis(ms) => *ms,
            ReportedTime::Text(text) => text.trim().parse::<f64>().unwrap_or(0.0),
            ReportedTime::Missing => 0.0,
        };
        if ms.is_finite() { ms } else { 0.0 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PingReply {
    pub alive: bool,
    pub time: ReportedTime,
}

impl PingReply {
    fn unreachable() -> Self {
        Self { alive: false, time: ReportedTime::Missing }
    }

    pub fn into_result(self) -> MonitoringResult {
        let ms = self.time.as_millis();
        if self.alive {
            MonitoringResult::new(STATUS_PING_ALIVE, ms)
        } else {
            MonitoringResult::new(STATUS_NO_RESPONSE, ms)
                .with_message(ProbeError::NoReply.to_string())
        }
    }
}

/// Pulls the round-trip figure out of `ping` command output.
pub fn parse_ping_output(output: &str) -> ReportedTime {
    PING_TIME
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| ReportedTime::Text(m.as_str().to_string()))
        .unwrap_or(ReportedTime::Missing)
}

enum PingBackend {
    Icmp { v4: PingClient, v6: Option<PingClient> },
    System,
}

/// Probes over the network: HTTP GET with reqwest, ICMP echo with surge-ping.
pub struct NetProber {
    http_client: reqwest::Client,
    dns_resolver: TokioResolver,
    ping: PingBackend,
}

impl NetProber {
    pub fn new() -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        let dns_resolver = TokioResolver::builder_with_config(
            ResolverConfig::cloudflare(),
            TokioConnectionProvider::default(),
        )
        .build();

        let ping = match PingClient::new(&PingConfig::default()) {
            Ok(v4) => {
                let v6 = PingClient::new(&PingConfig::builder().kind(ICMP::V6).build()).ok();
                info!(ipv6 = v6.is_some(), "ICMP sockets ready");
                PingBackend::Icmp { v4, v6 }
            }
            Err(e) => {
                warn!(error = %e, "Raw ICMP socket unavailable, falling back to system ping");
                PingBackend::System
            }
        };

        Ok(Self { http_client, dns_resolver, ping })
    }

    async fn probe_http(&self, url: &Url, timeout: Duration) -> MonitoringResult {
        let start = Instant::now();
        match tokio::time::timeout(timeout, self.http_client.get(url.clone()).send()).await {
            Ok(Ok(response)) => {
                MonitoringResult::new(response.status().as_u16(), elapsed_ms(start))
            }
            Ok(Err(e)) => MonitoringResult::failure(elapsed_ms(start), ProbeError::from(e)),
            Err(_) => MonitoringResult::failure(elapsed_ms(start), ProbeError::Timeout(timeout)),
        }
    }

    async fn probe_ping(&self, host: &str, timeout: Duration) -> MonitoringResult {
        let start = Instant::now();
        let ip = match tokio::time::timeout(timeout, self.resolve(host)).await {
            Ok(Ok(ip)) => ip,
            Ok(Err(e)) => return MonitoringResult::failure(elapsed_ms(start), e),
            Err(_) => {
                return MonitoringResult::failure(elapsed_ms(start), ProbeError::Timeout(timeout))
            }
        };

        // Only what is left of the budget goes to the echo itself.
        let remaining = timeout.saturating_sub(start.elapsed()).max(Duration::from_millis(1));
        let reply = match &self.ping {
            PingBackend::Icmp { v4, v6 } => {
                let client = match (ip, v6) {
                    (IpAddr::V6(_), Some(v6)) => v6,
                    _ => v4,
                };
                icmp_ping(client, ip, remaining).await
            }
            PingBackend::System => system_ping(ip, remaining).await,
        };
        reply.into_result()
    }

    async fn resolve(&self, host: &str) -> Result<IpAddr, ProbeError> {
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(ip);
        }
        match self.dns_resolver.lookup_ip(host).await {
            Ok(lookup) => lookup
                .iter()
                .next()
                .ok_or_else(|| ProbeError::Dns(format!("no address found for {}", host))),
            Err(e) => Err(ProbeError::Dns(e.to_string())),
        }
    }
}

#[async_trait]
impl Prober for NetProber {
    async fn probe(&self, target: &Target, timeout: Duration) -> MonitoringResult {
        match target {
            Target::Http(url) => self.probe_http(url, timeout).await,
            Target::Ping { host } => self.probe_ping(host, timeout).await,
        }
    }
}

async fn icmp_ping(client: &PingClient, ip: IpAddr, timeout: Duration) -> PingReply {
    let payload = [0u8; 56];
    let mut pinger = client.pinger(ip, PingIdentifier(rand::random())).await;
    pinger.timeout(timeout);

    match pinger.ping(PingSequence(0), &payload).await {
        Ok((_, rtt)) => PingReply {
            alive: true,
            time: ReportedTime::Millis(rtt.as_secs_f64() * 1000.0),
        },
        Err(_) => PingReply::unreachable(),
    }
}

async fn system_ping(ip: IpAddr, timeout: Duration) -> PingReply {
    let mut cmd = Command::new("ping");
    if cfg!(windows) {
        cmd.args(["-n", "1", "-w", &timeout.as_millis().to_string()]);
    } else {
        cmd.args(["-c", "1", "-W", &timeout.as_secs().max(1).to_string()]);
    }
    cmd.arg(ip.to_string()).kill_on_drop(true);

    match tokio::time::timeout(timeout + SYSTEM_PING_GRACE, cmd.output()).await {
        Ok(Ok(output)) => PingReply {
            alive: output.status.success(),
            time: parse_ping_output(&String::from_utf8_lossy(&output.stdout)),
        },
        Ok(Err(e)) => {
            warn!(error = %e, "Failed to run system ping");
            PingReply::unreachable()
        }
        Err(_) => PingReply::unreachable(),
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
