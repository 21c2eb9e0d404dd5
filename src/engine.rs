use anyhow::{Context, Result};
use std::collections::HashMap;
use std::io::Write;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::MonitorConfig;
use crate::error::RenderError;
use crate::history::TargetHistory;
use crate::models::{Aggregate, MonitoringResult};
use crate::probe::{NetProber, Prober};
use crate::report::{self, ReportView};

/// Probes one target on a fixed interval and repaints a rolling report.
///
/// Histories are owned here and live as long as the monitor does.
pub struct Monitor<P = NetProber> {
    config: MonitorConfig,
    prober: P,
    histories: HashMap<String, TargetHistory>,
}

impl Monitor<NetProber> {
    pub fn new(config: MonitorConfig) -> Result<Self> {
        let prober = NetProber::new().context("Failed to initialise network prober")?;
        Ok(Self::with_prober(config, prober))
    }
}

impl<P: Prober> Monitor<P> {
    pub fn with_prober(config: MonitorConfig, prober: P) -> Self {
        Self {
            config,
            prober,
            histories: HashMap::new(),
        }
    }

    pub fn history(&self, target: &str) -> Option<&TargetHistory> {
        self.histories.get(target)
    }

    pub async fn probe_once(&self) -> MonitoringResult {
        self.prober.probe(&self.config.target, self.config.timeout).await
    }

    pub fn record_and_aggregate(&mut self, target: &str, result: MonitoringResult) -> Aggregate {
        let history = self
            .histories
            .entry(target.to_string())
            .or_insert_with(|| TargetHistory::new(target));
        history.record(result);
        history.aggregate()
    }

    /// Ticks immediately, then once per interval until `shutdown` flips or
    /// its sender is dropped.
    ///
    /// Cancellation is only observed between ticks; a probe in flight is
    /// allowed to finish or hit its own timeout.
    pub async fn run<W: Write>(
        &mut self,
        out: &mut W,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        info!(
            endpoint = %self.config.target,
            mode = %self.config.target.mode(),
            interval_s = self.config.interval.as_secs(),
            timeout_s = self.config.timeout.as_secs(),
            "Starting uptime monitor"
        );

        let mut ticks: u64 = 0;
        while !*shutdown.borrow() {
            ticks += 1;
            self.tick(out, ticks).await;

            // Armed only once the tick has fully rendered.
            tokio::select! {
                _ = tokio::time::sleep(self.config.interval) => {}
                _ = shutdown.changed() => break,
            }
        }

        writeln!(out, "\nMonitoring stopped.").context("Failed to write stop message")?;
        out.flush().context("Failed to flush output")?;
        info!(checks = ticks, "Uptime monitor stopped");
        Ok(())
    }

    async fn tick<W: Write>(&mut self, out: &mut W, tick: u64) {
        let result = self.probe_once().await;
        debug!(
            status = result.status(),
            up = result.is_up(),
            response_ms = result.response_time_ms(),
            "Probe finished"
        );

        let key = self.config.target.to_string();
        let aggregate = self.record_and_aggregate(&key, result);

        if let Err(e) = self.render(out, &key, aggregate, tick) {
            warn!(error = %e, tick, "Report render failed");
            let _ = writeln!(out, "Report error: {}", e);
            let _ = out.flush();
        }
    }

    fn render<W: Write>(
        &self,
        out: &mut W,
        key: &str,
        aggregate: Aggregate,
        tick: u64,
    ) -> Result<(), RenderError> {
        let history = self
            .histories
            .get(key)
            .ok_or_else(|| RenderError::EmptyHistory(key.to_string()))?;
        let text = report::render(&ReportView {
            config: &self.config,
            history,
            aggregate,
            tick,
        })?;
        report::paint(out, &text)
    }
}
