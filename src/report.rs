use chrono::Local;
use std::fmt::Write as _;
use std::io;

use crate::config::MonitorConfig;
use crate::error::RenderError;
use crate::history::TargetHistory;
use crate::models::{Aggregate, MonitoringResult, STATUS_NO_RESPONSE};

/// Clear the screen and move the cursor home.
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

const RULE_WIDTH: usize = 56;

/// Everything one repaint needs.
pub struct ReportView<'a> {
    pub config: &'a MonitorConfig,
    pub history: &'a TargetHistory,
    pub aggregate: Aggregate,
    pub tick: u64,
}

pub fn render(view: &ReportView<'_>) -> Result<String, RenderError> {
    let latest = view
        .history
        .latest()
        .ok_or_else(|| RenderError::EmptyHistory(view.history.target().to_string()))?;

    let mut out = String::new();
    writeln!(out, "Uptime Monitor - {}", view.config.target)?;
    writeln!(
        out,
        "Mode: {} | Interval: {}s | Timeout: {}s | Check #{}",
        view.config.target.mode(),
        view.config.interval.as_secs(),
        view.config.timeout.as_secs(),
        view.tick
    )?;
    writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;

    writeln!(out, "Status: {}", up_label(latest))?;
    writeln!(out, "Status Code: {}", status_label(latest.status()))?;
    writeln!(out, "Response Time: {:.0}ms", latest.response_time_ms())?;
    writeln!(out, "Last Checked: {}", clock(latest))?;
    if let Some(reason) = latest.message() {
        writeln!(out, "Error: {}", reason)?;
    }

    writeln!(out)?;
    writeln!(
        out,
        "Availability: {:.1}% (last {} checks)",
        view.aggregate.availability, view.aggregate.samples
    )?;
    writeln!(out, "Average Response Time: {:.0}ms", view.aggregate.avg_response_time_ms)?;

    writeln!(out)?;
    writeln!(out, "Recent Checks (newest first):")?;
    for result in view.history.newest_first() {
        writeln!(
            out,
            "  {}  {:<4}  {:>11}  {:>6.0}ms",
            clock(result),
            up_label(result),
            status_label(result.status()),
            result.response_time_ms()
        )?;
    }

    writeln!(out)?;
    writeln!(out, "Press Ctrl+C to stop monitoring.")?;
    Ok(out)
}

/// Repaints the whole screen with `report`.
pub fn paint<W: io::Write>(out: &mut W, report: &str) -> Result<(), RenderError> {
    out.write_all(CLEAR_SCREEN.as_bytes())?;
    out.write_all(report.as_bytes())?;
    out.flush()?;
    Ok(())
}

fn up_label(result: &MonitoringResult) -> &'static str {
    if result.is_up() { "UP" } else { "DOWN" }
}

fn status_label(status: u16) -> String {
    if status == STATUS_NO_RESPONSE {
        "no response".to_string()
    } else {
        status.to_string()
    }
}

fn clock(result: &MonitoringResult) -> String {
    result.timestamp().with_timezone(&Local).format("%H:%M:%S").to_string()
}
