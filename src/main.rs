use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use std::future::Future;
use std::io;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

mod config;
mod engine;
mod error;
mod history;
mod models;
mod probe;
mod report;
mod utils;

use crate::config::MonitorArgs;
use crate::engine::Monitor;

#[derive(Parser)]
#[command(name = "pulsewatch")]
#[command(about = "Rolling-window uptime monitor for websites and hosts", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe a URL (or ping its host) on an interval and show live uptime stats
    Monitor(MonitorArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    utils::enable_ansi_console();

    // Logs go to stderr so they never land inside the repainted report.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Monitor(args) => monitor(args).await,
    }
}

async fn monitor(args: MonitorArgs) -> Result<()> {
    let config = match args.resolve() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            let mut cmd = Cli::command();
            if let Some(sub) = cmd.find_subcommand_mut("monitor") {
                eprintln!("{}", sub.render_usage());
            }
            return Ok(());
        }
    };

    let mut monitor = Monitor::new(config)?;

    let stop_rx = stop_on(signal::ctrl_c());

    let mut stdout = std::io::stdout();
    monitor.run(&mut stdout, stop_rx).await.context("Monitor loop failed")
}

/// Flips the returned flag once `signal` fires. If the listener cannot be
/// installed the flag never flips and monitoring runs until the process is killed.
fn stop_on<F>(signal: F) -> watch::Receiver<bool>
where
    F: Future<Output = io::Result<()>> + Send + 'static,
{
    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = signal.await {
            error!("Failed to listen for Ctrl+C, monitoring continues: {}", e);
            // Dropping the sender would read as a stop request.
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received. Stopping monitor...");
        let _ = stop_tx.send(true);
    });
    stop_rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn signal_flips_stop_flag() {
        let mut stop = stop_on(async { Ok(()) });
        stop.changed().await.unwrap();
        assert!(*stop.borrow());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_signal_listener_keeps_monitoring() {
        let mut stop = stop_on(async { Err(io::Error::other("signals unsupported")) });

        let waited = tokio::time::timeout(Duration::from_secs(3600), stop.changed()).await;
        assert!(waited.is_err(), "stop flag changed or sender dropped");
        assert!(!*stop.borrow());
    }
}
