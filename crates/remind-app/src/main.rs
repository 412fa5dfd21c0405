//! RemindMe application binary - composition root.
//!
//! Ties the crates together into a single executable:
//! 1. Load configuration from TOML
//! 2. Build the GitHub client and the cycle lock
//! 3. Run poll cycles forever (or once with --once)

mod cli;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::Notify;

use remind_core::RemindConfig;
use remind_engine::{CycleLock, CycleRunner, ProcessLock};
use remind_github::{GithubClient, ReminderApi};

use cli::CliArgs;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config is loaded before tracing so the log level can come from it.
    let config_file = args.resolve_config_path();
    let config = RemindConfig::load_or_default(&config_file);

    let level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .init();

    tracing::info!("Starting RemindMe v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "Invalid configuration");
        return Err(e.into());
    }

    let api: Arc<dyn ReminderApi> = Arc::new(GithubClient::new(
        &config.github,
        Duration::from_secs(config.poll.request_timeout_secs),
    )?);
    let lock: Arc<dyn CycleLock> = Arc::new(ProcessLock::new(Duration::from_secs(
        config.lock.timeout_secs,
    )));

    let runner = CycleRunner::new(&config, api, lock);

    if args.once {
        let report = runner.run_cycle().await?;
        tracing::info!(
            mentions = report.mentions,
            comments = report.comments_seen,
            responded = report.responded,
            dispatched = report.dispatched,
            failures = report.dispatch_failures,
            "Single cycle complete"
        );
        return Ok(());
    }

    let shutdown = Arc::new(Notify::new());
    let signal_target = Arc::clone(&shutdown);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            signal_target.notify_one();
        }
    });

    tracing::info!(
        handle = %config.github.handle,
        interval_secs = config.poll.interval_secs,
        "Polling for mentions"
    );
    runner.run(&shutdown).await;

    tracing::info!("Shut down cleanly");
    Ok(())
}
