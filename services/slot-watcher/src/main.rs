//! slot-watcher
//!
//! Single-binary service that:
//! 1. Polls an appointment-availability API on a jittered cadence
//! 2. Rotates API keys, freezing any key the upstream rate-limits
//! 3. Filters results by location, open count and start date
//! 4. Sends one aggregate SMS per batch of newly matching results

mod client;
mod config;
mod dedupe;
mod filter;
mod notify;
mod poller;
mod schedule;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use keypool::KeyPool;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::client::SlotClient;
use crate::config::Config;
use crate::filter::Criteria;
use crate::notify::TwilioSender;
use crate::poller::{Poller, PollerConfig};
use crate::schedule::ScheduleGate;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("starting slot-watcher");

    // CLI: simple --config flag parsing
    let args: Vec<String> = std::env::args().collect();
    let cli_config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let config_path = Config::resolve_path(cli_config_path);
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    info!(
        endpoint = %config.api.endpoint,
        keys = config.api.keys.len(),
        min_interval_secs = config.poll.min_interval_secs,
        max_interval_secs = config.poll.max_interval_secs,
        quiet_start = config.schedule.quiet_start_hour,
        quiet_end = config.schedule.quiet_end_hour,
        "configuration loaded"
    );

    let client = SlotClient::new(
        &config.api.endpoint,
        Duration::from_secs(config.api.timeout_secs),
    )
    .context("failed to build HTTP client")?;

    let pool = KeyPool::new(config.api.keys.clone());

    let gate = ScheduleGate::new(
        config.schedule.utc_offset_hours,
        config.schedule.quiet_start_hour,
        config.schedule.quiet_end_hour,
    );

    let criteria = Criteria {
        location_contains: config.filter.location_contains.clone(),
        before_date: config.filter.before_date,
    };

    let auth_token = config
        .sms
        .auth_token
        .context("SMS auth token missing after config load")?;
    let sender = Arc::new(TwilioSender::new(
        config.sms.account_sid.clone(),
        auth_token,
        config.sms.from.clone(),
        config.sms.to.clone(),
    ));

    let mut poller = Poller::new(
        client,
        pool,
        gate,
        criteria,
        sender,
        PollerConfig {
            min_interval: Duration::from_secs(config.poll.min_interval_secs),
            max_interval: Duration::from_secs(config.poll.max_interval_secs),
            freeze_duration: Duration::from_secs(config.api.freeze_secs),
            startup_notification: config.poll.startup_notification,
        },
    );

    // The poll loop never returns on its own; a signal is the only way out
    tokio::select! {
        _ = poller.run() => {}
        _ = shutdown_signal() => {}
    }

    info!("shutdown complete");
    Ok(())
}

/// Wait for SIGTERM or SIGINT for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
