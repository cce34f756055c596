//! Resto Admin - restaurant management dashboard client.
//!
//! The library holds the typed REST client, the explicit session context,
//! the page state for every dashboard screen, invoice rendering and the live
//! order channel. The `resto-admin` binary drives it through [`run`], whose
//! subcommands stand in for the dashboard pages.

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod api;
pub mod auth;
pub mod cli;
mod commands;
pub mod config;
pub mod diagnostics;
pub mod employees;
pub mod error;
pub mod invoice;
pub mod kitchen;
pub mod live;
pub mod menu;
pub mod models;
pub mod orders;
pub mod pagination;
pub mod pdf;
pub mod reports;
pub mod reservations;
pub mod routes;
pub mod storage;
pub mod tables;
pub mod waiter;

pub use config::AppConfig;
pub use error::{DashboardError, DashboardResult};

/// Install console and rolling-file logging. Old files are pruned first.
pub fn init_logging(cfg: &AppConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,resto_admin_lib=debug"));

    let log_dir = diagnostics::log_dir(cfg);
    diagnostics::prune_old_logs(&log_dir, diagnostics::MAX_LOG_FILES);
    let dir_ok = std::fs::create_dir_all(&log_dir).is_ok();

    // Console goes to stderr so command output on stdout stays parseable.
    let console_layer = fmt::layer().with_target(true).with_writer(std::io::stderr);

    if dir_ok {
        let file_appender =
            tracing_appender::rolling::daily(&log_dir, diagnostics::LOG_FILE_PREFIX);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        let file_layer = fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true);
        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .try_init();
        // Dropping the guard flushes and stops the writer; it must outlive
        // the process.
        std::mem::forget(guard);
    } else {
        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .try_init();
        warn!(dir = %log_dir.display(), "log directory unavailable, logging to console only");
    }
}

/// Binary entry point: parse arguments, configure, log, dispatch.
pub fn run() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let cfg = cli.apply_overrides(AppConfig::from_env()?)?;
    init_logging(&cfg);
    info!(
        version = env!("CARGO_PKG_VERSION"),
        api_base = %cfg.api_base,
        "Starting Resto Admin"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(commands::dispatch(cli.command, cfg))
}
