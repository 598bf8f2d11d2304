//! rbdo-sync - Rekordbox "date added" reorder tool
//!
//! Rewrites `created_at` for tracks under a Rekordbox folder so that sorting
//! by "date added" follows SoundCloud likes order. Dry run unless `--apply`.

use anyhow::Context;
use clap::Parser;
use rbdo_sync::{exit_code, Args, SyncConfig};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match SyncConfig::from_args(args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(exit_code::INVALID_CONFIG);
        }
    };

    if let Err(e) = init_tracing(&config.log_level) {
        eprintln!("{:#}", e);
        std::process::exit(exit_code::RUNTIME_FAILURE);
    }

    info!(
        "Starting rbdo-sync v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let source = config.likes_source();
    match rbdo_sync::run(&config, source.as_ref()).await {
        Ok(report) => {
            println!("Done.");
            for line in report.to_lines() {
                println!("{}", line);
            }
        }
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(e.exit_code());
        }
    }
}

/// Log to stderr; RUST_LOG wins over the configured level
fn init_tracing(level: &str) -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("rbdo_sync={0},rbdo_common={0}", level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .context("Failed to initialize logging")
}
