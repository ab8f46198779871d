//! Main application entry point (CLI binary).
//!
//! A thin wrapper around the `threat_harvest` library that handles:
//! - Environment variable loading (.env file)
//! - Command-line argument parsing
//! - Logger initialization
//! - Ctrl-C handling
//!
//! Batches are written to stdout as JSON lines; logs go to stderr.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use threat_harvest::initialization::init_logger_with;
use threat_harvest::{run_collector, Config};

fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }
    // Fall back to a .env next to the executable
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let env_path = exe_dir.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
            }
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();

    let config = Config::parse();

    let log_level = config.log_level.clone();
    let log_format = config.log_format.clone();
    init_logger_with(log_level.into(), log_format).context("Failed to initialize logger")?;

    match run_collector(config, std::io::stdout(), shutdown_signal()).await {
        Ok(report) => {
            eprintln!(
                "✅ Emitted {} threat group{}, {} malicious IP{} and {} news snapshot{} in {:.1}s ({} collection events)",
                report.threat_groups,
                if report.threat_groups == 1 { "" } else { "s" },
                report.ip_records,
                if report.ip_records == 1 { "" } else { "s" },
                report.news_snapshots,
                if report.news_snapshots == 1 { "" } else { "s" },
                report.elapsed_seconds,
                report.events
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("threat_harvest error: {:#}", e);
            process::exit(1);
        }
    }
}
