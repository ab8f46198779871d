//! Logger initialization.

use std::io::Write;

use colored::*;
use log::{Level, LevelFilter};

use crate::config::LogFormat;
use crate::error_handling::InitializationError;

/// Renders one log line as a JSON object with `ts`, `level`, `target` and
/// `msg` keys.
fn json_line(level: Level, target: &str, message: &str) -> String {
    serde_json::json!({
        "ts": chrono::Utc::now().timestamp_millis(),
        "level": level.as_str(),
        "target": target,
        "msg": message,
    })
    .to_string()
}

fn level_marker(level: Level) -> (ColoredString, &'static str) {
    match level {
        Level::Error => ("ERROR".red().bold(), "❌"),
        Level::Warn => ("WARN".yellow(), "⚠️"),
        Level::Info => ("INFO".green(), "📡"),
        Level::Debug => ("DEBUG".blue(), "🔍"),
        Level::Trace => ("TRACE".purple(), "🔬"),
    }
}

/// Initializes `env_logger` with the given level and output format.
///
/// `RUST_LOG` is read first so per-module directives still work; `level`
/// then overrides the global and crate levels. HTTP internals are held at
/// `info` so a debug run shows collector activity rather than connection
/// churn.
///
/// ```bash
/// RUST_LOG=threat_harvest=debug,reqwest=debug threat_harvest --log-format json
/// ```
///
/// # Errors
///
/// Returns [`InitializationError::LoggerError`] if a logger is already set.
pub fn init_logger_with(level: LevelFilter, format: LogFormat) -> Result<(), InitializationError> {
    colored::control::set_override(matches!(format, LogFormat::Plain));

    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(level);
    builder.filter_module("reqwest", LevelFilter::Info);
    builder.filter_module("hyper", LevelFilter::Info);
    builder.filter_module("hyper_util", LevelFilter::Info);
    builder.filter_module("threat_harvest", level);

    match format {
        LogFormat::Json => {
            builder.format(|buf, record| {
                writeln!(
                    buf,
                    "{}",
                    json_line(record.level(), record.target(), &record.args().to_string())
                )
            });
        }
        LogFormat::Plain => {
            builder.format(|buf, record| {
                let (label, emoji) = level_marker(record.level());
                writeln!(
                    buf,
                    "{} {} {} [{}] {}",
                    chrono::Local::now().format("%H:%M:%S%.3f").to_string().dimmed(),
                    emoji,
                    record.target().cyan(),
                    label,
                    record.args()
                )
            });
        }
    }

    builder.try_init().map_err(InitializationError::from)
}
