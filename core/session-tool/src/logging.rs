//! File logging for the CLI.
//!
//! Logs go to `~/.search-session/logs/search-session.log.<date>` so stdout
//! stays clean for command output. `SEARCH_SESSION_DEBUG_LOG=1` forces debug
//! level; otherwise `RUST_LOG` applies, defaulting to `info`.

use std::env;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const DEBUG_ENV: &str = "SEARCH_SESSION_DEBUG_LOG";
const LOG_DIR_RELATIVE_PATH: &str = ".search-session/logs";
const LOG_FILE_PREFIX: &str = "search-session.log";

pub fn init() -> Option<WorkerGuard> {
    let filter = if debug_enabled() {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let Some(log_dir) = dirs::home_dir().map(|home| home.join(LOG_DIR_RELATIVE_PATH)) else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        return None;
    };

    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Some(guard)
}

fn debug_enabled() -> bool {
    env::var(DEBUG_ENV)
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false)
}
