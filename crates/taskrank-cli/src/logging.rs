//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the filter:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `TASKRANK_LOG` environment variable (any `EnvFilter` directive)
//! 3. `logging.level` from the config file
//! 4. `info`
//!
//! Output goes to stderr; stdout is reserved for command results.

use tracing_subscriber::EnvFilter;

use crate::LogLevel;

pub const LOG_ENV_VAR: &str = "TASKRANK_LOG";

/// Initialise the global subscriber. Call once at startup.
pub fn init_logging(
    cli_level: Option<LogLevel>,
    configured: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let directive = resolve_directive(cli_level, std::env::var(LOG_ENV_VAR).ok(), configured);
    let filter = EnvFilter::try_new(&directive)
        .map_err(|e| format!("invalid log filter {directive:?}: {e}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
}

fn resolve_directive(cli_level: Option<LogLevel>, env: Option<String>, configured: &str) -> String {
    if let Some(level) = cli_level {
        return level_name(level).to_string();
    }
    env.map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| Some(configured.trim().to_string()).filter(|s| !s.is_empty()))
        .unwrap_or_else(|| "info".to_string())
}

fn level_name(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}
