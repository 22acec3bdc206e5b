// File logging; stdout belongs to the terminal UI

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the configured log filter
pub const LOG_ENV: &str = "SOURCECHAT_LOG";

pub fn init(log_path: &Path, default_level: &str) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter(default_level))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialise logging: {e}"))?;

    Ok(())
}

fn filter(default_level: &str) -> EnvFilter {
    build_filter(std::env::var(LOG_ENV).ok().as_deref(), default_level)
}

/// Env directives win when they parse; a bad configured level falls back to `info`
fn build_filter(env_directives: Option<&str>, default_level: &str) -> EnvFilter {
    env_directives
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::try_new(default_level).unwrap_or_else(|_| EnvFilter::new("info")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_uses_configured_level() {
        assert_eq!(build_filter(None, "debug").to_string(), "debug");
    }

    #[test]
    fn test_env_directives_override_configured_level() {
        assert_eq!(build_filter(Some("trace"), "debug").to_string(), "trace");
    }

    #[test]
    fn test_invalid_level_falls_back_to_info() {
        assert_eq!(build_filter(None, "not a level[").to_string(), "info");
        assert_eq!(build_filter(Some("not a level["), "warn").to_string(), "warn");
    }
}
