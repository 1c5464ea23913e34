//! Logging initialization.
//!
//! Structured logging with tracing; pretty output for terminals, JSON for
//! log collectors. `RUST_LOG` overrides the level given on the command line.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter from `RUST_LOG`, falling back to `log_level`.
fn build_filter(log_level: &str) -> anyhow::Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new(log_level)?),
    }
}

/// Initialize logging. Logs go to stderr so command output stays pipeable.
pub fn init_telemetry(log_level: &str, json_format: bool) -> anyhow::Result<()> {
    let filter = build_filter(log_level)?;

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .try_init()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_accepts_directives() {
        assert!(EnvFilter::try_new("agora_governance=debug,warn").is_ok());
    }

    #[test]
    fn test_init_telemetry_installs_once() {
        // Nothing else in this test binary installs a global subscriber.
        assert!(init_telemetry("info", false).is_ok());
        assert!(init_telemetry("info", true).is_err());
    }
}
