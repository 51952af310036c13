//! Diagnostic logging setup
//!
//! Logs go to stderr so they never mix with listings on stdout. `RUST_LOG`
//! takes precedence over the configured level and the `-v` count.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Level after applying `verbosity` extra `-v` flags to `base`
#[must_use]
pub fn effective_level(base: &str, verbosity: u8) -> String {
    const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

    let start = LEVELS
        .iter()
        .position(|level| level.eq_ignore_ascii_case(base.trim()));
    match (start, verbosity) {
        (_, 0) => base.to_string(),
        (Some(i), v) => LEVELS[(i + usize::from(v)).min(LEVELS.len() - 1)].to_string(),
        (None, 1) => "info".to_string(),
        (None, 2) => "debug".to_string(),
        (None, _) => "trace".to_string(),
    }
}

/// Install the global subscriber
///
/// Calling this more than once keeps the first subscriber.
pub fn init(level: &str, verbosity: u8) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(effective_level(level, verbosity)));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_level() {
        assert_eq!(effective_level("warn", 0), "warn");
        assert_eq!(effective_level("warn", 1), "info");
        assert_eq!(effective_level("warn", 2), "debug");
        assert_eq!(effective_level("WARN", 9), "trace");
        assert_eq!(effective_level("trpc=debug", 0), "trpc=debug");
        assert_eq!(effective_level("trpc=debug", 1), "info");
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init("warn", 0);
        init("debug", 2);
    }
}
