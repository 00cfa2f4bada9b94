//! CLI configuration.
//!
//! Defaults come from environment variables; command-line flags override
//! them.

use std::time::Duration;

use hubbridge_sdk::DEFAULT_REDIRECT_TIMEOUT;

/// Environment variable holding the redirect timeout in seconds.
pub const REDIRECT_TIMEOUT_ENV: &str = "HUBBRIDGE_REDIRECT_TIMEOUT_SECS";

/// How the result is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// The bare connection string.
    Plain,
    /// A JSON object with the string and its parts.
    Json,
}

/// Settings for one run.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// How long to wait for the registry's redirect.
    pub redirect_timeout: Duration,
    /// Output format.
    pub output: OutputFormat,
}

impl CliConfig {
    /// Build the configuration from environment variables.
    ///
    /// | Variable                          | Default | Description                    |
    /// |-----------------------------------|---------|--------------------------------|
    /// | `HUBBRIDGE_REDIRECT_TIMEOUT_SECS` | `10`    | Seconds to wait for a redirect |
    pub fn from_env() -> Self {
        Self {
            redirect_timeout: parse_timeout(std::env::var(REDIRECT_TIMEOUT_ENV).ok().as_deref()),
            output: OutputFormat::Plain,
        }
    }

    /// Apply command-line overrides.
    #[must_use]
    pub fn with_overrides(mut self, timeout_secs: Option<u64>, json: bool) -> Self {
        if let Some(secs) = timeout_secs.filter(|s| *s > 0) {
            self.redirect_timeout = Duration::from_secs(secs);
        }
        if json {
            self.output = OutputFormat::Json;
        }
        self
    }
}

/// Parse a timeout in whole seconds; unset, zero or unparsable values
/// fall back to the SDK default.
fn parse_timeout(raw: Option<&str>) -> Duration {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map_or(DEFAULT_REDIRECT_TIMEOUT, Duration::from_secs)
}
