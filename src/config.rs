//! Render pass configuration

use std::time::Duration;

/// Environment variable holding the per-helper wait bound in milliseconds
pub const TIMEOUT_ENV: &str = "HBS_ASYNC_TIMEOUT_MS";

/// Settings for the resolution phase of a render pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderConfig {
    /// Upper bound on how long each deferred helper may take. `None` waits
    /// indefinitely.
    pub timeout: Option<Duration>,
}

impl RenderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Read settings from the environment.
    ///
    /// A missing, empty, zero or unparsable `HBS_ASYNC_TIMEOUT_MS` means no
    /// timeout.
    pub fn from_env() -> Self {
        Self {
            timeout: parse_timeout_ms(std::env::var(TIMEOUT_ENV).ok().as_deref()),
        }
    }
}

fn parse_timeout_ms(raw: Option<&str>) -> Option<Duration> {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
}
