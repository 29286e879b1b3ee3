// File: testing-framework/src/config.rs
//
// Retry budget for convergence waits.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable overriding `WaitConfig::max_retries`
pub const MAX_RETRIES_ENV: &str = "LEDGER_TEST_MAX_RETRIES";

/// Environment variable overriding `WaitConfig::retry_interval` (milliseconds)
pub const RETRY_INTERVAL_ENV: &str = "LEDGER_TEST_RETRY_INTERVAL_MS";

const DEFAULT_MAX_RETRIES: u32 = 10;
const DEFAULT_RETRY_INTERVAL_MS: u64 = 1000;

/// How many times to observe the block count, and how long to sleep between
/// observations
///
/// YAML form:
///
/// ```yaml
/// wait:
///   max_retries: 4
///   retry_interval_ms: 250
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitConfig {
    /// Observations made before giving up (must be >= 1)
    pub max_retries: u32,

    /// Pause between two observations
    #[serde(rename = "retry_interval_ms", with = "duration_millis")]
    pub retry_interval: Duration,
}

impl WaitConfig {
    /// Create a config from explicit values
    pub fn new(max_retries: u32, retry_interval: Duration) -> Self {
        Self {
            max_retries,
            retry_interval,
        }
    }

    /// Defaults, overridden by `LEDGER_TEST_MAX_RETRIES` and
    /// `LEDGER_TEST_RETRY_INTERVAL_MS` when set
    ///
    /// Unparsable values are ignored with a warning.
    pub fn from_env_or_default() -> Self {
        let mut config = Self::default();

        if let Some(retries) = read_env(MAX_RETRIES_ENV) {
            config.max_retries = retries;
        }
        if let Some(millis) = read_env(RETRY_INTERVAL_ENV) {
            config.retry_interval = Duration::from_millis(millis);
        }

        config
    }

    /// Set the retry budget
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the pause between observations
    pub fn with_retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }

    /// Upper bound on the time a wait can sleep before timing out
    pub fn max_wait(&self) -> Duration {
        self.retry_interval
            .saturating_mul(self.max_retries.saturating_sub(1))
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_interval: Duration::from_millis(DEFAULT_RETRY_INTERVAL_MS),
        }
    }
}

fn read_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring {}={:?}: not a valid number", name, raw);
            None
        }
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
