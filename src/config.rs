//! Timing configuration for a light's phase cycle.
//!
//! Defaults reproduce the classic behavior: a cycle lasts a uniformly drawn
//! 4 to 6 seconds and the cycler polls every millisecond. Every value can be
//! overridden from the environment with `CycleConfig::from_env`.

use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_MIN_CYCLE_MS: u64 = 4000;
pub const DEFAULT_MAX_CYCLE_MS: u64 = 6000;
pub const DEFAULT_POLL_MS: u64 = 1;

pub const ENV_MIN_CYCLE_MS: &str = "TRAFFIC_LIGHT_MIN_CYCLE_MS";
pub const ENV_MAX_CYCLE_MS: &str = "TRAFFIC_LIGHT_MAX_CYCLE_MS";
pub const ENV_POLL_MS: &str = "TRAFFIC_LIGHT_POLL_MS";
pub const ENV_SEED: &str = "TRAFFIC_LIGHT_SEED";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleConfig {
    /// Shortest cycle, inclusive.
    pub min_cycle: Duration,
    /// Longest cycle, inclusive.
    pub max_cycle: Duration,
    /// Sleep between two polls of the cycler and of `wait_for_green`.
    pub poll_interval: Duration,
    /// Fixed seed for the light's generator. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            min_cycle: Duration::from_millis(DEFAULT_MIN_CYCLE_MS),
            max_cycle: Duration::from_millis(DEFAULT_MAX_CYCLE_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_MS),
            seed: None,
        }
    }
}

impl CycleConfig {
    /// Reads overrides from `TRAFFIC_LIGHT_*` variables.
    ///
    /// Unparseable values are logged and replaced by the default. The result
    /// is validated before it is returned.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            min_cycle: Duration::from_millis(env_or(ENV_MIN_CYCLE_MS, DEFAULT_MIN_CYCLE_MS)),
            max_cycle: Duration::from_millis(env_or(ENV_MAX_CYCLE_MS, DEFAULT_MAX_CYCLE_MS)),
            poll_interval: Duration::from_millis(env_or(ENV_POLL_MS, DEFAULT_POLL_MS)),
            seed: std::env::var(ENV_SEED)
                .ok()
                .and_then(|v| match v.parse() {
                    Ok(seed) => Some(seed),
                    Err(_) => {
                        tracing::warn!(name = ENV_SEED, value = %v, "invalid seed, using entropy");
                        None
                    }
                }),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_cycle_range(mut self, min: Duration, max: Duration) -> Self {
        self.min_cycle = min;
        self.max_cycle = max;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_cycle > self.max_cycle {
            return Err(ConfigError::InvalidRange {
                min_ms: millis(self.min_cycle),
                max_ms: millis(self.max_cycle),
            });
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        Ok(())
    }
}

pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(v) => v.parse().unwrap_or_else(|_| {
            tracing::warn!(name, value = %v, "invalid env var value, using default");
            default
        }),
        Err(_) => default,
    }
}
