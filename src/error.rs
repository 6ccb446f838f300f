use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::light::LightId;

/// Errors from the light lifecycle and blocking waits.
#[derive(Debug, Error)]
pub enum LightError {
    /// `simulate` was called while the cycler is still running.
    #[error("light {id} is already running")]
    AlreadyRunning { id: LightId },

    /// A bounded wait for green ran out.
    #[error("light {id} did not turn green within {waited:?}")]
    Timeout { id: LightId, waited: Duration },

    /// The cycler thread panicked before it could be joined.
    #[error("cycler thread for light {id} panicked")]
    CyclerPanicked { id: LightId },

    #[error("failed to spawn cycler thread for light {id}")]
    Spawn {
        id: LightId,
        #[source]
        source: io::Error,
    },

    #[error("no light registered with id {id}")]
    UnknownLight { id: LightId },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid cycle range: min {min_ms}ms is greater than max {max_ms}ms")]
    InvalidRange { min_ms: u64, max_ms: u64 },

    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,
}
