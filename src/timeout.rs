//! Upstream call timeouts.
//!
//! Every outbound call carries a fixed upper bound; when it lapses the call
//! fails like any other transport error. Bootstrap pages are small and should
//! answer quickly, while answer generation can legitimately take a while.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for outbound call timeouts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Maximum time for a session bootstrap fetch.
    /// Default: 15 seconds
    #[serde(with = "secs")]
    pub bootstrap_timeout: Duration,

    /// Maximum time for a backend query, including reading the full body.
    /// Default: 60 seconds
    #[serde(with = "secs")]
    pub query_timeout: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            bootstrap_timeout: Duration::from_secs(15),
            query_timeout: Duration::from_secs(60),
        }
    }
}

impl TimeoutConfig {
    /// Creates a new TimeoutConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the bootstrap timeout.
    pub fn with_bootstrap_timeout(mut self, timeout: Duration) -> Self {
        self.bootstrap_timeout = timeout;
        self
    }

    /// Sets the query timeout.
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }
}

/// Whole-second (de)serialization for durations in config files.
pub(crate) mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
