//! Quota limit configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::backend::Backend;

/// Requests per backend per day when nothing else is configured.
pub const DEFAULT_DAILY_LIMIT: u32 = 100;

/// Configuration for daily per-backend request limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaConfig {
    /// Limit applied to every backend without an override
    pub daily_limit: u32,

    /// Per-backend limits that replace `daily_limit`
    pub overrides: BTreeMap<Backend, u32>,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            daily_limit: DEFAULT_DAILY_LIMIT,
            overrides: BTreeMap::new(),
        }
    }
}

impl QuotaConfig {
    /// Create a new quota config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the limit shared by all backends.
    pub fn with_daily_limit(mut self, limit: u32) -> Self {
        self.daily_limit = limit;
        self
    }

    /// Set a limit for one backend only.
    pub fn with_backend_limit(mut self, backend: Backend, limit: u32) -> Self {
        self.overrides.insert(backend, limit);
        self
    }

    /// Effective limit for a backend.
    pub fn limit_for(&self, backend: Backend) -> u32 {
        self.overrides
            .get(&backend)
            .copied()
            .unwrap_or(self.daily_limit)
    }
}
