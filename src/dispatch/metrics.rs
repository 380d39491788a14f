//! Per-backend dispatch outcome counters.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;

use crate::backend::Backend;
use crate::error::FailureKind;

/// Outcome counters for one backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BackendOutcomes {
    /// Asks that returned an answer
    pub successes: u64,
    /// Failed asks keyed by failure label
    pub failures: BTreeMap<&'static str, u64>,
    /// Duration of the most recent answered ask, in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_success_ms: Option<u64>,
}

impl BackendOutcomes {
    pub fn failure_count(&self, kind: FailureKind) -> u64 {
        self.failures.get(kind.label()).copied().unwrap_or(0)
    }

    pub fn total_failures(&self) -> u64 {
        self.failures.values().sum()
    }
}

/// Thread-safe dispatch metrics collector.
#[derive(Debug, Clone, Default)]
pub struct DispatchMetrics {
    inner: Arc<Mutex<BTreeMap<Backend, BackendOutcomes>>>,
}

impl DispatchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an answered ask.
    pub fn record_success(&self, backend: Backend, duration: Duration) {
        if let Ok(mut state) = self.inner.lock() {
            let entry = state.entry(backend).or_default();
            entry.successes += 1;
            entry.last_success_ms = Some(duration.as_millis() as u64);
        }
    }

    /// Record a failed ask.
    pub fn record_failure(&self, backend: Backend, kind: FailureKind) {
        if let Ok(mut state) = self.inner.lock() {
            *state
                .entry(backend)
                .or_default()
                .failures
                .entry(kind.label())
                .or_insert(0) += 1;
        }
    }

    /// Counters for every backend, including ones with no traffic yet.
    pub fn snapshot(&self) -> BTreeMap<Backend, BackendOutcomes> {
        let state = self.inner.lock().map(|s| s.clone()).unwrap_or_default();
        Backend::ALL
            .into_iter()
            .map(|backend| (backend, state.get(&backend).cloned().unwrap_or_default()))
            .collect()
    }
}
