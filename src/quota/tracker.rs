//! Daily quota tracking and enforcement.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

use super::config::QuotaConfig;
use crate::backend::Backend;
use crate::clock::Clock;
use crate::error::{GatewayError, GatewayResult};

/// Counters for one backend.
#[derive(Debug, Clone, Copy, Default)]
struct BackendUsage {
    /// Answered requests today
    count: u32,
    /// Reserved slots whose asks are still running
    in_flight: u32,
}

#[derive(Debug)]
struct QuotaState {
    day: NaiveDate,
    usage: BTreeMap<Backend, BackendUsage>,
}

impl QuotaState {
    fn usage_mut(&mut self, backend: Backend) -> &mut BackendUsage {
        self.usage.entry(backend).or_default()
    }

    fn count(&self, backend: Backend) -> u32 {
        self.usage.get(&backend).map(|u| u.count).unwrap_or(0)
    }
}

/// Point-in-time view of all quota counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuotaSnapshot {
    pub date: NaiveDate,
    pub counts: BTreeMap<Backend, u32>,
    pub limits: BTreeMap<Backend, u32>,
    pub remaining: BTreeMap<Backend, u32>,
}

/// Thread-safe per-backend daily quota store.
///
/// The day check runs before every read or write, so counters observed by
/// callers always belong to the current date.
#[derive(Debug)]
pub struct QuotaStore {
    config: QuotaConfig,
    clock: Arc<dyn Clock>,
    inner: Mutex<QuotaState>,
}

impl QuotaStore {
    /// Create a new quota store starting at the clock's current day.
    pub fn new(config: QuotaConfig, clock: Arc<dyn Clock>) -> Self {
        let day = clock.today();
        Self {
            config,
            clock,
            inner: Mutex::new(QuotaState {
                day,
                usage: BTreeMap::new(),
            }),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &QuotaConfig {
        &self.config
    }

    /// Limit for a backend.
    pub fn limit(&self, backend: Backend) -> u32 {
        self.config.limit_for(backend)
    }

    /// Reset every counter if the calendar day changed since the last call.
    pub fn check_and_reset(&self) {
        let _state = self.lock();
    }

    /// Requests left today for a backend.
    ///
    /// Only answered requests are subtracted. Slots held by asks still in
    /// flight are not, so an ask can be refused while this is above zero.
    pub fn remaining(&self, backend: Backend) -> u32 {
        let state = self.lock();
        self.limit(backend).saturating_sub(state.count(backend))
    }

    /// Answered requests today for a backend.
    pub fn count(&self, backend: Backend) -> u32 {
        self.lock().count(backend)
    }

    /// Day the counters currently belong to.
    pub fn day(&self) -> NaiveDate {
        self.lock().day
    }

    /// Count one answered request, failing if the limit is already reached.
    ///
    /// The limit is checked against answered requests plus outstanding
    /// reservations (`count + in_flight >= limit`), so a direct consume cannot
    /// take a slot an in-flight ask already holds. With nothing in flight this
    /// is the plain `count >= limit` check.
    pub fn try_consume(&self, backend: Backend) -> GatewayResult<()> {
        let limit = self.limit(backend);
        let mut state = self.lock();
        let usage = state.usage_mut(backend);
        if usage.count + usage.in_flight >= limit {
            return Err(GatewayError::QuotaExceeded { backend, limit });
        }
        usage.count += 1;
        Ok(())
    }

    /// Reserve a slot for an ask that has not finished yet.
    ///
    /// Reservations count against the limit but not against `remaining`, so
    /// concurrent asks can never push the committed count past the limit.
    pub fn reserve(&self, backend: Backend) -> GatewayResult<QuotaPermit<'_>> {
        let limit = self.limit(backend);
        let mut state = self.lock();
        let usage = state.usage_mut(backend);
        if usage.count + usage.in_flight >= limit {
            debug!(backend = %backend, count = usage.count, in_flight = usage.in_flight, limit, "Quota exhausted");
            return Err(GatewayError::QuotaExceeded { backend, limit });
        }
        usage.in_flight += 1;
        Ok(QuotaPermit {
            store: self,
            backend,
            settled: false,
        })
    }

    /// Current counters for every backend.
    pub fn snapshot(&self) -> QuotaSnapshot {
        let state = self.lock();
        let mut counts = BTreeMap::new();
        let mut limits = BTreeMap::new();
        let mut remaining = BTreeMap::new();
        for backend in Backend::ALL {
            let count = state.count(backend);
            let limit = self.limit(backend);
            counts.insert(backend, count);
            limits.insert(backend, limit);
            remaining.insert(backend, limit.saturating_sub(count));
        }
        QuotaSnapshot {
            date: state.day,
            counts,
            limits,
            remaining,
        }
    }

    fn settle(&self, backend: Backend, answered: bool) {
        let mut state = self.lock();
        let usage = state.usage_mut(backend);
        usage.in_flight = usage.in_flight.saturating_sub(1);
        if answered {
            usage.count += 1;
        }
    }

    /// Lock the state, applying the day-boundary reset first.
    fn lock(&self) -> MutexGuard<'_, QuotaState> {
        let mut state = match self.inner.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        let today = self.clock.today();
        if state.day != today {
            info!(previous = %state.day, today = %today, "New quota day, resetting counters");
            state.day = today;
            for usage in state.usage.values_mut() {
                usage.count = 0;
            }
        }
        state
    }
}

/// A reserved quota slot.
///
/// Call [`QuotaPermit::commit`] once the ask produced an answer. Dropping the
/// permit without committing hands the slot back.
#[derive(Debug)]
pub struct QuotaPermit<'a> {
    store: &'a QuotaStore,
    backend: Backend,
    settled: bool,
}

impl QuotaPermit<'_> {
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Turn the reservation into a counted request.
    pub fn commit(mut self) {
        self.settled = true;
        self.store.settle(self.backend, true);
    }
}

impl Drop for QuotaPermit<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.store.settle(self.backend, false);
        }
    }
}
