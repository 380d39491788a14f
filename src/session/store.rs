//! Cached session credentials with TTL-based refresh.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::extract::extract_gemini_tokens;
use super::{Session, SessionCredentials};
use crate::backend::{Backend, SessionPolicy};
use crate::clock::Clock;
use crate::error::{GatewayError, GatewayResult};
use crate::request::RequestBuilder;
use crate::transport::Transport;

/// Owns the credential cache for every bootstrapped backend.
///
/// Each backend has its own lock, held across a bootstrap call, so two
/// requests that both find a stale session trigger a single refresh.
pub struct SessionStore {
    transport: Arc<dyn Transport>,
    builder: RequestBuilder,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    bootstrap_timeout: Duration,
    slots: BTreeMap<Backend, Mutex<Option<SessionCredentials>>>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("ttl", &self.ttl)
            .field("bootstrap_timeout", &self.bootstrap_timeout)
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    pub fn new(
        transport: Arc<dyn Transport>,
        builder: RequestBuilder,
        clock: Arc<dyn Clock>,
        ttl: Duration,
        bootstrap_timeout: Duration,
    ) -> Self {
        let slots = Backend::ALL
            .into_iter()
            .filter(|backend| backend.session_policy() == SessionPolicy::Bootstrap)
            .map(|backend| (backend, Mutex::new(None)))
            .collect();
        Self {
            transport,
            builder,
            clock,
            ttl,
            bootstrap_timeout,
            slots,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return usable credentials for `backend`, bootstrapping if needed.
    ///
    /// Per-call backends always succeed without touching the network.
    pub async fn ensure_session(&self, backend: Backend) -> GatewayResult<Session> {
        let Some(slot) = self.slots.get(&backend) else {
            return Ok(Session::PerCall);
        };

        let mut cached = slot.lock().await;
        let now = self.clock.now();
        if let Some(credentials) = cached.as_ref() {
            if credentials.is_valid(now, self.ttl) {
                debug!(backend = %backend, age_secs = credentials.age(now).as_secs(), "Reusing cached session");
                return Ok(Session::Established(credentials.clone()));
            }
            debug!(backend = %backend, age_secs = credentials.age(now).as_secs(), "Cached session expired");
        }

        let credentials = self.bootstrap(backend).await?;
        *cached = Some(credentials.clone());
        Ok(Session::Established(credentials))
    }

    /// Drop cached credentials so the next ask bootstraps again.
    pub async fn invalidate(&self, backend: Backend) {
        if let Some(slot) = self.slots.get(&backend) {
            if slot.lock().await.take().is_some() {
                info!(backend = %backend, "Session invalidated");
            }
        }
    }

    /// Currently cached credentials, valid or not.
    pub async fn cached(&self, backend: Backend) -> Option<SessionCredentials> {
        match self.slots.get(&backend) {
            Some(slot) => slot.lock().await.clone(),
            None => None,
        }
    }

    /// Age of the cached credentials, if any.
    pub async fn session_age(&self, backend: Backend) -> Option<Duration> {
        let now = self.clock.now();
        self.cached(backend).await.map(|c| c.age(now))
    }

    async fn bootstrap(&self, backend: Backend) -> GatewayResult<SessionCredentials> {
        let frame = self.builder.bootstrap_frame(backend).ok_or_else(|| {
            GatewayError::session_init(backend, "backend has no bootstrap endpoint")
        })?;

        info!(backend = %backend, url = %frame.url, "Bootstrapping session");
        let response = self
            .transport
            .send(frame, self.bootstrap_timeout)
            .await
            .map_err(|e| {
                warn!(backend = %backend, error = %e, "Session bootstrap request failed");
                GatewayError::session_init(backend, format!("bootstrap request failed: {}", e))
            })?;

        let (build_label, session_id) = extract_gemini_tokens(&response.body).map_err(|reason| {
            warn!(backend = %backend, status = response.status, reason = %reason, "Session token extraction failed");
            GatewayError::session_init(backend, format!("{} (HTTP {})", reason, response.status))
        })?;

        let credentials = SessionCredentials::new(build_label, session_id, self.clock.now());
        info!(backend = %backend, build_label = %credentials.build_label(), "Session established");
        Ok(credentials)
    }
}
