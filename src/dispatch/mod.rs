//! Ask pipeline orchestration.
//!
//! One ask walks `QuotaCheck → SessionEnsure → BuildRequest → NetworkCall →
//! Decode → QuotaCommit`. Any stage may end the ask with a classified
//! [`GatewayError`]; the quota is only charged once an answer was decoded.

mod metrics;

pub use metrics::{BackendOutcomes, DispatchMetrics};

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::clock::Clock;
use crate::config::GatewayConfig;
use crate::decode::decode;
use crate::error::{GatewayError, GatewayResult};
use crate::quota::QuotaStore;
use crate::request::RequestBuilder;
use crate::session::SessionStore;
use crate::timeout::TimeoutConfig;
use crate::transport::Transport;

/// Longest body excerpt copied into error messages and logs.
const BODY_EXCERPT_CHARS: usize = 200;

/// A decoded, non-empty answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerResult {
    pub text: String,
    pub backend: Backend,
}

/// Pipeline stage, reported with every failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStage {
    QuotaCheck,
    SessionEnsure,
    BuildRequest,
    NetworkCall,
    Decode,
    QuotaCommit,
}

impl DispatchStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchStage::QuotaCheck => "quota_check",
            DispatchStage::SessionEnsure => "session_ensure",
            DispatchStage::BuildRequest => "build_request",
            DispatchStage::NetworkCall => "network_call",
            DispatchStage::Decode => "decode",
            DispatchStage::QuotaCommit => "quota_commit",
        }
    }
}

impl fmt::Display for DispatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runs asks against backends, sharing quota and session state between them.
pub struct Dispatcher {
    quota: Arc<QuotaStore>,
    sessions: Arc<SessionStore>,
    builder: RequestBuilder,
    transport: Arc<dyn Transport>,
    timeouts: TimeoutConfig,
    metrics: DispatchMetrics,
}

impl Dispatcher {
    pub fn new(
        quota: Arc<QuotaStore>,
        sessions: Arc<SessionStore>,
        builder: RequestBuilder,
        transport: Arc<dyn Transport>,
        timeouts: TimeoutConfig,
    ) -> Self {
        Self {
            quota,
            sessions,
            builder,
            transport,
            timeouts,
            metrics: DispatchMetrics::new(),
        }
    }

    /// Wire quota and session stores from configuration.
    pub fn from_config(
        config: &GatewayConfig,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let builder = RequestBuilder::new(config.locale.clone())
            .with_gemini_cookie(config.gemini_cookie.clone());
        let quota = Arc::new(QuotaStore::new(config.quota.clone(), clock.clone()));
        let sessions = Arc::new(SessionStore::new(
            transport.clone(),
            builder.clone(),
            clock,
            config.session_ttl,
            config.timeouts.bootstrap_timeout,
        ));
        Self::new(quota, sessions, builder, transport, config.timeouts.clone())
    }

    pub fn quota(&self) -> &QuotaStore {
        &self.quota
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn metrics(&self) -> &DispatchMetrics {
        &self.metrics
    }

    /// Relay `prompt` to `backend` and return its answer.
    pub async fn ask(&self, backend: Backend, prompt: &str) -> GatewayResult<AnswerResult> {
        let started = Instant::now();
        let result = self.run(backend, prompt).await;
        match &result {
            Ok(answer) => {
                let elapsed = started.elapsed();
                self.metrics.record_success(backend, elapsed);
                info!(
                    backend = %backend,
                    chars = answer.text.chars().count(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    remaining = self.quota.remaining(backend),
                    "Ask answered"
                );
            }
            Err(err) => self.metrics.record_failure(backend, err.kind()),
        }
        result
    }

    async fn run(&self, backend: Backend, prompt: &str) -> GatewayResult<AnswerResult> {
        let permit = self
            .quota
            .reserve(backend)
            .map_err(|e| failed(DispatchStage::QuotaCheck, e))?;

        let session = self
            .sessions
            .ensure_session(backend)
            .await
            .map_err(|e| failed(DispatchStage::SessionEnsure, e))?;

        let frame = self
            .builder
            .build(backend, prompt, &session)
            .map_err(|e| failed(DispatchStage::BuildRequest, e))?;

        debug!(backend = %backend, url = %frame.url, "Querying backend");
        let response = self
            .transport
            .send(frame, self.timeouts.query_timeout)
            .await
            .map_err(|e| {
                failed(
                    DispatchStage::NetworkCall,
                    GatewayError::upstream(
                        backend,
                        None,
                        format!("{} connection error: {}", backend.display_name(), e),
                    ),
                )
            })?;

        if !response.is_success() {
            // Rejected tokens look like any other error status; refresh them next time.
            if backend.invalidates_session_on_failure() {
                self.sessions.invalidate(backend).await;
            }
            return Err(failed(
                DispatchStage::NetworkCall,
                GatewayError::upstream(
                    backend,
                    Some(response.status),
                    format!(
                        "{}: {} API error: {}",
                        response.status,
                        backend.display_name(),
                        excerpt(&response.body)
                    ),
                ),
            ));
        }

        let text = decode(backend, &response.body);
        if text.is_empty() {
            debug!(
                backend = %backend,
                body_len = response.body.len(),
                body = %excerpt(&response.body),
                "No answer found in response body"
            );
            if backend.invalidates_session_on_failure() {
                self.sessions.invalidate(backend).await;
            }
            return Err(failed(
                DispatchStage::Decode,
                GatewayError::EmptyResponse { backend },
            ));
        }

        permit.commit();
        Ok(AnswerResult { text, backend })
    }
}

/// Log a pipeline failure and pass the error through.
fn failed(stage: DispatchStage, err: GatewayError) -> GatewayError {
    warn!(
        backend = %err.backend(),
        stage = %stage,
        kind = err.kind().label(),
        error = %err,
        "Ask failed"
    );
    err
}

/// First characters of a body, on one line.
fn excerpt(body: &str) -> String {
    let flat: String = body
        .chars()
        .take(BODY_EXCERPT_CHARS)
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    if body.chars().count() > BODY_EXCERPT_CHARS {
        format!("{}...", flat.trim_end())
    } else {
        flat.trim_end().to_string()
    }
}
