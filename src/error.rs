//! Failure taxonomy for the ask pipeline.

use serde::Serialize;
use thiserror::Error;

use crate::backend::Backend;

/// Coarse classification of a failed ask, stable across message changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    QuotaExceeded,
    SessionInitFailed,
    UpstreamError,
    EmptyResponse,
}

impl FailureKind {
    pub const ALL: [FailureKind; 4] = [
        FailureKind::QuotaExceeded,
        FailureKind::SessionInitFailed,
        FailureKind::UpstreamError,
        FailureKind::EmptyResponse,
    ];

    /// Stable label used in logs, metrics and error bodies.
    pub fn label(&self) -> &'static str {
        match self {
            FailureKind::QuotaExceeded => "quota_exceeded",
            FailureKind::SessionInitFailed => "session_init_failed",
            FailureKind::UpstreamError => "upstream_error",
            FailureKind::EmptyResponse => "empty_response",
        }
    }
}

/// Errors surfaced by the dispatch pipeline.
///
/// Every variant names the backend so an operator can tell which upstream
/// protocol broke without reproducing the request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The backend's daily request budget is used up.
    #[error("{} rate limit exceeded for today ({limit} requests)", .backend.display_name())]
    QuotaExceeded { backend: Backend, limit: u32 },

    /// Session tokens could not be obtained from the bootstrap endpoint.
    #[error(
        "{} session initialization failed: {reason} (cookie may be invalid or missing)",
        .backend.display_name()
    )]
    SessionInitFailed { backend: Backend, reason: String },

    /// The backend was unreachable or answered with a non-success status.
    #[error("{} upstream error: {message}", .backend.display_name())]
    UpstreamError {
        backend: Backend,
        status: Option<u16>,
        message: String,
    },

    /// The response body held no recognizable answer.
    #[error("Empty response from {}", .backend.display_name())]
    EmptyResponse { backend: Backend },
}

/// Result type for dispatch operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

impl GatewayError {
    pub fn session_init(backend: Backend, reason: impl Into<String>) -> Self {
        GatewayError::SessionInitFailed {
            backend,
            reason: reason.into(),
        }
    }

    pub fn upstream(backend: Backend, status: Option<u16>, message: impl Into<String>) -> Self {
        GatewayError::UpstreamError {
            backend,
            status,
            message: message.into(),
        }
    }

    pub fn backend(&self) -> Backend {
        match self {
            GatewayError::QuotaExceeded { backend, .. }
            | GatewayError::SessionInitFailed { backend, .. }
            | GatewayError::UpstreamError { backend, .. }
            | GatewayError::EmptyResponse { backend } => *backend,
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            GatewayError::QuotaExceeded { .. } => FailureKind::QuotaExceeded,
            GatewayError::SessionInitFailed { .. } => FailureKind::SessionInitFailed,
            GatewayError::UpstreamError { .. } => FailureKind::UpstreamError,
            GatewayError::EmptyResponse { .. } => FailureKind::EmptyResponse,
        }
    }

    /// HTTP status an inbound caller should see for this failure.
    ///
    /// Upstream error statuses are passed through; an upstream failure without
    /// a usable status (connection error, timeout) maps to 502.
    pub fn http_status(&self) -> u16 {
        match self {
            GatewayError::QuotaExceeded { .. } => 429,
            GatewayError::SessionInitFailed { .. } => 500,
            GatewayError::UpstreamError {
                status: Some(status),
                ..
            } if (400..=599).contains(status) => *status,
            GatewayError::UpstreamError { .. } => 502,
            GatewayError::EmptyResponse { .. } => 500,
        }
    }
}
