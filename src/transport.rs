//! Outbound HTTP seam.
//!
//! The dispatcher and session store talk to backends only through
//! [`Transport`], so tests can script upstream behavior without a network.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::trace;

use crate::request::{FrameBody, Method, RequestFrame};

/// Raw upstream response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: String,
}

impl UpstreamResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failures below the HTTP status level.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("{0}")]
    Other(String),
}

/// Sends request frames to upstream backends.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one call, giving up after `timeout`.
    ///
    /// Any HTTP status is returned as a response; only failures to obtain a
    /// response at all are errors.
    async fn send(
        &self,
        frame: RequestFrame,
        timeout: Duration,
    ) -> Result<UpstreamResponse, TransportError>;
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| TransportError::Other(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        frame: RequestFrame,
        timeout: Duration,
    ) -> Result<UpstreamResponse, TransportError> {
        trace!(url = %frame.url, method = ?frame.method, "Sending upstream request");

        let mut request = match frame.method {
            Method::Get => self.client.get(&frame.url),
            Method::Post => self.client.post(&frame.url),
        };
        request = request.timeout(timeout);
        if !frame.query.is_empty() {
            request = request.query(&frame.query);
        }
        for (name, value) in &frame.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        request = match &frame.body {
            FrameBody::Empty => request,
            FrameBody::Form(fields) => request.form(fields),
            FrameBody::Json(value) => request.json(value),
        };

        let response = request
            .send()
            .await
            .map_err(|e| classify(e, timeout))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout(timeout)
            } else {
                TransportError::Body(e.to_string())
            }
        })?;

        Ok(UpstreamResponse { status, body })
    }
}

fn classify(err: reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(timeout)
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else if err.is_builder() {
        TransportError::InvalidRequest(err.to_string())
    } else {
        TransportError::Other(err.to_string())
    }
}
