//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::json;

use relaygate::clock::ManualClock;
use relaygate::quota::QuotaConfig;
use relaygate::request::{Method, RequestFrame};
use relaygate::transport::{Transport, TransportError, UpstreamResponse};
use relaygate::{Dispatcher, GatewayConfig};

pub const BOOTSTRAP_PAGE: &str =
    r#"<script>WIZ_global_data = {"cfb2h":"boq_build_1","FdrFJe":"sid-1"};</script>"#;

type Reply = Result<UpstreamResponse, TransportError>;

/// Which upstream call a frame represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    GeminiBootstrap,
    GeminiQuery,
    PerplexityQuery,
}

impl Route {
    fn of(frame: &RequestFrame) -> Route {
        match frame.method {
            Method::Get => Route::GeminiBootstrap,
            Method::Post if frame.url.contains("perplexity") => Route::PerplexityQuery,
            Method::Post => Route::GeminiQuery,
        }
    }
}

/// Gemini streaming body carrying `text` at the answer position.
pub fn gemini_answer(text: &str) -> String {
    let inner = json!([null, null, null, null, [["rc_1", [text]]]]);
    format!(
        ")]}}'\n\n123\n{}\n",
        json!([["wrb.fr", null, inner.to_string()]])
    )
}

/// Perplexity event stream ending in a final step with `text`.
pub fn perplexity_answer(text: &str) -> String {
    let searching = json!([{ "step_type": "SEARCH_WEB", "content": {} }]);
    let done = json!([
        { "step_type": "SEARCH_WEB", "content": {} },
        { "step_type": "FINAL", "content": { "answer": json!({ "answer": text }).to_string() } }
    ]);
    format!(
        "event: message\ndata: {}\n\nevent: message\ndata: {}\n\n",
        json!({ "text": searching.to_string() }),
        json!({ "text": done.to_string() })
    )
}

/// Upstream stand-in answering by route, with per-route call counters.
#[derive(Default)]
pub struct FakeUpstream {
    scripts: Mutex<Vec<(Route, VecDeque<Reply>)>>,
    fallbacks: Mutex<Vec<(Route, Reply)>>,
    calls: Mutex<Vec<Route>>,
    delay: Duration,
}

impl FakeUpstream {
    /// Healthy upstream: bootstrap page plus fixed answers.
    pub fn healthy() -> Self {
        Self::default()
            .always(Route::GeminiBootstrap, ok(BOOTSTRAP_PAGE))
            .always(Route::GeminiQuery, ok(&gemini_answer("gemini says hi")))
            .always(Route::PerplexityQuery, ok(&perplexity_answer("perplexity says hi")))
    }

    /// Reply used whenever the route has no scripted reply left.
    pub fn always(self, route: Route, reply: Reply) -> Self {
        if let Ok(mut fallbacks) = self.fallbacks.lock() {
            fallbacks.retain(|(r, _)| *r != route);
            fallbacks.push((route, reply));
        }
        self
    }

    /// Reply used once, before the fallback.
    pub fn then(self, route: Route, reply: Reply) -> Self {
        if let Ok(mut scripts) = self.scripts.lock() {
            match scripts.iter_mut().find(|(r, _)| *r == route) {
                Some((_, queue)) => queue.push_back(reply),
                None => scripts.push((route, VecDeque::from([reply]))),
            }
        }
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self, route: Route) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.iter().filter(|r| **r == route).count())
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().map(|calls| calls.len()).unwrap_or(0)
    }
}

#[async_trait]
impl Transport for FakeUpstream {
    async fn send(&self, frame: RequestFrame, _timeout: Duration) -> Reply {
        let route = Route::of(&frame);
        self.calls.lock().unwrap().push(route);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let scripted = self
            .scripts
            .lock()
            .unwrap()
            .iter_mut()
            .find(|(r, _)| *r == route)
            .and_then(|(_, queue)| queue.pop_front());
        scripted.unwrap_or_else(|| {
            self.fallbacks
                .lock()
                .unwrap()
                .iter()
                .find(|(r, _)| *r == route)
                .map(|(_, reply)| reply.clone())
                .unwrap_or_else(|| Err(TransportError::Other(format!("no reply for {:?}", route))))
        })
    }
}

pub fn ok(body: &str) -> Reply {
    Ok(UpstreamResponse::new(200, body))
}

pub fn status(code: u16, body: &str) -> Reply {
    Ok(UpstreamResponse::new(code, body))
}

/// 2024-06-01 08:00:00 UTC.
pub fn start_clock() -> ManualClock {
    ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap())
}

pub fn config_with_limit(daily_limit: u32) -> GatewayConfig {
    GatewayConfig {
        gemini_cookie: Some("__Secure-1PSID=test".to_string()),
        quota: QuotaConfig::new().with_daily_limit(daily_limit),
        ..GatewayConfig::default()
    }
}

pub fn dispatcher(
    config: &GatewayConfig,
    upstream: Arc<FakeUpstream>,
    clock: &ManualClock,
) -> Arc<Dispatcher> {
    Arc::new(Dispatcher::from_config(
        config,
        upstream,
        Arc::new(clock.clone()),
    ))
}
