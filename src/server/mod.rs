//! HTTP surface of the gateway.
//!
//! - `POST /ask/{backend}` with `{"prompt": "..."}` relays one prompt
//! - `GET /ping` reports quota counters, dispatch outcomes and the region

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::backend::Backend;
use crate::dispatch::{BackendOutcomes, Dispatcher};
use crate::error::GatewayError;
use crate::quota::QuotaSnapshot;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    dispatcher: Arc<Dispatcher>,
    region: Arc<str>,
}

impl AppState {
    pub fn new(dispatcher: Arc<Dispatcher>, region: impl Into<Arc<str>>) -> Self {
        Self {
            dispatcher,
            region: region.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AskRequest {
    prompt: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
    kind: &'static str,
    backend: Backend,
}

#[derive(Debug, Serialize)]
struct PingResponse {
    status: &'static str,
    #[serde(flatten)]
    quota: QuotaSnapshot,
    region: String,
    outcomes: BTreeMap<Backend, BackendOutcomes>,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorBody {
            detail: self.to_string(),
            kind: self.kind().label(),
            backend: self.backend(),
        };
        (status, Json(body)).into_response()
    }
}

/// Build the gateway router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ping", get(ping_handler))
        .route("/ask/{backend}", post(ask_handler))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(addr: &str, state: AppState) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, region = %state.region, "Relaygate listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn ping_handler(State(state): State<AppState>) -> Json<PingResponse> {
    Json(PingResponse {
        status: "ok",
        quota: state.dispatcher.quota().snapshot(),
        region: state.region.to_string(),
        outcomes: state.dispatcher.metrics().snapshot(),
    })
}

async fn ask_handler(
    State(state): State<AppState>,
    Path(backend): Path<String>,
    request: Result<Json<AskRequest>, JsonRejection>,
) -> Response {
    // Unknown backends are reported before the body is looked at.
    let backend: Backend = match backend.parse() {
        Ok(backend) => backend,
        Err(e) => {
            return (StatusCode::NOT_FOUND, Json(json!({ "detail": e.to_string() })))
                .into_response()
        }
    };
    let Json(request) = match request {
        Ok(request) => request,
        Err(rejection) => return rejection.into_response(),
    };

    // Run the ask on its own task so it completes even if the caller goes away.
    let dispatcher = state.dispatcher.clone();
    let task =
        tokio::spawn(async move { dispatcher.ask(backend, &request.prompt).await });

    match task.await {
        Ok(Ok(answer)) => Json(answer).into_response(),
        Ok(Err(err)) => err.into_response(),
        Err(e) => {
            error!(backend = %backend, error = %e, "Ask task aborted");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "detail": format!("ask task aborted: {}", e) })),
            )
                .into_response()
        }
    }
}
