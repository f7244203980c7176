//! Webhook HTTP server: health endpoint and the inbound message hook.

use crate::auth::AuthorizedSenders;
use crate::config::{self, Config};
use crate::inbound::{self, ExtractError, InboundMessage};
use crate::pipeline;
use crate::providers::{self, MessageProvider};
use crate::reply;
use crate::store::{PgReportStore, ReportStore, RetryingStore};
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Shared state for the webhook server (authorized senders, store, provider).
#[derive(Clone)]
pub struct AppState {
    pub senders: Arc<AuthorizedSenders>,
    pub store: Arc<dyn ReportStore>,
    pub provider: Arc<dyn MessageProvider>,
}

/// Build the router: GET / health probe, POST /inbound webhook.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health_http))
        .route("/inbound", post(inbound_webhook))
        .with_state(state)
}

/// Run the server with production components built from config. Fails fast
/// when no senders are authorized or provider credentials are missing.
pub async fn run_server(config: Config) -> Result<()> {
    let senders = AuthorizedSenders::from_list(&config::resolve_authorized_senders(&config))?;
    let password = config::resolve_db_password(&config);
    let store = RetryingStore::new(
        PgReportStore::new(&config.storage, password.as_deref()),
        Duration::from_millis(config.storage.retry_backoff_ms),
    );
    let provider = providers::build_provider(&config)?;
    log::info!("dispatching replies via provider: {}", provider.id());
    let state = AppState {
        senders: Arc::new(senders),
        store: Arc::new(store),
        provider,
    };
    serve(state, config.server.bind.trim(), config.server.port).await
}

/// Bind and serve until SIGINT/SIGTERM. Split from `run_server` so tests
/// can inject their own store and provider.
pub async fn serve(state: AppState, bind: &str, port: u16) -> Result<()> {
    let app = router(state);
    let bind_addr = format!("{}:{}", bind, port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("ladle listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("webhook server exited")?;
    log::info!("server stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}

/// POST /inbound — the provider webhook. Runs the pipeline, dispatches the
/// composed reply, and acknowledges with 200 and an empty body on every
/// terminal outcome: webhook acknowledgment and reply delivery are
/// decoupled, so business failures never surface as HTTP errors here.
async fn inbound_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let msg = match inbound::extract_inbound(content_type, &body) {
        Ok(msg) => msg,
        // A payload with a sender but no text still goes through the
        // pipeline (guard first, then the empty text fails parsing), so the
        // sender hears the same invalid-input reply as for any bad body.
        Err(ExtractError::MissingText { sender }) => InboundMessage {
            sender,
            text: String::new(),
        },
        Err(e) => {
            // No sender to address a reply to; log and acknowledge.
            log::warn!("webhook: discarding request: {}", e);
            return StatusCode::OK;
        }
    };

    let outcome = pipeline::run_pipeline(&state.senders, state.store.as_ref(), &msg).await;
    let reply = reply::compose(&outcome);
    let sent = state.provider.send(&msg.sender, &reply).await;
    if sent.accepted {
        log::info!(
            "webhook: reply to {} accepted by {} ({})",
            msg.sender,
            state.provider.id(),
            sent.detail
        );
    } else {
        log::warn!(
            "webhook: reply to {} rejected by {}: {}",
            msg.sender,
            state.provider.id(),
            sent.detail
        );
    }
    StatusCode::OK
}

/// GET / returns a simple health JSON (for probes).
async fn health_http() -> Json<serde_json::Value> {
    Json(json!({
        "service": "ladle",
        "runtime": "running",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
