// SPDX-FileCopyrightText: 2026 Faxgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use faxgate_auth::{UrlTokenSigner, WebhookVerifier};
use faxgate_core::{AttachmentStore, FaxgateError};
use faxgate_dispatch::CallbackProcessor;
use tower_http::trace::TraceLayer;

use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// The delivery-status state machine.
    pub processor: Arc<CallbackProcessor>,
    /// Ed25519 verifier for current-provider callbacks. `None` in a
    /// legacy-only deployment; current callbacks are then rejected.
    pub verifier: Option<Arc<WebhookVerifier>>,
    /// Signed URL token mint/check (legacy callbacks, media URLs).
    pub tokens: UrlTokenSigner,
    /// Rendered documents served through the media URL.
    pub attachments: Arc<dyn AttachmentStore>,
}

/// Gateway server configuration (mirrors `GatewayConfig` from
/// `faxgate-config` without depending on the config crate).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Assemble the gateway router.
///
/// Routes:
/// - `GET  /health` -- liveness
/// - `POST /fax/callback` -- current provider (signature headers)
/// - `POST /fax/callback/{signed}` -- legacy provider (signed URL token)
/// - `GET  /fax/media/{signed}` -- document fetch for the provider
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(handlers::get_health))
        .route("/fax/callback", post(handlers::post_callback))
        .route("/fax/callback/{signed}", post(handlers::post_legacy_callback))
        .route("/fax/media/{signed}", get(handlers::get_media))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the task is aborted.
pub async fn start_server(config: &ServerConfig, state: GatewayState) -> Result<(), FaxgateError> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| FaxgateError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| FaxgateError::Internal(format!("gateway server error: {e}")))?;

    Ok(())
}
