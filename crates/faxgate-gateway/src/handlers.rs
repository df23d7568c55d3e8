// SPDX-FileCopyrightText: 2026 Faxgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for provider callbacks and signed media URLs.
//!
//! Response code contract:
//! - 200/204: event applied (JSON vs. legacy form callbacks)
//! - 403: invalid signature, bad URL token, or a payload that cannot even
//!   be attributed to a job
//! - 404: callback references a provider fax id no job matches
//! - 409: stale or superseded event (timestamp not newer than stored)
//! - 500: unmappable status token (provider contract drift, loud on
//!   purpose) and any unexpected processing error, so the provider's own
//!   retry mechanism re-delivers the event

use std::collections::BTreeMap;

use axum::body::Bytes;
use axum::extract::{Form, Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use faxgate_core::{
    CanonicalStatus, EventMetadata, FaxgateError, ProviderEvent, ProviderKind,
};
use faxgate_dispatch::CallbackOutcome;

use crate::server::GatewayState;

/// Header carrying the provider's event timestamp (opaque; it is part of
/// the signed payload and never re-parsed before verification).
pub const TIMESTAMP_HEADER: &str = "x-fax-timestamp";
/// Header carrying the base64 Ed25519 signature over `"{timestamp}|" + body`.
pub const SIGNATURE_HEADER: &str = "x-fax-signature";

/// Current-provider callback body: `{data: {payload: {...}, occurred_at}}`.
#[derive(Debug, Deserialize)]
pub struct CallbackEnvelope {
    pub data: CallbackData,
}

#[derive(Debug, Deserialize)]
pub struct CallbackData {
    pub payload: CallbackPayload,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackPayload {
    pub status: String,
    #[serde(default)]
    pub fax_id: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub page_count: Option<u32>,
    #[serde(default)]
    pub call_duration_secs: Option<u32>,
    #[serde(default)]
    pub failure_reason: Option<String>,
}

/// Response body for an applied current-provider callback.
#[derive(Debug, Serialize)]
pub struct CallbackResponse {
    pub status: CanonicalStatus,
}

/// POST /fax/callback -- current provider, JSON body, signature headers.
pub async fn post_callback(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    // Step 1: verify before anything can mutate. No verifier configured
    // means this deployment speaks the legacy protocol only: fail closed.
    let Some(verifier) = &state.verifier else {
        warn!("current-provider callback received but no public key configured");
        return StatusCode::FORBIDDEN.into_response();
    };
    let timestamp = headers.get(TIMESTAMP_HEADER).and_then(|v| v.to_str().ok());
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    if let Err(e) = verifier.verify(&body, timestamp, signature) {
        warn!(error = %e, "callback signature rejected");
        return StatusCode::FORBIDDEN.into_response();
    }

    // A payload that does not parse, or carries no fax id, cannot be
    // attributed to a job at all.
    let envelope: CallbackEnvelope = match serde_json::from_slice(&body) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!(error = %e, "malformed callback payload");
            return StatusCode::FORBIDDEN.into_response();
        }
    };
    let payload = envelope.data.payload;
    if payload.fax_id.is_none() {
        warn!("callback payload carries no fax id");
        return StatusCode::FORBIDDEN.into_response();
    }

    let event = ProviderEvent {
        provider: ProviderKind::Current,
        status_token: payload.status,
        fax_id: payload.fax_id,
        message_id: None,
        occurred_at: envelope.data.occurred_at,
        metadata: EventMetadata {
            from: payload.from,
            to: payload.to,
            page_count: payload.page_count,
            call_duration_secs: payload.call_duration_secs,
            failure_reason: payload.failure_reason,
            remote_station_id: None,
            bit_rate: None,
        },
        raw_fields: Vec::new(),
    };

    match state.processor.on_event(&event).await {
        Ok(CallbackOutcome::Applied { status, .. }) => {
            (StatusCode::OK, Json(CallbackResponse { status })).into_response()
        }
        Ok(CallbackOutcome::Stale) => StatusCode::CONFLICT.into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /fax/callback/{signed} -- legacy provider, form-encoded body,
/// authenticity via the signed URL token.
pub async fn post_legacy_callback(
    State(state): State<GatewayState>,
    Path(signed): Path<String>,
    Form(fields): Form<BTreeMap<String, String>>,
) -> Response {
    let Some(message_id) = state.tokens.unsign_callback(&signed) else {
        warn!("legacy callback token rejected");
        return StatusCode::FORBIDDEN.into_response();
    };

    let Some(status_token) = fields.get("FaxStatus").cloned() else {
        warn!(message_id = %message_id, "legacy callback without FaxStatus field");
        return StatusCode::FORBIDDEN.into_response();
    };

    // The legacy provider does not reliably timestamp its callbacks; fall
    // back to arrival time so the staleness guard still orders events.
    let occurred_at = fields
        .get("Timestamp")
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    let event = ProviderEvent {
        provider: ProviderKind::Legacy,
        status_token,
        fax_id: fields.get("FaxSid").cloned(),
        message_id: Some(message_id),
        occurred_at,
        metadata: EventMetadata {
            from: fields.get("From").cloned(),
            to: fields.get("To").cloned(),
            page_count: fields.get("NumPages").and_then(|v| v.parse().ok()),
            call_duration_secs: fields.get("Duration").and_then(|v| v.parse().ok()),
            failure_reason: fields.get("ErrorMessage").cloned(),
            remote_station_id: fields.get("RemoteStationId").cloned(),
            bit_rate: fields.get("BitRate").and_then(|v| v.parse().ok()),
        },
        raw_fields: fields.into_iter().collect(),
    };

    match state.processor.on_event(&event).await {
        Ok(CallbackOutcome::Applied { .. }) => StatusCode::NO_CONTENT.into_response(),
        Ok(CallbackOutcome::Stale) => StatusCode::CONFLICT.into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /fax/media/{signed} -- serves the rendered document to the provider.
pub async fn get_media(
    State(state): State<GatewayState>,
    Path(signed): Path<String>,
) -> Response {
    let Some(message_id) = state.tokens.unsign_media(&signed) else {
        warn!("media token rejected");
        return StatusCode::FORBIDDEN.into_response();
    };

    match state.attachments.fetch_document(&message_id).await {
        Ok(Some(document)) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, document.content_type)],
            document.bytes,
        )
            .into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            error!(error = %e, message_id = %message_id, "document fetch failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// GET /health -- unauthenticated liveness probe.
pub async fn get_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn error_response(e: FaxgateError) -> Response {
    match &e {
        FaxgateError::UnknownJob { external_id } => {
            warn!(external_id, "callback for unknown job");
            StatusCode::NOT_FOUND.into_response()
        }
        FaxgateError::UnmappableStatus { provider, token } => {
            // Contract drift. Never swallowed: a 500 makes the provider
            // redeliver and keeps the operator's error budget noisy.
            error!(%provider, token, "unmappable provider status token");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
        FaxgateError::Auth { .. } => StatusCode::FORBIDDEN.into_response(),
        _ => {
            error!(error = %e, "callback processing failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
