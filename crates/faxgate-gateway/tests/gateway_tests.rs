// SPDX-FileCopyrightText: 2026 Faxgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire-level tests for the callback and media routes.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{Duration, Utc};
use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use http_body_util::BodyExt;
use rand::rngs::OsRng;
use tower::ServiceExt;

use faxgate_auth::WebhookVerifier;
use faxgate_core::{AttachmentStore, CanonicalStatus, FaxJob, MessageId, ProviderKind};
use faxgate_dispatch::{Actor, SubmitOverrides};
use faxgate_gateway::{GatewayState, handlers, router};
use faxgate_test_utils::TestHarness;

struct Wire {
    harness: TestHarness,
    signing: SigningKey,
    app: axum::Router,
}

async fn wire(kind: ProviderKind) -> Wire {
    let harness = TestHarness::builder()
        .with_provider_kind(kind)
        .with_message(TestHarness::eligible_message("msg-1"))
        .build()
        .await
        .unwrap();

    let signing = SigningKey::generate(&mut OsRng);
    let state = GatewayState {
        processor: harness.processor.clone(),
        verifier: Some(Arc::new(WebhookVerifier::from_key(VerifyingKey::from(
            &signing,
        )))),
        tokens: harness.tokens.clone(),
        attachments: harness.attachments.clone() as Arc<dyn AttachmentStore>,
    };
    let app = router(state);
    Wire {
        harness,
        signing,
        app,
    }
}

async fn submit_job(wire: &Wire) -> FaxJob {
    wire.harness
        .orchestrator
        .submit(
            &MessageId("msg-1".into()),
            &Actor::system(),
            SubmitOverrides::default(),
        )
        .await
        .unwrap()
        .expect("harness message is eligible")
}

fn signed_callback_request(wire: &Wire, body: &str, tamper: bool) -> Request<Body> {
    let timestamp = "1714000000";
    let mut payload = timestamp.as_bytes().to_vec();
    payload.push(b'|');
    payload.extend_from_slice(body.as_bytes());
    let signature = BASE64.encode(wire.signing.sign(&payload).to_bytes());

    let sent_body = if tamper {
        body.replace("delivered", "failed")
    } else {
        body.to_string()
    };

    Request::builder()
        .method("POST")
        .uri("/fax/callback")
        .header("content-type", "application/json")
        .header(handlers::TIMESTAMP_HEADER, timestamp)
        .header(handlers::SIGNATURE_HEADER, signature)
        .body(Body::from(sent_body))
        .unwrap()
}

fn callback_body(fax_id: &str, status: &str, occurred_at: chrono::DateTime<Utc>) -> String {
    serde_json::json!({
        "data": {
            "payload": {
                "status": status,
                "fax_id": fax_id,
                "from": "+4930111111",
                "to": "+49301234567",
                "page_count": 2,
                "call_duration_secs": 41
            },
            "occurred_at": occurred_at.to_rfc3339()
        }
    })
    .to_string()
}

#[tokio::test]
async fn health_is_public() {
    let w = wire(ProviderKind::Current).await;
    let response = w
        .app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn verified_delivered_callback_applies_and_returns_200() {
    let w = wire(ProviderKind::Current).await;
    let job = submit_job(&w).await;
    let fax_id = job.provider_fax_id.clone().unwrap();

    let body = callback_body(&fax_id, "delivered", Utc::now() + Duration::seconds(5));
    let response = w
        .app
        .clone()
        .oneshot(signed_callback_request(&w, &body, false))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(parsed["status"], "sent");

    let stored = w.harness.store.delivery_status(&job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, CanonicalStatus::Sent);
    assert_eq!(w.harness.messages.delivered.lock().unwrap().len(), 1);
    assert_eq!(w.harness.problems.resolved.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn tampered_body_is_rejected_without_mutation() {
    let w = wire(ProviderKind::Current).await;
    let job = submit_job(&w).await;
    let fax_id = job.provider_fax_id.clone().unwrap();
    let before = w.harness.store.delivery_status(&job.id).await.unwrap().unwrap();

    let body = callback_body(&fax_id, "delivered", Utc::now() + Duration::seconds(5));
    let response = w
        .app
        .clone()
        .oneshot(signed_callback_request(&w, &body, true))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let after = w.harness.store.delivery_status(&job.id).await.unwrap().unwrap();
    assert_eq!(before, after, "no state change on signature failure");
}

#[tokio::test]
async fn missing_signature_headers_are_rejected() {
    let w = wire(ProviderKind::Current).await;
    let job = submit_job(&w).await;
    let body = callback_body(
        &job.provider_fax_id.clone().unwrap(),
        "delivered",
        Utc::now() + Duration::seconds(5),
    );

    let response = w
        .app
        .clone()
        .oneshot(
            Request::post("/fax/callback")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn duplicate_callback_is_a_409() {
    let w = wire(ProviderKind::Current).await;
    let job = submit_job(&w).await;
    let fax_id = job.provider_fax_id.clone().unwrap();
    let body = callback_body(&fax_id, "delivered", Utc::now() + Duration::seconds(5));

    let first = w
        .app
        .clone()
        .oneshot(signed_callback_request(&w, &body, false))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = w
        .app
        .clone()
        .oneshot(signed_callback_request(&w, &body, false))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn unknown_fax_id_is_a_404() {
    let w = wire(ProviderKind::Current).await;
    submit_job(&w).await;
    let body = callback_body("fax-nobody", "delivered", Utc::now() + Duration::seconds(5));

    let response = w
        .app
        .clone()
        .oneshot(signed_callback_request(&w, &body, false))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unmappable_token_is_a_500() {
    let w = wire(ProviderKind::Current).await;
    let job = submit_job(&w).await;
    let body = callback_body(
        &job.provider_fax_id.clone().unwrap(),
        "negotiating",
        Utc::now() + Duration::seconds(5),
    );

    let response = w
        .app
        .clone()
        .oneshot(signed_callback_request(&w, &body, false))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn malformed_json_with_valid_signature_is_a_403() {
    let w = wire(ProviderKind::Current).await;
    let response = w
        .app
        .clone()
        .oneshot(signed_callback_request(&w, "not json", false))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn legacy_callback_with_signed_token_is_a_204() {
    let w = wire(ProviderKind::Legacy).await;
    let job = submit_job(&w).await;
    let token = w.harness.tokens.sign_callback(&MessageId("msg-1".into()));

    let response = w
        .app
        .clone()
        .oneshot(
            Request::post(format!("/fax/callback/{token}"))
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Body::from(
                    "FaxStatus=delivered&FaxSid=FX1&NumPages=2&RemoteStationId=%2B49301234567",
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let stored = w.harness.store.delivery_status(&job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, CanonicalStatus::Received);
    assert!(stored.log.contains("FaxStatus: delivered"));
}

#[tokio::test]
async fn legacy_callback_with_bad_token_is_a_403() {
    let w = wire(ProviderKind::Legacy).await;
    submit_job(&w).await;

    let response = w
        .app
        .clone()
        .oneshot(
            Request::post("/fax/callback/msg-1@acct-test:forged")
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Body::from("FaxStatus=delivered"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn media_url_serves_the_document() {
    let w = wire(ProviderKind::Current).await;
    let message_id = MessageId("msg-1".into());
    w.harness.attachments.insert_pdf(&message_id, b"%PDF-1.4 fax");
    let token = w.harness.tokens.sign_media(&message_id);

    let response = w
        .app
        .clone()
        .oneshot(
            Request::get(format!("/fax/media/{token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/pdf"
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"%PDF-1.4 fax");
}

#[tokio::test]
async fn media_url_with_callback_token_is_rejected() {
    let w = wire(ProviderKind::Current).await;
    let message_id = MessageId("msg-1".into());
    w.harness.attachments.insert_pdf(&message_id, b"%PDF-1.4 fax");
    // Token minted for the callback salt must not open the media route.
    let token = w.harness.tokens.sign_callback(&message_id);

    let response = w
        .app
        .clone()
        .oneshot(
            Request::get(format!("/fax/media/{token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn media_url_without_document_is_a_404() {
    let w = wire(ProviderKind::Current).await;
    let token = w.harness.tokens.sign_media(&MessageId("msg-1".into()));

    let response = w
        .app
        .clone()
        .oneshot(
            Request::get(format!("/fax/media/{token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
