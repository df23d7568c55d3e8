// SPDX-FileCopyrightText: 2026 Faxgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the current provider's fax API.
//!
//! Submits jobs as JSON with bearer authentication. The provider answers
//! an HTTP "accepted" status with the assigned fax id; anything else is a
//! rejection surfaced as [`FaxgateError::Submission`]. No internal retry:
//! the delivery-status state machine owns all retry decisions.

use std::time::Duration;

use async_trait::async_trait;
use faxgate_core::{
    FaxProvider, FaxSubmission, FaxgateError, ProviderAccepted, ProviderKind,
};
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::debug;

use crate::types::{CurrentSubmitRequest, CurrentSubmitResponse, ProviderErrorBody};

const DEFAULT_ENDPOINT: &str = "https://api.fax-gateway.example/v2/faxes";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the current provider's JSON fax API.
#[derive(Debug, Clone)]
pub struct CurrentProviderClient {
    client: reqwest::Client,
    connection_id: String,
    endpoint: String,
}

impl CurrentProviderClient {
    /// Creates a new client.
    ///
    /// `endpoint` overrides the production API URL (regional hosts, tests).
    pub fn new(
        auth_token: &str,
        connection_id: &str,
        endpoint: Option<String>,
    ) -> Result<Self, FaxgateError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {auth_token}"))
            .map_err(|e| FaxgateError::Config(format!("invalid provider auth token: {e}")))?;
        headers.insert("authorization", bearer);
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| FaxgateError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            connection_id: connection_id.to_string(),
            endpoint: endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
        })
    }
}

#[async_trait]
impl FaxProvider for CurrentProviderClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Current
    }

    async fn submit(&self, request: &FaxSubmission) -> Result<ProviderAccepted, FaxgateError> {
        let body = CurrentSubmitRequest {
            connection_id: request
                .connection_id
                .as_deref()
                .unwrap_or(&self.connection_id),
            to: &request.to,
            from: &request.from,
            media_url: &request.media_url,
            webhook_url: &request.callback_url,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| FaxgateError::Provider {
                message: format!("fax submission request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, to = %request.to, "submission response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ProviderErrorBody>(&body) {
                Ok(err_body) => err_body
                    .message
                    .or(err_body.detail)
                    .unwrap_or_else(|| format!("provider returned {status}")),
                Err(_) => format!("provider returned {status}: {body}"),
            };
            return Err(FaxgateError::Submission {
                message,
                source: None,
            });
        }

        let body = response.text().await.map_err(|e| FaxgateError::Provider {
            message: format!("failed to read submission response: {e}"),
            source: Some(Box::new(e)),
        })?;
        let parsed: CurrentSubmitResponse =
            serde_json::from_str(&body).map_err(|e| FaxgateError::Provider {
                message: format!("failed to parse submission response: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(ProviderAccepted {
            fax_id: parsed.data.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn submission() -> FaxSubmission {
        FaxSubmission {
            to: "+49301234567".into(),
            from: "+4930111111".into(),
            media_url: "https://fax.example.org/fax/media/token".into(),
            callback_url: "https://fax.example.org/fax/callback".into(),
            connection_id: None,
        }
    }

    #[tokio::test]
    async fn accepted_submission_returns_provider_fax_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/faxes"))
            .and(header("authorization", "Bearer tok-1"))
            .and(body_partial_json(serde_json::json!({
                "to": "+49301234567",
                "connection_id": "conn-1",
            })))
            .respond_with(ResponseTemplate::new(202).set_body_json(serde_json::json!({
                "data": {"id": "fax-xyz"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = CurrentProviderClient::new(
            "tok-1",
            "conn-1",
            Some(format!("{}/v2/faxes", server.uri())),
        )
        .unwrap();

        let accepted = client.submit(&submission()).await.unwrap();
        assert_eq!(accepted.fax_id, "fax-xyz");
        assert_eq!(client.kind(), ProviderKind::Current);
    }

    #[tokio::test]
    async fn rejection_surfaces_submission_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
                "message": "destination not faxable"
            })))
            .mount(&server)
            .await;

        let client =
            CurrentProviderClient::new("tok-1", "conn-1", Some(server.uri())).unwrap();
        let err = client.submit(&submission()).await.unwrap_err();
        match err {
            FaxgateError::Submission { message, .. } => {
                assert!(message.contains("destination not faxable"))
            }
            other => panic!("expected Submission, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_success_body_is_a_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(202).set_body_string("not json"))
            .mount(&server)
            .await;

        let client =
            CurrentProviderClient::new("tok-1", "conn-1", Some(server.uri())).unwrap();
        let err = client.submit(&submission()).await.unwrap_err();
        assert!(matches!(err, FaxgateError::Provider { .. }));
    }
}
