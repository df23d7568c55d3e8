// SPDX-FileCopyrightText: 2026 Faxgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the legacy provider's fax API.
//!
//! The legacy API is form-encoded with HTTP basic authentication and
//! answers `201 Created` with the assigned fax sid. Kept alive because
//! stored delivery logs and replayed callbacks from the legacy era must
//! remain reconcilable, and the gateway can still be pointed at it.

use std::time::Duration;

use async_trait::async_trait;
use faxgate_core::{
    FaxProvider, FaxSubmission, FaxgateError, ProviderAccepted, ProviderKind,
};
use tracing::debug;

use crate::types::{LegacySubmitResponse, ProviderErrorBody};

const DEFAULT_ENDPOINT: &str = "https://legacy.fax-gateway.example/v1/Faxes";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the legacy provider's form-encoded fax API.
#[derive(Debug, Clone)]
pub struct LegacyProviderClient {
    client: reqwest::Client,
    account_id: String,
    auth_token: String,
    endpoint: String,
}

impl LegacyProviderClient {
    pub fn new(
        account_id: &str,
        auth_token: &str,
        endpoint: Option<String>,
    ) -> Result<Self, FaxgateError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| FaxgateError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            account_id: account_id.to_string(),
            auth_token: auth_token.to_string(),
            endpoint: endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
        })
    }
}

#[async_trait]
impl FaxProvider for LegacyProviderClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Legacy
    }

    async fn submit(&self, request: &FaxSubmission) -> Result<ProviderAccepted, FaxgateError> {
        let form = [
            ("To", request.to.as_str()),
            ("From", request.from.as_str()),
            ("MediaUrl", request.media_url.as_str()),
            ("StatusCallback", request.callback_url.as_str()),
            ("Quality", "standard"),
            ("StoreMedia", "false"),
        ];

        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.account_id, Some(&self.auth_token))
            .form(&form)
            .send()
            .await
            .map_err(|e| FaxgateError::Provider {
                message: format!("fax submission request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, to = %request.to, "legacy submission response received");

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
        let parsed: LegacySubmitResponse =
            serde_json::from_str(&body).map_err(|e| FaxgateError::Provider {
                message: format!("failed to parse submission response: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(ProviderAccepted { fax_id: parsed.sid })
    }
}
