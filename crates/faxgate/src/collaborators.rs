// SPDX-FileCopyrightText: 2026 Faxgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! REST-backed collaborator clients.
//!
//! The message store, signature images, rendered documents, and problem
//! reports all live in the host application; this module binds the
//! collaborator traits to its HTTP API so the standalone binary can run
//! against it. Library embedders skip this entirely and implement the
//! traits in-process.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use faxgate_core::{
    AttachmentStore, Document, FaxgateError, MessageId, MessageStore, ProblemReporter,
    SignatureStore, SourceMessage,
};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Wire shape of a message record in the host application's API.
#[derive(Debug, Deserialize)]
struct MessageDto {
    id: String,
    kind: String,
    is_response: bool,
    sent_at: DateTime<Utc>,
    #[serde(default)]
    sender_user: Option<String>,
    recipient_id: String,
    #[serde(default)]
    recipient_fax: Option<String>,
    law_requires_signature: bool,
}

impl From<MessageDto> for SourceMessage {
    fn from(dto: MessageDto) -> Self {
        SourceMessage {
            id: MessageId(dto.id),
            kind: dto.kind,
            is_response: dto.is_response,
            sent_at: dto.sent_at,
            sender_user: dto.sender_user,
            recipient_id: dto.recipient_id,
            recipient_fax: dto.recipient_fax,
            law_requires_signature: dto.law_requires_signature,
        }
    }
}

#[derive(Debug, Serialize)]
struct RecipientFaxUpdate<'a> {
    number: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct MarkSentBody<'a> {
    fax_id: &'a str,
}

#[derive(Debug, Serialize)]
struct MarkDeliveredBody {
    at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct ProblemBody<'a> {
    description: &'a str,
}

/// One client implementing all four collaborator traits against the host
/// application's REST API.
#[derive(Debug, Clone)]
pub struct RestCollaborators {
    client: reqwest::Client,
    base_url: String,
}

impl RestCollaborators {
    pub fn new(base_url: &str, auth_token: Option<&str>) -> Result<Self, FaxgateError> {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(token) = auth_token {
            let value = reqwest::header::HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| {
                    FaxgateError::Config(format!("invalid collaborators.auth_token: {e}"))
                })?;
            headers.insert("authorization", value);
        }
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| FaxgateError::Collaborator {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn check(
        &self,
        response: reqwest::Response,
        context: &str,
    ) -> Result<reqwest::Response, FaxgateError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(FaxgateError::Collaborator {
                message: format!("{context} returned {status}"),
                source: None,
            })
        }
    }

    fn transport(e: reqwest::Error, context: &str) -> FaxgateError {
        FaxgateError::Collaborator {
            message: format!("{context} failed: {e}"),
            source: Some(Box::new(e)),
        }
    }
}

#[async_trait]
impl MessageStore for RestCollaborators {
    async fn get_message(&self, id: &MessageId) -> Result<Option<SourceMessage>, FaxgateError> {
        let response = self
            .client
            .get(self.url(&format!("/messages/{id}")))
            .send()
            .await
            .map_err(|e| Self::transport(e, "message lookup"))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = self.check(response, "message lookup").await?;
        let dto: MessageDto = response
            .json()
            .await
            .map_err(|e| Self::transport(e, "message decode"))?;
        Ok(Some(dto.into()))
    }

    async fn outbound_messages_of_request(
        &self,
        request_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<SourceMessage>, FaxgateError> {
        let response = self
            .client
            .get(self.url(&format!("/requests/{request_id}/messages")))
            .query(&[("since", since.to_rfc3339())])
            .send()
            .await
            .map_err(|e| Self::transport(e, "request messages lookup"))?;
        let response = self.check(response, "request messages lookup").await?;
        let dtos: Vec<MessageDto> = response
            .json()
            .await
            .map_err(|e| Self::transport(e, "request messages decode"))?;
        Ok(dtos.into_iter().map(SourceMessage::from).collect())
    }

    async fn update_recipient_fax(
        &self,
        recipient_id: &str,
        number: Option<&str>,
    ) -> Result<(), FaxgateError> {
        debug!(recipient_id, ?number, "persisting normalized fax number");
        let response = self
            .client
            .put(self.url(&format!("/recipients/{recipient_id}/fax")))
            .json(&RecipientFaxUpdate { number })
            .send()
            .await
            .map_err(|e| Self::transport(e, "recipient update"))?;
        self.check(response, "recipient update").await?;
        Ok(())
    }

    async fn mark_sent(&self, id: &MessageId, provider_fax_id: &str) -> Result<(), FaxgateError> {
        let response = self
            .client
            .post(self.url(&format!("/messages/{id}/sent")))
            .json(&MarkSentBody {
                fax_id: provider_fax_id,
            })
            .send()
            .await
            .map_err(|e| Self::transport(e, "mark sent"))?;
        self.check(response, "mark sent").await?;
        Ok(())
    }

    async fn mark_delivered(&self, id: &MessageId, at: DateTime<Utc>) -> Result<(), FaxgateError> {
        let response = self
            .client
            .post(self.url(&format!("/messages/{id}/delivered")))
            .json(&MarkDeliveredBody { at })
            .send()
            .await
            .map_err(|e| Self::transport(e, "mark delivered"))?;
        self.check(response, "mark delivered").await?;
        Ok(())
    }
}

#[async_trait]
impl SignatureStore for RestCollaborators {
    async fn has_signature(&self, user: &str) -> Result<bool, FaxgateError> {
        let response = self
            .client
            .get(self.url(&format!("/signatures/{user}")))
            .send()
            .await
            .map_err(|e| Self::transport(e, "signature lookup"))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        self.check(response, "signature lookup").await?;
        Ok(true)
    }
}

#[async_trait]
impl AttachmentStore for RestCollaborators {
    async fn fetch_document(&self, message: &MessageId) -> Result<Option<Document>, FaxgateError> {
        let response = self
            .client
            .get(self.url(&format!("/messages/{message}/document")))
            .send()
            .await
            .map_err(|e| Self::transport(e, "document fetch"))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = self.check(response, "document fetch").await?;
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/pdf")
            .to_string();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Self::transport(e, "document read"))?;
        Ok(Some(Document {
            content_type,
            bytes: bytes.to_vec(),
        }))
    }
}

#[async_trait]
impl ProblemReporter for RestCollaborators {
    async fn report(&self, message: &MessageId, description: &str) -> Result<(), FaxgateError> {
        let response = self
            .client
            .post(self.url(&format!("/messages/{message}/problem")))
            .json(&ProblemBody { description })
            .send()
            .await
            .map_err(|e| Self::transport(e, "problem report"))?;
        self.check(response, "problem report").await?;
        Ok(())
    }

    async fn resolve(&self, message: &MessageId) -> Result<(), FaxgateError> {
        let response = self
            .client
            .delete(self.url(&format!("/messages/{message}/problem")))
            .send()
            .await
            .map_err(|e| Self::transport(e, "problem resolve"))?;
        // Nothing to resolve is fine.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        self.check(response, "problem resolve").await?;
        Ok(())
    }
}
