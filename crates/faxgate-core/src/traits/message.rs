// SPDX-FileCopyrightText: 2026 Faxgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Host-application collaborator traits: message records, signature images,
//! and rendered documents.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::FaxgateError;
use crate::types::MessageId;

/// The slice of an originating message Faxgate needs for eligibility
/// decisions and delivery bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMessage {
    pub id: MessageId,
    /// Message kind in the host application (`"email"`, `"fax"`, `"post"`, ...).
    pub kind: String,
    /// Replies are never faxed.
    pub is_response: bool,
    /// When the message was originally sent.
    pub sent_at: DateTime<Utc>,
    /// Sender user id, used to look up a stored signature image.
    pub sender_user: Option<String>,
    /// Recipient record id, used to persist normalized fax numbers back.
    pub recipient_id: String,
    /// Recipient fax number as currently stored, possibly unnormalized.
    pub recipient_fax: Option<String>,
    /// Whether the law governing the owning request requires a signature.
    pub law_requires_signature: bool,
}

/// Read/update access to originating messages in the host application.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Look up a message by id. `None` is an expected outcome (the message
    /// may have been deleted between scheduling and execution).
    async fn get_message(&self, id: &MessageId) -> Result<Option<SourceMessage>, FaxgateError>;

    /// All outbound messages of a request sent at or after `since`,
    /// newest last. Used by the bulk submission entry point.
    async fn outbound_messages_of_request(
        &self,
        request_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<SourceMessage>, FaxgateError>;

    /// Persist a normalized (or cleared, when unparseable) fax number back
    /// onto the recipient record.
    async fn update_recipient_fax(
        &self,
        recipient_id: &str,
        number: Option<&str>,
    ) -> Result<(), FaxgateError>;

    /// Mark the message sent after the provider accepted the job.
    async fn mark_sent(
        &self,
        id: &MessageId,
        provider_fax_id: &str,
    ) -> Result<(), FaxgateError>;

    /// Update the message's effective timestamp to the delivery time.
    async fn mark_delivered(
        &self,
        id: &MessageId,
        at: DateTime<Utc>,
    ) -> Result<(), FaxgateError>;
}

/// Stored signature images, keyed by user id.
#[async_trait]
pub trait SignatureStore: Send + Sync {
    async fn has_signature(&self, user: &str) -> Result<bool, FaxgateError>;
}

/// A rendered document ready for the provider to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Access to the rendered PDF for a fax message. Rendering itself is the
/// host application's concern; Faxgate only serves the result through the
/// signed media URL.
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    async fn fetch_document(
        &self,
        message: &MessageId,
    ) -> Result<Option<Document>, FaxgateError>;
}
