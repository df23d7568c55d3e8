// SPDX-FileCopyrightText: 2026 Faxgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Faxgate workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier for a fax job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FaxJobId(pub String);

impl std::fmt::Display for FaxJobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the originating message in the host application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which fax-gateway provider a credential set, vocabulary, or event belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// The original provider: form-encoded callbacks, signed-URL-token auth.
    Legacy,
    /// The current provider: JSON callbacks, Ed25519 header signatures.
    Current,
}

/// The small unified status enum both provider vocabularies map into.
///
/// Progression: `Unknown -> Sending -> {Sent, Deferred, Failed}`,
/// `Sent -> Received`, `Deferred -> Sending | Failed` via retry or
/// exhaustion. `Sent`, `Received`, and `Failed` are terminal for retry
/// scheduling; `Failed` may still be resent manually as a new job.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CanonicalStatus {
    Unknown,
    Sending,
    Sent,
    Received,
    Deferred,
    Failed,
}

impl CanonicalStatus {
    /// No further automatic retries fire from these states.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CanonicalStatus::Sent | CanonicalStatus::Received | CanonicalStatus::Failed
        )
    }

    /// The fax reached the remote station.
    pub fn is_delivered(&self) -> bool {
        matches!(self, CanonicalStatus::Sent | CanonicalStatus::Received)
    }
}

/// One outbound fax attempt tied to an originating message.
///
/// At most one active (non-terminal) job exists per originating message;
/// re-sends start a new job chain rather than duplicating an active one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaxJob {
    pub id: FaxJobId,
    pub message_id: MessageId,
    /// Recipient fax number in E.164 form.
    pub recipient_number: String,
    /// Provider-assigned external id; `None` until submission succeeds.
    pub provider_fax_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Canonical delivery state, one-to-one with a [`FaxJob`].
///
/// `last_update` is monotonically non-decreasing: events older than it
/// are rejected as stale rather than merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryStatus {
    pub job_id: FaxJobId,
    pub status: CanonicalStatus,
    pub last_update: DateTime<Utc>,
    pub retry_count: u32,
    /// Raw stored log: either legacy free text or a structured JSON record.
    pub log: String,
}

/// Optional callback metadata shared by both provider vocabularies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    pub from: Option<String>,
    pub to: Option<String>,
    pub page_count: Option<u32>,
    pub call_duration_secs: Option<u32>,
    pub failure_reason: Option<String>,
    pub remote_station_id: Option<String>,
    pub bit_rate: Option<u32>,
}

/// A single parsed webhook payload. Ephemeral: never persisted as its own
/// row, only folded into the delivery log.
#[derive(Debug, Clone)]
pub struct ProviderEvent {
    pub provider: ProviderKind,
    /// Provider-specific status token, e.g. `"delivered"` or `"no-answer"`.
    pub status_token: String,
    /// Provider-assigned fax id carried in the payload, if any.
    pub fax_id: Option<String>,
    /// Originating message id, resolved from a signed legacy callback URL.
    pub message_id: Option<MessageId>,
    /// Provider timestamp of the event; drives the staleness guard.
    pub occurred_at: DateTime<Utc>,
    pub metadata: EventMetadata,
    /// Raw key/value view of a legacy form-encoded callback, in arrival
    /// order, used for free-text logging. Empty for current-provider events.
    pub raw_fields: Vec<(String, String)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn canonical_status_display_and_parse_round_trip() {
        let variants = [
            CanonicalStatus::Unknown,
            CanonicalStatus::Sending,
            CanonicalStatus::Sent,
            CanonicalStatus::Received,
            CanonicalStatus::Deferred,
            CanonicalStatus::Failed,
        ];
        for variant in &variants {
            let s = variant.to_string();
            let parsed = CanonicalStatus::from_str(&s).expect("should parse back");
            assert_eq!(*variant, parsed);
        }
    }

    #[test]
    fn terminal_states_are_exactly_sent_received_failed() {
        assert!(CanonicalStatus::Sent.is_terminal());
        assert!(CanonicalStatus::Received.is_terminal());
        assert!(CanonicalStatus::Failed.is_terminal());
        assert!(!CanonicalStatus::Unknown.is_terminal());
        assert!(!CanonicalStatus::Sending.is_terminal());
        assert!(!CanonicalStatus::Deferred.is_terminal());
    }

    #[test]
    fn delivered_excludes_failed() {
        assert!(CanonicalStatus::Sent.is_delivered());
        assert!(CanonicalStatus::Received.is_delivered());
        assert!(!CanonicalStatus::Failed.is_delivered());
    }

    #[test]
    fn provider_kind_serializes_lowercase() {
        let json = serde_json::to_string(&ProviderKind::Current).unwrap();
        assert_eq!(json, r#""current""#);
        let parsed: ProviderKind = serde_json::from_str(r#""legacy""#).unwrap();
        assert_eq!(parsed, ProviderKind::Legacy);
    }

    #[test]
    fn status_serializes_lowercase_for_storage() {
        assert_eq!(CanonicalStatus::Sending.to_string(), "sending");
        assert_eq!(
            CanonicalStatus::from_str("deferred").unwrap(),
            CanonicalStatus::Deferred
        );
        assert!(CanonicalStatus::from_str("bogus").is_err());
    }
}
