// SPDX-FileCopyrightText: 2026 Faxgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider status vocabulary mapping.
//!
//! Both gateway providers report delivery progress with their own token
//! vocabulary. Everything downstream of this module only sees
//! [`CanonicalStatus`]; the provider split lives here and nowhere else.

use faxgate_core::{CanonicalStatus, FaxgateError, ProviderKind};

/// Translate a provider-specific status token into the canonical enum.
///
/// A token outside the documented vocabulary fails with
/// [`FaxgateError::UnmappableStatus`]. That error must surface to the
/// operator: an unmapped token means the provider changed its contract.
pub fn map_status(
    provider: ProviderKind,
    token: &str,
) -> Result<CanonicalStatus, FaxgateError> {
    let mapped = match provider {
        ProviderKind::Legacy => match token {
            "queued" | "processing" | "sending" => Some(CanonicalStatus::Sending),
            "delivered" | "received" => Some(CanonicalStatus::Received),
            "no-answer" | "busy" => Some(CanonicalStatus::Deferred),
            "failed" | "canceled" => Some(CanonicalStatus::Failed),
            _ => None,
        },
        ProviderKind::Current => match token {
            "failed" => Some(CanonicalStatus::Failed),
            "queued" | "media.processed" => Some(CanonicalStatus::Sending),
            "delivered" => Some(CanonicalStatus::Sent),
            t if t.starts_with("sending") => Some(CanonicalStatus::Sending),
            _ => None,
        },
    };

    mapped.ok_or_else(|| FaxgateError::UnmappableStatus {
        provider,
        token: token.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_vocabulary_maps_totally() {
        let cases = [
            ("queued", CanonicalStatus::Sending),
            ("processing", CanonicalStatus::Sending),
            ("sending", CanonicalStatus::Sending),
            ("delivered", CanonicalStatus::Received),
            ("received", CanonicalStatus::Received),
            ("no-answer", CanonicalStatus::Deferred),
            ("busy", CanonicalStatus::Deferred),
            ("failed", CanonicalStatus::Failed),
            ("canceled", CanonicalStatus::Failed),
        ];
        for (token, expected) in cases {
            assert_eq!(
                map_status(ProviderKind::Legacy, token).unwrap(),
                expected,
                "token {token}"
            );
        }
    }

    #[test]
    fn current_vocabulary_maps_totally() {
        let cases = [
            ("failed", CanonicalStatus::Failed),
            ("queued", CanonicalStatus::Sending),
            ("media.processed", CanonicalStatus::Sending),
            ("delivered", CanonicalStatus::Sent),
        ];
        for (token, expected) in cases {
            assert_eq!(
                map_status(ProviderKind::Current, token).unwrap(),
                expected,
                "token {token}"
            );
        }
    }

    #[test]
    fn current_sending_prefix_maps_to_sending() {
        for token in ["sending", "sending.started", "sending_in_progress"] {
            assert_eq!(
                map_status(ProviderKind::Current, token).unwrap(),
                CanonicalStatus::Sending
            );
        }
    }

    #[test]
    fn delivered_means_received_on_legacy_but_sent_on_current() {
        assert_eq!(
            map_status(ProviderKind::Legacy, "delivered").unwrap(),
            CanonicalStatus::Received
        );
        assert_eq!(
            map_status(ProviderKind::Current, "delivered").unwrap(),
            CanonicalStatus::Sent
        );
    }

    proptest::proptest! {
        // Mapping is total over the documented vocabulary and loud outside
        // it: no input ever falls through to Unknown.
        #[test]
        fn arbitrary_tokens_never_default_to_unknown(token in "\\PC{0,24}") {
            for provider in [ProviderKind::Legacy, ProviderKind::Current] {
                if let Ok(status) = map_status(provider, &token) {
                    proptest::prop_assert_ne!(status, CanonicalStatus::Unknown);
                }
            }
        }
    }

    #[test]
    fn unknown_token_raises_never_defaults() {
        for (provider, token) in [
            (ProviderKind::Legacy, "warming-up"),
            (ProviderKind::Legacy, ""),
            (ProviderKind::Current, "no-answer"),
            (ProviderKind::Current, "canceled"),
            (ProviderKind::Current, "QUEUED"),
        ] {
            let err = map_status(provider, token).unwrap_err();
            match err {
                FaxgateError::UnmappableStatus { provider: p, token: t } => {
                    assert_eq!(p, provider);
                    assert_eq!(t, token);
                }
                other => panic!("expected UnmappableStatus, got {other:?}"),
            }
        }
    }
}
