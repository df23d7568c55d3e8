// SPDX-FileCopyrightText: 2026 Faxgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ed25519 verification of current-provider webhook callbacks.
//!
//! The provider signs `"{timestamp}|" + raw_body` with its private key and
//! sends the base64 signature plus the timestamp in two request headers.
//! The concatenation is byte-exact: the timestamp header value is used as
//! received, never re-parsed or re-formatted before verification.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use ed25519_dalek::{Signature, VerifyingKey};
use faxgate_core::FaxgateError;

/// Verifies that an inbound callback originates from the configured
/// provider. Pure check: no side effects, callers must reject the request
/// and mutate nothing when it fails.
#[derive(Clone)]
pub struct WebhookVerifier {
    public_key: VerifyingKey,
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("public_key", &hex::encode(self.public_key.to_bytes()))
            .finish()
    }
}

impl WebhookVerifier {
    /// Build a verifier from the provider's base64-encoded public key.
    pub fn from_base64(key: &str) -> Result<Self, FaxgateError> {
        let bytes = BASE64
            .decode(key.trim())
            .map_err(|e| FaxgateError::Config(format!("provider.public_key is not base64: {e}")))?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|_| {
            FaxgateError::Config("provider.public_key must decode to 32 bytes".to_string())
        })?;
        let public_key = VerifyingKey::from_bytes(&bytes)
            .map_err(|e| FaxgateError::Config(format!("invalid provider public key: {e}")))?;
        Ok(Self { public_key })
    }

    pub fn from_key(public_key: VerifyingKey) -> Self {
        Self { public_key }
    }

    /// Verify a callback against its timestamp and signature header values.
    ///
    /// Fails with `MissingFields` when either header is absent and
    /// `InvalidSignature` on any decode or verification failure.
    pub fn verify(
        &self,
        raw_body: &[u8],
        timestamp: Option<&str>,
        signature: Option<&str>,
    ) -> Result<(), FaxgateError> {
        let (timestamp, signature) = match (timestamp, signature) {
            (Some(t), Some(s)) => (t, s),
            _ => return Err(FaxgateError::missing_auth_fields()),
        };

        let sig_bytes = BASE64
            .decode(signature)
            .map_err(|_| FaxgateError::invalid_signature())?;
        let sig_bytes: [u8; 64] = sig_bytes
            .try_into()
            .map_err(|_| FaxgateError::invalid_signature())?;
        let signature = Signature::from_bytes(&sig_bytes);

        let mut payload = Vec::with_capacity(timestamp.len() + 1 + raw_body.len());
        payload.extend_from_slice(timestamp.as_bytes());
        payload.push(b'|');
        payload.extend_from_slice(raw_body);

        self.public_key
            .verify_strict(&payload, &signature)
            .map_err(|_| FaxgateError::invalid_signature())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};
    use faxgate_core::AuthFailure;
    use rand::rngs::OsRng;

    fn keypair() -> (SigningKey, WebhookVerifier) {
        let signing = SigningKey::generate(&mut OsRng);
        let verifier = WebhookVerifier::from_key(VerifyingKey::from(&signing));
        (signing, verifier)
    }

    fn sign(signing: &SigningKey, timestamp: &str, body: &[u8]) -> String {
        let mut payload = timestamp.as_bytes().to_vec();
        payload.push(b'|');
        payload.extend_from_slice(body);
        BASE64.encode(signing.sign(&payload).to_bytes())
    }

    #[test]
    fn valid_signature_verifies() {
        let (signing, verifier) = keypair();
        let body = br#"{"data":{"payload":{"status":"delivered"}}}"#;
        let sig = sign(&signing, "1714000000", body);
        assert!(verifier
            .verify(body, Some("1714000000"), Some(&sig))
            .is_ok());
    }

    #[test]
    fn tampered_body_is_rejected() {
        let (signing, verifier) = keypair();
        let sig = sign(&signing, "1714000000", b"original body");
        let err = verifier
            .verify(b"tampered body", Some("1714000000"), Some(&sig))
            .unwrap_err();
        assert!(matches!(
            err,
            FaxgateError::Auth {
                failure: AuthFailure::InvalidSignature
            }
        ));
    }

    #[test]
    fn tampered_timestamp_is_rejected() {
        let (signing, verifier) = keypair();
        let body = b"body";
        let sig = sign(&signing, "1714000000", body);
        assert!(verifier.verify(body, Some("1714000099"), Some(&sig)).is_err());
    }

    #[test]
    fn missing_headers_fail_with_missing_fields() {
        let (signing, verifier) = keypair();
        let body = b"body";
        let sig = sign(&signing, "1714000000", body);
        for (ts, s) in [
            (None, Some(sig.as_str())),
            (Some("1714000000"), None),
            (None, None),
        ] {
            let err = verifier.verify(body, ts, s).unwrap_err();
            assert!(matches!(
                err,
                FaxgateError::Auth {
                    failure: AuthFailure::MissingFields
                }
            ));
        }
    }

    #[test]
    fn garbage_signature_is_invalid_not_missing() {
        let (_, verifier) = keypair();
        for sig in ["%%%not-base64%%%", "c2hvcnQ="] {
            let err = verifier
                .verify(b"body", Some("1714000000"), Some(sig))
                .unwrap_err();
            assert!(matches!(
                err,
                FaxgateError::Auth {
                    failure: AuthFailure::InvalidSignature
                }
            ));
        }
    }

    #[test]
    fn signature_from_another_key_is_rejected() {
        let (other_signing, _) = keypair();
        let (_, verifier) = keypair();
        let body = b"body";
        let sig = sign(&other_signing, "1714000000", body);
        assert!(verifier.verify(body, Some("1714000000"), Some(&sig)).is_err());
    }

    #[test]
    fn from_base64_rejects_wrong_length_keys() {
        assert!(WebhookVerifier::from_base64("AAAA").is_err());
        assert!(WebhookVerifier::from_base64("!!!").is_err());
    }
}
