// SPDX-FileCopyrightText: 2026 Faxgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Faxgate delivery service.

use thiserror::Error;

use crate::types::ProviderKind;

/// Why a webhook failed authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// Timestamp or signature header was absent from the request.
    MissingFields,
    /// The signature did not verify against the configured key.
    InvalidSignature,
}

impl std::fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthFailure::MissingFields => write!(f, "missing timestamp or signature"),
            AuthFailure::InvalidSignature => write!(f, "signature mismatch"),
        }
    }
}

/// The primary error type used across all Faxgate crates.
///
/// Stale events and ineligible submissions are deliberately NOT errors:
/// they are expected outcomes modeled as values (`CallbackOutcome::Stale`,
/// `Ok(None)` from the orchestrator).
#[derive(Debug, Error)]
pub enum FaxgateError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Webhook authentication failed. Callers must reject the request
    /// without touching any state.
    #[error("webhook authentication failed: {failure}")]
    Auth { failure: AuthFailure },

    /// A callback referenced a provider fax id no known job matches.
    #[error("no fax job matches provider id {external_id}")]
    UnknownJob { external_id: String },

    /// The provider sent a status token outside the documented vocabulary.
    /// Indicates provider contract drift and must never be swallowed.
    #[error("unmappable {provider} status token: {token}")]
    UnmappableStatus {
        provider: ProviderKind,
        token: String,
    },

    /// The provider rejected an outbound fax submission.
    #[error("fax submission failed: {message}")]
    Submission {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Storage backend errors (database connection, query failure, migration).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Transport-level provider errors (connect failure, timeout, bad response body).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A collaborator (message store, problem reporter, ...) failed.
    #[error("collaborator error: {message}")]
    Collaborator {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl FaxgateError {
    /// Shorthand for an authentication failure with missing headers.
    pub fn missing_auth_fields() -> Self {
        FaxgateError::Auth {
            failure: AuthFailure::MissingFields,
        }
    }

    /// Shorthand for an authentication failure with a bad signature.
    pub fn invalid_signature() -> Self {
        FaxgateError::Auth {
            failure: AuthFailure::InvalidSignature,
        }
    }
}
