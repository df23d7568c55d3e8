// SPDX-FileCopyrightText: 2026 Faxgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Faxgate delivery service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::str::FromStr;

use faxgate_core::ProviderKind;
use serde::{Deserialize, Serialize};

/// Top-level Faxgate configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values; provider credentials are checked at serve time.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FaxgateConfig {
    /// Service identity and logging.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Fax-gateway provider credentials and endpoints.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Inbound callback HTTP server.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Retry/backoff policy constants.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Submission eligibility constants.
    #[serde(default)]
    pub submission: SubmissionConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Host-application collaborator endpoints.
    #[serde(default)]
    pub collaborators: CollaboratorsConfig,
}

/// Service identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the service.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "faxgate".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Fax-gateway provider configuration.
///
/// Exactly one provider is configured at a time; `kind` selects which
/// vocabulary, auth scheme, and retry policy apply.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// `"current"` or `"legacy"`.
    #[serde(default = "default_provider_kind")]
    pub kind: String,

    /// Provider account identifier, embedded into signed URL tokens.
    #[serde(default)]
    pub account_id: Option<String>,

    /// API credential: bearer token (current) or auth token (legacy).
    #[serde(default)]
    pub auth_token: Option<String>,

    /// Base64-encoded Ed25519 public key for webhook verification
    /// (current provider only).
    #[serde(default)]
    pub public_key: Option<String>,

    /// Shared secret for signed URL tokens (legacy callbacks, media URLs).
    #[serde(default)]
    pub url_secret: Option<String>,

    /// Source fax number, E.164.
    #[serde(default)]
    pub from_number: String,

    /// Provider application/connection identifier, where the API needs one.
    #[serde(default)]
    pub connection_id: Option<String>,

    /// Override for the provider API endpoint (testing, regional hosts).
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: default_provider_kind(),
            account_id: None,
            auth_token: None,
            public_key: None,
            url_secret: None,
            from_number: String::new(),
            connection_id: None,
            endpoint: None,
        }
    }
}

impl ProviderConfig {
    /// Parsed provider kind. Validation guarantees this succeeds on a
    /// validated config.
    pub fn provider_kind(&self) -> Option<ProviderKind> {
        ProviderKind::from_str(&self.kind).ok()
    }
}

fn default_provider_kind() -> String {
    "current".to_string()
}

/// Inbound callback HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Public base URL used when minting callback and media URLs for the
    /// provider, e.g. `https://fax.example.org`.
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: default_public_url(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8480
}

fn default_public_url() -> String {
    "http://127.0.0.1:8480".to_string()
}

/// Retry/backoff policy constants, kept split by provider variant.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Maximum automatic retries for the current provider.
    #[serde(default = "default_max_retries_current")]
    pub max_retries_current: u32,

    /// Maximum automatic retries for the legacy provider.
    #[serde(default = "default_max_retries_legacy")]
    pub max_retries_legacy: u32,

    /// Base delay in minutes. Current provider backs off exponentially
    /// (`base * 4^retry`); legacy retries at this fixed interval.
    #[serde(default = "default_base_delay_minutes")]
    pub base_delay_minutes: u64,

    /// How often the retry worker polls for due entries.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries_current: default_max_retries_current(),
            max_retries_legacy: default_max_retries_legacy(),
            base_delay_minutes: default_base_delay_minutes(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

fn default_max_retries_current() -> u32 {
    3
}

fn default_max_retries_legacy() -> u32 {
    4
}

fn default_base_delay_minutes() -> u64 {
    15
}

fn default_poll_interval_secs() -> u64 {
    30
}

/// Submission eligibility constants.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SubmissionConfig {
    /// Messages older than this are never auto-faxed; guards against
    /// faxing stale messages on reprocessing.
    #[serde(default = "default_eligibility_window_hours")]
    pub eligibility_window_hours: i64,

    /// Country calling code assumed for nationally formatted fax numbers.
    #[serde(default = "default_country_code")]
    pub default_country_code: String,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            eligibility_window_hours: default_eligibility_window_hours(),
            default_country_code: default_country_code(),
        }
    }
}

fn default_eligibility_window_hours() -> i64 {
    36
}

fn default_country_code() -> String {
    "49".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "faxgate.db".to_string()
}

/// Host-application collaborator API configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CollaboratorsConfig {
    /// Base URL of the host application's collaborator API. `None`
    /// disables serving (library embedders wire their own collaborators).
    #[serde(default)]
    pub base_url: Option<String>,

    /// Bearer token for the collaborator API.
    #[serde(default)]
    pub auth_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_policy_constants() {
        let config = FaxgateConfig::default();
        assert_eq!(config.retry.max_retries_current, 3);
        assert_eq!(config.retry.max_retries_legacy, 4);
        assert_eq!(config.retry.base_delay_minutes, 15);
        assert_eq!(config.submission.eligibility_window_hours, 36);
    }

    #[test]
    fn default_provider_kind_parses() {
        let config = FaxgateConfig::default();
        assert_eq!(
            config.provider.provider_kind(),
            Some(ProviderKind::Current)
        );
    }
}
