// SPDX-FileCopyrightText: 2026 Faxgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints serde attributes cannot express. Only
//! shape-level constraints live here; presence of provider credentials is
//! checked at serve time so that defaults remain loadable for tooling.

use crate::diagnostic::ConfigError;
use crate::model::FaxgateConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)`
/// with all collected validation errors (does not fail fast).
pub fn validate_config(config: &FaxgateConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.provider.provider_kind().is_none() {
        errors.push(ConfigError::Validation {
            message: format!(
                "provider.kind must be `current` or `legacy`, got `{}`",
                config.provider.kind
            ),
        });
    }

    if !config.provider.from_number.is_empty() && !config.provider.from_number.starts_with('+') {
        errors.push(ConfigError::Validation {
            message: format!(
                "provider.from_number must be E.164 (start with `+`), got `{}`",
                config.provider.from_number
            ),
        });
    }

    let host = config.gateway.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "gateway.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("gateway.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    if config.gateway.public_url.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "gateway.public_url must not be empty".to_string(),
        });
    }

    if config.retry.base_delay_minutes == 0 {
        errors.push(ConfigError::Validation {
            message: "retry.base_delay_minutes must be at least 1".to_string(),
        });
    }

    if config.retry.poll_interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "retry.poll_interval_secs must be at least 1".to_string(),
        });
    }

    if config.submission.eligibility_window_hours < 1 {
        errors.push(ConfigError::Validation {
            message: format!(
                "submission.eligibility_window_hours must be at least 1, got {}",
                config.submission.eligibility_window_hours
            ),
        });
    }

    if !config
        .submission
        .default_country_code
        .chars()
        .all(|c| c.is_ascii_digit())
        || config.submission.default_country_code.is_empty()
    {
        errors.push(ConfigError::Validation {
            message: format!(
                "submission.default_country_code must be digits, got `{}`",
                config.submission.default_country_code
            ),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
