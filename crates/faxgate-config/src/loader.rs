// SPDX-FileCopyrightText: 2026 Faxgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports the XDG hierarchy: `./faxgate.toml` > `~/.config/faxgate/faxgate.toml`
//! > `/etc/faxgate/faxgate.toml` with environment variable overrides via
//! the `FAXGATE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::FaxgateConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/faxgate/faxgate.toml` (system-wide)
/// 3. `~/.config/faxgate/faxgate.toml` (user XDG config)
/// 4. `./faxgate.toml` (local directory)
/// 5. `FAXGATE_*` environment variables
pub fn load_config() -> Result<FaxgateConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<FaxgateConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FaxgateConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<FaxgateConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FaxgateConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for
/// diagnostic use).
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(FaxgateConfig::default()))
        .merge(Toml::file("/etc/faxgate/faxgate.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("faxgate/faxgate.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("faxgate.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// CRITICAL: uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity
/// with underscore-containing key names. `FAXGATE_PROVIDER_AUTH_TOKEN`
/// must map to `provider.auth_token`, not `provider.auth.token`.
fn env_provider() -> Env {
    Env::prefixed("FAXGATE_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: FAXGATE_PROVIDER_AUTH_TOKEN -> "provider_auth_token"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("provider_", "provider.", 1)
            .replacen("gateway_", "gateway.", 1)
            .replacen("retry_", "retry.", 1)
            .replacen("submission_", "submission.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("collaborators_", "collaborators.", 1);
        mapped.into()
    })
}
