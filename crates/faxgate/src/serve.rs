// SPDX-FileCopyrightText: 2026 Faxgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `faxgate serve` command implementation.
//!
//! Wires configuration into the full stack: SQLite store, provider
//! client, REST collaborators, submission orchestrator, callback
//! processor, retry worker, and the callback gateway. Runs until ctrl-c.

use std::sync::Arc;
use std::time::Duration;

use faxgate_auth::{UrlTokenSigner, WebhookVerifier};
use faxgate_config::FaxgateConfig;
use faxgate_core::{FaxProvider, FaxgateError, ProviderKind};
use faxgate_dispatch::{
    CallbackProcessor, Orchestrator, OrchestratorConfig, RetryPolicy, RetryWorker,
};
use faxgate_gateway::{GatewayState, ServerConfig};
use faxgate_provider::{CurrentProviderClient, LegacyProviderClient};
use faxgate_storage::FaxStore;
use tracing::{error, info};

use crate::collaborators::RestCollaborators;

/// Initialize the tracing subscriber from the configured log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn require<'a>(value: &'a Option<String>, key: &str) -> Result<&'a str, FaxgateError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| FaxgateError::Config(format!("{key} is required for `faxgate serve`")))
}

/// Build the provider client selected by `provider.kind`.
fn build_provider(config: &FaxgateConfig) -> Result<Arc<dyn FaxProvider>, FaxgateError> {
    let provider = &config.provider;
    let kind = provider
        .provider_kind()
        .ok_or_else(|| FaxgateError::Config(format!("unknown provider.kind `{}`", provider.kind)))?;
    let auth_token = require(&provider.auth_token, "provider.auth_token")?;

    let client: Arc<dyn FaxProvider> = match kind {
        ProviderKind::Current => {
            let connection_id = require(&provider.connection_id, "provider.connection_id")?;
            Arc::new(CurrentProviderClient::new(
                auth_token,
                connection_id,
                provider.endpoint.clone(),
            )?)
        }
        ProviderKind::Legacy => {
            let account_id = require(&provider.account_id, "provider.account_id")?;
            Arc::new(LegacyProviderClient::new(
                account_id,
                auth_token,
                provider.endpoint.clone(),
            )?)
        }
    };
    Ok(client)
}

/// Runs the `faxgate serve` command.
pub async fn run_serve(config: FaxgateConfig) -> Result<(), FaxgateError> {
    init_tracing(&config.agent.log_level);
    info!("starting faxgate serve");

    let kind = config
        .provider
        .provider_kind()
        .ok_or_else(|| FaxgateError::Config(format!("unknown provider.kind `{}`", config.provider.kind)))?;

    // Serve-time credential checks; kept out of config validation so that
    // defaults stay loadable for tooling.
    if config.provider.from_number.is_empty() {
        return Err(FaxgateError::Config(
            "provider.from_number is required for `faxgate serve`".to_string(),
        ));
    }
    let url_secret = require(&config.provider.url_secret, "provider.url_secret")?;
    let account_id = require(&config.provider.account_id, "provider.account_id")?;
    let collaborators_url =
        require(&config.collaborators.base_url, "collaborators.base_url")?;

    let verifier = match kind {
        ProviderKind::Current => {
            let public_key = require(&config.provider.public_key, "provider.public_key")?;
            Some(Arc::new(WebhookVerifier::from_base64(public_key)?))
        }
        ProviderKind::Legacy => None,
    };

    let store = FaxStore::open(&config.storage.database_path).await?;
    info!(path = %config.storage.database_path, "store opened");

    let collaborators = Arc::new(RestCollaborators::new(
        collaborators_url,
        config.collaborators.auth_token.as_deref(),
    )?);

    let provider = build_provider(&config)?;
    let tokens = UrlTokenSigner::new(url_secret, account_id)?;

    let orchestrator = Arc::new(Orchestrator::new(
        store.clone(),
        collaborators.clone(),
        collaborators.clone(),
        provider,
        tokens.clone(),
        OrchestratorConfig {
            public_url: config.gateway.public_url.clone(),
            from_number: config.provider.from_number.clone(),
            connection_id: config.provider.connection_id.clone(),
            eligibility_window_hours: config.submission.eligibility_window_hours,
            default_country_code: config.submission.default_country_code.clone(),
        },
    ));

    let policy = match kind {
        ProviderKind::Current => RetryPolicy::new(
            kind,
            config.retry.max_retries_current,
            config.retry.base_delay_minutes,
        ),
        ProviderKind::Legacy => RetryPolicy::new(
            kind,
            config.retry.max_retries_legacy,
            config.retry.base_delay_minutes,
        ),
    };

    let processor = Arc::new(CallbackProcessor::new(
        store.clone(),
        collaborators.clone(),
        collaborators.clone(),
        policy,
    ));

    let worker = RetryWorker::new(
        store.clone(),
        orchestrator,
        Duration::from_secs(config.retry.poll_interval_secs),
    );
    let worker_handle = worker.spawn();
    info!(
        poll_interval_secs = config.retry.poll_interval_secs,
        "retry worker running"
    );

    let server_config = ServerConfig {
        host: config.gateway.host.clone(),
        port: config.gateway.port,
    };
    let state = GatewayState {
        processor,
        verifier,
        tokens,
        attachments: collaborators,
    };
    let server_handle = tokio::spawn(async move {
        if let Err(e) = faxgate_gateway::start_server(&server_config, state).await {
            error!(error = %e, "gateway server exited");
        }
    });

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| FaxgateError::Internal(format!("failed to listen for ctrl-c: {e}")))?;
    info!("shutdown requested");

    server_handle.abort();
    worker_handle.abort();
    Ok(())
}
