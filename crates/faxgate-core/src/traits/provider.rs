// SPDX-FileCopyrightText: 2026 Faxgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound fax-gateway client trait.

use async_trait::async_trait;

use crate::error::FaxgateError;
use crate::types::ProviderKind;

/// One outbound submission to the fax gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaxSubmission {
    /// Recipient fax number, E.164.
    pub to: String,
    /// Source fax number, E.164.
    pub from: String,
    /// Publicly fetchable signed URL to the rendered document.
    pub media_url: String,
    /// URL the provider posts delivery-status callbacks to.
    pub callback_url: String,
    /// Provider application/connection identifier, where the API requires one.
    pub connection_id: Option<String>,
}

/// The provider accepted the job and assigned it an external id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderAccepted {
    pub fax_id: String,
}

/// Client for the configured fax-gateway API.
///
/// `submit` must either return the provider-assigned id on an HTTP-level
/// "accepted" response or fail with [`FaxgateError::Submission`]; it never
/// retries internally. Network I/O carries a request timeout.
#[async_trait]
pub trait FaxProvider: Send + Sync {
    /// Which vocabulary and credential set this client speaks.
    fn kind(&self) -> ProviderKind;

    /// Submit one fax job to the gateway.
    async fn submit(&self, request: &FaxSubmission) -> Result<ProviderAccepted, FaxgateError>;
}
