// SPDX-FileCopyrightText: 2026 Faxgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the two provider submission APIs.

use serde::{Deserialize, Serialize};

/// JSON body for a current-provider submission.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentSubmitRequest<'a> {
    pub connection_id: &'a str,
    pub to: &'a str,
    pub from: &'a str,
    pub media_url: &'a str,
    pub webhook_url: &'a str,
}

/// Successful current-provider submission response.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentSubmitResponse {
    pub data: CurrentSubmitData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentSubmitData {
    /// Provider-assigned fax id.
    pub id: String,
}

/// Successful legacy-provider submission response.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacySubmitResponse {
    /// Provider-assigned fax sid.
    pub sid: String,
}

/// Error body both APIs return on rejection; free-form, best effort.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}
