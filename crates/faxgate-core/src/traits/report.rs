// SPDX-FileCopyrightText: 2026 Faxgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Problem-report collaborator trait.

use async_trait::async_trait;

use crate::error::FaxgateError;
use crate::types::MessageId;

/// Flags permanent delivery failures for human follow-up and resolves
/// them once a later attempt succeeds.
#[async_trait]
pub trait ProblemReporter: Send + Sync {
    /// Raise a delivery-failure report for the message. `description`
    /// carries the accumulated delivery log as diagnostic detail.
    async fn report(
        &self,
        message: &MessageId,
        description: &str,
    ) -> Result<(), FaxgateError>;

    /// Resolve any open delivery-problem report for the message.
    async fn resolve(&self, message: &MessageId) -> Result<(), FaxgateError>;
}
