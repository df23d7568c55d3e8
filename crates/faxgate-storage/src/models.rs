// SPDX-FileCopyrightText: 2026 Faxgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage entity types.
//!
//! The canonical domain types live in `faxgate-core::types`; this module
//! re-exports them for convenience and adds the retry-queue row type that
//! only storage and the retry worker ever see.

pub use faxgate_core::types::{CanonicalStatus, DeliveryStatus, FaxJob, FaxJobId, MessageId};

/// One scheduled re-submission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryEntry {
    pub id: i64,
    pub job_id: String,
    /// RFC 3339; the worker claims entries whose `due_at` has passed.
    pub due_at: String,
    /// `pending`, `processing`, or `completed`.
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}
