// SPDX-FileCopyrightText: 2026 Faxgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Faxgate delivery service.
//!
//! This crate provides the error taxonomy, canonical domain types, and the
//! collaborator traits the rest of the workspace is written against. The
//! host application (message store, signature images, problem reports) and
//! the fax gateway (submission client) both plug in through traits defined
//! here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{AuthFailure, FaxgateError};
pub use types::{
    CanonicalStatus, DeliveryStatus, EventMetadata, FaxJob, FaxJobId, MessageId,
    ProviderEvent, ProviderKind,
};

pub use traits::{
    AttachmentStore, Document, FaxProvider, FaxSubmission, MessageStore, ProblemReporter,
    ProviderAccepted, SignatureStore, SourceMessage,
};
