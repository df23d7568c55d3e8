// SPDX-FileCopyrightText: 2026 Faxgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! Everything Faxgate consumes from the host application (message records,
//! signature images, rendered documents, problem reports) and from the fax
//! gateway (outbound submission) is specified here as a trait, keeping the
//! delivery core free of host-application coupling.

pub mod message;
pub mod provider;
pub mod report;

pub use message::{AttachmentStore, Document, MessageStore, SignatureStore, SourceMessage};
pub use provider::{FaxProvider, FaxSubmission, ProviderAccepted};
pub use report::ProblemReporter;
