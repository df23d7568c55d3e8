// SPDX-FileCopyrightText: 2026 Faxgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for the Faxgate workspace: mock collaborators and an
//! end-to-end harness over temp SQLite. Not shipped; dev-dependency only.

pub mod harness;
pub mod mocks;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mocks::{
    MockAttachmentStore, MockFaxProvider, MockMessageStore, MockProblemReporter,
    MockSignatureStore,
};
