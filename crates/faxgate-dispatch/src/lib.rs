// SPDX-FileCopyrightText: 2026 Faxgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Orchestration for the Faxgate delivery service.
//!
//! Three pieces live here, all stateless over the shared store:
//! the callback state machine ([`callback::CallbackProcessor`]), the
//! submission orchestrator ([`submit::Orchestrator`]), and retry
//! scheduling ([`retry`]).

pub mod callback;
pub mod number;
pub mod retry;
pub mod submit;

pub use callback::{CallbackOutcome, CallbackProcessor};
pub use retry::{RetryPolicy, RetryScheduler, RetryWorker};
pub use submit::{
    Actor, Orchestrator, OrchestratorConfig, ResubmitOutcome, SkipReason, SubmitOverrides,
};
