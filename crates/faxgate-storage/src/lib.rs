// SPDX-FileCopyrightText: 2026 Faxgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for Faxgate.
//!
//! Provides WAL-mode SQLite with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, and typed operations for fax
//! jobs, delivery status (including the transactional staleness-guarded
//! event upsert), and the persisted retry queue.

pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod store;

pub use database::Database;
pub use models::*;
pub use store::{FaxStore, UpsertOutcome};
