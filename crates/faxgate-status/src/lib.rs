// SPDX-FileCopyrightText: 2026 Faxgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Status vocabulary mapping and the delivery event log.
//!
//! This crate is pure: no I/O, no storage. The callback handler feeds it
//! parsed webhook events and stores whatever it returns.

pub mod log;
pub mod mapper;

pub use log::{DeliveryLog, EventRecord, ParsedLegacyLog, StructuredLog, merge, parse_legacy_text};
pub use mapper::map_status;
