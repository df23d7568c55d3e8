// SPDX-FileCopyrightText: 2026 Faxgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound fax-gateway API clients.
//!
//! One client per provider generation, both implementing
//! [`faxgate_core::FaxProvider`]. Which one is constructed is decided
//! once, from configuration, at wiring time.

pub mod current;
pub mod legacy;
pub mod types;

pub use current::CurrentProviderClient;
pub use legacy::LegacyProviderClient;
