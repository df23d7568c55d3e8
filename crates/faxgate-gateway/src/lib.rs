// SPDX-FileCopyrightText: 2026 Faxgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound HTTP gateway for the Faxgate delivery service.
//!
//! Terminates the wire protocol: signature-verified JSON callbacks from
//! the current provider, token-authenticated form callbacks from the
//! legacy provider, and the signed media URL the provider fetches the
//! rendered document from. All state changes go through
//! [`faxgate_dispatch::CallbackProcessor`].

pub mod handlers;
pub mod server;

pub use server::{GatewayState, ServerConfig, router, start_server};
