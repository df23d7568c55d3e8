// SPDX-FileCopyrightText: 2026 Faxgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authentication primitives for provider callbacks and signed URLs.
//!
//! The current provider signs webhook bodies with an Ed25519 key; the
//! legacy provider carries no signature headers, so its callbacks (and the
//! media URLs both providers fetch documents from) are authenticated by a
//! shared-secret HMAC token embedded in the URL path.

pub mod token;
pub mod webhook;

pub use token::UrlTokenSigner;
pub use webhook::WebhookVerifier;
