// SPDX-FileCopyrightText: 2026 Wabridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the wabridge WhatsApp bridge.
//!
//! This crate provides the collaborator traits, the error type, and the
//! domain types shared by the supervisor, the HTTP adapters and the gateway.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::WabridgeError;
pub use types::{AdapterType, ChatId, ClientEvent, ClientState, ConnectionState, HealthStatus};

pub use traits::{ForwardingApi, PaymentsApi, PluginAdapter, WhatsAppClient};
