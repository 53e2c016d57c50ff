// SPDX-FileCopyrightText: 2026 Wabridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the external collaborators.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod client;
pub mod forwarding;

pub use adapter::PluginAdapter;
pub use client::WhatsAppClient;
pub use forwarding::{ForwardingApi, PaymentsApi};
