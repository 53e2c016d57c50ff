// SPDX-FileCopyrightText: 2026 Wabridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP control surface for the wabridge WhatsApp bridge.
//!
//! Exposes connection status and diagnostics, operator commands (disconnect,
//! clear session), the two outreach endpoints, the webhook the WhatsApp
//! sidecar pushes its events to, and a public health check.

pub mod auth;
pub mod handlers;
pub mod server;

pub use auth::AuthConfig;
pub use server::{AppState, HealthState, OutreachSettings, ServerConfig, build_router, start_server};
