// SPDX-FileCopyrightText: 2026 Wabridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for wabridge integration tests.
//!
//! Provides mock adapters and a supervisor harness for fast, deterministic
//! tests without a WhatsApp sidecar or a Django backend.
//!
//! # Components
//!
//! - [`MockWhatsAppClient`] - Scriptable WhatsApp client with event injection and call capture
//! - [`MockForwarder`] - Forwarding and Payments API double that records every request
//! - [`TestHarness`] - A running [`Supervisor`](wabridge_agent::Supervisor) wired to both mocks

pub mod harness;
pub mod mock_client;
pub mod mock_forwarder;

pub use harness::TestHarness;
pub use mock_client::{ClientCall, MockWhatsAppClient};
pub use mock_forwarder::MockForwarder;
