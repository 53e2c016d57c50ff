// SPDX-FileCopyrightText: 2026 Wabridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection supervision and message flow for the wabridge WhatsApp bridge.
//!
//! - [`lifecycle`]: the pure connection state machine
//! - [`supervisor`]: the actor that runs it against a [`WhatsAppClient`](wabridge_core::WhatsAppClient)
//! - [`relay`] and [`contacts`]: traffic towards the Forwarding API
//! - [`outreach`]: bulk sends and payment reminders
//! - [`shutdown`]: signal handling

pub mod contacts;
pub mod lifecycle;
pub mod outreach;
pub mod relay;
pub mod shutdown;
pub mod supervisor;

pub use lifecycle::{Action, Input, Lifecycle, Phase, Timings};
pub use outreach::BulkSendReport;
pub use supervisor::{Supervisor, SupervisorHandle, SupervisorSettings, safe_destroy};
