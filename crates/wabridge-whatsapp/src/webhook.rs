// SPDX-FileCopyrightText: 2026 Wabridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Events pushed by the sidecar to `POST /whatsapp-events`.

use serde::Deserialize;
use wabridge_core::types::{ClientEvent, ClientState, IncomingMessage};

/// One webhook payload, tagged on `event`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WebhookEvent {
    Qr {
        qr: String,
    },
    Authenticated,
    Ready,
    AuthFailure {
        #[serde(default, alias = "reason")]
        message: String,
    },
    Disconnected {
        #[serde(default)]
        reason: String,
    },
    ChangeState {
        state: ClientState,
    },
    Message(IncomingMessage),
}

impl From<WebhookEvent> for ClientEvent {
    fn from(event: WebhookEvent) -> Self {
        match event {
            WebhookEvent::Qr { qr } => ClientEvent::Qr(qr),
            WebhookEvent::Authenticated => ClientEvent::Authenticated,
            WebhookEvent::Ready => ClientEvent::Ready,
            WebhookEvent::AuthFailure { message } => ClientEvent::AuthFailure(message),
            WebhookEvent::Disconnected { reason } => ClientEvent::Disconnected(reason),
            WebhookEvent::ChangeState { state } => ClientEvent::StateChanged(state),
            WebhookEvent::Message(message) => ClientEvent::Message(message),
        }
    }
}
