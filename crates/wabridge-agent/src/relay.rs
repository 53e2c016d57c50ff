// SPDX-FileCopyrightText: 2026 Wabridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound message relay to the Forwarding API.

use std::sync::Arc;

use tracing::{debug, warn};
use wabridge_core::ForwardingApi;
use wabridge_core::types::{IncomingMessage, MessageForward};

/// Body forwarded for `msg`, or `None` when it must not be forwarded.
///
/// Media messages are summarised by their type name; text is trimmed.
pub fn forward_body(msg: &IncomingMessage) -> Option<String> {
    if msg.from_me {
        return None;
    }

    let body = if msg.has_media {
        if msg.kind.is_empty() {
            "media".to_string()
        } else {
            msg.kind.clone()
        }
    } else {
        msg.body.trim().to_string()
    };

    (!body.is_empty()).then_some(body)
}

/// Forward one message. Errors are logged, never returned.
///
/// Returns whether a POST succeeded.
pub async fn relay_message(forwarder: &dyn ForwardingApi, msg: &IncomingMessage) -> bool {
    let Some(message_body) = forward_body(msg) else {
        debug!(message_id = %msg.id, "message skipped by relay");
        return false;
    };

    let payload = MessageForward {
        sender_number: msg.from.0.clone(),
        message_body,
    };
    match forwarder.forward_message(&payload).await {
        Ok(()) => {
            debug!(sender = %msg.from, "message forwarded");
            true
        }
        Err(e) => {
            warn!(sender = %msg.from, error = %e, "failed to forward message");
            false
        }
    }
}

/// Relay on a dedicated task so a slow Forwarding API only delays this message.
pub fn spawn_relay(forwarder: Arc<dyn ForwardingApi>, msg: IncomingMessage) {
    tokio::spawn(async move {
        relay_message(forwarder.as_ref(), &msg).await;
    });
}
