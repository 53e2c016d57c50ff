// SPDX-FileCopyrightText: 2026 Wabridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contact sync loop and the unread catch-up run on reaching Ready.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};
use wabridge_core::error::WabridgeError;
use wabridge_core::types::{Chat, ContactRecord};
use wabridge_core::{ForwardingApi, WhatsAppClient};

use crate::relay;

/// One `sync` record per non-group chat, keyed by the id's user part.
pub fn contact_records(chats: &[Chat]) -> Vec<ContactRecord> {
    chats
        .iter()
        .filter(|chat| !chat.is_group_chat())
        .map(|chat| ContactRecord::sync(chat.id.user()))
        .collect()
}

/// List chats and post the non-group ones. Empty batches are not posted.
///
/// Returns the number of contacts synced.
pub async fn sync_once(
    client: &dyn WhatsAppClient,
    forwarder: &dyn ForwardingApi,
) -> Result<usize, WabridgeError> {
    let chats = client.get_chats().await?;
    let contacts = contact_records(&chats);
    if !contacts.is_empty() {
        forwarder.sync_contacts(&contacts).await?;
    }
    info!(count = contacts.len(), "contacts synced");
    Ok(contacts.len())
}

/// Replay unread messages through the relay, then mark their chats seen.
///
/// The first client error aborts the run. Returns the number of messages
/// handed to the relay.
pub async fn catch_up_unread(
    client: &dyn WhatsAppClient,
    forwarder: &dyn ForwardingApi,
) -> Result<usize, WabridgeError> {
    let mut relayed = 0;
    for chat in client.get_chats().await? {
        if chat.unread_count == 0 {
            continue;
        }
        let messages = client.fetch_messages(&chat.id, chat.unread_count).await?;
        for message in &messages {
            relay::relay_message(forwarder, message).await;
        }
        relayed += messages.len();
        client.send_seen(&chat.id).await?;
    }
    Ok(relayed)
}

/// Sync immediately, then every `interval` until the task is aborted.
///
/// When `process_unread` is set, the unread catch-up runs once right after
/// the first sync.
pub async fn run_sync_loop(
    client: Arc<dyn WhatsAppClient>,
    forwarder: Arc<dyn ForwardingApi>,
    interval: Duration,
    process_unread: bool,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut first = true;

    loop {
        ticker.tick().await;

        if let Err(e) = sync_once(client.as_ref(), forwarder.as_ref()).await {
            warn!(error = %e, "contact sync failed");
        }

        if first && process_unread {
            match catch_up_unread(client.as_ref(), forwarder.as_ref()).await {
                Ok(count) => info!(count, "unread messages processed"),
                Err(e) => error!(error = %e, "error processing unread messages"),
            }
        }
        first = false;
    }
}
