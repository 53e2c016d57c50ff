// SPDX-FileCopyrightText: 2026 Wabridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp client trait: the boundary to the WhatsApp Web automation library.

use async_trait::async_trait;

use crate::error::WabridgeError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Chat, ChatId, ClientEvent, ClientState, IncomingMessage, MessageId};

/// A WhatsApp Web session driven by an external automation client.
///
/// Session authentication, QR generation and browser automation live behind
/// this trait. Lifecycle events are pulled with [`next_event`](Self::next_event)
/// by the connection supervisor, which is the only consumer.
#[async_trait]
pub trait WhatsAppClient: PluginAdapter {
    /// Starts (or restarts) the session. Progress is reported through events.
    async fn initialize(&self) -> Result<(), WabridgeError>;

    /// Tears the session down, releasing the browser.
    async fn destroy(&self) -> Result<(), WabridgeError>;

    /// Queries the live connection state. `None` when the client has no page.
    async fn get_state(&self) -> Result<Option<ClientState>, WabridgeError>;

    /// Lists the chats known to the session.
    async fn get_chats(&self) -> Result<Vec<Chat>, WabridgeError>;

    /// Fetches the latest `limit` messages of a chat.
    async fn fetch_messages(
        &self,
        chat_id: &ChatId,
        limit: u32,
    ) -> Result<Vec<IncomingMessage>, WabridgeError>;

    /// Marks a chat as read.
    async fn send_seen(&self, chat_id: &ChatId) -> Result<(), WabridgeError>;

    /// Sends a text message.
    async fn send_text(&self, chat_id: &ChatId, text: &str) -> Result<MessageId, WabridgeError>;

    /// Receives the next lifecycle or message event.
    async fn next_event(&self) -> Result<ClientEvent, WabridgeError>;
}
