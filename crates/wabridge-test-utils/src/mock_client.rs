// SPDX-FileCopyrightText: 2026 Wabridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock WhatsApp client for deterministic testing.
//!
//! `MockWhatsAppClient` implements `WhatsAppClient` with injectable events,
//! scripted chats and client state, and captured lifecycle calls and sends
//! for assertion in tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;

use wabridge_core::error::WabridgeError;
use wabridge_core::traits::{PluginAdapter, WhatsAppClient};
use wabridge_core::types::{
    AdapterType, Chat, ChatId, ClientEvent, ClientState, HealthStatus, IncomingMessage, MessageId,
};

/// A lifecycle call observed by the mock, stamped with the (possibly paused) clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCall {
    Initialize(Instant),
    Destroy(Instant),
}

/// A scriptable WhatsApp client.
///
/// Events injected via `inject_event()` are returned by `next_event()`.
/// `send_text()` captures every message and fails for recipients registered
/// with `fail_sends_to()`.
pub struct MockWhatsAppClient {
    events: Arc<Mutex<VecDeque<ClientEvent>>>,
    notify: Arc<Notify>,
    chats: Mutex<Vec<Chat>>,
    history: Mutex<HashMap<ChatId, Vec<IncomingMessage>>>,
    state: Mutex<Option<ClientState>>,
    state_delay: Mutex<Option<Duration>>,
    destroy_failures: Mutex<u32>,
    failing_recipients: Mutex<HashSet<ChatId>>,
    calls: Mutex<Vec<ClientCall>>,
    sent: Mutex<Vec<(ChatId, String)>>,
    seen: Mutex<Vec<ChatId>>,
}

impl MockWhatsAppClient {
    /// Create a mock with no chats and an unknown client state.
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::new())),
            notify: Arc::new(Notify::new()),
            chats: Mutex::new(Vec::new()),
            history: Mutex::new(HashMap::new()),
            state: Mutex::new(None),
            state_delay: Mutex::new(None),
            destroy_failures: Mutex::new(0),
            failing_recipients: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Queue an event for the next `next_event()` call.
    pub async fn inject_event(&self, event: ClientEvent) {
        self.events.lock().await.push_back(event);
        self.notify.notify_one();
    }

    pub async fn set_chats(&self, chats: Vec<Chat>) {
        *self.chats.lock().await = chats;
    }

    /// Messages returned by `fetch_messages()` for `chat_id`, oldest first.
    pub async fn set_history(&self, chat_id: ChatId, messages: Vec<IncomingMessage>) {
        self.history.lock().await.insert(chat_id, messages);
    }

    /// State reported by `get_state()`.
    pub async fn set_state(&self, state: Option<ClientState>) {
        *self.state.lock().await = state;
    }

    /// Make `get_state()` hang for `delay` before answering.
    pub async fn set_state_delay(&self, delay: Duration) {
        *self.state_delay.lock().await = Some(delay);
    }

    /// Fail the next `count` calls to `destroy()`.
    pub async fn fail_destroys(&self, count: u32) {
        *self.destroy_failures.lock().await = count;
    }

    /// Fail every `send_text()` addressed to `chat_id`.
    pub async fn fail_sends_to(&self, chat_id: ChatId) {
        self.failing_recipients.lock().await.insert(chat_id);
    }

    /// Every `initialize()` and `destroy()` call, in order.
    pub async fn calls(&self) -> Vec<ClientCall> {
        self.calls.lock().await.clone()
    }

    pub async fn initialize_count(&self) -> usize {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|call| matches!(call, ClientCall::Initialize(_)))
            .count()
    }

    pub async fn destroy_count(&self) -> usize {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|call| matches!(call, ClientCall::Destroy(_)))
            .count()
    }

    /// Messages accepted by `send_text()`.
    pub async fn sent_messages(&self) -> Vec<(ChatId, String)> {
        self.sent.lock().await.clone()
    }

    /// Chats marked as seen.
    pub async fn seen_chats(&self) -> Vec<ChatId> {
        self.seen.lock().await.clone()
    }
}

impl Default for MockWhatsAppClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockWhatsAppClient {
    fn name(&self) -> &str {
        "mock-whatsapp"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::WhatsApp
    }

    async fn health_check(&self) -> Result<HealthStatus, WabridgeError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl WhatsAppClient for MockWhatsAppClient {
    async fn initialize(&self) -> Result<(), WabridgeError> {
        self.calls
            .lock()
            .await
            .push(ClientCall::Initialize(Instant::now()));
        Ok(())
    }

    async fn destroy(&self) -> Result<(), WabridgeError> {
        self.calls
            .lock()
            .await
            .push(ClientCall::Destroy(Instant::now()));

        let mut failures = self.destroy_failures.lock().await;
        if *failures > 0 {
            *failures -= 1;
            return Err(WabridgeError::client("mock destroy failure"));
        }
        Ok(())
    }

    async fn get_state(&self) -> Result<Option<ClientState>, WabridgeError> {
        let delay = *self.state_delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(*self.state.lock().await)
    }

    async fn get_chats(&self) -> Result<Vec<Chat>, WabridgeError> {
        Ok(self.chats.lock().await.clone())
    }

    async fn fetch_messages(
        &self,
        chat_id: &ChatId,
        limit: u32,
    ) -> Result<Vec<IncomingMessage>, WabridgeError> {
        let history = self.history.lock().await;
        let messages = history.get(chat_id).cloned().unwrap_or_default();
        let skip = messages.len().saturating_sub(limit as usize);
        Ok(messages.into_iter().skip(skip).collect())
    }

    async fn send_seen(&self, chat_id: &ChatId) -> Result<(), WabridgeError> {
        self.seen.lock().await.push(chat_id.clone());
        Ok(())
    }

    async fn send_text(&self, chat_id: &ChatId, text: &str) -> Result<MessageId, WabridgeError> {
        if self.failing_recipients.lock().await.contains(chat_id) {
            return Err(WabridgeError::client(format!("mock send to {chat_id} failed")));
        }
        let mut sent = self.sent.lock().await;
        sent.push((chat_id.clone(), text.to_string()));
        Ok(MessageId(format!("mock-msg-{}", sent.len())))
    }

    async fn next_event(&self) -> Result<ClientEvent, WabridgeError> {
        loop {
            {
                let mut queue = self.events.lock().await;
                if let Some(event) = queue.pop_front() {
                    return Ok(event);
                }
            }
            self.notify.notified().await;
        }
    }
}
