// SPDX-FileCopyrightText: 2026 Wabridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp Web sidecar adapter for the wabridge WhatsApp bridge.
//!
//! The browser automation runs in a sidecar process. This crate implements
//! [`WhatsAppClient`] on top of its REST API; lifecycle and message events
//! arrive on the `/whatsapp-events` webhook, are decoded by [`webhook`], and
//! are queued through [`WebBridgeClient::event_sink`].

pub mod client;
pub mod qr;
pub mod types;
pub mod webhook;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info};
use wabridge_config::model::WhatsAppConfig;
use wabridge_core::error::WabridgeError;
use wabridge_core::traits::{PluginAdapter, WhatsAppClient};
use wabridge_core::types::{
    AdapterType, Chat, ChatId, ClientEvent, ClientState, HealthStatus, IncomingMessage, MessageId,
};

use crate::client::SidecarClient;
use crate::types::{
    FetchMessagesRequest, SendMessageRequest, SendMessageResponse, StartSessionRequest,
    StateResponse,
};

pub use webhook::WebhookEvent;

/// Capacity of the webhook-to-supervisor event queue.
const EVENT_QUEUE_CAPACITY: usize = 256;

/// WhatsApp client backed by the sidecar REST API and its webhook.
pub struct WebBridgeClient {
    sidecar: SidecarClient,
    config: WhatsAppConfig,
    events_tx: mpsc::Sender<ClientEvent>,
    events_rx: Mutex<mpsc::Receiver<ClientEvent>>,
}

impl WebBridgeClient {
    /// Creates the adapter. No request is made until [`initialize`](WhatsAppClient::initialize).
    pub fn new(config: &WhatsAppConfig) -> Result<Self, WabridgeError> {
        let sidecar = SidecarClient::new(&config.bridge_url, config.api_key.as_deref())?;
        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);

        info!(bridge_url = %sidecar.base_url(), "WhatsApp sidecar adapter created");

        Ok(Self {
            sidecar,
            config: config.clone(),
            events_tx,
            events_rx: Mutex::new(events_rx),
        })
    }

    /// Sender the webhook handler pushes decoded events into.
    pub fn event_sink(&self) -> mpsc::Sender<ClientEvent> {
        self.events_tx.clone()
    }
}

fn chat_path(chat_id: &ChatId, suffix: &str) -> String {
    format!("/chats/{chat_id}/{suffix}")
}

#[async_trait]
impl PluginAdapter for WebBridgeClient {
    fn name(&self) -> &str {
        "whatsapp-web"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::WhatsApp
    }

    async fn health_check(&self) -> Result<HealthStatus, WabridgeError> {
        match self.get_state().await {
            Ok(Some(ClientState::Connected)) => Ok(HealthStatus::Healthy),
            Ok(Some(state)) => Ok(HealthStatus::Degraded(format!("client state {state}"))),
            Ok(None) => Ok(HealthStatus::Degraded("no active session".into())),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }
}

#[async_trait]
impl WhatsAppClient for WebBridgeClient {
    async fn initialize(&self) -> Result<(), WabridgeError> {
        let request = StartSessionRequest {
            session_dir: &self.config.session_dir,
            web_version: &self.config.web_version,
            web_version_cache_url: &self.config.web_version_cache_url,
            webhook_url: &self.config.webhook_url,
        };
        self.sidecar
            .post_empty("/session/start", Some(&request))
            .await?;
        info!(web_version = %self.config.web_version, "WhatsApp session start requested");
        Ok(())
    }

    async fn destroy(&self) -> Result<(), WabridgeError> {
        self.sidecar.post_empty::<()>("/session/destroy", None).await
    }

    async fn get_state(&self) -> Result<Option<ClientState>, WabridgeError> {
        let response: StateResponse = self.sidecar.get("/session/state").await?;
        Ok(response.state)
    }

    async fn get_chats(&self) -> Result<Vec<Chat>, WabridgeError> {
        self.sidecar.get("/chats").await
    }

    async fn fetch_messages(
        &self,
        chat_id: &ChatId,
        limit: u32,
    ) -> Result<Vec<IncomingMessage>, WabridgeError> {
        self.sidecar
            .post(&chat_path(chat_id, "messages"), &FetchMessagesRequest { limit })
            .await
    }

    async fn send_seen(&self, chat_id: &ChatId) -> Result<(), WabridgeError> {
        self.sidecar
            .post_empty::<()>(&chat_path(chat_id, "seen"), None)
            .await
    }

    async fn send_text(&self, chat_id: &ChatId, text: &str) -> Result<MessageId, WabridgeError> {
        let request = SendMessageRequest {
            chat_id: &chat_id.0,
            text,
        };
        let response: SendMessageResponse = self.sidecar.post("/messages", &request).await?;
        debug!(chat_id = %chat_id, message_id = %response.id, "message sent");
        Ok(MessageId(response.id))
    }

    async fn next_event(&self) -> Result<ClientEvent, WabridgeError> {
        let mut rx = self.events_rx.lock().await;
        rx.recv()
            .await
            .ok_or_else(|| WabridgeError::client("event queue closed"))
    }
}
