// SPDX-FileCopyrightText: 2026 Wabridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Supervisor test harness with builder pattern.
//!
//! Provides `TestHarness` for integration tests that drive a running
//! [`Supervisor`] through a [`MockWhatsAppClient`] and observe its effects on
//! a [`MockForwarder`]. Pair it with `#[tokio::test(start_paused = true)]`
//! so recovery timers elapse instantly.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use wabridge_agent::{Supervisor, SupervisorHandle, SupervisorSettings};
use wabridge_config::WabridgeConfig;
use wabridge_core::error::WabridgeError;
use wabridge_core::types::{Chat, ClientState, ConnectionState};
use wabridge_core::{ForwardingApi, WhatsAppClient};

use crate::mock_client::MockWhatsAppClient;
use crate::mock_forwarder::MockForwarder;

/// Builder for constructing a [`TestHarness`] with custom configuration.
pub struct TestHarnessBuilder {
    config: WabridgeConfig,
    chats: Vec<Chat>,
    state: Option<ClientState>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            config: WabridgeConfig::default(),
            chats: Vec::new(),
            state: None,
        }
    }

    /// Chats returned by the mock client's `get_chats()`.
    pub fn with_chats(mut self, chats: Vec<Chat>) -> Self {
        self.chats = chats;
        self
    }

    /// State returned by the mock client's `get_state()` (the recovery probe).
    pub fn with_client_state(mut self, state: Option<ClientState>) -> Self {
        self.state = state;
        self
    }

    pub fn with_recovery_timeout(mut self, secs: u64) -> Self {
        self.config.supervisor.recovery_timeout_secs = secs;
        self
    }

    pub fn with_contact_sync_interval(mut self, secs: u64) -> Self {
        self.config.supervisor.contact_sync_interval_secs = secs;
        self
    }

    /// Skip the unread catch-up normally run on reaching Ready.
    pub fn without_unread_catch_up(mut self) -> Self {
        self.config.supervisor.process_unread_on_ready = false;
        self
    }

    /// Build the mocks, populate a session directory and start the supervisor.
    pub async fn build(self) -> Result<TestHarness, WabridgeError> {
        let temp_dir = tempfile::tempdir()?;
        let session_dir = temp_dir.path().join(".wwebjs_auth");
        tokio::fs::create_dir_all(session_dir.join("session")).await?;

        let mut config = self.config;
        config.whatsapp.session_dir = session_dir.to_string_lossy().into_owned();
        let settings = SupervisorSettings::from_config(&config);

        let client = Arc::new(MockWhatsAppClient::new());
        client.set_chats(self.chats).await;
        client.set_state(self.state).await;
        let forwarder = Arc::new(MockForwarder::new());

        let (supervisor, handle) = Supervisor::new(
            client.clone() as Arc<dyn WhatsAppClient>,
            forwarder.clone() as Arc<dyn ForwardingApi>,
            settings,
        );
        let cancel = CancellationToken::new();
        let task = tokio::spawn(supervisor.run(cancel.clone()));

        let harness = TestHarness {
            client,
            forwarder,
            handle,
            session_dir,
            cancel,
            task,
            _temp_dir: temp_dir,
        };
        // Let the supervisor run its startup initialize.
        harness.settle().await;
        Ok(harness)
    }
}

/// A running supervisor with mock collaborators and a temp session directory.
pub struct TestHarness {
    /// The mock WhatsApp client driven by tests.
    pub client: Arc<MockWhatsAppClient>,
    /// The mock Forwarding and Payments API.
    pub forwarder: Arc<MockForwarder>,
    /// Handle to the running supervisor.
    pub handle: SupervisorHandle,
    /// Session directory removed by `clear_session`.
    pub session_dir: PathBuf,
    cancel: CancellationToken,
    task: JoinHandle<Result<(), WabridgeError>>,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Current connection flags.
    pub fn state(&self) -> ConnectionState {
        self.handle.state()
    }

    /// Give spawned tasks a chance to run without moving past any timer that matters.
    pub async fn settle(&self) {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    /// Let `by` of (paused) time elapse.
    pub async fn advance(&self, by: Duration) {
        tokio::time::sleep(by).await;
    }

    /// Cancel the supervisor and wait for it to stop.
    pub async fn shutdown(self) -> Result<(), WabridgeError> {
        self.cancel.cancel();
        self.task
            .await
            .map_err(|e| WabridgeError::Internal(format!("supervisor task failed: {e}")))?
    }
}
