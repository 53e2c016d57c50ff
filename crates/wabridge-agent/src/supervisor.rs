// SPDX-FileCopyrightText: 2026 Wabridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection supervisor: the runner around [`Lifecycle`].
//!
//! The [`Supervisor`] is an actor. It is the only writer of the
//! [`ConnectionState`], which it publishes through a `watch` channel after
//! every transition. It owns the recovery timer, the pending probe, the
//! contact sync loop and the pending reinitialization, each behind a single
//! handle that is cleared before being re-armed.

use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use wabridge_config::WabridgeConfig;
use wabridge_core::error::WabridgeError;
use wabridge_core::types::{ClientEvent, ClientState, ConnectionState, QrCode};
use wabridge_core::{ForwardingApi, WhatsAppClient};
use wabridge_whatsapp::qr;

use crate::contacts;
use crate::lifecycle::{Action, Input, Lifecycle, Timings};
use crate::relay;

/// Capacity of the operator command queue.
const COMMAND_QUEUE_CAPACITY: usize = 16;

/// Everything the runner needs beyond the state machine's own timings.
#[derive(Debug, Clone)]
pub struct SupervisorSettings {
    pub timings: Timings,
    pub destroy_retry_delay: Duration,
    pub clear_session_reinit_delay: Duration,
    pub contact_sync_interval: Duration,
    pub probe_timeout: Duration,
    pub process_unread_on_ready: bool,
    pub session_dir: PathBuf,
}

impl SupervisorSettings {
    pub fn from_config(config: &WabridgeConfig) -> Self {
        let supervisor = &config.supervisor;
        Self {
            timings: Timings {
                recovery_timeout: supervisor.recovery_timeout(),
                hard_recovery_delay: supervisor.hard_recovery_delay(),
                disconnect_reinit_delay: supervisor.disconnect_reinit_delay(),
            },
            destroy_retry_delay: supervisor.destroy_retry_delay(),
            clear_session_reinit_delay: supervisor.clear_session_reinit_delay(),
            contact_sync_interval: supervisor.contact_sync_interval(),
            probe_timeout: supervisor.probe_timeout(),
            process_unread_on_ready: supervisor.process_unread_on_ready,
            session_dir: PathBuf::from(&config.whatsapp.session_dir),
        }
    }
}

type Reply = oneshot::Sender<Result<(), WabridgeError>>;

enum Command {
    Disconnect { reply: Reply },
    ClearSession { reply: Reply },
}

/// Cheap, cloneable access to a running [`Supervisor`].
#[derive(Clone)]
pub struct SupervisorHandle {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<ConnectionState>,
}

impl SupervisorHandle {
    /// Snapshot of the current connection state.
    pub fn state(&self) -> ConnectionState {
        self.state.borrow().clone()
    }

    pub fn is_ready(&self) -> bool {
        self.state.borrow().ready
    }

    /// Destroy the client and reset the connection state.
    pub async fn disconnect(&self) -> Result<(), WabridgeError> {
        self.request(|reply| Command::Disconnect { reply }).await
    }

    /// Delete the persisted session, destroy the client, reset the state and
    /// reinitialize after a short delay.
    pub async fn clear_session(&self) -> Result<(), WabridgeError> {
        self.request(|reply| Command::ClearSession { reply }).await
    }

    async fn request(&self, command: impl FnOnce(Reply) -> Command) -> Result<(), WabridgeError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| WabridgeError::Internal("connection supervisor is not running".into()))?;
        response
            .await
            .map_err(|_| WabridgeError::Internal("connection supervisor dropped the request".into()))?
    }
}

pub struct Supervisor {
    client: Arc<dyn WhatsAppClient>,
    forwarder: Arc<dyn ForwardingApi>,
    settings: SupervisorSettings,
    lifecycle: Lifecycle,
    state_tx: watch::Sender<ConnectionState>,
    commands: mpsc::Receiver<Command>,
    recovery_timer: Option<Pin<Box<Sleep>>>,
    probe: Option<JoinHandle<Option<ClientState>>>,
    sync_loop: Option<JoinHandle<()>>,
    reinit: Option<JoinHandle<()>>,
}

impl Supervisor {
    pub fn new(
        client: Arc<dyn WhatsAppClient>,
        forwarder: Arc<dyn ForwardingApi>,
        settings: SupervisorSettings,
    ) -> (Self, SupervisorHandle) {
        let (state_tx, state_rx) = watch::channel(ConnectionState::default());
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);

        let supervisor = Self {
            client,
            forwarder,
            lifecycle: Lifecycle::new(settings.timings),
            settings,
            state_tx,
            commands: commands_rx,
            recovery_timer: None,
            probe: None,
            sync_loop: None,
            reinit: None,
        };
        let handle = SupervisorHandle {
            commands: commands_tx,
            state: state_rx,
        };
        (supervisor, handle)
    }

    /// Initialize the client, then process events, commands and timers until
    /// `cancel` fires or the client's event stream ends.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<(), WabridgeError> {
        info!("connection supervisor running");
        initialize_client(self.client.as_ref()).await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping connection supervisor");
                    break;
                }
                event = self.client.next_event() => match event {
                    Ok(event) => self.on_event(event),
                    Err(e) => {
                        error!(error = %e, "client event stream ended");
                        break;
                    }
                },
                Some(command) = self.commands.recv() => self.on_command(command).await,
                _ = timer_fired(&mut self.recovery_timer) => {
                    self.recovery_timer = None;
                    self.apply(Input::RecoveryTimeout);
                }
                live = probe_finished(&mut self.probe) => {
                    self.probe = None;
                    warn!(state = ?live, "ready missing after recovery timeout, live client state");
                    self.apply(Input::Probed(live));
                }
            }
        }

        self.stop_background_work();
        info!("connection supervisor stopped");
        Ok(())
    }

    fn on_event(&mut self, event: ClientEvent) {
        match event {
            ClientEvent::Qr(token) => {
                info!("QR code received");
                self.apply(Input::Qr(render_qr(&token)));
            }
            ClientEvent::Authenticated => {
                info!("authenticated, waiting for ready");
                self.apply(Input::Authenticated);
            }
            ClientEvent::Ready => {
                info!("client ready");
                self.apply(Input::Ready);
            }
            ClientEvent::AuthFailure(message) => {
                error!(message = %message, "authentication failure");
                self.apply(Input::AuthFailure);
            }
            ClientEvent::Disconnected(reason) => {
                warn!(reason = %reason, "client disconnected");
                self.apply(Input::Disconnected);
            }
            ClientEvent::StateChanged(state) => {
                debug!(state = %state, "client state changed");
            }
            ClientEvent::Message(message) => {
                relay::spawn_relay(self.forwarder.clone(), message);
            }
        }
    }

    async fn on_command(&mut self, command: Command) {
        match command {
            Command::Disconnect { reply } => {
                info!("operator requested disconnect");
                let _ = safe_destroy(self.client.as_ref(), self.settings.destroy_retry_delay).await;
                self.apply(Input::Reset);
                let _ = reply.send(Ok(()));
            }
            Command::ClearSession { reply } => {
                info!("operator requested session clear");
                if let Err(e) = remove_session_dir(&self.settings.session_dir).await {
                    error!(error = %e, "failed to remove session directory");
                    let _ = reply.send(Err(e));
                    return;
                }
                let _ = safe_destroy(self.client.as_ref(), self.settings.destroy_retry_delay).await;
                self.apply(Input::Reset);
                self.execute(Action::ScheduleReinit(
                    self.settings.clear_session_reinit_delay,
                ));
                let _ = reply.send(Ok(()));
            }
        }
    }

    fn apply(&mut self, input: Input) {
        for action in self.lifecycle.handle(input) {
            self.execute(action);
        }
        self.state_tx.send_replace(self.lifecycle.state().clone());
    }

    fn execute(&mut self, action: Action) {
        debug!(?action, "executing lifecycle action");
        match action {
            Action::ArmRecoveryTimer(after) => {
                self.recovery_timer = Some(Box::pin(tokio::time::sleep(after)));
            }
            Action::CancelRecoveryTimer => {
                self.recovery_timer = None;
            }
            Action::ProbeClientState => {
                abort(&mut self.probe);
                let client = self.client.clone();
                let limit = self.settings.probe_timeout;
                self.probe = Some(tokio::spawn(async move {
                    match bounded_probe(limit, client.get_state()).await {
                        Ok(state) => state,
                        Err(e) => {
                            warn!(error = %e, "live client state unavailable");
                            None
                        }
                    }
                }));
            }
            Action::StartReadyRoutine => {
                abort(&mut self.sync_loop);
                self.sync_loop = Some(tokio::spawn(contacts::run_sync_loop(
                    self.client.clone(),
                    self.forwarder.clone(),
                    self.settings.contact_sync_interval,
                    self.settings.process_unread_on_ready,
                )));
            }
            Action::StopSyncLoop => abort(&mut self.sync_loop),
            Action::HardRecover { reinit_after } => {
                abort(&mut self.reinit);
                info!("hard recovery: destroying client and re-initializing");
                let client = self.client.clone();
                let retry_delay = self.settings.destroy_retry_delay;
                self.reinit = Some(tokio::spawn(async move {
                    let _ = safe_destroy(client.as_ref(), retry_delay).await;
                    tokio::time::sleep(reinit_after).await;
                    initialize_client(client.as_ref()).await;
                }));
            }
            Action::ScheduleReinit(after) => {
                abort(&mut self.reinit);
                let client = self.client.clone();
                self.reinit = Some(tokio::spawn(async move {
                    tokio::time::sleep(after).await;
                    initialize_client(client.as_ref()).await;
                }));
            }
            Action::CancelReinit => abort(&mut self.reinit),
        }
    }

    fn stop_background_work(&mut self) {
        self.recovery_timer = None;
        abort(&mut self.probe);
        abort(&mut self.sync_loop);
        abort(&mut self.reinit);
    }
}

/// Destroy the client, retrying once after `retry_delay`.
///
/// A second failure is logged and returned; callers treat it as fatal for
/// the current cycle only.
pub async fn safe_destroy(
    client: &dyn WhatsAppClient,
    retry_delay: Duration,
) -> Result<(), WabridgeError> {
    let Err(first) = client.destroy().await else {
        return Ok(());
    };
    warn!(error = %first, "destroy failed, retrying");
    tokio::time::sleep(retry_delay).await;

    client
        .destroy()
        .await
        .inspect_err(|e| error!(error = %e, "destroy failed after retry"))
}

async fn initialize_client(client: &dyn WhatsAppClient) {
    match client.initialize().await {
        Ok(()) => info!("client initialization started"),
        Err(e) => error!(error = %e, "client initialization failed"),
    }
}

async fn remove_session_dir(path: &Path) -> Result<(), WabridgeError> {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => {
            info!(path = %path.display(), "session directory removed");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn render_qr(token: &str) -> Option<QrCode> {
    match qr::render_terminal(token) {
        Ok(art) => info!("scan this QR code with WhatsApp:\n{art}"),
        Err(e) => warn!(error = %e, "failed to render QR code for the console"),
    }

    match qr::render_data_uri(token) {
        Ok(data_uri) => Some(QrCode {
            token: token.to_string(),
            data_uri,
        }),
        Err(e) => {
            warn!(error = %e, "failed to render QR code image");
            None
        }
    }
}

fn abort<T>(handle: &mut Option<JoinHandle<T>>) {
    if let Some(handle) = handle.take() {
        handle.abort();
    }
}

async fn timer_fired(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}

/// Run a live state query, failing with [`WabridgeError::Timeout`] after `limit`.
async fn bounded_probe(
    limit: Duration,
    query: impl Future<Output = Result<Option<ClientState>, WabridgeError>>,
) -> Result<Option<ClientState>, WabridgeError> {
    tokio::time::timeout(limit, query)
        .await
        .map_err(|_| WabridgeError::Timeout { duration: limit })?
}

async fn probe_finished(probe: &mut Option<JoinHandle<Option<ClientState>>>) -> Option<ClientState> {
    match probe {
        Some(handle) => handle.await.unwrap_or(None),
        None => std::future::pending().await,
    }
}
