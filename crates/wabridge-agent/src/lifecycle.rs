// SPDX-FileCopyrightText: 2026 Wabridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection lifecycle state machine.
//!
//! [`Lifecycle`] is pure: it consumes [`Input`]s, mutates the
//! [`ConnectionState`] it owns, and returns the [`Action`]s the runner must
//! perform. Timers, tasks and client calls all live in the runner, so the
//! transition table can be exercised without a clock or a client.

use std::time::Duration;

use wabridge_core::types::{ClientState, ConnectionState, QrCode};

/// Coarse connection phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Disconnected,
    /// A QR code is waiting to be scanned.
    Pairing,
    /// Authenticated, waiting for `ready`. The recovery timer is armed.
    Authenticating,
    Ready,
}

/// Something that happened to the connection.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// A new pairing token. `None` when rendering it failed.
    Qr(Option<QrCode>),
    Authenticated,
    Ready,
    AuthFailure,
    Disconnected,
    /// The recovery timer armed on `authenticated` fired.
    RecoveryTimeout,
    /// Result of the live state query requested by [`Action::ProbeClientState`].
    /// `None` when the query failed or timed out.
    Probed(Option<ClientState>),
    /// Operator-initiated reset (disconnect, clear session).
    Reset,
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Arm the recovery timer, replacing any armed one.
    ArmRecoveryTimer(Duration),
    CancelRecoveryTimer,
    /// Query the client's live state and feed back [`Input::Probed`].
    ProbeClientState,
    /// (Re)start the contact sync loop and the unread catch-up.
    StartReadyRoutine,
    StopSyncLoop,
    /// Destroy the client (with retry), wait, then initialize it again.
    HardRecover { reinit_after: Duration },
    /// Initialize the client after a delay, replacing any pending reinitialization.
    ScheduleReinit(Duration),
    /// Drop any pending reinitialization or hard recovery.
    CancelReinit,
}

/// Delays the machine hands out in its actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub recovery_timeout: Duration,
    pub hard_recovery_delay: Duration,
    pub disconnect_reinit_delay: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            recovery_timeout: Duration::from_secs(60),
            hard_recovery_delay: Duration::from_secs(2),
            disconnect_reinit_delay: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Lifecycle {
    phase: Phase,
    state: ConnectionState,
    timings: Timings,
}

impl Lifecycle {
    pub fn new(timings: Timings) -> Self {
        Self {
            phase: Phase::Disconnected,
            state: ConnectionState::default(),
            timings,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// Apply one input and return the actions to perform, in order.
    pub fn handle(&mut self, input: Input) -> Vec<Action> {
        match input {
            Input::Qr(code) => {
                self.phase = Phase::Pairing;
                self.state.last_qr_code = code;
                self.state.connected = false;
                self.state.authenticated = false;
                Vec::new()
            }
            Input::Authenticated => {
                self.phase = Phase::Authenticating;
                self.state.authenticated = true;
                self.state.last_qr_code = None;
                self.state.recovery_triggered = false;
                vec![Action::ArmRecoveryTimer(self.timings.recovery_timeout)]
            }
            Input::Ready => self.enter_ready(),
            Input::RecoveryTimeout => {
                if self.phase != Phase::Authenticating
                    || self.state.ready
                    || self.state.recovery_triggered
                {
                    return Vec::new();
                }
                self.state.recovery_triggered = true;
                vec![Action::ProbeClientState]
            }
            Input::Probed(live) => {
                // Stale when `ready`, `disconnected` or a new `authenticated`
                // arrived while the probe was in flight.
                if self.phase != Phase::Authenticating || !self.state.recovery_triggered {
                    return Vec::new();
                }
                if live == Some(ClientState::Connected) {
                    return self.enter_ready();
                }
                self.enter_disconnected();
                vec![
                    Action::CancelRecoveryTimer,
                    Action::StopSyncLoop,
                    Action::HardRecover {
                        reinit_after: self.timings.hard_recovery_delay,
                    },
                ]
            }
            Input::Disconnected => {
                self.enter_disconnected();
                vec![
                    Action::CancelRecoveryTimer,
                    Action::StopSyncLoop,
                    Action::ScheduleReinit(self.timings.disconnect_reinit_delay),
                ]
            }
            Input::AuthFailure => {
                self.enter_disconnected();
                vec![Action::CancelRecoveryTimer, Action::StopSyncLoop]
            }
            Input::Reset => {
                self.enter_disconnected();
                vec![
                    Action::CancelRecoveryTimer,
                    Action::StopSyncLoop,
                    Action::CancelReinit,
                ]
            }
        }
    }

    fn enter_ready(&mut self) -> Vec<Action> {
        self.phase = Phase::Ready;
        self.state.connected = true;
        self.state.authenticated = true;
        self.state.ready = true;
        self.state.last_qr_code = None;
        self.state.recovery_triggered = false;
        vec![Action::CancelRecoveryTimer, Action::StartReadyRoutine]
    }

    fn enter_disconnected(&mut self) {
        self.phase = Phase::Disconnected;
        self.state.reset();
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new(Timings::default())
    }
}
