// SPDX-FileCopyrightText: 2026 Wabridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the supervisor, the adapters, and the gateway.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Suffix WhatsApp Web uses for one-to-one chats.
const USER_SUFFIX: &str = "@c.us";

/// Suffix WhatsApp Web uses for group chats.
const GROUP_SUFFIX: &str = "@g.us";

/// Shortest digit string accepted as a phone number.
pub const MIN_PHONE_DIGITS: usize = 6;

/// WhatsApp chat identifier, e.g. `212600000000@c.us`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub String);

impl ChatId {
    /// The user part of the id (the phone number for one-to-one chats).
    pub fn user(&self) -> &str {
        self.0.split('@').next().unwrap_or("")
    }

    /// Whether the id designates a group chat.
    pub fn is_group(&self) -> bool {
        self.0.ends_with(GROUP_SUFFIX)
    }

    /// Build a one-to-one chat id from a loosely formatted phone number.
    ///
    /// Non-digits are dropped, an international `00` prefix is removed and a
    /// single national `0` prefix is replaced by `default_country_code`.
    /// Returns `None` when fewer than [`MIN_PHONE_DIGITS`] digits remain.
    pub fn from_phone(phone: &str, default_country_code: &str) -> Option<Self> {
        let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

        let digits = if let Some(rest) = digits.strip_prefix("00") {
            rest.to_string()
        } else if let Some(rest) = digits.strip_prefix('0') {
            format!("{default_country_code}{rest}")
        } else {
            digits
        };

        if digits.len() < MIN_PHONE_DIGITS {
            return None;
        }

        Some(Self(format!("{digits}{USER_SUFFIX}")))
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a message sent through the WhatsApp client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "lowercase")]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of external collaborator an adapter talks to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AdapterType {
    WhatsApp,
    Forwarding,
}

/// Raw connection state reported by the WhatsApp Web client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientState {
    Conflict,
    Connected,
    DeprecatedVersion,
    Opening,
    Pairing,
    Proxyblock,
    SmbTosBlock,
    Timeout,
    TosBlock,
    Unlaunched,
    Unpaired,
    UnpairedIdle,
    #[serde(other)]
    Unknown,
}

/// A message received by the WhatsApp client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingMessage {
    #[serde(default)]
    pub id: String,
    pub from: ChatId,
    #[serde(default)]
    pub from_me: bool,
    #[serde(default)]
    pub has_media: bool,
    /// WhatsApp message type (`chat`, `image`, `ptt`, `document`, ...).
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

/// A chat as listed by the WhatsApp client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: ChatId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_group: bool,
    #[serde(default)]
    pub unread_count: u32,
}

impl Chat {
    /// Group chats are flagged by the client, but the id suffix is authoritative too.
    pub fn is_group_chat(&self) -> bool {
        self.is_group || self.id.is_group()
    }
}

/// Lifecycle and message events emitted by the WhatsApp client.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// A new pairing token is available.
    Qr(String),
    /// The QR code was scanned and the session authenticated.
    Authenticated,
    /// The client finished loading and can send/receive.
    Ready,
    /// Session restore or pairing failed.
    AuthFailure(String),
    /// The client lost its session.
    Disconnected(String),
    /// Informational connection state change.
    StateChanged(ClientState),
    /// An inbound message.
    Message(IncomingMessage),
}

/// Body POSTed to the Forwarding API for each relayed message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageForward {
    pub sender_number: String,
    pub message_body: String,
}

/// Direction marker expected by the contacts endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncDirection {
    Sync,
}

/// One entry of a contact sync batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub number: String,
    pub direction: SyncDirection,
}

impl ContactRecord {
    pub fn sync(number: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            direction: SyncDirection::Sync,
        }
    }
}

/// Outstanding balance as returned by the payments API (number or preformatted string).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Number(f64),
    Text(String),
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Amount::Number(n) if n.fract() == 0.0 => write!(f, "{n:.0}"),
            Amount::Number(n) => write!(f, "{n:.2}"),
            Amount::Text(s) => f.write_str(s),
        }
    }
}

/// A client with an unpaid balance, as listed by the payments API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Debtor {
    pub client_phone: Option<String>,
    pub client_name: Option<String>,
    pub balance_remaining: Option<Amount>,
    pub tour_title: Option<String>,
}

/// A pairing token and its image rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrCode {
    /// Opaque token emitted by the client.
    pub token: String,
    /// `data:` URI suitable for an `<img src>`.
    pub data_uri: String,
}

/// Connection flags owned by the supervisor and read by the status endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionState {
    pub connected: bool,
    pub authenticated: bool,
    pub ready: bool,
    pub last_qr_code: Option<QrCode>,
    pub recovery_triggered: bool,
}

impl ConnectionState {
    /// Return every flag to its initial value.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
