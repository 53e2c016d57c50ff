// SPDX-FileCopyrightText: 2026 Wabridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the WhatsApp Web sidecar REST API.

use serde::{Deserialize, Serialize};
use wabridge_core::types::ClientState;

/// Body of `POST /session/start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionRequest<'a> {
    pub session_dir: &'a str,
    pub web_version: &'a str,
    pub web_version_cache_url: &'a str,
    pub webhook_url: &'a str,
}

/// Response of `GET /session/state`.
#[derive(Debug, Clone, Deserialize)]
pub struct StateResponse {
    #[serde(default)]
    pub state: Option<ClientState>,
}

/// Body of `POST /chats/{id}/messages`.
#[derive(Debug, Clone, Serialize)]
pub struct FetchMessagesRequest {
    pub limit: u32,
}

/// Body of `POST /messages`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest<'a> {
    pub chat_id: &'a str,
    pub text: &'a str,
}

/// Response of `POST /messages`.
#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageResponse {
    pub id: String,
}

/// Error body returned by the sidecar on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct SidecarErrorResponse {
    pub error: String,
}
