// SPDX-FileCopyrightText: 2026 Wabridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the control surface and the sidecar webhook.

use std::collections::BTreeMap;

use axum::{
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use wabridge_agent::outreach;
use wabridge_core::types::{AdapterType, ClientState, HealthStatus};
use wabridge_whatsapp::WebhookEvent;

use crate::server::AppState;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Shorthand for an `{error}` response with `status`.
fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

/// Body of `{status: "..."}` acknowledgements.
#[derive(Debug, Serialize)]
pub struct StatusMessage {
    pub status: &'static str,
}

/// Response body for GET /whatsapp-status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub connected: bool,
    pub authenticated: bool,
    pub ready: bool,
    /// QR code as an image data URI, or `null` once paired.
    pub qr_code_url: Option<String>,
}

/// Response body for GET /whatsapp-diagnose.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnoseResponse {
    pub is_connected: bool,
    pub is_authenticated: bool,
    pub is_client_ready: bool,
    pub last_qr_code: bool,
    pub client_state: Option<ClientState>,
}

/// Request body for POST /relance-pub.
#[derive(Debug, Default, Deserialize)]
pub struct RelancePubRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub contacts: Vec<String>,
}

/// Response body for POST /relance-pub.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelancePubResponse {
    pub status: &'static str,
    pub sent_count: usize,
    pub failed_count: usize,
    pub sent: Vec<String>,
    pub failed: Vec<String>,
}

/// Response body for GET /send-relance-payer.
#[derive(Debug, Serialize)]
pub struct RelancePayerResponse {
    pub status: &'static str,
    pub recipients: usize,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok` when every adapter is healthy, `degraded` otherwise.
    pub status: &'static str,
    pub version: String,
    pub uptime_secs: u64,
    pub adapters: BTreeMap<String, AdapterHealth>,
}

/// One adapter's entry in the health report.
#[derive(Debug, Serialize)]
pub struct AdapterHealth {
    pub kind: AdapterType,
    pub version: String,
    pub health: HealthStatus,
}

/// GET /whatsapp-status
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let snapshot = state.supervisor.state();
    Json(StatusResponse {
        connected: snapshot.connected,
        authenticated: snapshot.authenticated,
        ready: snapshot.ready,
        qr_code_url: snapshot.last_qr_code.map(|code| code.data_uri),
    })
}

/// GET /whatsapp-diagnose
///
/// Flags from the supervisor plus the client's live state.
pub async fn get_diagnose(State(state): State<AppState>) -> Response {
    let snapshot = state.supervisor.state();
    match state.client.get_state().await {
        Ok(client_state) => Json(DiagnoseResponse {
            is_connected: snapshot.connected,
            is_authenticated: snapshot.authenticated,
            is_client_ready: snapshot.ready,
            last_qr_code: snapshot.last_qr_code.is_some(),
            client_state,
        })
        .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "diagnose: client state query failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// POST /whatsapp-disconnect
pub async fn post_disconnect(State(state): State<AppState>) -> Response {
    match state.supervisor.disconnect().await {
        Ok(()) => Json(StatusMessage {
            status: "disconnected",
        })
        .into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

/// POST /whatsapp-clear-session
pub async fn post_clear_session(State(state): State<AppState>) -> Response {
    match state.supervisor.clear_session().await {
        Ok(()) => Json(StatusMessage {
            status: "session cleared",
        })
        .into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

/// GET /send-relance-payer
///
/// Fetches debtors, then sends reminders on a background task.
pub async fn get_send_relance_payer(State(state): State<AppState>) -> Response {
    if !state.supervisor.is_ready() {
        return error_response(StatusCode::SERVICE_UNAVAILABLE, "WhatsApp client not ready");
    }

    let debtors = match state.payments.list_debtors().await {
        Ok(debtors) => debtors,
        Err(e) => {
            tracing::error!(error = %e, "failed to fetch debtors");
            return error_response(StatusCode::BAD_GATEWAY, e.to_string());
        }
    };

    let reminders = outreach::plan_reminders(
        &debtors,
        &state.outreach.reminder_template,
        &state.outreach.default_country_code,
    );
    let recipients = reminders.len();
    tracing::info!(debtors = debtors.len(), recipients, "payment reminders started");
    // Detached: the task logs its own outcome.
    let _ = outreach::spawn_reminders(state.client.clone(), reminders);

    (
        StatusCode::ACCEPTED,
        Json(RelancePayerResponse {
            status: "relance started",
            recipients,
        }),
    )
        .into_response()
}

/// POST /relance-pub
///
/// Sends `message` to each contact in order and reports the partition.
pub async fn post_relance_pub(
    State(state): State<AppState>,
    body: Result<Json<RelancePubRequest>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, rejection.body_text()),
    };

    if let Err(e) = outreach::validate_bulk_request(&body.message, &body.contacts) {
        return error_response(StatusCode::BAD_REQUEST, e.to_string());
    }
    if !state.supervisor.is_ready() {
        return error_response(StatusCode::SERVICE_UNAVAILABLE, "WhatsApp client not ready");
    }

    let report = outreach::bulk_send(
        state.client.as_ref(),
        &body.message,
        &body.contacts,
        &state.outreach.default_country_code,
    )
    .await;

    Json(RelancePubResponse {
        status: "done",
        sent_count: report.sent_count(),
        failed_count: report.failed_count(),
        sent: report.sent,
        failed: report.failed,
    })
    .into_response()
}

/// POST /whatsapp-events
///
/// Webhook target for the WhatsApp sidecar. Events are queued for the supervisor.
pub async fn post_whatsapp_event(
    State(state): State<AppState>,
    body: Result<Json<WebhookEvent>, JsonRejection>,
) -> Response {
    let Json(event) = match body {
        Ok(event) => event,
        Err(rejection) => {
            tracing::warn!(error = %rejection.body_text(), "malformed webhook event");
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    if state.events.send(event.into()).await.is_err() {
        return error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "connection supervisor is not accepting events",
        );
    }
    (StatusCode::ACCEPTED, Json(StatusMessage { status: "accepted" })).into_response()
}

/// GET /health
pub async fn get_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let mut adapters = BTreeMap::new();
    for adapter in &state.health.adapters {
        let health = adapter
            .health_check()
            .await
            .unwrap_or_else(|e| HealthStatus::Unhealthy(e.to_string()));
        adapters.insert(
            adapter.name().to_string(),
            AdapterHealth {
                kind: adapter.adapter_type(),
                version: adapter.version().to_string(),
                health,
            },
        );
    }

    let status = if adapters.values().all(|a| a.health == HealthStatus::Healthy) {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
        adapters,
    })
}
