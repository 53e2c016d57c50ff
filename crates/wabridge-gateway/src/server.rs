// SPDX-FileCopyrightText: 2026 Wabridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the control surface.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use wabridge_agent::SupervisorHandle;
use wabridge_core::types::ClientEvent;
use wabridge_core::{PaymentsApi, PluginAdapter, WabridgeError, WhatsAppClient};

use crate::auth::{AuthConfig, auth_middleware};
use crate::handlers;

/// State for the unauthenticated health endpoint.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: Instant,
    /// Adapters polled by `GET /health`.
    pub adapters: Vec<Arc<dyn PluginAdapter>>,
}

/// Reminder text and phone normalisation used by the relance endpoints.
#[derive(Debug, Clone)]
pub struct OutreachSettings {
    pub reminder_template: String,
    pub default_country_code: String,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Connection state snapshots and operator commands.
    pub supervisor: SupervisorHandle,
    /// Client used for live state queries and outbound sends.
    pub client: Arc<dyn WhatsAppClient>,
    pub payments: Arc<dyn PaymentsApi>,
    /// Queue feeding the supervisor with webhook events.
    pub events: mpsc::Sender<ClientEvent>,
    pub outreach: OutreachSettings,
    pub health: HealthState,
}

/// Gateway server configuration (mirrors `[server]` plus the webhook token).
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed by CORS. Entries that are not valid header values are ignored.
    pub allowed_origins: Vec<String>,
    /// Bearer token for the control routes (None = open).
    pub api_token: Option<String>,
    /// Bearer token for `POST /whatsapp-events` (None = open).
    pub webhook_token: Option<String>,
    /// Directory served for unmatched paths.
    pub static_dir: Option<String>,
}

/// Build the full router:
/// - GET /health (public)
/// - GET /whatsapp-status, GET /whatsapp-diagnose, POST /whatsapp-disconnect,
///   POST /whatsapp-clear-session, GET /send-relance-payer, POST /relance-pub
///   (control token)
/// - POST /whatsapp-events (webhook token)
/// - static files as fallback when configured
pub fn build_router(config: &ServerConfig, state: AppState) -> Router {
    let control_auth = AuthConfig::new(config.api_token.clone());
    let webhook_auth = AuthConfig::new(config.webhook_token.clone());
    if control_auth.is_open() {
        tracing::warn!("no server.api_token configured, control routes are open");
    }
    if webhook_auth.is_open() {
        tracing::warn!("no whatsapp.webhook_token configured, /whatsapp-events is open");
    }

    let public_routes = Router::new().route("/health", get(handlers::get_health));

    let control_routes = Router::new()
        .route("/whatsapp-status", get(handlers::get_status))
        .route("/whatsapp-diagnose", get(handlers::get_diagnose))
        .route("/whatsapp-disconnect", post(handlers::post_disconnect))
        .route("/whatsapp-clear-session", post(handlers::post_clear_session))
        .route("/send-relance-payer", get(handlers::get_send_relance_payer))
        .route("/relance-pub", post(handlers::post_relance_pub))
        .route_layer(axum_middleware::from_fn_with_state(
            control_auth,
            auth_middleware,
        ));

    let webhook_routes = Router::new()
        .route("/whatsapp-events", post(handlers::post_whatsapp_event))
        .route_layer(axum_middleware::from_fn_with_state(
            webhook_auth,
            auth_middleware,
        ));

    let mut app = Router::new()
        .merge(public_routes)
        .merge(control_routes)
        .merge(webhook_routes)
        .with_state(state);

    if let Some(dir) = config.static_dir.as_deref() {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(cors_layer(&config.allowed_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Serve the gateway until `cancel` fires.
pub async fn start_server(
    config: &ServerConfig,
    state: AppState,
    cancel: CancellationToken,
) -> Result<(), WabridgeError> {
    let app = build_router(config, state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| WabridgeError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await
        .map_err(|e| WabridgeError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("gateway stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn server_config_debug() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..ServerConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("127.0.0.1"));
    }

    #[test]
    fn invalid_origins_are_skipped() {
        // Must not panic on a value that is not a valid header.
        let _layer = cors_layer(&["https://ts.travel4you.ma".into(), "bad\norigin".into()]);
    }

    #[tokio::test(start_paused = true)]
    #[traced_test]
    async fn open_route_groups_are_reported() {
        let harness = wabridge_test_utils::TestHarness::builder()
            .build()
            .await
            .unwrap();
        let (events, _rx) = mpsc::channel(1);
        let state = AppState {
            supervisor: harness.handle.clone(),
            client: harness.client.clone(),
            payments: harness.forwarder.clone(),
            events,
            outreach: OutreachSettings {
                reminder_template: "{name}".into(),
                default_country_code: "212".into(),
            },
            health: HealthState {
                start_time: Instant::now(),
                adapters: Vec::new(),
            },
        };

        let _router = build_router(
            &ServerConfig {
                webhook_token: Some("hook".into()),
                ..ServerConfig::default()
            },
            state,
        );

        assert!(logs_contain("control routes are open"));
        assert!(!logs_contain("/whatsapp-events is open"));
    }
}
