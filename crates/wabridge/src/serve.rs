// SPDX-FileCopyrightText: 2026 Wabridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `wabridge serve` command implementation.
//!
//! Wires the sidecar client, the forwarding backend, the connection
//! supervisor and the HTTP gateway together, then runs until SIGINT/SIGTERM.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};
use wabridge_agent::{Supervisor, SupervisorSettings, shutdown};
use wabridge_config::WabridgeConfig;
use wabridge_core::{PluginAdapter, WabridgeError};
use wabridge_forwarding::HttpBackend;
use wabridge_gateway::{AppState, HealthState, OutreachSettings, ServerConfig};
use wabridge_whatsapp::WebBridgeClient;

/// How long the supervisor gets to stop once the server is down.
const SUPERVISOR_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Runs the `wabridge serve` command.
pub async fn run_serve(config: WabridgeConfig) -> Result<(), WabridgeError> {
    init_tracing(&config.logging.level);

    info!(version = env!("CARGO_PKG_VERSION"), "starting wabridge serve");

    let client = Arc::new(WebBridgeClient::new(&config.whatsapp)?);
    let backend = Arc::new(HttpBackend::new(&config.forwarding)?);
    if !backend.payments_enabled() {
        warn!("forwarding.debtors_url is not set, /send-relance-payer will answer 502");
    }
    info!(
        bridge_url = %config.whatsapp.bridge_url,
        message_url = %config.forwarding.message_url,
        contacts_url = %config.forwarding.contacts_url,
        "collaborators configured"
    );

    let (supervisor, handle) = Supervisor::new(
        client.clone(),
        backend.clone(),
        SupervisorSettings::from_config(&config),
    );

    let cancel = shutdown::install_signal_handler();
    let supervisor_task = tokio::spawn(supervisor.run(cancel.clone()));

    let state = AppState {
        supervisor: handle,
        client: client.clone(),
        payments: backend.clone(),
        events: client.event_sink(),
        outreach: OutreachSettings {
            reminder_template: config.outreach.reminder_template.clone(),
            default_country_code: config.outreach.default_country_code.clone(),
        },
        health: HealthState {
            start_time: Instant::now(),
            adapters: vec![
                client as Arc<dyn PluginAdapter>,
                backend as Arc<dyn PluginAdapter>,
            ],
        },
    };

    let served = wabridge_gateway::start_server(&server_config(&config), state, cancel.clone()).await;

    // Stop the supervisor whether the server ended by signal or by error.
    cancel.cancel();
    shutdown::drain_task("connection supervisor", supervisor_task, SUPERVISOR_DRAIN_TIMEOUT)
        .await;

    served?;
    info!("wabridge serve shutdown complete");
    Ok(())
}

fn server_config(config: &WabridgeConfig) -> ServerConfig {
    ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        allowed_origins: config.server.allowed_origins.clone(),
        api_token: config.server.api_token.clone(),
        webhook_token: config.whatsapp.webhook_token.clone(),
        static_dir: config.server.static_dir.clone(),
    }
}

/// Initialize the tracing subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("wabridge={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
