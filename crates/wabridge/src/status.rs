// SPDX-FileCopyrightText: 2026 Wabridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `wabridge status` command implementation.
//!
//! Queries a running instance's `/health` and `/whatsapp-status` endpoints
//! and prints a summary. Falls back gracefully when nothing is listening.

use std::io::IsTerminal;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use wabridge_config::WabridgeConfig;
use wabridge_core::WabridgeError;

/// Subset of the `/health` response the summary needs.
#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
    version: String,
    uptime_secs: u64,
}

/// Subset of the `/whatsapp-status` response the summary needs.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectionResponse {
    connected: bool,
    authenticated: bool,
    ready: bool,
    qr_code_url: Option<String>,
}

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub running: bool,
    pub status: String,
    pub version: Option<String>,
    pub uptime_secs: Option<u64>,
    pub uptime_human: Option<String>,
    /// `None` when the connection endpoint could not be read (e.g. wrong token).
    pub whatsapp: Option<WhatsAppSummary>,
    pub endpoint: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct WhatsAppSummary {
    pub connected: bool,
    pub authenticated: bool,
    pub ready: bool,
    pub awaiting_qr_scan: bool,
}

impl From<ConnectionResponse> for WhatsAppSummary {
    fn from(resp: ConnectionResponse) -> Self {
        Self {
            connected: resp.connected,
            authenticated: resp.authenticated,
            ready: resp.ready,
            awaiting_qr_scan: resp.qr_code_url.is_some(),
        }
    }
}

/// Format seconds into a human-readable duration string.
fn format_uptime(secs: u64) -> String {
    let days = secs / 86400;
    let hours = (secs % 86400) / 3600;
    let minutes = (secs % 3600) / 60;

    match (days, hours) {
        (0, 0) => format!("{minutes}m"),
        (0, _) => format!("{hours}h {minutes}m"),
        _ => format!("{days}d {hours}h {minutes}m"),
    }
}

/// Base URL a local client should use; wildcard binds are reached via loopback.
fn base_url(config: &WabridgeConfig) -> String {
    let host = match config.server.host.as_str() {
        "0.0.0.0" | "::" | "[::]" => "127.0.0.1",
        host => host,
    };
    format!("http://{host}:{}", config.server.port)
}

/// Query the instance at `base` and build a report.
async fn collect(base: &str, api_token: Option<&str>) -> Result<StatusReport, WabridgeError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(3))
        .build()
        .map_err(|e| WabridgeError::Internal(format!("failed to create HTTP client: {e}")))?;

    let offline = StatusReport {
        running: false,
        status: "not running".to_string(),
        version: None,
        uptime_secs: None,
        uptime_human: None,
        whatsapp: None,
        endpoint: base.to_string(),
    };

    let health = match client.get(format!("{base}/health")).send().await {
        Ok(resp) if resp.status().is_success() => resp,
        _ => return Ok(offline),
    };
    let health: HealthResponse = health
        .json()
        .await
        .map_err(|e| WabridgeError::Internal(format!("failed to parse health response: {e}")))?;

    let mut request = client.get(format!("{base}/whatsapp-status"));
    if let Some(token) = api_token {
        request = request.bearer_auth(token);
    }
    let whatsapp = match request.send().await {
        Ok(resp) if resp.status().is_success() => resp
            .json::<ConnectionResponse>()
            .await
            .ok()
            .map(WhatsAppSummary::from),
        _ => None,
    };

    Ok(StatusReport {
        running: true,
        status: health.status,
        version: Some(health.version),
        uptime_secs: Some(health.uptime_secs),
        uptime_human: Some(format_uptime(health.uptime_secs)),
        whatsapp,
        endpoint: base.to_string(),
    })
}

/// Run the `wabridge status` command.
///
/// If `--json` is passed, outputs structured JSON for scripting.
/// If `--plain` is passed or stdout is not a TTY, disables colors.
pub async fn run_status(config: &WabridgeConfig, json: bool, plain: bool) -> Result<(), WabridgeError> {
    let report = collect(&base_url(config), config.server.api_token.as_deref()).await?;

    if json {
        let rendered = serde_json::to_string_pretty(&report)
            .map_err(|e| WabridgeError::Internal(format!("failed to render status: {e}")))?;
        println!("{rendered}");
    } else {
        let use_color = !plain && std::io::stdout().is_terminal();
        print_report(&report, use_color);
    }
    Ok(())
}

fn print_report(report: &StatusReport, use_color: bool) {
    use colored::Colorize;

    println!();
    println!("  wabridge status");
    println!("  {}", "-".repeat(35));

    if !report.running {
        if use_color {
            println!("    State:    {} {}", "✗".red(), "not running".red());
        } else {
            println!("    State:    [FAIL] not running");
        }
        println!("    Endpoint: {}", report.endpoint);
        println!();
        println!("  Start with: wabridge serve");
        println!();
        return;
    }

    let uptime = report.uptime_human.as_deref().unwrap_or("?");
    let version = report.version.as_deref().unwrap_or("?");
    if use_color {
        println!(
            "    State:    {} {} (v{version}, uptime: {uptime})",
            "✓".green(),
            report.status.green()
        );
    } else {
        println!("    State:    [OK] {} (v{version}, uptime: {uptime})", report.status);
    }

    let line = match &report.whatsapp {
        Some(wa) if wa.ready => "ready".to_string(),
        Some(wa) if wa.awaiting_qr_scan => "waiting for QR scan".to_string(),
        Some(wa) if wa.authenticated => "authenticated, loading".to_string(),
        Some(_) => "disconnected".to_string(),
        None => "unknown (check server.api_token)".to_string(),
    };
    let ready = report.whatsapp.as_ref().is_some_and(|wa| wa.ready);
    match (use_color, ready) {
        (true, true) => println!("    WhatsApp: {}", line.green()),
        (true, false) => println!("    WhatsApp: {}", line.yellow()),
        (false, _) => println!("    WhatsApp: {line}"),
    }
    println!();
}
