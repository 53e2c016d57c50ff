// SPDX-FileCopyrightText: 2026 Wabridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the wabridge service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level wabridge configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WabridgeConfig {
    /// HTTP control surface settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// WhatsApp automation sidecar settings.
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,

    /// Forwarding and payments API endpoints.
    #[serde(default)]
    pub forwarding: ForwardingConfig,

    /// Connection supervisor timings.
    #[serde(default)]
    pub supervisor: SupervisorConfig,

    /// Bulk send and payment reminder settings.
    #[serde(default)]
    pub outreach: OutreachConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP control surface configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind the server to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on. The `PORT` environment variable takes precedence.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Origins allowed by the CORS policy.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    /// Bearer token required on control routes. `None` leaves them open.
    #[serde(default)]
    pub api_token: Option<String>,

    /// Directory of static files served on unmatched paths (QR page).
    #[serde(default)]
    pub static_dir: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: default_allowed_origins(),
            api_token: None,
            static_dir: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "https://ts.travel4you.ma".to_string(),
        "https://backoff.travel4you.ma".to_string(),
    ]
}

/// WhatsApp automation sidecar configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WhatsAppConfig {
    /// Base URL of the sidecar REST API.
    #[serde(default = "default_bridge_url")]
    pub bridge_url: String,

    /// API key sent as `x-api-key` to the sidecar.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Directory where the client persists its authenticated session.
    #[serde(default = "default_session_dir")]
    pub session_dir: String,

    /// Pinned WhatsApp Web version.
    #[serde(default = "default_web_version")]
    pub web_version: String,

    /// Remote cache the client fetches the pinned web version from.
    #[serde(default = "default_web_version_cache_url")]
    pub web_version_cache_url: String,

    /// URL the sidecar posts events to (this service's `/whatsapp-events`).
    #[serde(default = "default_webhook_url")]
    pub webhook_url: String,

    /// Bearer token the sidecar must present on the webhook.
    #[serde(default)]
    pub webhook_token: Option<String>,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            bridge_url: default_bridge_url(),
            api_key: None,
            session_dir: default_session_dir(),
            web_version: default_web_version(),
            web_version_cache_url: default_web_version_cache_url(),
            webhook_url: default_webhook_url(),
            webhook_token: None,
        }
    }
}

fn default_bridge_url() -> String {
    "http://127.0.0.1:3000".to_string()
}

fn default_session_dir() -> String {
    "/data/.wwebjs_auth".to_string()
}

fn default_web_version() -> String {
    "2.2412.54".to_string()
}

fn default_web_version_cache_url() -> String {
    "https://raw.githubusercontent.com/wppconnect-team/wa-version/main/html/{version}.html"
        .to_string()
}

fn default_webhook_url() -> String {
    "http://127.0.0.1:8080/whatsapp-events".to_string()
}

/// Backend API endpoints.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ForwardingConfig {
    /// Endpoint receiving `{sender_number, message_body}`.
    #[serde(default = "default_message_url")]
    pub message_url: String,

    /// Endpoint receiving `[{number, direction}]` batches.
    #[serde(default = "default_contacts_url")]
    pub contacts_url: String,

    /// Payments API endpoint listing debtors. `None` disables payment reminders.
    #[serde(default)]
    pub debtors_url: Option<String>,
}

impl Default for ForwardingConfig {
    fn default() -> Self {
        Self {
            message_url: default_message_url(),
            contacts_url: default_contacts_url(),
            debtors_url: None,
        }
    }
}

fn default_message_url() -> String {
    "https://ts.travel4you.ma/api/receive-message/".to_string()
}

fn default_contacts_url() -> String {
    "https://ts.travel4you.ma/api/sync_contacts/sync_contacts/".to_string()
}

/// Connection supervisor timings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SupervisorConfig {
    /// Seconds to wait for `ready` after `authenticated` before recovering.
    #[serde(default = "default_recovery_timeout_secs")]
    pub recovery_timeout_secs: u64,

    /// Seconds between destroying and reinitializing on hard recovery.
    #[serde(default = "default_hard_recovery_delay_secs")]
    pub hard_recovery_delay_secs: u64,

    /// Seconds before reinitializing after a `disconnected` event.
    #[serde(default = "default_disconnect_reinit_delay_secs")]
    pub disconnect_reinit_delay_secs: u64,

    /// Seconds before reinitializing after the session was cleared.
    #[serde(default = "default_clear_session_reinit_delay_secs")]
    pub clear_session_reinit_delay_secs: u64,

    /// Seconds before retrying a failed destroy.
    #[serde(default = "default_destroy_retry_delay_secs")]
    pub destroy_retry_delay_secs: u64,

    /// Seconds between contact syncs while ready.
    #[serde(default = "default_contact_sync_interval_secs")]
    pub contact_sync_interval_secs: u64,

    /// Upper bound on the live state query made during recovery.
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,

    /// Replay unread messages through the relay when the client becomes ready.
    #[serde(default = "default_process_unread_on_ready")]
    pub process_unread_on_ready: bool,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            recovery_timeout_secs: default_recovery_timeout_secs(),
            hard_recovery_delay_secs: default_hard_recovery_delay_secs(),
            disconnect_reinit_delay_secs: default_disconnect_reinit_delay_secs(),
            clear_session_reinit_delay_secs: default_clear_session_reinit_delay_secs(),
            destroy_retry_delay_secs: default_destroy_retry_delay_secs(),
            contact_sync_interval_secs: default_contact_sync_interval_secs(),
            probe_timeout_secs: default_probe_timeout_secs(),
            process_unread_on_ready: default_process_unread_on_ready(),
        }
    }
}

impl SupervisorConfig {
    pub fn recovery_timeout(&self) -> Duration {
        Duration::from_secs(self.recovery_timeout_secs)
    }

    pub fn hard_recovery_delay(&self) -> Duration {
        Duration::from_secs(self.hard_recovery_delay_secs)
    }

    pub fn disconnect_reinit_delay(&self) -> Duration {
        Duration::from_secs(self.disconnect_reinit_delay_secs)
    }

    pub fn clear_session_reinit_delay(&self) -> Duration {
        Duration::from_secs(self.clear_session_reinit_delay_secs)
    }

    pub fn destroy_retry_delay(&self) -> Duration {
        Duration::from_secs(self.destroy_retry_delay_secs)
    }

    pub fn contact_sync_interval(&self) -> Duration {
        Duration::from_secs(self.contact_sync_interval_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

fn default_recovery_timeout_secs() -> u64 {
    60
}

fn default_hard_recovery_delay_secs() -> u64 {
    2
}

fn default_disconnect_reinit_delay_secs() -> u64 {
    5
}

fn default_clear_session_reinit_delay_secs() -> u64 {
    2
}

fn default_destroy_retry_delay_secs() -> u64 {
    2
}

fn default_contact_sync_interval_secs() -> u64 {
    120 // 2 minutes
}

fn default_probe_timeout_secs() -> u64 {
    10
}

fn default_process_unread_on_ready() -> bool {
    true
}

/// Bulk send and payment reminder configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OutreachConfig {
    /// Reminder text. Placeholders: `{name}`, `{balance}`, `{tour}`.
    #[serde(default = "default_reminder_template")]
    pub reminder_template: String,

    /// Country code substituted for a national `0` prefix.
    #[serde(default = "default_country_code")]
    pub default_country_code: String,
}

impl Default for OutreachConfig {
    fn default() -> Self {
        Self {
            reminder_template: default_reminder_template(),
            default_country_code: default_country_code(),
        }
    }
}

fn default_reminder_template() -> String {
    "Bonjour {name}, il reste {balance} MAD à régler pour votre voyage \"{tour}\". \
     Merci de régulariser votre paiement dès que possible. Travel4You"
        .to_string()
}

fn default_country_code() -> String {
    "212".to_string()
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
