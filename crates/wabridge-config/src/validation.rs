// SPDX-FileCopyrightText: 2026 Wabridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as parseable origins, http(s) endpoints, and non-zero intervals.

use crate::diagnostic::ConfigError;
use crate::model::WabridgeConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &WabridgeConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    let host = config.server.host.trim();
    if host.is_empty() {
        fail("server.host must not be empty".to_string());
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            fail(format!(
                "server.host `{host}` is not a valid IP address or hostname"
            ));
        }
    }

    for origin in &config.server.allowed_origins {
        if !is_http_url(origin) || origin.ends_with('/') {
            fail(format!(
                "server.allowed_origins entry `{origin}` must be a scheme://host[:port] origin without trailing slash"
            ));
        }
    }

    let endpoints = [
        ("whatsapp.bridge_url", Some(&config.whatsapp.bridge_url)),
        ("whatsapp.webhook_url", Some(&config.whatsapp.webhook_url)),
        ("forwarding.message_url", Some(&config.forwarding.message_url)),
        ("forwarding.contacts_url", Some(&config.forwarding.contacts_url)),
        ("forwarding.debtors_url", config.forwarding.debtors_url.as_ref()),
    ];
    for (key, value) in endpoints {
        if let Some(url) = value
            && !is_http_url(url)
        {
            fail(format!("{key} `{url}` must be an http:// or https:// URL"));
        }
    }

    if config.whatsapp.session_dir.trim().is_empty() {
        fail("whatsapp.session_dir must not be empty".to_string());
    }

    let supervisor = &config.supervisor;
    let non_zero = [
        ("supervisor.recovery_timeout_secs", supervisor.recovery_timeout_secs),
        (
            "supervisor.contact_sync_interval_secs",
            supervisor.contact_sync_interval_secs,
        ),
        ("supervisor.probe_timeout_secs", supervisor.probe_timeout_secs),
    ];
    for (key, value) in non_zero {
        if value == 0 {
            fail(format!("{key} must be greater than zero"));
        }
    }

    let country_code = &config.outreach.default_country_code;
    if country_code.is_empty() || !country_code.chars().all(|c| c.is_ascii_digit()) {
        fail(format!(
            "outreach.default_country_code `{country_code}` must contain digits only"
        ));
    }

    if config.outreach.reminder_template.trim().is_empty() {
        fail("outreach.reminder_template must not be empty".to_string());
    }

    if !matches!(
        config.logging.level.as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    ) {
        fail(format!(
            "logging.level `{}` must be one of trace, debug, info, warn, error",
            config.logging.level
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_http_url(value: &str) -> bool {
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    matches!(rest, Some(host) if !host.is_empty() && !host.starts_with('/'))
}
