// SPDX-FileCopyrightText: 2026 Wabridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./wabridge.toml` > `~/.config/wabridge/wabridge.toml` > `/etc/wabridge/wabridge.toml`
//! with environment variable overrides via `WABRIDGE_` prefix and the
//! conventional `PORT` variable.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::WabridgeConfig;

/// Top-level config sections, used to split `WABRIDGE_<SECTION>_<KEY>` names.
const SECTIONS: &[&str] = &[
    "server",
    "whatsapp",
    "forwarding",
    "supervisor",
    "outreach",
    "logging",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/wabridge/wabridge.toml` (system-wide)
/// 3. `~/.config/wabridge/wabridge.toml` (user XDG config)
/// 4. `./wabridge.toml` (local directory)
/// 5. `WABRIDGE_*` environment variables
/// 6. `PORT`
pub fn load_config() -> Result<WabridgeConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<WabridgeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WabridgeConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<WabridgeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WabridgeConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .merge(port_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(WabridgeConfig::default()))
        .merge(Toml::file("/etc/wabridge/wabridge.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("wabridge/wabridge.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("wabridge.toml"))
        .merge(env_provider())
        .merge(port_provider())
}

/// Map `WABRIDGE_<SECTION>_<KEY>` to `<section>.<key>`.
///
/// Uses `Env::map()` NOT `Env::split("_")`: `WABRIDGE_WHATSAPP_SESSION_DIR`
/// must map to `whatsapp.session_dir`, not `whatsapp.session.dir`.
fn env_provider() -> Env {
    Env::prefixed("WABRIDGE_").map(|key| section_key(key.as_str()).into())
}

/// The platform-conventional `PORT` variable maps to `server.port`.
fn port_provider() -> Env {
    Env::raw().only(&["PORT"]).map(|_| "server.port".into())
}

/// Figment hands the key over in its original case, so match on the lowercased form.
fn section_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key
}
