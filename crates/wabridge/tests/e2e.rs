// SPDX-FileCopyrightText: 2026 Wabridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests of the `wabridge` binary's offline subcommands.
//!
//! Each test writes its own config file and runs the compiled binary with
//! `WABRIDGE_*` and `PORT` stripped from the environment.

use std::path::Path;
use std::process::{Command, Output};

fn wabridge(config: &Path, args: &[&str]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_wabridge"));
    cmd.arg("--config").arg(config).args(args);
    for (key, _) in std::env::vars() {
        if key.starts_with("WABRIDGE_") || key == "PORT" {
            cmd.env_remove(key);
        }
    }
    cmd.output().expect("binary should run")
}

fn write_config(dir: &tempfile::TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("wabridge.toml");
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn check_accepts_a_valid_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        &dir,
        r#"
[server]
port = 9090
api_token = "s3cret"

[forwarding]
message_url = "https://backoff.example/api/messages/"
contacts_url = "https://backoff.example/api/contacts/"
"#,
    );

    let output = wabridge(&config, &["check"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("configuration is valid"));
}

#[test]
fn check_reports_typos_with_a_suggestion() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, "[server]\nprot = 9090\n");

    let output = wabridge(&config, &["check"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("prot"), "stderr: {stderr}");
    assert!(stderr.contains("port"), "stderr: {stderr}");
}

#[test]
fn check_collects_every_validation_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        &dir,
        r#"
[forwarding]
message_url = "ftp://nowhere"

[supervisor]
recovery_timeout_secs = 0
"#,
    );

    let output = wabridge(&config, &["check"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("message_url"), "stderr: {stderr}");
    assert!(stderr.contains("recovery_timeout_secs"), "stderr: {stderr}");
}

#[test]
fn config_prints_effective_toml_without_secrets() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        &dir,
        r#"
[server]
api_token = "s3cret"

[whatsapp]
webhook_token = "hook-token"

[outreach]
default_country_code = "33"
"#,
    );

    let output = wabridge(&config, &["config"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let printed: toml::Value = toml::from_str(&stdout).expect("output is TOML");

    assert_eq!(printed["server"]["api_token"].as_str(), Some("[redacted]"));
    assert_eq!(printed["whatsapp"]["webhook_token"].as_str(), Some("[redacted]"));
    assert_eq!(printed["outreach"]["default_country_code"].as_str(), Some("33"));
    assert_eq!(printed["supervisor"]["recovery_timeout_secs"].as_integer(), Some(60));
    assert!(!stdout.contains("s3cret"));
    assert!(!stdout.contains("hook-token"));
}

#[test]
fn status_reports_not_running_as_json() {
    let dir = tempfile::tempdir().unwrap();
    // Port 9 (discard) is essentially never served on loopback.
    let config = write_config(&dir, "[server]\nhost = \"127.0.0.1\"\nport = 9\n");

    let output = wabridge(&config, &["status", "--json"]);
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["running"], false);
    assert_eq!(report["endpoint"], "http://127.0.0.1:9");
}
