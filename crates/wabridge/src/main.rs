// SPDX-FileCopyrightText: 2026 Wabridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! wabridge - WhatsApp to Django bridge.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;
mod status;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use wabridge_config::{ConfigError, WabridgeConfig};
use wabridge_core::WabridgeError;

/// wabridge - bridge a WhatsApp account to a Django backend.
#[derive(Parser, Debug)]
#[command(name = "wabridge", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the default locations.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the bridge (default).
    Serve,
    /// Print the effective configuration as TOML, secrets redacted.
    Config,
    /// Validate the configuration and exit.
    Check,
    /// Query a running instance.
    Status {
        /// Output JSON.
        #[arg(long)]
        json: bool,
        /// Disable colors.
        #[arg(long)]
        plain: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            wabridge_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Config => print_config(&config),
        Commands::Check => {
            eprintln!("wabridge: configuration is valid");
            Ok(())
        }
        Commands::Status { json, plain } => status::run_status(&config, json, plain).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<WabridgeConfig, Vec<ConfigError>> {
    match path {
        Some(path) => wabridge_config::load_and_validate_path(path),
        None => wabridge_config::load_and_validate(),
    }
}

fn print_config(config: &WabridgeConfig) -> Result<(), WabridgeError> {
    let rendered = toml::to_string_pretty(&redacted(config))
        .map_err(|e| WabridgeError::Internal(format!("failed to render configuration: {e}")))?;
    print!("{rendered}");
    Ok(())
}

/// Copy of `config` with every credential masked.
fn redacted(config: &WabridgeConfig) -> WabridgeConfig {
    const MASK: &str = "[redacted]";
    let mask = |secret: &Option<String>| secret.as_ref().map(|_| MASK.to_string());

    let mut copy = config.clone();
    copy.server.api_token = mask(&config.server.api_token);
    copy.whatsapp.api_key = mask(&config.whatsapp.api_key);
    copy.whatsapp.webhook_token = mask(&config.whatsapp.webhook_token);
    copy
}
