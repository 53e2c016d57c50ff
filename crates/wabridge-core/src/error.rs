// SPDX-FileCopyrightText: 2026 Wabridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the wabridge service.

use thiserror::Error;

/// The primary error type used across all wabridge adapter traits and core operations.
#[derive(Debug, Error)]
pub enum WabridgeError {
    /// Configuration errors (invalid TOML, missing required fields, bad URLs).
    #[error("configuration error: {0}")]
    Config(String),

    /// WhatsApp client errors (sidecar unreachable, rejected command, bad payload).
    #[error("whatsapp client error: {message}")]
    Client {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Forwarding or payments API errors.
    #[error("forwarding error: {message}")]
    Forwarding {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A control request was malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Filesystem errors (session directory handling).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl WabridgeError {
    /// Shorthand for a client error without an underlying source.
    pub fn client(message: impl Into<String>) -> Self {
        Self::Client {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a forwarding error without an underlying source.
    pub fn forwarding(message: impl Into<String>) -> Self {
        Self::Forwarding {
            message: message.into(),
            source: None,
        }
    }
}
