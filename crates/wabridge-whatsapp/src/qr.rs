// SPDX-FileCopyrightText: 2026 Wabridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pairing token rendering: an SVG data URI for the status endpoint and a
//! unicode block for the console.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use qrcode::QrCode;
use qrcode::render::{svg, unicode};
use wabridge_core::WabridgeError;

const DATA_URI_PREFIX: &str = "data:image/svg+xml;base64,";

/// Render `token` as a `data:image/svg+xml;base64,...` URI.
pub fn render_data_uri(token: &str) -> Result<String, WabridgeError> {
    let code = encode(token)?;
    let image = code
        .render::<svg::Color<'_>>()
        .min_dimensions(256, 256)
        .quiet_zone(true)
        .build();
    Ok(format!("{DATA_URI_PREFIX}{}", STANDARD.encode(image)))
}

/// Render `token` with half-block characters, two modules per line.
pub fn render_terminal(token: &str) -> Result<String, WabridgeError> {
    let code = encode(token)?;
    Ok(code
        .render::<unicode::Dense1x2>()
        .dark_color(unicode::Dense1x2::Light)
        .light_color(unicode::Dense1x2::Dark)
        .build())
}

fn encode(token: &str) -> Result<QrCode, WabridgeError> {
    QrCode::new(token.as_bytes()).map_err(|e| WabridgeError::Client {
        message: format!("QR generation failed: {e}"),
        source: Some(Box::new(e)),
    })
}
