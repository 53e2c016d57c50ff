// SPDX-FileCopyrightText: 2026 Wabridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the WhatsApp Web sidecar REST API.
//!
//! Provides [`SidecarClient`] which handles request construction, the
//! `x-api-key` header, and one retry on transient errors for reads.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use wabridge_core::WabridgeError;

use crate::types::SidecarErrorResponse;

/// Delay before retrying a read that failed with a transient status.
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Thin REST client for the sidecar.
///
/// Writes (session start/destroy, sends) are never retried: a duplicated
/// `POST /messages` would deliver the text twice.
#[derive(Debug, Clone)]
pub struct SidecarClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
}

impl SidecarClient {
    /// Creates a client for the sidecar at `base_url`.
    pub fn new(base_url: &str, api_key: Option<&str>) -> Result<Self, WabridgeError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key {
            headers.insert(
                "x-api-key",
                HeaderValue::from_str(key).map_err(|e| {
                    WabridgeError::Config(format!("invalid sidecar API key header value: {e}"))
                })?,
            );
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| WabridgeError::Client {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries: 1,
        })
    }

    /// Base URL without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET` a JSON resource, retrying once on transient errors.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, WabridgeError> {
        let mut attempt = 0;
        loop {
            let response = self.send(Method::GET, path, None::<&()>).await?;
            let status = response.status();

            if is_transient_error(status) && attempt < self.max_retries {
                attempt += 1;
                warn!(status = %status, path, attempt, "transient sidecar error, will retry");
                tokio::time::sleep(RETRY_DELAY).await;
                continue;
            }

            return decode(path, response).await;
        }
    }

    /// `POST` a JSON body and decode the JSON response.
    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, WabridgeError> {
        let response = self.send(Method::POST, path, Some(body)).await?;
        decode(path, response).await
    }

    /// `POST` and discard the response body.
    pub async fn post_empty<B: Serialize>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<(), WabridgeError> {
        let response = self.send(Method::POST, path, body).await?;
        check_status(path, response).await.map(drop)
    }

    async fn send<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<reqwest::Response, WabridgeError> {
        let url = format!("{}{path}", self.base_url);
        let mut request = self.client.request(method.clone(), &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| WabridgeError::Client {
            message: format!("sidecar request {method} {path} failed: {e}"),
            source: Some(Box::new(e)),
        })?;
        debug!(status = %response.status(), %method, path, "sidecar response received");
        Ok(response)
    }
}

async fn check_status(
    path: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, WabridgeError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<SidecarErrorResponse>(&body) {
        Ok(err) => format!("sidecar {path} returned {status}: {}", err.error),
        Err(_) => format!("sidecar {path} returned {status}: {body}"),
    };
    Err(WabridgeError::client(message))
}

async fn decode<T: DeserializeOwned>(
    path: &str,
    response: reqwest::Response,
) -> Result<T, WabridgeError> {
    let response = check_status(path, response).await?;
    response.json::<T>().await.map_err(|e| WabridgeError::Client {
        message: format!("failed to parse sidecar response for {path}: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 502 | 503 | 504)
}
