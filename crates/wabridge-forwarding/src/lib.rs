// SPDX-FileCopyrightText: 2026 Wabridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP adapter for the Forwarding API (inbound messages, contact sync) and
//! the Payments API (debtors list).
//!
//! Deliveries are best-effort: a failed POST is reported to the caller once
//! and never retried or queued.

use std::sync::Mutex;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};
use wabridge_config::model::ForwardingConfig;
use wabridge_core::error::WabridgeError;
use wabridge_core::traits::{ForwardingApi, PaymentsApi, PluginAdapter};
use wabridge_core::types::{AdapterType, ContactRecord, Debtor, HealthStatus, MessageForward};

/// Forwarding and Payments API client.
pub struct HttpBackend {
    client: reqwest::Client,
    message_url: String,
    contacts_url: String,
    debtors_url: Option<String>,
    last_error: Mutex<Option<String>>,
}

impl HttpBackend {
    pub fn new(config: &ForwardingConfig) -> Result<Self, WabridgeError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| WabridgeError::Forwarding {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            message_url: config.message_url.clone(),
            contacts_url: config.contacts_url.clone(),
            debtors_url: config.debtors_url.clone(),
            last_error: Mutex::new(None),
        })
    }

    /// Whether a debtors endpoint is configured.
    pub fn payments_enabled(&self) -> bool {
        self.debtors_url.is_some()
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<(), WabridgeError> {
        let result = self.try_post_json(url, body).await;
        self.record(&result);
        result
    }

    async fn try_post_json<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<(), WabridgeError> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| WabridgeError::Forwarding {
                message: format!("POST {url} failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, url, "forwarding response received");
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(WabridgeError::forwarding(format!(
            "POST {url} returned {status}: {body}"
        )))
    }

    fn record(&self, result: &Result<(), WabridgeError>) {
        if let Ok(mut last) = self.last_error.lock() {
            *last = result.as_ref().err().map(ToString::to_string);
        }
    }
}

#[async_trait]
impl PluginAdapter for HttpBackend {
    fn name(&self) -> &str {
        "forwarding-http"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Forwarding
    }

    /// Reports the outcome of the most recent delivery.
    async fn health_check(&self) -> Result<HealthStatus, WabridgeError> {
        let last = self
            .last_error
            .lock()
            .map_err(|_| WabridgeError::Internal("forwarding health lock poisoned".into()))?;
        Ok(match last.as_ref() {
            None => HealthStatus::Healthy,
            Some(err) => HealthStatus::Degraded(format!("last delivery failed: {err}")),
        })
    }
}

#[async_trait]
impl ForwardingApi for HttpBackend {
    async fn forward_message(&self, msg: &MessageForward) -> Result<(), WabridgeError> {
        self.post_json(&self.message_url, msg).await
    }

    async fn sync_contacts(&self, contacts: &[ContactRecord]) -> Result<(), WabridgeError> {
        self.post_json(&self.contacts_url, contacts).await
    }
}

#[async_trait]
impl PaymentsApi for HttpBackend {
    async fn list_debtors(&self) -> Result<Vec<Debtor>, WabridgeError> {
        let url = self
            .debtors_url
            .as_deref()
            .ok_or_else(|| WabridgeError::Config("forwarding.debtors_url is not set".into()))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| WabridgeError::Forwarding {
                message: format!("GET {url} failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, url, "payments API rejected debtors request");
            return Err(WabridgeError::forwarding(format!(
                "GET {url} returned {status}: {body}"
            )));
        }

        response
            .json::<Vec<Debtor>>()
            .await
            .map_err(|e| WabridgeError::Forwarding {
                message: format!("failed to parse debtors list: {e}"),
                source: Some(Box::new(e)),
            })
    }
}
