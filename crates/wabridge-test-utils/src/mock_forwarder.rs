// SPDX-FileCopyrightText: 2026 Wabridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock Forwarding and Payments API for deterministic testing.

use async_trait::async_trait;
use tokio::sync::Mutex;

use wabridge_core::error::WabridgeError;
use wabridge_core::traits::{ForwardingApi, PaymentsApi, PluginAdapter};
use wabridge_core::types::{AdapterType, ContactRecord, Debtor, HealthStatus, MessageForward};

/// Records every forwarded message and contact batch.
///
/// Debtors are served from a scripted list; `fail_forwarding()` and
/// `fail_debtors()` switch the corresponding calls to errors.
#[derive(Default)]
pub struct MockForwarder {
    forwards: Mutex<Vec<MessageForward>>,
    batches: Mutex<Vec<Vec<ContactRecord>>>,
    debtors: Mutex<Vec<Debtor>>,
    forwarding_down: Mutex<bool>,
    payments_down: Mutex<bool>,
}

impl MockForwarder {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_debtors(&self, debtors: Vec<Debtor>) {
        *self.debtors.lock().await = debtors;
    }

    /// Make `forward_message()` and `sync_contacts()` fail.
    pub async fn fail_forwarding(&self, down: bool) {
        *self.forwarding_down.lock().await = down;
    }

    /// Make `list_debtors()` fail.
    pub async fn fail_debtors(&self, down: bool) {
        *self.payments_down.lock().await = down;
    }

    /// Messages posted to the Forwarding API, including failed attempts.
    pub async fn forwarded(&self) -> Vec<MessageForward> {
        self.forwards.lock().await.clone()
    }

    /// Contact batches posted to the Forwarding API.
    pub async fn contact_batches(&self) -> Vec<Vec<ContactRecord>> {
        self.batches.lock().await.clone()
    }
}

#[async_trait]
impl PluginAdapter for MockForwarder {
    fn name(&self) -> &str {
        "mock-forwarder"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Forwarding
    }

    async fn health_check(&self) -> Result<HealthStatus, WabridgeError> {
        if *self.forwarding_down.lock().await {
            Ok(HealthStatus::Degraded("mock forwarding down".into()))
        } else {
            Ok(HealthStatus::Healthy)
        }
    }
}

#[async_trait]
impl ForwardingApi for MockForwarder {
    async fn forward_message(&self, msg: &MessageForward) -> Result<(), WabridgeError> {
        self.forwards.lock().await.push(msg.clone());
        if *self.forwarding_down.lock().await {
            return Err(WabridgeError::forwarding("mock forwarding down"));
        }
        Ok(())
    }

    async fn sync_contacts(&self, contacts: &[ContactRecord]) -> Result<(), WabridgeError> {
        self.batches.lock().await.push(contacts.to_vec());
        if *self.forwarding_down.lock().await {
            return Err(WabridgeError::forwarding("mock forwarding down"));
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentsApi for MockForwarder {
    async fn list_debtors(&self) -> Result<Vec<Debtor>, WabridgeError> {
        if *self.payments_down.lock().await {
            return Err(WabridgeError::forwarding("mock payments down"));
        }
        Ok(self.debtors.lock().await.clone())
    }
}
