// SPDX-FileCopyrightText: 2026 Wabridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Traits for the backend APIs the bridge reports to.

use async_trait::async_trait;

use crate::error::WabridgeError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ContactRecord, Debtor, MessageForward};

/// The backend that ingests relayed messages and contact syncs.
#[async_trait]
pub trait ForwardingApi: PluginAdapter {
    /// Delivers one inbound message.
    async fn forward_message(&self, msg: &MessageForward) -> Result<(), WabridgeError>;

    /// Delivers a contact sync batch.
    async fn sync_contacts(&self, contacts: &[ContactRecord]) -> Result<(), WabridgeError>;
}

/// The backend that lists clients with an outstanding balance.
#[async_trait]
pub trait PaymentsApi: PluginAdapter {
    async fn list_debtors(&self) -> Result<Vec<Debtor>, WabridgeError>;
}
