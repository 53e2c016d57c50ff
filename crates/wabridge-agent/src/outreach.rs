// SPDX-FileCopyrightText: 2026 Wabridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound campaigns: bulk promotional sends and payment reminders.

use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use wabridge_core::error::WabridgeError;
use wabridge_core::types::{ChatId, Debtor};
use wabridge_core::WhatsAppClient;

/// Name used in reminders when the payments API has none.
const FALLBACK_NAME: &str = "client";

/// Outcome of a bulk send, partitioned by recipient as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkSendReport {
    pub sent: Vec<String>,
    pub failed: Vec<String>,
}

impl BulkSendReport {
    pub fn sent_count(&self) -> usize {
        self.sent.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }
}

/// Reject a bulk send that has nothing to say or nobody to say it to.
pub fn validate_bulk_request(message: &str, contacts: &[String]) -> Result<(), WabridgeError> {
    if message.trim().is_empty() {
        return Err(WabridgeError::InvalidRequest(
            "message must not be empty".into(),
        ));
    }
    if contacts.is_empty() {
        return Err(WabridgeError::InvalidRequest(
            "contacts must contain at least one phone number".into(),
        ));
    }
    Ok(())
}

/// Send `message` to each contact in order. A failure never aborts the batch.
pub async fn bulk_send(
    client: &dyn WhatsAppClient,
    message: &str,
    contacts: &[String],
    default_country_code: &str,
) -> BulkSendReport {
    let mut report = BulkSendReport::default();

    for contact in contacts {
        let Some(chat_id) = ChatId::from_phone(contact, default_country_code) else {
            warn!(contact = %contact, "invalid phone number, skipping");
            report.failed.push(contact.clone());
            continue;
        };

        match client.send_text(&chat_id, message).await {
            Ok(_) => report.sent.push(contact.clone()),
            Err(e) => {
                warn!(contact = %contact, error = %e, "bulk send failed");
                report.failed.push(contact.clone());
            }
        }
    }

    info!(
        sent = report.sent_count(),
        failed = report.failed_count(),
        "bulk send finished"
    );
    report
}

/// A payment reminder ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub chat_id: ChatId,
    pub text: String,
}

/// Fill `{name}`, `{balance}` and `{tour}` in `template` from `debtor`.
pub fn render_reminder(template: &str, debtor: &Debtor) -> String {
    let name = debtor
        .client_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(FALLBACK_NAME);
    let balance = debtor
        .balance_remaining
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "0".to_string());
    let tour = debtor.tour_title.as_deref().unwrap_or_default();

    template
        .replace("{name}", name)
        .replace("{balance}", &balance)
        .replace("{tour}", tour)
}

/// Reminders for every debtor with a usable phone number.
pub fn plan_reminders(
    debtors: &[Debtor],
    template: &str,
    default_country_code: &str,
) -> Vec<Reminder> {
    debtors
        .iter()
        .filter_map(|debtor| {
            let phone = debtor.client_phone.as_deref().unwrap_or_default();
            match ChatId::from_phone(phone, default_country_code) {
                Some(chat_id) => Some(Reminder {
                    chat_id,
                    text: render_reminder(template, debtor),
                }),
                None => {
                    warn!(
                        client = debtor.client_name.as_deref().unwrap_or_default(),
                        phone, "debtor has no usable phone number, skipping"
                    );
                    None
                }
            }
        })
        .collect()
}

/// Send every reminder on a background task, logging each failure.
pub fn spawn_reminders(
    client: Arc<dyn WhatsAppClient>,
    reminders: Vec<Reminder>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let total = reminders.len();
        let mut delivered = 0usize;
        for reminder in reminders {
            match client.send_text(&reminder.chat_id, &reminder.text).await {
                Ok(_) => delivered += 1,
                Err(e) => {
                    warn!(chat_id = %reminder.chat_id, error = %e, "payment reminder failed");
                }
            }
        }
        info!(delivered, total, "payment reminders finished");
    })
}
