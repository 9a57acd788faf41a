//! Webhook event normalization.
//!
//! ```text
//! event                                   status
//! ─────────────────────────────────────   ──────────
//! charge.success | transaction.success    SUCCESSFUL   paid_at = data.paid_at or now
//! charge.failed  | transaction.failed     FAILED
//! anything else                           PENDING      (logged, never applied)
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use shepherd_core::{PaymentStatus, ValidationError};

use super::CustomerInfo;

/// A provider event reduced to what reconciliation needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedEvent {
    pub event_type: String,
    pub reference: String,
    pub status: PaymentStatus,
    /// Minor units, when the provider sent one.
    pub amount: Option<i64>,
    pub paid_at: Option<DateTime<Utc>>,
    pub customer: CustomerInfo,
    pub metadata: Option<Value>,
}

/// Maps a provider event name to the payment status it reports.
pub fn status_for_event(event_type: &str) -> PaymentStatus {
    match event_type {
        "charge.success" | "transaction.success" => PaymentStatus::Successful,
        "charge.failed" | "transaction.failed" => PaymentStatus::Failed,
        other => {
            warn!(event_type = %other, "Unhandled webhook event type");
            PaymentStatus::Pending
        }
    }
}

/// Parses and normalizes a raw webhook body.
///
/// ## Errors
/// `InvalidFormat` for a body that is not a JSON object, `Required` when
/// neither `data.reference` nor `data.tx_ref` is present.
pub fn process_webhook_event(raw_body: &[u8]) -> Result<NormalizedEvent, ValidationError> {
    let event: Value =
        serde_json::from_slice(raw_body).map_err(|e| ValidationError::InvalidFormat {
            field: "body".to_string(),
            reason: e.to_string(),
        })?;

    if !event.is_object() {
        return Err(ValidationError::InvalidFormat {
            field: "body".to_string(),
            reason: "expected a JSON object".to_string(),
        });
    }

    let event_type = event
        .get("event")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let data = event.get("data").cloned().unwrap_or(Value::Null);

    let reference = ["reference", "tx_ref"]
        .iter()
        .find_map(|key| data.get(*key).and_then(Value::as_str))
        .filter(|r| !r.trim().is_empty())
        .ok_or_else(|| ValidationError::Required {
            field: "data.reference".to_string(),
        })?
        .to_string();

    let status = status_for_event(&event_type);
    let paid_at = match status {
        PaymentStatus::Successful => Some(
            data.get("paid_at")
                .and_then(Value::as_str)
                .and_then(parse_timestamp)
                .unwrap_or_else(Utc::now),
        ),
        _ => None,
    };

    Ok(NormalizedEvent {
        event_type,
        reference,
        status,
        amount: data.get("amount").and_then(Value::as_i64),
        paid_at,
        customer: customer_from(data.get("customer")),
        metadata: data.get("metadata").filter(|m| m.is_object()).cloned(),
    })
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// `first_name last_name` when the provider has a name, else the email.
pub(crate) fn customer_from(customer: Option<&Value>) -> CustomerInfo {
    let Some(customer) = customer else {
        return CustomerInfo::default();
    };

    let field = |key: &str| {
        customer
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let email = field("email");
    let name = match field("first_name") {
        Some(first) => {
            let full = format!("{} {}", first, field("last_name").unwrap_or_default());
            Some(full.trim().to_string())
        }
        None => email.clone(),
    };

    CustomerInfo { email, name }
}
