//! # Validation Module
//!
//! Input validation for order and payment requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP extractor (serde)                                        │
//! │  └── Shape and enum values                                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                   │
//! │  ├── Line counts, quantities, duplicate books                           │
//! │  ├── Field length limits                                                │
//! │  └── Payment amount / purpose / metadata rules                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                             │
//! │  ├── CHECK (stock_quantity >= 0)                                        │
//! │  ├── UNIQUE (order_number), UNIQUE (payment_ref)                        │
//! │  └── Foreign keys                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shepherd_core::validation::{validate_quantity, validate_payment_amount};
//!
//! assert!(validate_quantity(2).is_ok());
//! assert!(validate_payment_amount(5_000).is_err()); // below ₦100
//! ```

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::types::{DeliveryDetails, NewOrder, OrderLine};
use crate::{
    MAX_ADDRESS_LEN, MAX_CITY_LEN, MAX_ITEM_QUANTITY, MAX_NAME_LEN, MAX_NOTES_LEN,
    MAX_ORDER_LINES, MAX_PHONE_LEN, MAX_PURPOSE_LEN, MAX_STATE_LEN, MIN_PAYMENT_MINOR,
};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates an optional free-text field against a character limit.
///
/// `None` and empty strings are accepted.
pub fn validate_optional_text(
    field: &str,
    value: Option<&str>,
    max: usize,
) -> ValidationResult<()> {
    match value {
        Some(text) if text.chars().count() > max => Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        }),
        _ => Ok(()),
    }
}

/// Validates the delivery metadata of a new order.
pub fn validate_delivery(details: &DeliveryDetails) -> ValidationResult<()> {
    validate_optional_text(
        "deliveryAddress",
        details.delivery_address.as_deref(),
        MAX_ADDRESS_LEN,
    )?;
    validate_optional_text("deliveryCity", details.delivery_city.as_deref(), MAX_CITY_LEN)?;
    validate_optional_text(
        "deliveryState",
        details.delivery_state.as_deref(),
        MAX_STATE_LEN,
    )?;
    validate_optional_text(
        "recipientName",
        details.recipient_name.as_deref(),
        MAX_NAME_LEN,
    )?;
    validate_optional_text(
        "recipientPhone",
        details.recipient_phone.as_deref(),
        MAX_PHONE_LEN,
    )?;
    validate_optional_text(
        "customerNotes",
        details.customer_notes.as_deref(),
        MAX_NOTES_LEN,
    )?;
    Ok(())
}

/// Validates a payment purpose.
///
/// ## Rules
/// - Must not be blank
/// - At most 500 characters
pub fn validate_purpose(purpose: &str) -> ValidationResult<()> {
    let purpose = purpose.trim();

    if purpose.is_empty() {
        return Err(ValidationError::Required {
            field: "purpose".to_string(),
        });
    }

    if purpose.chars().count() > MAX_PURPOSE_LEN {
        return Err(ValidationError::TooLong {
            field: "purpose".to_string(),
            max: MAX_PURPOSE_LEN,
        });
    }

    Ok(())
}

/// Validates a customer email.
///
/// Only a shape check; the provider is the authority on deliverability.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must look like name@domain".to_string(),
        }),
    }
}

/// Validates a payment reference supplied by a client.
pub fn validate_payment_ref(reference: &str) -> ValidationResult<()> {
    if reference.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "paymentRef".to_string(),
        });
    }
    Ok(())
}

/// Validates a search query.
///
/// ## Returns
/// The trimmed query, or `None` when blank.
pub fn validate_search_query(query: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(query) = query.map(str::trim).filter(|q| !q.is_empty()) else {
        return Ok(None);
    };

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "search".to_string(),
            max: 100,
        });
    }

    Ok(Some(query.to_string()))
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - At least 1
/// - At most MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if !(1..=MAX_ITEM_QUANTITY).contains(&qty) {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a payment amount in minor units.
///
/// ## Rules
/// - At least MIN_PAYMENT_MINOR (₦100)
///
/// ## Example
/// ```rust
/// use shepherd_core::validation::validate_payment_amount;
///
/// assert!(validate_payment_amount(10_000).is_ok());
/// assert!(validate_payment_amount(9_999).is_err());
/// ```
pub fn validate_payment_amount(minor: i64) -> ValidationResult<()> {
    if minor < MIN_PAYMENT_MINOR {
        return Err(ValidationError::TooSmall {
            field: "amount".to_string(),
            min: MIN_PAYMENT_MINOR,
        });
    }

    Ok(())
}

// =============================================================================
// Structured Validators
// =============================================================================

/// Validates a UUID string.
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

/// Validates the requested lines of a new order.
///
/// ## Rules
/// ```text
/// items.len() == 0            → Required
/// items.len() > 100           → OutOfRange
/// bookId not a UUID           → InvalidFormat
/// quantity outside 1..=999    → OutOfRange
/// same bookId twice           → Duplicate
/// ```
pub fn validate_order_lines(items: &[OrderLine]) -> ValidationResult<()> {
    if items.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    if items.len() > MAX_ORDER_LINES {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_ORDER_LINES as i64,
        });
    }

    let mut seen = HashSet::with_capacity(items.len());
    for line in items {
        validate_uuid("bookId", &line.book_id)?;
        validate_quantity(line.quantity)?;

        if !seen.insert(line.book_id.as_str()) {
            return Err(ValidationError::Duplicate {
                field: "bookId".to_string(),
                value: line.book_id.clone(),
            });
        }
    }

    Ok(())
}

/// Validates a whole order request.
pub fn validate_new_order(order: &NewOrder) -> ValidationResult<()> {
    validate_order_lines(&order.items)?;
    validate_delivery(&order.delivery)
}

/// Validates caller-supplied payment metadata.
///
/// Must be a JSON object when present; scalars and arrays cannot be merged
/// with the system keys.
pub fn validate_metadata(metadata: Option<&serde_json::Value>) -> ValidationResult<()> {
    match metadata {
        None | Some(serde_json::Value::Null) | Some(serde_json::Value::Object(_)) => Ok(()),
        Some(_) => Err(ValidationError::InvalidFormat {
            field: "metadata".to_string(),
            reason: "must be a JSON object".to_string(),
        }),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
