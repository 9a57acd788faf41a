//! # Error Types
//!
//! Domain-specific error types for shepherd-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  shepherd-core (this file)                                              │
//! │  ├── CoreError        - Business rule violations                        │
//! │  ├── ValidationError  - Input validation failures                       │
//! │  └── ErrorKind        - Caller-facing category shared by every layer    │
//! │                                                                         │
//! │  shepherd-db          DbError        - Storage and ledger failures      │
//! │  shepherd-commerce    CommerceError  - Core + Db + Gateway + Signature  │
//! │  shepherd-api         ApiError       - What clients see {code, message} │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CommerceError → ApiError           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::status::OrderStatus;

// =============================================================================
// Error Kind
// =============================================================================

/// The caller-facing category of any failure in the pipeline.
///
/// Every layer's error type exposes `kind()`; the HTTP surface maps a kind
/// to a status code without inspecting individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    InvalidTransition,
    InsufficientStock,
    UnsupportedMethod,
    Gateway,
    Signature,
    Internal,
}

impl ErrorKind {
    /// Gateway failures are transient and may be retried by the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Gateway)
    }
}

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations detected before anything is persisted.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Book referenced by an order line does not exist.
    #[error("Book not found: {0}")]
    BookNotFound(String),

    /// Book exists but is not on sale.
    #[error("Book is not available: {title}")]
    BookUnavailable { book_id: String, title: String },

    /// Not enough copies on the shelf for an order line.
    ///
    /// ## User Workflow
    /// ```text
    /// Create order (qty: 5)
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { title: "Daily Light", available: 3, requested: 5 }
    /// ```
    #[error("Insufficient stock for {title}: available {available}, requested {requested}")]
    InsufficientStock {
        book_id: String,
        title: String,
        available: i64,
        requested: i64,
    },

    /// The requested status change is not an edge of the transition table.
    #[error("Cannot transition order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Payment not found: {0}")]
    PaymentNotFound(String),

    /// The order already carries a successful payment.
    #[error("Order {0} has already been paid")]
    AlreadyPaid(String),

    /// The order is cancelled or refunded.
    #[error("Order {order_id} is {status} and cannot take a payment")]
    NotPayable { order_id: String, status: OrderStatus },

    /// A payment whose amount does not cover its order exactly.
    #[error("Payment of {paid_minor} does not match order {order_id} total {total_minor}")]
    PaymentMismatch {
        order_id: String,
        total_minor: i64,
        paid_minor: i64,
    },

    /// Soft delete requested on an order that is still live.
    #[error("Order {order_id} is {status} and cannot be removed")]
    NotRemovable { order_id: String, status: OrderStatus },

    /// Order number generation kept colliding.
    #[error("Could not allocate a unique order number after {attempts} attempts")]
    OrderNumberExhausted { attempts: u32 },

    /// Payment method is known but not wired to a provider.
    #[error("Payment method {0} is not supported")]
    UnsupportedMethod(String),

    /// Arithmetic overflow while totalling.
    #[error("Amount overflow while computing {0}")]
    AmountOverflow(&'static str),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::BookNotFound(_)
            | CoreError::OrderNotFound(_)
            | CoreError::PaymentNotFound(_) => ErrorKind::NotFound,
            CoreError::BookUnavailable { .. }
            | CoreError::AmountOverflow(_)
            | CoreError::PaymentMismatch { .. }
            | CoreError::Validation(_) => ErrorKind::Validation,
            CoreError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            CoreError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            CoreError::AlreadyPaid(_)
            | CoreError::NotPayable { .. }
            | CoreError::NotRemovable { .. }
            | CoreError::OrderNumberExhausted { .. } => ErrorKind::Conflict,
            CoreError::UnsupportedMethod(_) => ErrorKind::UnsupportedMethod,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any business logic runs and never retried.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value is below a minimum.
    #[error("{field} must be at least {min}")]
    TooSmall { field: String, min: i64 },

    /// Invalid format (e.g., invalid UUID, invalid JSON).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value within one request (e.g., the same book twice).
    #[error("{field} '{value}' appears more than once")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
