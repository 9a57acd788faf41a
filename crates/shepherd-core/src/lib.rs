//! # shepherd-core: Pure Commerce Domain
//!
//! Types and rules of the bookshop order, inventory and payment-settlement
//! pipeline, as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shepherd Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                    shepherd-api (axum)                          │    │
//! │  │       /api/v1/orders ...  /api/v1/payments ...  /health         │    │
//! │  └─────────────────────────────┬───────────────────────────────────┘    │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │          shepherd-commerce (OrderManager, PaymentService)       │    │
//! │  │                  + Paystack gateway adapter                     │    │
//! │  └──────────────┬──────────────────────────────┬───────────────────┘    │
//! │                 │                              │                        │
//! │  ┌──────────────▼──────────────┐  ┌────────────▼────────────────────┐   │
//! │  │  ★ shepherd-core (THIS) ★   │  │  shepherd-db (SQLite, ledger)   │   │
//! │  │  money · status · pricing   │◄─│  repositories, migrations       │   │
//! │  │  validation · reference     │  └─────────────────────────────────┘   │
//! │  └─────────────────────────────┘                                        │
//! │        NO I/O • NO DATABASE • NO NETWORK                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Book, Order, Payment, ...)
//! - [`money`] - Integer minor-unit money
//! - [`status`] - Order transition table and payment status merge
//! - [`pricing`] - Order totals from catalog rows
//! - [`validation`] - Request validation
//! - [`reference`] - Order numbers and payment references
//! - [`error`] - Domain error types and the shared `ErrorKind`
//!
//! ## Example Usage
//!
//! ```rust
//! use shepherd_core::{OrderStatus, PaymentStatus};
//!
//! assert!(OrderStatus::Confirmed.can_transition_to(OrderStatus::Processing));
//! assert!(!OrderStatus::Completed.can_transition_to(OrderStatus::Cancelled));
//!
//! // A late failure report never overrides a settled payment
//! assert_eq!(PaymentStatus::Successful.merge(PaymentStatus::Failed), None);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod pricing;
pub mod reference;
pub mod status;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::Money;
pub use status::{OrderStatus, PaymentStatus, StockEffect};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines in one order.
pub const MAX_ORDER_LINES: usize = 100;

/// Maximum quantity of a single book in one order.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Flat home delivery fee in minor units (₦1,500).
pub const HOME_DELIVERY_FEE: i64 = 150_000;

/// Smallest payment accepted by the provider, in minor units (₦100).
pub const MIN_PAYMENT_MINOR: i64 = 10_000;

/// Order number allocations tried before giving up with a conflict.
pub const ORDER_NUMBER_ATTEMPTS: u32 = 5;

/// Field length limits, in characters.
pub const MAX_ADDRESS_LEN: usize = 500;
pub const MAX_CITY_LEN: usize = 100;
pub const MAX_STATE_LEN: usize = 100;
pub const MAX_NAME_LEN: usize = 100;
pub const MAX_PHONE_LEN: usize = 20;
pub const MAX_NOTES_LEN: usize = 500;
pub const MAX_PURPOSE_LEN: usize = 500;
