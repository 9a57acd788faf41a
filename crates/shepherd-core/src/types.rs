//! # Domain Types
//!
//! Core domain types used throughout the order and payment pipeline.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐        │
//! │  │      Book       │   │      Order      │   │    Payment      │        │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │        │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │        │
//! │  │  title          │   │  order_number   │   │  payment_ref    │        │
//! │  │  price_minor    │   │  status         │   │  status         │        │
//! │  │  stock_quantity │   │  total_minor    │   │  amount_minor   │        │
//! │  └─────────────────┘   └────────┬────────┘   │  reference_id ──┼──► id  │
//! │                                 │ 1..n       └─────────────────┘        │
//! │                        ┌────────▼────────┐                              │
//! │                        │    OrderItem    │  title + unit price frozen   │
//! │                        └─────────────────┘  at creation                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Orders and payments have:
//! - `id`: UUID v4, immutable, used for relations
//! - Business ID: `order_number` / `payment_ref`, human readable and unique

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::status::{OrderStatus, PaymentStatus};

// =============================================================================
// Book
// =============================================================================

/// A catalog book. Stock is only ever changed through the inventory ledger.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: Option<String>,
    /// Price in minor units (kobo).
    pub price_minor: i64,
    /// Copies on the shelf. Never negative.
    pub stock_quantity: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Book {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_minor(self.price_minor)
    }

    /// Checks if enough copies are on the shelf.
    pub fn has_stock(&self, quantity: i64) -> bool {
        self.stock_quantity >= quantity
    }
}

// =============================================================================
// Delivery
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryType {
    /// Collected at the bookshop counter.
    Pickup,
    /// Shipped to the customer for a flat fee.
    HomeDelivery,
}

impl DeliveryType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            DeliveryType::Pickup => "pickup",
            DeliveryType::HomeDelivery => "home_delivery",
        }
    }
}

impl Default for DeliveryType {
    fn default() -> Self {
        DeliveryType::Pickup
    }
}

/// Free-form delivery metadata supplied by the customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryDetails {
    pub delivery_address: Option<String>,
    pub delivery_city: Option<String>,
    pub delivery_state: Option<String>,
    pub recipient_name: Option<String>,
    pub recipient_phone: Option<String>,
    pub customer_notes: Option<String>,
}

// =============================================================================
// Order Requests
// =============================================================================

/// One requested line of a new order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub book_id: String,
    pub quantity: i64,
}

/// Everything a customer submits to place an order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub items: Vec<OrderLine>,
    pub delivery_type: DeliveryType,
    #[serde(flatten)]
    pub delivery: DeliveryDetails,
}

// =============================================================================
// Order
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub order_number: String,
    /// Owner.
    pub user_id: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<PaymentMethod>,
    pub payment_ref: Option<String>,
    pub subtotal_minor: i64,
    pub delivery_fee_minor: i64,
    pub total_minor: i64,
    pub delivery_type: DeliveryType,
    pub delivery_address: Option<String>,
    pub delivery_city: Option<String>,
    pub delivery_state: Option<String>,
    pub recipient_name: Option<String>,
    pub recipient_phone: Option<String>,
    pub customer_notes: Option<String>,
    pub admin_notes: Option<String>,
    /// Set while this order holds stock taken out by the ledger.
    pub stock_reserved: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub paid_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub completed_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Order {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_minor(self.total_minor)
    }

    #[inline]
    pub fn is_paid(&self) -> bool {
        self.payment_status.is_settled()
    }

    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

// =============================================================================
// Order Item
// =============================================================================

/// A line item of an order.
/// Uses snapshot pattern to freeze title and price at time of order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub book_id: String,
    /// Book title at time of order (frozen).
    pub title_snapshot: String,
    pub quantity: i64,
    /// Unit price at time of order (frozen).
    pub unit_price_minor: i64,
    /// unit_price × quantity.
    pub subtotal_minor: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_minor(self.subtotal_minor)
    }
}

/// An order together with its lines.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// A `(book, quantity)` pair handed to the inventory ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockLine {
    pub book_id: String,
    pub quantity: i64,
}

impl From<&OrderItem> for StockLine {
    fn from(item: &OrderItem) -> Self {
        StockLine {
            book_id: item.book_id.clone(),
            quantity: item.quantity,
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Card / bank payment through Paystack.
    Paystack,
    /// Manual bank transfer, confirmed by staff.
    BankTransfer,
    /// Cash at the counter.
    Cash,
}

impl PaymentMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Paystack => "paystack",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Cash => "cash",
        }
    }
}

// =============================================================================
// Payment
// =============================================================================

/// A provider-backed payment, correlated to its purpose by `reference_id`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Payment {
    pub id: String,
    pub user_id: String,
    pub amount_minor: i64,
    pub method: PaymentMethod,
    /// Globally unique provider reference.
    pub payment_ref: String,
    pub purpose: String,
    /// What was paid for, e.g. an order id.
    pub reference_id: Option<String>,
    /// JSON object text sent to the provider.
    pub metadata: Option<String>,
    pub status: PaymentStatus,
    #[ts(as = "Option<String>")]
    pub paid_at: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_minor(self.amount_minor)
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// Requested page. Out-of-range values are clamped, never rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl Page {
    pub const DEFAULT_LIMIT: u32 = 20;
    pub const MAX_LIMIT: u32 = 100;

    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Page {
            page: page.unwrap_or(1).max(1),
            limit: limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, Self::MAX_LIMIT),
        }
    }

    /// Rows to skip.
    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
    }
}

impl Default for Page {
    fn default() -> Self {
        Page::new(None, None)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: i64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: i64, page: Page) -> Self {
        let limit = page.limit as i64;
        let total_pages = (total + limit - 1) / limit;
        Paginated {
            items,
            total,
            page: page.page,
            limit: page.limit,
            total_pages,
            has_next_page: (page.page as i64) < total_pages,
            has_previous_page: page.page > 1,
        }
    }
}

// =============================================================================
// Queries and Reports
// =============================================================================

/// Admin listing filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub delivery_type: Option<DeliveryType>,
    /// Substring of the order number.
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub total_orders: i64,
    pub pending_orders: i64,
    pub processing_orders: i64,
    pub completed_orders: i64,
    pub cancelled_orders: i64,
    pub paid_orders: i64,
    /// Σ total of paid orders, minor units.
    pub total_revenue_minor: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStats {
    pub total_payments: i64,
    pub successful_payments: i64,
    /// Σ amount of successful payments, minor units.
    pub total_revenue_minor: i64,
    /// Latest successful payments, newest first.
    pub recent: Vec<Payment>,
}

// =============================================================================
// Unit Tests
// =============================================================================
