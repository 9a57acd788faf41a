//! # Order Pricing
//!
//! Turns a validated order request plus the current catalog rows into priced
//! lines and totals. Pure: the caller fetches the books.
//!
//! ## Pricing Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  NewOrder.items ──► for each line                                       │
//! │                        ├── book missing?     → BookNotFound             │
//! │                        ├── book inactive?    → BookUnavailable          │
//! │                        ├── stock < quantity? → InsufficientStock        │
//! │                        └── snapshot title + unit price                  │
//! │                                                                         │
//! │  subtotal     = Σ unit_price × quantity                                 │
//! │  delivery_fee = HOME_DELIVERY_FEE if HomeDelivery else 0                │
//! │  total        = subtotal + delivery_fee                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust
//! use shepherd_core::pricing::delivery_fee;
//! use shepherd_core::DeliveryType;
//!
//! assert_eq!(delivery_fee(DeliveryType::Pickup).minor(), 0);
//! assert_eq!(delivery_fee(DeliveryType::HomeDelivery).minor(), 150_000);
//! ```

use std::collections::HashMap;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Book, DeliveryType, NewOrder};
use crate::HOME_DELIVERY_FEE;

/// A priced order line with frozen title and price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub book_id: String,
    pub title: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub subtotal: Money,
}

/// Totals for a new order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedOrder {
    pub lines: Vec<PricedLine>,
    pub subtotal: Money,
    pub delivery_fee: Money,
    pub total: Money,
}

/// Flat delivery fee for a delivery type.
pub fn delivery_fee(delivery_type: DeliveryType) -> Money {
    match delivery_type {
        DeliveryType::Pickup => Money::zero(),
        DeliveryType::HomeDelivery => Money::from_minor(HOME_DELIVERY_FEE),
    }
}

/// Prices an order against the given catalog rows.
///
/// Lines keep the request order. `books` may contain extra rows.
pub fn price_order(order: &NewOrder, books: &[Book]) -> CoreResult<PricedOrder> {
    let catalog: HashMap<&str, &Book> = books.iter().map(|b| (b.id.as_str(), b)).collect();

    let mut lines = Vec::with_capacity(order.items.len());
    let mut subtotal = Money::zero();

    for item in &order.items {
        let book = catalog
            .get(item.book_id.as_str())
            .ok_or_else(|| CoreError::BookNotFound(item.book_id.clone()))?;

        if !book.is_active {
            return Err(CoreError::BookUnavailable {
                book_id: book.id.clone(),
                title: book.title.clone(),
            });
        }

        if !book.has_stock(item.quantity) {
            return Err(CoreError::InsufficientStock {
                book_id: book.id.clone(),
                title: book.title.clone(),
                available: book.stock_quantity,
                requested: item.quantity,
            });
        }

        let unit_price = book.price();
        let line_total = unit_price
            .checked_multiply_quantity(item.quantity)
            .ok_or(CoreError::AmountOverflow("line subtotal"))?;
        subtotal = subtotal
            .checked_add(line_total)
            .ok_or(CoreError::AmountOverflow("order subtotal"))?;

        lines.push(PricedLine {
            book_id: book.id.clone(),
            title: book.title.clone(),
            quantity: item.quantity,
            unit_price,
            subtotal: line_total,
        });
    }

    let delivery_fee = delivery_fee(order.delivery_type);
    let total = subtotal
        .checked_add(delivery_fee)
        .ok_or(CoreError::AmountOverflow("order total"))?;

    Ok(PricedOrder {
        lines,
        subtotal,
        delivery_fee,
        total,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DeliveryDetails, OrderLine};
    use chrono::Utc;

    fn book(id: &str, price_minor: i64, stock: i64, active: bool) -> Book {
        Book {
            id: id.to_string(),
            title: format!("Book {}", id),
            author: None,
            price_minor,
            stock_quantity: stock,
            is_active: active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn order(lines: &[(&str, i64)], delivery_type: DeliveryType) -> NewOrder {
        NewOrder {
            items: lines
                .iter()
                .map(|(id, q)| OrderLine {
                    book_id: id.to_string(),
                    quantity: *q,
                })
                .collect(),
            delivery_type,
            delivery: DeliveryDetails::default(),
        }
    }

    #[test]
    fn test_pickup_two_copies() {
        let books = [book("a", 100_000, 10, true)];
        let priced = price_order(&order(&[("a", 2)], DeliveryType::Pickup), &books).unwrap();

        assert_eq!(priced.subtotal.minor(), 200_000);
        assert_eq!(priced.delivery_fee.minor(), 0);
        assert_eq!(priced.total.minor(), 200_000);
        assert_eq!(priced.lines[0].unit_price.minor(), 100_000);
        assert_eq!(priced.lines[0].title, "Book a");
    }

    #[test]
    fn test_home_delivery_totals_add_up() {
        let books = [book("a", 250_000, 5, true), book("b", 99_950, 5, true)];
        let priced = price_order(
            &order(&[("a", 1), ("b", 3)], DeliveryType::HomeDelivery),
            &books,
        )
        .unwrap();

        let line_sum: Money = priced.lines.iter().map(|l| l.subtotal).sum();
        assert_eq!(priced.subtotal, line_sum);
        assert_eq!(priced.delivery_fee.minor(), HOME_DELIVERY_FEE);
        assert_eq!(priced.total, priced.subtotal + priced.delivery_fee);
        assert_eq!(priced.subtotal.minor(), 250_000 + 3 * 99_950);
    }

    #[test]
    fn test_rejects_missing_inactive_and_short_stock() {
        let books = [book("a", 1000, 1, true), book("off", 1000, 9, false)];

        assert!(matches!(
            price_order(&order(&[("zzz", 1)], DeliveryType::Pickup), &books),
            Err(CoreError::BookNotFound(id)) if id == "zzz"
        ));
        assert!(matches!(
            price_order(&order(&[("off", 1)], DeliveryType::Pickup), &books),
            Err(CoreError::BookUnavailable { .. })
        ));
        assert!(matches!(
            price_order(&order(&[("a", 2)], DeliveryType::Pickup), &books),
            Err(CoreError::InsufficientStock {
                available: 1,
                requested: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_overflow_is_an_error() {
        let books = [book("a", i64::MAX / 2, 999, true)];
        assert!(matches!(
            price_order(&order(&[("a", 3)], DeliveryType::Pickup), &books),
            Err(CoreError::AmountOverflow(_))
        ));
    }
}
