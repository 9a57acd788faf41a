//! # Status Machines
//!
//! Order fulfillment status, payment status, and the rules that move them.
//!
//! ## Order Transition Table
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  PENDING ──► CONFIRMED ──► PROCESSING ──┬──► SHIPPED ──► DELIVERED ─┐   │
//! │     │            │        (stock out)   │        │                  │   │
//! │     │            │            │         └──► READY ──► COMPLETED ◄──┘   │
//! │     │            │            │                │                        │
//! │     ▼            ▼            ▼                ▼                        │
//! │  ─────────────────────── CANCELLED ◄────────────── (from SHIPPED too)   │
//! │                        (stock back in if it was taken out)              │
//! │                                                                         │
//! │  COMPLETED, CANCELLED, REFUNDED: terminal, no outgoing edges            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The table is a single exhaustive `match`; adding a status without deciding
//! its edges is a compile error.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Order Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Ready,
    Delivered,
    Completed,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [OrderStatus; 9] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Ready,
        OrderStatus::Delivered,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
        OrderStatus::Refunded,
    ];

    /// Statuses reachable from `self` in one step.
    pub const fn allowed_transitions(&self) -> &'static [OrderStatus] {
        use OrderStatus::*;
        match self {
            Pending => &[Confirmed, Cancelled],
            Confirmed => &[Processing, Cancelled],
            Processing => &[Shipped, Ready, Cancelled],
            Shipped => &[Delivered, Cancelled],
            Ready => &[Completed, Cancelled],
            Delivered => &[Completed],
            Completed | Cancelled | Refunded => &[],
        }
    }

    /// Returns true if `(self, next)` is an edge of the transition table.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    /// Terminal statuses have no outgoing edges.
    pub fn is_terminal(&self) -> bool {
        self.allowed_transitions().is_empty()
    }

    /// Cancelled and refunded orders never take a payment.
    pub fn accepts_payment(&self) -> bool {
        !matches!(self, OrderStatus::Cancelled | OrderStatus::Refunded)
    }

    /// Statuses from which the owner may cancel their own order.
    ///
    /// Narrower than the admin table: once the parcel has shipped or is
    /// waiting at the counter, only staff can cancel.
    pub fn is_cancellable_by_owner(&self) -> bool {
        matches!(
            self,
            OrderStatus::Pending | OrderStatus::Confirmed | OrderStatus::Processing
        )
    }

    /// Canonical lowercase name, identical to the stored column value.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Ready => "ready",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: OrderStatus::ALL.iter().map(|s| s.to_string()).collect(),
            })
    }
}

// =============================================================================
// Stock Effect
// =============================================================================

/// What a status change does to inventory.
///
/// Derived from the target status plus the order's explicit reservation
/// marker, never from the previous status alone. Editing the transition table
/// cannot make a cancellation restore stock that was never taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockEffect {
    /// Leave inventory alone.
    None,
    /// Decrement every line's book (entering PROCESSING).
    Reserve,
    /// Put every line back (cancelling after a reservation).
    Release,
}

impl StockEffect {
    pub fn for_transition(to: OrderStatus, stock_reserved: bool) -> Self {
        match to {
            OrderStatus::Processing if !stock_reserved => StockEffect::Reserve,
            OrderStatus::Cancelled if stock_reserved => StockEffect::Release,
            _ => StockEffect::None,
        }
    }
}

// =============================================================================
// Payment Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Successful,
    Failed,
}

impl PaymentStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Successful => "successful",
            PaymentStatus::Failed => "failed",
        }
    }

    /// Idempotent merge of an inbound provider outcome into the stored status.
    ///
    /// Returns the status to write, or `None` when the stored value must stay.
    ///
    /// ```text
    /// stored \ incoming   PENDING   SUCCESSFUL   FAILED
    /// PENDING             -         SUCCESSFUL   FAILED
    /// FAILED              -         SUCCESSFUL   -
    /// SUCCESSFUL          -         -            -
    /// ```
    ///
    /// The same rule is enforced again by the conditional UPDATE in the
    /// payment repository so that racing writers converge.
    pub fn merge(self, incoming: PaymentStatus) -> Option<PaymentStatus> {
        match (self, incoming) {
            (PaymentStatus::Successful, _) => None,
            (_, PaymentStatus::Pending) => None,
            (current, next) if current == next => None,
            (_, next) => Some(next),
        }
    }

    /// Only SUCCESSFUL is final.
    pub fn is_settled(&self) -> bool {
        matches!(self, PaymentStatus::Successful)
    }
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Pending
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    const EDGES: &[(OrderStatus, OrderStatus)] = &[
        (Pending, Confirmed),
        (Pending, Cancelled),
        (Confirmed, Processing),
        (Confirmed, Cancelled),
        (Processing, Shipped),
        (Processing, Ready),
        (Processing, Cancelled),
        (Shipped, Delivered),
        (Shipped, Cancelled),
        (Ready, Completed),
        (Ready, Cancelled),
        (Delivered, Completed),
    ];

    #[test]
    fn test_transition_table_is_exactly_the_edge_list() {
        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                let expected = EDGES.contains(&(from, to));
                assert_eq!(
                    from.can_transition_to(to),
                    expected,
                    "{} -> {} should be {}",
                    from,
                    to,
                    expected
                );
            }
        }
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(Completed.is_terminal());
        assert!(Cancelled.is_terminal());
        assert!(Refunded.is_terminal());
        assert!(!Delivered.is_terminal());
    }

    #[test]
    fn test_owner_cancellable() {
        let cancellable: Vec<_> = OrderStatus::ALL
            .into_iter()
            .filter(|s| s.is_cancellable_by_owner())
            .collect();
        assert_eq!(cancellable, vec![Pending, Confirmed, Processing]);
    }

    #[test]
    fn test_closed_orders_refuse_payment() {
        let refusing: Vec<_> = OrderStatus::ALL
            .into_iter()
            .filter(|s| !s.accepts_payment())
            .collect();
        assert_eq!(refusing, vec![Cancelled, Refunded]);
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("processing".parse::<OrderStatus>().unwrap(), Processing);
        assert_eq!("SHIPPED".parse::<OrderStatus>().unwrap(), Shipped);
        assert!("lost".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_stock_effect_uses_marker() {
        assert_eq!(StockEffect::for_transition(Processing, false), StockEffect::Reserve);
        assert_eq!(StockEffect::for_transition(Processing, true), StockEffect::None);
        assert_eq!(StockEffect::for_transition(Cancelled, true), StockEffect::Release);
        assert_eq!(StockEffect::for_transition(Cancelled, false), StockEffect::None);
        assert_eq!(StockEffect::for_transition(Shipped, true), StockEffect::None);
    }

    #[test]
    fn test_payment_merge_success_is_sticky() {
        use PaymentStatus as P;
        assert_eq!(P::Successful.merge(P::Failed), None);
        assert_eq!(P::Successful.merge(P::Pending), None);
        assert_eq!(P::Successful.merge(P::Successful), None);
    }

    #[test]
    fn test_payment_merge_from_pending_and_failed() {
        use PaymentStatus as P;
        assert_eq!(P::Pending.merge(P::Successful), Some(P::Successful));
        assert_eq!(P::Pending.merge(P::Failed), Some(P::Failed));
        assert_eq!(P::Pending.merge(P::Pending), None);
        assert_eq!(P::Failed.merge(P::Successful), Some(P::Successful));
        assert_eq!(P::Failed.merge(P::Pending), None);
        assert_eq!(P::Failed.merge(P::Failed), None);
    }
}
