//! Owner notifications.
//!
//! Delivery is fire-and-forget: a sink never fails the workflow that
//! emitted the notification.

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use shepherd_core::{Order, OrderStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    OrderPlaced,
    OrderStatusChanged,
    OrderCancelled,
    PaymentReceived,
}

/// A message for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub user_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    /// Entity the notification is about (order id).
    pub reference_id: Option<String>,
}

impl Notification {
    pub fn order_placed(order: &Order) -> Self {
        Notification {
            user_id: order.user_id.clone(),
            kind: NotificationKind::OrderPlaced,
            title: "Order placed".to_string(),
            body: format!(
                "Your order {} for {} has been received.",
                order.order_number,
                order.total()
            ),
            reference_id: Some(order.id.clone()),
        }
    }

    pub fn status_changed(order: &Order) -> Self {
        let (kind, title) = match order.status {
            OrderStatus::Cancelled => (NotificationKind::OrderCancelled, "Order cancelled"),
            _ => (NotificationKind::OrderStatusChanged, "Order updated"),
        };
        Notification {
            user_id: order.user_id.clone(),
            kind,
            title: title.to_string(),
            body: format!("Order {} is now {}.", order.order_number, order.status),
            reference_id: Some(order.id.clone()),
        }
    }

    pub fn payment_received(order: &Order) -> Self {
        Notification {
            user_id: order.user_id.clone(),
            kind: NotificationKind::PaymentReceived,
            title: "Payment received".to_string(),
            body: format!(
                "We received {} for order {}.",
                order.total(),
                order.order_number
            ),
            reference_id: Some(order.id.clone()),
        }
    }
}

/// Where notifications go.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, notification: Notification);
}

/// Writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl NotificationSink for LogNotifier {
    async fn notify(&self, notification: Notification) {
        info!(
            user_id = %notification.user_id,
            kind = ?notification.kind,
            reference_id = ?notification.reference_id,
            title = %notification.title,
            "Notification"
        );
    }
}
