//! # Order Manager
//!
//! Order lifecycle on top of the repositories.
//!
//! ## Create
//! ```text
//! NewOrder ──► validate ──► load books ──► price_order ──► insert_with_items
//!                                              │                 │
//!                          NotFound / Unavailable /     order_number taken?
//!                          InsufficientStock             └── regenerate (≤ 5)
//! ```
//!
//! ## Transition
//! ```text
//! load order ──► table check ──► apply_transition(expected = observed status)
//!                    │                    │
//!            InvalidTransition      StaleState → re-read → InvalidTransition
//!                                                       or NotFound
//! ```
//!
//! Stock is only taken on entering PROCESSING and only given back on
//! CANCELLED when the order actually holds it; both happen inside the
//! transition's transaction.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shepherd_core::pricing::{self, PricedOrder};
use shepherd_core::reference::generate_order_number;
use shepherd_core::validation::{
    validate_new_order, validate_optional_text, validate_payment_ref, validate_search_query,
};
use shepherd_core::{
    CoreError, NewOrder, Order, OrderFilter, OrderItem, OrderStats, OrderStatus, OrderWithItems,
    Page, Paginated, Payment, PaymentMethod, PaymentStatus, MAX_NOTES_LEN,
    ORDER_NUMBER_ATTEMPTS,
};
use shepherd_db::{Database, DbError, OrderQuery, Transition};

use crate::error::CommerceResult;
use crate::notify::{Notification, NotificationSink};

/// Source of candidate order numbers.
pub type OrderNumberSource = Arc<dyn Fn() -> String + Send + Sync>;

/// Order lifecycle service.
#[derive(Clone)]
pub struct OrderManager {
    db: Database,
    notifier: Arc<dyn NotificationSink>,
    order_numbers: OrderNumberSource,
}

impl OrderManager {
    pub fn new(db: Database, notifier: Arc<dyn NotificationSink>) -> Self {
        OrderManager {
            db,
            notifier,
            order_numbers: Arc::new(generate_order_number),
        }
    }

    /// Replaces the order number generator.
    pub fn with_order_numbers(mut self, source: OrderNumberSource) -> Self {
        self.order_numbers = source;
        self
    }

    // =========================================================================
    // Create
    // =========================================================================

    /// Places a new PENDING order.
    ///
    /// Stock is checked here but not taken; it is reserved when the order
    /// enters PROCESSING.
    pub async fn create_order(
        &self,
        owner_id: &str,
        request: NewOrder,
    ) -> CommerceResult<OrderWithItems> {
        validate_new_order(&request)?;

        let book_ids: Vec<String> = request.items.iter().map(|l| l.book_id.clone()).collect();
        let books = self.db.books().get_many(&book_ids).await?;
        let priced = pricing::price_order(&request, &books)?;

        for attempt in 1..=ORDER_NUMBER_ATTEMPTS {
            let (order, items) = build_order(owner_id, &request, &priced, (self.order_numbers)());

            match self.db.orders().insert_with_items(&order, &items).await {
                Ok(()) => {
                    info!(
                        order_id = %order.id,
                        order_number = %order.order_number,
                        user_id = %owner_id,
                        total_minor = order.total_minor,
                        lines = items.len(),
                        "Order created"
                    );
                    self.notifier.notify(Notification::order_placed(&order)).await;
                    return Ok(OrderWithItems { order, items });
                }
                Err(e) if e.is_unique_violation_on("order_number") => {
                    warn!(
                        attempt,
                        order_number = %order.order_number,
                        "Order number collision, regenerating"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(CoreError::OrderNumberExhausted {
            attempts: ORDER_NUMBER_ATTEMPTS,
        }
        .into())
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Moves an order along the transition table (staff operation).
    pub async fn update_status(
        &self,
        order_id: &str,
        next: OrderStatus,
        notes: Option<String>,
    ) -> CommerceResult<OrderWithItems> {
        validate_optional_text("adminNotes", notes.as_deref(), MAX_NOTES_LEN)?;

        let order = self.load(order_id).await?;
        if !order.status.can_transition_to(next) {
            return Err(CoreError::InvalidTransition {
                from: order.status,
                to: next,
            }
            .into());
        }

        let transition = Transition {
            order_id: order_id.to_string(),
            expected: order.status,
            next,
            admin_notes: notes,
            require_unpaid: false,
        };

        let outcome = match self.db.orders().apply_transition(&transition).await {
            Ok(outcome) => outcome,
            Err(DbError::StaleState { .. }) => {
                let current = self.load(order_id).await?;
                debug!(order_id = %order_id, current = %current.status, "Lost transition race");
                return Err(CoreError::InvalidTransition {
                    from: current.status,
                    to: next,
                }
                .into());
            }
            Err(e) => return Err(e.into()),
        };

        info!(
            order_id = %order_id,
            from = %order.status,
            to = %next,
            stock = ?outcome.stock,
            "Order status updated"
        );
        self.notifier
            .notify(Notification::status_changed(&outcome.order))
            .await;

        self.with_items(outcome.order).await
    }

    /// Customer cancellation of their own order.
    ///
    /// ## Rules
    /// ```text
    /// not the owner                      → NotFound
    /// not PENDING/CONFIRMED/PROCESSING   → InvalidTransition
    /// already paid                       → Conflict
    /// ```
    pub async fn cancel_order(&self, order_id: &str, owner_id: &str) -> CommerceResult<OrderWithItems> {
        let order = self.load_owned(order_id, owner_id).await?;
        if let Some(rejection) = cancel_rejection(&order) {
            return Err(rejection.into());
        }

        let transition = Transition {
            order_id: order_id.to_string(),
            expected: order.status,
            next: OrderStatus::Cancelled,
            admin_notes: None,
            require_unpaid: true,
        };

        let outcome = match self.db.orders().apply_transition(&transition).await {
            Ok(outcome) => outcome,
            Err(DbError::StaleState { .. }) => {
                let current = self.load_owned(order_id, owner_id).await?;
                return Err(cancel_rejection(&current)
                    .unwrap_or(CoreError::InvalidTransition {
                        from: current.status,
                        to: OrderStatus::Cancelled,
                    })
                    .into());
            }
            Err(e) => return Err(e.into()),
        };

        info!(
            order_id = %order_id,
            user_id = %owner_id,
            from = %order.status,
            stock = ?outcome.stock,
            "Order cancelled by owner"
        );
        self.notifier
            .notify(Notification::status_changed(&outcome.order))
            .await;

        self.with_items(outcome.order).await
    }

    // =========================================================================
    // Settlement
    // =========================================================================

    /// Records a payment taken outside the gateway, e.g. cash at pickup.
    pub async fn mark_paid(
        &self,
        order_id: &str,
        method: PaymentMethod,
        payment_ref: &str,
        paid_at: DateTime<Utc>,
    ) -> CommerceResult<Order> {
        validate_payment_ref(payment_ref)?;
        let order = self.load(order_id).await?;
        if let Some(err) = payment_rejection(&order) {
            return Err(err.into());
        }
        self.record_payment(order_id, method, payment_ref.trim(), paid_at)
            .await
    }

    /// Applies a settled gateway payment to the order it names.
    ///
    /// The payer must own the order and the amount must equal its total.
    pub async fn settle_payment(&self, order_id: &str, payment: &Payment) -> CommerceResult<Order> {
        let order = self.load(order_id).await?;
        if let Some(err) = settlement_rejection(&order, &payment.user_id, payment.amount_minor) {
            return Err(err.into());
        }
        let paid_at = payment.paid_at.unwrap_or_else(Utc::now);
        self.record_payment(order_id, payment.method, &payment.payment_ref, paid_at)
            .await
    }

    async fn record_payment(
        &self,
        order_id: &str,
        method: PaymentMethod,
        payment_ref: &str,
        paid_at: DateTime<Utc>,
    ) -> CommerceResult<Order> {
        let changed = self
            .db
            .orders()
            .mark_paid(order_id, method, payment_ref, paid_at)
            .await?;

        let order = self.load(order_id).await?;
        if !changed {
            // Lost a race with a payment or a cancellation
            return Err(payment_rejection(&order)
                .unwrap_or_else(|| CoreError::AlreadyPaid(order_id.to_string()))
                .into());
        }

        info!(
            order_id = %order_id,
            payment_ref = %payment_ref,
            method = method.as_str(),
            "Order marked paid"
        );
        self.notifier
            .notify(Notification::payment_received(&order))
            .await;

        Ok(order)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Fetches an order with items. With `owner_id`, orders of other users
    /// are reported as missing.
    pub async fn get_order(
        &self,
        order_id: &str,
        owner_id: Option<&str>,
    ) -> CommerceResult<OrderWithItems> {
        let order = match owner_id {
            Some(owner_id) => self.load_owned(order_id, owner_id).await?,
            None => self.load(order_id).await?,
        };
        self.with_items(order).await
    }

    pub async fn list_orders_for_owner(
        &self,
        owner_id: &str,
        page: Page,
    ) -> CommerceResult<Paginated<Order>> {
        let query = OrderQuery {
            owner_id: Some(owner_id.to_string()),
            filter: OrderFilter::default(),
        };
        let (orders, total) = self.db.orders().list(&query, page).await?;
        Ok(Paginated::new(orders, total, page))
    }

    pub async fn list_orders(
        &self,
        filter: OrderFilter,
        page: Page,
    ) -> CommerceResult<Paginated<Order>> {
        let search = validate_search_query(filter.search.as_deref())?;
        let query = OrderQuery {
            owner_id: None,
            filter: OrderFilter { search, ..filter },
        };
        let (orders, total) = self.db.orders().list(&query, page).await?;
        Ok(Paginated::new(orders, total, page))
    }

    pub async fn order_stats(&self) -> CommerceResult<OrderStats> {
        Ok(self.db.orders().stats().await?)
    }

    /// Soft-deletes a finished, unpaid order.
    pub async fn remove_order(&self, order_id: &str) -> CommerceResult<()> {
        let order = self.load(order_id).await?;
        if let Some(rejection) = removal_rejection(&order) {
            return Err(rejection.into());
        }

        if !self.db.orders().soft_delete(order_id).await? {
            let current = self.load(order_id).await?;
            return Err(removal_rejection(&current)
                .unwrap_or(CoreError::OrderNotFound(order_id.to_string()))
                .into());
        }

        info!(order_id = %order_id, order_number = %order.order_number, "Order removed");
        Ok(())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn load(&self, order_id: &str) -> CommerceResult<Order> {
        self.db
            .orders()
            .get(order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()).into())
    }

    async fn load_owned(&self, order_id: &str, owner_id: &str) -> CommerceResult<Order> {
        let order = self.load(order_id).await?;
        if order.user_id != owner_id {
            return Err(CoreError::OrderNotFound(order_id.to_string()).into());
        }
        Ok(order)
    }

    async fn with_items(&self, order: Order) -> CommerceResult<OrderWithItems> {
        let items = self.db.orders().get_items(&order.id).await?;
        Ok(OrderWithItems { order, items })
    }
}

fn cancel_rejection(order: &Order) -> Option<CoreError> {
    if !order.status.is_cancellable_by_owner() {
        return Some(CoreError::InvalidTransition {
            from: order.status,
            to: OrderStatus::Cancelled,
        });
    }
    if order.is_paid() {
        return Some(CoreError::AlreadyPaid(order.id.clone()));
    }
    None
}

fn payment_rejection(order: &Order) -> Option<CoreError> {
    if !order.status.accepts_payment() {
        return Some(CoreError::NotPayable {
            order_id: order.id.clone(),
            status: order.status,
        });
    }
    if order.is_paid() {
        return Some(CoreError::AlreadyPaid(order.id.clone()));
    }
    None
}

/// Why a gateway payment by `payer_id` for `amount_minor` cannot pay `order`.
/// Orders of other users are reported as missing.
pub(crate) fn settlement_rejection(
    order: &Order,
    payer_id: &str,
    amount_minor: i64,
) -> Option<CoreError> {
    if order.user_id != payer_id {
        return Some(CoreError::OrderNotFound(order.id.clone()));
    }
    if let Some(err) = payment_rejection(order) {
        return Some(err);
    }
    if amount_minor != order.total_minor {
        return Some(CoreError::PaymentMismatch {
            order_id: order.id.clone(),
            total_minor: order.total_minor,
            paid_minor: amount_minor,
        });
    }
    None
}

fn removal_rejection(order: &Order) -> Option<CoreError> {
    if order.is_paid() {
        return Some(CoreError::AlreadyPaid(order.id.clone()));
    }
    if !order.status.is_terminal() {
        return Some(CoreError::NotRemovable {
            order_id: order.id.clone(),
            status: order.status,
        });
    }
    None
}

fn build_order(
    owner_id: &str,
    request: &NewOrder,
    priced: &PricedOrder,
    order_number: String,
) -> (Order, Vec<OrderItem>) {
    let now = Utc::now();
    let id = Uuid::new_v4().to_string();
    let delivery = request.delivery.clone();

    let order = Order {
        id: id.clone(),
        order_number,
        user_id: owner_id.to_string(),
        status: OrderStatus::Pending,
        payment_status: PaymentStatus::Pending,
        payment_method: None,
        payment_ref: None,
        subtotal_minor: priced.subtotal.minor(),
        delivery_fee_minor: priced.delivery_fee.minor(),
        total_minor: priced.total.minor(),
        delivery_type: request.delivery_type,
        delivery_address: delivery.delivery_address,
        delivery_city: delivery.delivery_city,
        delivery_state: delivery.delivery_state,
        recipient_name: delivery.recipient_name,
        recipient_phone: delivery.recipient_phone,
        customer_notes: delivery.customer_notes,
        admin_notes: None,
        stock_reserved: false,
        created_at: now,
        updated_at: now,
        paid_at: None,
        completed_at: None,
        cancelled_at: None,
        deleted_at: None,
    };

    let items = priced
        .lines
        .iter()
        .map(|line| OrderItem {
            id: Uuid::new_v4().to_string(),
            order_id: id.clone(),
            book_id: line.book_id.clone(),
            title_snapshot: line.title.clone(),
            quantity: line.quantity,
            unit_price_minor: line.unit_price.minor(),
            subtotal_minor: line.subtotal.minor(),
            created_at: now,
        })
        .collect();

    (order, items)
}

// =============================================================================
// Unit Tests
// =============================================================================
