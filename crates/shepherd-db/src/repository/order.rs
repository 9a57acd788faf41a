//! # Order Repository
//!
//! Database operations for orders and order items.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  1. CREATE                                                              │
//! │     └── insert_with_items() → Order { status: Pending } + items         │
//! │         (one transaction; order_number collision → UniqueViolation)     │
//! │                                                                         │
//! │  2. TRANSITION                                                          │
//! │     └── apply_transition(expected → next)                               │
//! │         ├── compare-and-set status write                                │
//! │         ├── reserve stock (→ PROCESSING) / release (→ CANCELLED)        │
//! │         └── commit all or nothing                                       │
//! │                                                                         │
//! │  3. SETTLE                                                              │
//! │     └── mark_paid() → payment_status SUCCESSFUL, once                   │
//! │                                                                         │
//! │  4. (OPTIONAL) REMOVE                                                   │
//! │     └── soft_delete() → deleted_at set, terminal + unpaid only          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::inventory;
use shepherd_core::{
    Order, OrderFilter, OrderItem, OrderStats, OrderStatus, OrderWithItems, Page, PaymentMethod,
    StockEffect,
};

const ORDER_COLUMNS: &str = r#"
    id, order_number, user_id, status, payment_status, payment_method, payment_ref,
    subtotal_minor, delivery_fee_minor, total_minor, delivery_type,
    delivery_address, delivery_city, delivery_state, recipient_name, recipient_phone,
    customer_notes, admin_notes, stock_reserved,
    created_at, updated_at, paid_at, completed_at, cancelled_at, deleted_at
"#;

const ITEM_COLUMNS: &str =
    "id, order_id, book_id, title_snapshot, quantity, unit_price_minor, subtotal_minor, created_at";

// =============================================================================
// Request / Outcome Types
// =============================================================================

/// A status change guarded by the status the caller observed.
#[derive(Debug, Clone)]
pub struct Transition {
    pub order_id: String,
    pub expected: OrderStatus,
    pub next: OrderStatus,
    /// Replaces `admin_notes` when present.
    pub admin_notes: Option<String>,
    /// Also require that the order has no successful payment.
    pub require_unpaid: bool,
}

/// Result of a committed transition.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub order: Order,
    /// Stock movement that was actually applied.
    pub stock: StockEffect,
}

/// Listing scope: one owner, or every order.
#[derive(Debug, Clone, Default)]
pub struct OrderQuery {
    pub owner_id: Option<String>,
    pub filter: OrderFilter,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Inserts an order and its items in one transaction.
    ///
    /// ## Snapshot Pattern
    /// Items carry the title and unit price at time of order; later catalog
    /// edits never change a placed order.
    pub async fn insert_with_items(&self, order: &Order, items: &[OrderItem]) -> DbResult<()> {
        debug!(
            id = %order.id,
            order_number = %order.order_number,
            items = items.len(),
            "Inserting order"
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, order_number, user_id, status, payment_status, payment_method, payment_ref,
                subtotal_minor, delivery_fee_minor, total_minor, delivery_type,
                delivery_address, delivery_city, delivery_state, recipient_name, recipient_phone,
                customer_notes, admin_notes, stock_reserved,
                created_at, updated_at, paid_at, completed_at, cancelled_at, deleted_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7,
                ?8, ?9, ?10, ?11,
                ?12, ?13, ?14, ?15, ?16,
                ?17, ?18, ?19,
                ?20, ?21, ?22, ?23, ?24, ?25
            )
            "#,
        )
        .bind(&order.id)
        .bind(&order.order_number)
        .bind(&order.user_id)
        .bind(order.status)
        .bind(order.payment_status)
        .bind(order.payment_method)
        .bind(&order.payment_ref)
        .bind(order.subtotal_minor)
        .bind(order.delivery_fee_minor)
        .bind(order.total_minor)
        .bind(order.delivery_type)
        .bind(&order.delivery_address)
        .bind(&order.delivery_city)
        .bind(&order.delivery_state)
        .bind(&order.recipient_name)
        .bind(&order.recipient_phone)
        .bind(&order.customer_notes)
        .bind(&order.admin_notes)
        .bind(order.stock_reserved)
        .bind(order.created_at)
        .bind(order.updated_at)
        .bind(order.paid_at)
        .bind(order.completed_at)
        .bind(order.cancelled_at)
        .bind(order.deleted_at)
        .execute(&mut *tx)
        .await?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    id, order_id, book_id, title_snapshot, quantity,
                    unit_price_minor, subtotal_minor, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(&item.id)
            .bind(&item.order_id)
            .bind(&item.book_id)
            .bind(&item.title_snapshot)
            .bind(item.quantity)
            .bind(item.unit_price_minor)
            .bind(item.subtotal_minor)
            .bind(item.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Gets a live (not soft-deleted) order by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {} FROM orders WHERE id = ?1 AND deleted_at IS NULL",
            ORDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Gets the items of an order.
    pub async fn get_items(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {} FROM order_items WHERE order_id = ?1 ORDER BY created_at, id",
            ITEM_COLUMNS
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Gets a live order together with its items.
    pub async fn get_with_items(&self, id: &str) -> DbResult<Option<OrderWithItems>> {
        let Some(order) = self.get(id).await? else {
            return Ok(None);
        };
        let items = self.get_items(id).await?;
        Ok(Some(OrderWithItems { order, items }))
    }

    /// Applies a guarded status change and its stock effect atomically.
    ///
    /// ## Steps (one transaction)
    /// ```text
    /// UPDATE orders SET status = next ... WHERE id = ? AND status = expected
    ///     │
    ///     ├── 0 rows → StaleState (someone else moved it, or it's gone)
    ///     ▼
    /// StockEffect::for_transition(next, stock_reserved)
    ///     ├── Reserve → inventory::reserve_for_order
    ///     ├── Release → inventory::release_for_order
    ///     └── None
    ///     │
    ///     ▼
    /// COMMIT (any error above drops the transaction: nothing changed)
    /// ```
    pub async fn apply_transition(&self, transition: &Transition) -> DbResult<TransitionOutcome> {
        let now = Utc::now();
        let completed_at = (transition.next == OrderStatus::Completed).then_some(now);
        let cancelled_at = (transition.next == OrderStatus::Cancelled).then_some(now);

        debug!(
            order_id = %transition.order_id,
            from = %transition.expected,
            to = %transition.next,
            "Applying order transition"
        );

        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE orders
            SET status = ?1,
                updated_at = ?2,
                admin_notes = COALESCE(?3, admin_notes),
                completed_at = COALESCE(?4, completed_at),
                cancelled_at = COALESCE(?5, cancelled_at)
            WHERE id = ?6
              AND status = ?7
              AND deleted_at IS NULL
              AND (?8 = 0 OR payment_status <> 'successful')
            "#,
        )
        .bind(transition.next)
        .bind(now)
        .bind(&transition.admin_notes)
        .bind(completed_at)
        .bind(cancelled_at)
        .bind(&transition.order_id)
        .bind(transition.expected)
        .bind(transition.require_unpaid)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(DbError::stale("Order", &transition.order_id));
        }

        let reserved: bool = sqlx::query_scalar("SELECT stock_reserved FROM orders WHERE id = ?1")
            .bind(&transition.order_id)
            .fetch_one(&mut *tx)
            .await?;

        let stock = match StockEffect::for_transition(transition.next, reserved) {
            StockEffect::Reserve => {
                inventory::reserve_for_order(&mut tx, &transition.order_id).await?;
                StockEffect::Reserve
            }
            StockEffect::Release => {
                inventory::release_for_order(&mut tx, &transition.order_id).await?;
                StockEffect::Release
            }
            StockEffect::None => StockEffect::None,
        };

        tx.commit().await?;

        let order = self
            .get(&transition.order_id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", &transition.order_id))?;

        Ok(TransitionOutcome { order, stock })
    }

    /// Records a successful payment against an order.
    ///
    /// Returns `false` when the order was already paid, is cancelled or
    /// refunded, or is gone; the existing payment details are left untouched.
    pub async fn mark_paid(
        &self,
        order_id: &str,
        method: PaymentMethod,
        payment_ref: &str,
        paid_at: DateTime<Utc>,
    ) -> DbResult<bool> {
        debug!(order_id = %order_id, payment_ref = %payment_ref, "Marking order paid");

        let updated = sqlx::query(
            r#"
            UPDATE orders
            SET payment_status = 'successful',
                payment_method = ?1,
                payment_ref = ?2,
                paid_at = ?3,
                updated_at = ?3
            WHERE id = ?4
              AND payment_status <> 'successful'
              AND status NOT IN ('cancelled', 'refunded')
              AND deleted_at IS NULL
            "#,
        )
        .bind(method)
        .bind(payment_ref)
        .bind(paid_at)
        .bind(order_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(updated == 1)
    }

    /// Soft-deletes a terminal, unpaid order.
    ///
    /// Returns `false` when the guard did not match.
    pub async fn soft_delete(&self, order_id: &str) -> DbResult<bool> {
        debug!(order_id = %order_id, "Soft-deleting order");

        let now = Utc::now();
        let updated = sqlx::query(
            r#"
            UPDATE orders
            SET deleted_at = ?1, updated_at = ?1
            WHERE id = ?2
              AND deleted_at IS NULL
              AND payment_status <> 'successful'
              AND status IN ('completed', 'cancelled', 'refunded')
            "#,
        )
        .bind(now)
        .bind(order_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(updated == 1)
    }

    /// Lists live orders, newest first.
    ///
    /// ## Returns
    /// `(page of orders, total matching rows)`
    pub async fn list(&self, query: &OrderQuery, page: Page) -> DbResult<(Vec<Order>, i64)> {
        let mut count: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM orders");
        push_filters(&mut count, query);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM orders", ORDER_COLUMNS));
        push_filters(&mut select, query);
        select
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(page.limit as i64)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let orders = select
            .build_query_as::<Order>()
            .fetch_all(&self.pool)
            .await?;

        Ok((orders, total))
    }

    /// Aggregate counters over live orders.
    pub async fn stats(&self) -> DbResult<OrderStats> {
        let stats = sqlx::query_as::<_, OrderStats>(
            r#"
            SELECT
                COUNT(*) AS total_orders,
                COALESCE(SUM(CASE WHEN status = 'pending' THEN 1 ELSE 0 END), 0) AS pending_orders,
                COALESCE(SUM(CASE WHEN status = 'processing' THEN 1 ELSE 0 END), 0) AS processing_orders,
                COALESCE(SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END), 0) AS completed_orders,
                COALESCE(SUM(CASE WHEN status = 'cancelled' THEN 1 ELSE 0 END), 0) AS cancelled_orders,
                COALESCE(SUM(CASE WHEN payment_status = 'successful' THEN 1 ELSE 0 END), 0) AS paid_orders,
                COALESCE(SUM(CASE WHEN payment_status = 'successful' THEN total_minor ELSE 0 END), 0)
                    AS total_revenue_minor
            FROM orders
            WHERE deleted_at IS NULL
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, query: &OrderQuery) {
    builder.push(" WHERE deleted_at IS NULL");

    if let Some(owner_id) = &query.owner_id {
        builder.push(" AND user_id = ").push_bind(owner_id.clone());
    }
    if let Some(status) = query.filter.status {
        builder.push(" AND status = ").push_bind(status);
    }
    if let Some(delivery_type) = query.filter.delivery_type {
        builder.push(" AND delivery_type = ").push_bind(delivery_type);
    }
    if let Some(search) = &query.filter.search {
        builder
            .push(" AND order_number LIKE ")
            .push_bind(format!("%{}%", search));
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use shepherd_core::{Book, DeliveryType, PaymentStatus};
    use uuid::Uuid;

    fn new_order(user_id: &str, number: &str, book: &Book, quantity: i64) -> (Order, Vec<OrderItem>) {
        let now = Utc::now();
        let id = Uuid::new_v4().to_string();
        let subtotal = book.price_minor * quantity;
        let order = Order {
            id: id.clone(),
            order_number: number.to_string(),
            user_id: user_id.to_string(),
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_method: None,
            payment_ref: None,
            subtotal_minor: subtotal,
            delivery_fee_minor: 0,
            total_minor: subtotal,
            delivery_type: DeliveryType::Pickup,
            delivery_address: None,
            delivery_city: None,
            delivery_state: None,
            recipient_name: None,
            recipient_phone: None,
            customer_notes: None,
            admin_notes: None,
            stock_reserved: false,
            created_at: now,
            updated_at: now,
            paid_at: None,
            completed_at: None,
            cancelled_at: None,
            deleted_at: None,
        };
        let items = vec![OrderItem {
            id: Uuid::new_v4().to_string(),
            order_id: id,
            book_id: book.id.clone(),
            title_snapshot: book.title.clone(),
            quantity,
            unit_price_minor: book.price_minor,
            subtotal_minor: subtotal,
            created_at: now,
        }];
        (order, items)
    }

    fn step(order_id: &str, expected: OrderStatus, next: OrderStatus) -> Transition {
        Transition {
            order_id: order_id.to_string(),
            expected,
            next,
            admin_notes: None,
            require_unpaid: false,
        }
    }

    async fn setup(stock: i64) -> (Database, Book) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let book = db.books().create("Pilgrim's Progress", None, 100_000, stock).await.unwrap();
        (db, book)
    }

    #[tokio::test]
    async fn test_insert_and_fetch_with_items() {
        let (db, book) = setup(5).await;
        let (order, items) = new_order("u1", "ORD-1-AAAA", &book, 2);
        db.orders().insert_with_items(&order, &items).await.unwrap();

        let fetched = db.orders().get_with_items(&order.id).await.unwrap().unwrap();
        assert_eq!(fetched.order.order_number, "ORD-1-AAAA");
        assert_eq!(fetched.order.status, OrderStatus::Pending);
        assert_eq!(fetched.order.delivery_type, DeliveryType::Pickup);
        assert_eq!(fetched.items.len(), 1);
        assert_eq!(fetched.items[0].subtotal_minor, 200_000);
    }

    #[tokio::test]
    async fn test_duplicate_order_number_is_unique_violation() {
        let (db, book) = setup(5).await;
        let (first, first_items) = new_order("u1", "ORD-DUP", &book, 1);
        let (second, second_items) = new_order("u1", "ORD-DUP", &book, 1);

        db.orders().insert_with_items(&first, &first_items).await.unwrap();
        let err = db
            .orders()
            .insert_with_items(&second, &second_items)
            .await
            .unwrap_err();

        assert!(err.is_unique_violation_on("order_number"));
        // Items of the failed insert were rolled back
        assert!(db.orders().get_items(&second.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_processing_reserves_and_cancel_releases_once() {
        let (db, book) = setup(5).await;
        let (order, items) = new_order("u1", "ORD-2", &book, 2);
        db.orders().insert_with_items(&order, &items).await.unwrap();
        let orders = db.orders();

        orders
            .apply_transition(&step(&order.id, OrderStatus::Pending, OrderStatus::Confirmed))
            .await
            .unwrap();
        assert_eq!(db.books().stock_of(&book.id).await.unwrap(), 5);

        let outcome = orders
            .apply_transition(&step(&order.id, OrderStatus::Confirmed, OrderStatus::Processing))
            .await
            .unwrap();
        assert_eq!(outcome.stock, StockEffect::Reserve);
        assert!(outcome.order.stock_reserved);
        assert_eq!(db.books().stock_of(&book.id).await.unwrap(), 3);

        let outcome = orders
            .apply_transition(&step(&order.id, OrderStatus::Processing, OrderStatus::Cancelled))
            .await
            .unwrap();
        assert_eq!(outcome.stock, StockEffect::Release);
        assert!(!outcome.order.stock_reserved);
        assert!(outcome.order.cancelled_at.is_some());
        assert_eq!(db.books().stock_of(&book.id).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_cancel_without_reservation_leaves_stock() {
        let (db, book) = setup(5).await;
        let (order, items) = new_order("u1", "ORD-3", &book, 2);
        db.orders().insert_with_items(&order, &items).await.unwrap();

        let outcome = db
            .orders()
            .apply_transition(&step(&order.id, OrderStatus::Pending, OrderStatus::Cancelled))
            .await
            .unwrap();
        assert_eq!(outcome.stock, StockEffect::None);
        assert_eq!(db.books().stock_of(&book.id).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_failed_reservation_keeps_status() {
        let (db, book) = setup(1).await;
        let (order, items) = new_order("u1", "ORD-4", &book, 2);
        db.orders().insert_with_items(&order, &items).await.unwrap();
        let orders = db.orders();

        orders
            .apply_transition(&step(&order.id, OrderStatus::Pending, OrderStatus::Confirmed))
            .await
            .unwrap();
        let err = orders
            .apply_transition(&step(&order.id, OrderStatus::Confirmed, OrderStatus::Processing))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::InsufficientStock { .. }));
        let stored = orders.get(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Confirmed);
        assert!(!stored.stock_reserved);
        assert_eq!(db.books().stock_of(&book.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_stale_expected_status() {
        let (db, book) = setup(5).await;
        let (order, items) = new_order("u1", "ORD-5", &book, 1);
        db.orders().insert_with_items(&order, &items).await.unwrap();

        let err = db
            .orders()
            .apply_transition(&step(&order.id, OrderStatus::Confirmed, OrderStatus::Processing))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::StaleState { .. }));
    }

    #[tokio::test]
    async fn test_reserve_for_order_is_idempotent() {
        let (db, book) = setup(5).await;
        let (order, items) = new_order("u1", "ORD-6", &book, 2);
        db.orders().insert_with_items(&order, &items).await.unwrap();

        // The in-memory pool has a single connection: release it before
        // going through the repositories again.
        {
            let mut conn = db.pool().acquire().await.unwrap();
            assert!(inventory::reserve_for_order(&mut conn, &order.id).await.unwrap());
            assert!(!inventory::reserve_for_order(&mut conn, &order.id).await.unwrap());
        }
        assert_eq!(db.books().stock_of(&book.id).await.unwrap(), 3);

        {
            let mut conn = db.pool().acquire().await.unwrap();
            assert!(inventory::release_for_order(&mut conn, &order.id).await.unwrap());
            assert!(!inventory::release_for_order(&mut conn, &order.id).await.unwrap());
        }
        assert_eq!(db.books().stock_of(&book.id).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_mark_paid_once_and_blocks_paid_cancel() {
        let (db, book) = setup(5).await;
        let (order, items) = new_order("u1", "ORD-7", &book, 1);
        db.orders().insert_with_items(&order, &items).await.unwrap();
        let orders = db.orders();

        assert!(orders
            .mark_paid(&order.id, PaymentMethod::Paystack, "PAY_1", Utc::now())
            .await
            .unwrap());
        assert!(!orders
            .mark_paid(&order.id, PaymentMethod::Cash, "PAY_2", Utc::now())
            .await
            .unwrap());

        let stored = orders.get(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Successful);
        assert_eq!(stored.payment_ref.as_deref(), Some("PAY_1"));
        assert_eq!(stored.payment_method, Some(PaymentMethod::Paystack));

        let mut cancel = step(&order.id, OrderStatus::Pending, OrderStatus::Cancelled);
        cancel.require_unpaid = true;
        assert!(matches!(
            orders.apply_transition(&cancel).await,
            Err(DbError::StaleState { .. })
        ));
    }

    #[tokio::test]
    async fn test_mark_paid_skips_cancelled_order() {
        let (db, book) = setup(5).await;
        let (order, items) = new_order("u1", "ORD-8", &book, 1);
        db.orders().insert_with_items(&order, &items).await.unwrap();
        let orders = db.orders();

        orders
            .apply_transition(&step(&order.id, OrderStatus::Pending, OrderStatus::Cancelled))
            .await
            .unwrap();
        assert!(!orders
            .mark_paid(&order.id, PaymentMethod::Paystack, "PAY_late", Utc::now())
            .await
            .unwrap());

        let stored = orders.get(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Pending);
        assert_eq!(stored.payment_ref, None);
    }

    #[tokio::test]
    async fn test_soft_delete_guard_and_listing() {
        let (db, book) = setup(10).await;
        let orders = db.orders();

        let (live, live_items) = new_order("u1", "ORD-LIVE", &book, 1);
        let (done, done_items) = new_order("u1", "ORD-DONE", &book, 1);
        let (other, other_items) = new_order("u2", "ORD-OTHER", &book, 1);
        orders.insert_with_items(&live, &live_items).await.unwrap();
        orders.insert_with_items(&done, &done_items).await.unwrap();
        orders.insert_with_items(&other, &other_items).await.unwrap();

        assert!(!orders.soft_delete(&live.id).await.unwrap());

        orders
            .apply_transition(&step(&done.id, OrderStatus::Pending, OrderStatus::Cancelled))
            .await
            .unwrap();
        assert!(orders.soft_delete(&done.id).await.unwrap());
        assert!(orders.get(&done.id).await.unwrap().is_none());

        let mine = OrderQuery {
            owner_id: Some("u1".to_string()),
            ..Default::default()
        };
        let (page, total) = orders.list(&mine, Page::default()).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(page[0].id, live.id);

        let search = OrderQuery {
            owner_id: None,
            filter: OrderFilter {
                search: Some("other".to_string()),
                ..Default::default()
            },
        };
        let (page, total) = orders.list(&search, Page::default()).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(page[0].order_number, "ORD-OTHER");

        let stats = orders.stats().await.unwrap();
        assert_eq!(stats.total_orders, 2);
        assert_eq!(stats.pending_orders, 2);
        assert_eq!(stats.paid_orders, 0);
    }
}
