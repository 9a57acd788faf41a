//! # Inventory Ledger
//!
//! The only code that changes `books.stock_quantity`.
//!
//! ## Conditional Decrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  One caller transaction                                                 │
//! │                                                                         │
//! │  for each (book, q):                                                    │
//! │     UPDATE books SET stock_quantity = stock_quantity - q                │
//! │      WHERE id = book AND stock_quantity >= q                            │
//! │          │                                                              │
//! │          ├── 1 row  → next line                                         │
//! │          └── 0 rows → InsufficientStock / NotFound                      │
//! │                       caller drops the transaction: nothing changed     │
//! │                                                                         │
//! │  Two writers racing for the last copy: SQLite serializes the UPDATEs,   │
//! │  the second sees stock_quantity = 0 and matches no row.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Reservation Marker
//! `orders.stock_reserved` is flipped with a conditional UPDATE before stock
//! moves, so reserving or releasing the same order twice is a no-op:
//!
//! ```text
//! reserve_for_order:  stock_reserved 0 → 1  then decrement lines
//! release_for_order:  stock_reserved 1 → 0  then restore lines
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use shepherd_core::StockLine;

// =============================================================================
// Connection-Level Operations
// =============================================================================

/// Takes stock for every line, inside the caller's transaction.
///
/// On error the caller must not commit; dropping the transaction rolls back
/// lines already taken.
pub async fn decrement(conn: &mut SqliteConnection, lines: &[StockLine]) -> DbResult<()> {
    let now = Utc::now();

    for line in lines {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET stock_quantity = stock_quantity - ?1, updated_at = ?2
            WHERE id = ?3 AND stock_quantity >= ?4
            "#,
        )
        .bind(line.quantity)
        .bind(now)
        .bind(&line.book_id)
        .bind(line.quantity)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            let available: Option<i64> =
                sqlx::query_scalar("SELECT stock_quantity FROM books WHERE id = ?1")
                    .bind(&line.book_id)
                    .fetch_optional(&mut *conn)
                    .await?;

            return Err(match available {
                None => DbError::not_found("Book", &line.book_id),
                Some(available) => {
                    warn!(
                        book_id = %line.book_id,
                        available,
                        requested = line.quantity,
                        "Stock decrement rejected"
                    );
                    DbError::InsufficientStock {
                        book_id: line.book_id.clone(),
                        available,
                        requested: line.quantity,
                    }
                }
            });
        }

        debug!(book_id = %line.book_id, quantity = line.quantity, "Stock decremented");
    }

    Ok(())
}

/// Puts stock back for every line, inside the caller's transaction.
pub async fn restore(conn: &mut SqliteConnection, lines: &[StockLine]) -> DbResult<()> {
    let now = Utc::now();

    for line in lines {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET stock_quantity = stock_quantity + ?1, updated_at = ?2
            WHERE id = ?3
            "#,
        )
        .bind(line.quantity)
        .bind(now)
        .bind(&line.book_id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Book", &line.book_id));
        }

        debug!(book_id = %line.book_id, quantity = line.quantity, "Stock restored");
    }

    Ok(())
}

async fn order_lines(conn: &mut SqliteConnection, order_id: &str) -> DbResult<Vec<StockLine>> {
    let lines = sqlx::query_as::<_, StockLine>(
        "SELECT book_id, quantity FROM order_items WHERE order_id = ?1 ORDER BY book_id",
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(lines)
}

/// Reserves stock for an order's lines.
///
/// Returns `false` when the order already holds its stock.
pub async fn reserve_for_order(conn: &mut SqliteConnection, order_id: &str) -> DbResult<bool> {
    let flipped = sqlx::query(
        "UPDATE orders SET stock_reserved = 1 WHERE id = ?1 AND stock_reserved = 0",
    )
    .bind(order_id)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    if flipped == 0 {
        debug!(order_id = %order_id, "Stock already reserved");
        return Ok(false);
    }

    let lines = order_lines(conn, order_id).await?;
    decrement(conn, &lines).await?;

    debug!(order_id = %order_id, lines = lines.len(), "Stock reserved for order");
    Ok(true)
}

/// Releases stock held by an order.
///
/// Returns `false` when the order holds no stock.
pub async fn release_for_order(conn: &mut SqliteConnection, order_id: &str) -> DbResult<bool> {
    let flipped = sqlx::query(
        "UPDATE orders SET stock_reserved = 0 WHERE id = ?1 AND stock_reserved = 1",
    )
    .bind(order_id)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    if flipped == 0 {
        debug!(order_id = %order_id, "No reserved stock to release");
        return Ok(false);
    }

    let lines = order_lines(conn, order_id).await?;
    restore(conn, &lines).await?;

    debug!(order_id = %order_id, lines = lines.len(), "Stock released for order");
    Ok(true)
}

// =============================================================================
// Standalone Ledger
// =============================================================================

/// Pool-backed ledger for batch adjustments outside an order transition.
///
/// Each call is its own transaction.
#[derive(Debug, Clone)]
pub struct InventoryLedger {
    pool: SqlitePool,
}

impl InventoryLedger {
    pub fn new(pool: SqlitePool) -> Self {
        InventoryLedger { pool }
    }

    /// Decrements every line or none.
    pub async fn decrement(&self, lines: &[StockLine]) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        decrement(&mut tx, lines).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Restores every line or none.
    pub async fn restore(&self, lines: &[StockLine]) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        restore(&mut tx, lines).await?;
        tx.commit().await?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
