//! # Payment Repository
//!
//! Persistence for provider-backed payments.
//!
//! ## Status Merge at the Storage Level
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Verify (client)          Webhook (provider)                            │
//! │       │                         │                                       │
//! │       └────────────┬────────────┘                                       │
//! │                    ▼                                                    │
//! │  UPDATE payments SET status = target,                                   │
//! │                      paid_at = COALESCE(paid_at, ?)                     │
//! │   WHERE payment_ref = ?                                                 │
//! │     AND status <> 'successful'     ← success is sticky                  │
//! │     AND status <> target           ← replay is a no-op                  │
//! │                    │                                                    │
//! │        1 row: this caller moved it   0 rows: someone already did        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Exactly one concurrent caller observes `true` for a given target, which is
//! what gates the settlement hook.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use shepherd_core::{Page, Payment, PaymentStats, PaymentStatus};

const PAYMENT_COLUMNS: &str = r#"
    id, user_id, amount_minor, method, payment_ref, purpose, reference_id, metadata,
    status, paid_at, created_at, updated_at
"#;

/// Number of payments reported in `PaymentStats::recent`.
const RECENT_PAYMENTS: i64 = 10;

/// Repository for payment database operations.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
}

impl PaymentRepository {
    /// Creates a new PaymentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PaymentRepository { pool }
    }

    /// Inserts a new payment.
    pub async fn insert(&self, payment: &Payment) -> DbResult<()> {
        debug!(
            id = %payment.id,
            payment_ref = %payment.payment_ref,
            amount_minor = payment.amount_minor,
            "Inserting payment"
        );

        sqlx::query(
            r#"
            INSERT INTO payments (
                id, user_id, amount_minor, method, payment_ref, purpose, reference_id,
                metadata, status, paid_at, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.user_id)
        .bind(payment.amount_minor)
        .bind(payment.method)
        .bind(&payment.payment_ref)
        .bind(&payment.purpose)
        .bind(&payment.reference_id)
        .bind(&payment.metadata)
        .bind(payment.status)
        .bind(payment.paid_at)
        .bind(payment.created_at)
        .bind(payment.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a payment by its provider reference.
    pub async fn get_by_ref(&self, payment_ref: &str) -> DbResult<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {} FROM payments WHERE payment_ref = ?1",
            PAYMENT_COLUMNS
        ))
        .bind(payment_ref)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    /// Conditionally moves a payment to `target`.
    ///
    /// `paid_at` is only written for SUCCESSFUL and never overwritten.
    /// PENDING is never written over anything.
    ///
    /// ## Returns
    /// `true` if this call changed the row.
    pub async fn apply_status(
        &self,
        payment_ref: &str,
        target: PaymentStatus,
        paid_at: Option<DateTime<Utc>>,
    ) -> DbResult<bool> {
        if target == PaymentStatus::Pending {
            return Ok(false);
        }

        let paid_at = match target {
            PaymentStatus::Successful => paid_at.or_else(|| Some(Utc::now())),
            _ => None,
        };

        let updated = sqlx::query(
            r#"
            UPDATE payments
            SET status = ?1,
                paid_at = COALESCE(paid_at, ?2),
                updated_at = ?3
            WHERE payment_ref = ?4
              AND status <> 'successful'
              AND status <> ?5
            "#,
        )
        .bind(target)
        .bind(paid_at)
        .bind(Utc::now())
        .bind(payment_ref)
        .bind(target)
        .execute(&self.pool)
        .await?
        .rows_affected();

        debug!(
            payment_ref = %payment_ref,
            target = %target,
            changed = updated == 1,
            "Applied payment status"
        );

        Ok(updated == 1)
    }

    /// Lists an owner's payments, newest first.
    pub async fn list_for_owner(&self, owner_id: &str, page: Page) -> DbResult<(Vec<Payment>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM payments WHERE user_id = ?1")
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await?;

        let payments = sqlx::query_as::<_, Payment>(&format!(
            r#"
            SELECT {} FROM payments
            WHERE user_id = ?1
            ORDER BY created_at DESC, id DESC
            LIMIT ?2 OFFSET ?3
            "#,
            PAYMENT_COLUMNS
        ))
        .bind(owner_id)
        .bind(page.limit as i64)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((payments, total))
    }

    /// Totals and the latest successful payments.
    pub async fn stats(&self) -> DbResult<PaymentStats> {
        let (total_payments, successful_payments, total_revenue_minor): (i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    COUNT(*),
                    COALESCE(SUM(CASE WHEN status = 'successful' THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN status = 'successful' THEN amount_minor ELSE 0 END), 0)
                FROM payments
                "#,
            )
            .fetch_one(&self.pool)
            .await?;

        let recent = sqlx::query_as::<_, Payment>(&format!(
            r#"
            SELECT {} FROM payments
            WHERE status = 'successful'
            ORDER BY paid_at DESC, id DESC
            LIMIT ?1
            "#,
            PAYMENT_COLUMNS
        ))
        .bind(RECENT_PAYMENTS)
        .fetch_all(&self.pool)
        .await?;

        Ok(PaymentStats {
            total_payments,
            successful_payments,
            total_revenue_minor,
            recent,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
