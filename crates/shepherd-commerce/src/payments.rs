//! # Payment Service
//!
//! Initiation and reconciliation of provider payments.
//!
//! ## Two Paths, One Merge
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  verify_payment(ref)                 handle_webhook(body, signature)    │
//! │     │                                   │                               │
//! │     │ already SUCCESSFUL? ─► return     │ signature check (first)       │
//! │     ▼                                   ▼                               │
//! │  gateway.verify_transaction          process_webhook_event              │
//! │     │                                   │                               │
//! │     └──────────────┬────────────────────┘                               │
//! │                    ▼                                                    │
//! │         reconcile(payment, target)                                      │
//! │           ├── PaymentStatus::merge says "keep"  → no write              │
//! │           ├── success with a different amount   → no write, warn        │
//! │           └── apply_status (conditional UPDATE)                         │
//! │                   │                                                     │
//! │          changed && SUCCESSFUL ──► SettlementHook::on_settled (once)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Whichever path lands first wins; the other observes `changed == false`,
//! so the hook runs at most once per payment.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use shepherd_core::reference::generate_payment_ref;
use shepherd_core::validation::{
    validate_email, validate_metadata, validate_payment_amount, validate_payment_ref,
    validate_purpose,
};
use shepherd_core::{
    CoreError, ErrorKind, Page, Paginated, Payment, PaymentMethod, PaymentStats, PaymentStatus,
};
use shepherd_db::Database;

use crate::error::{CommerceError, CommerceResult};
use crate::gateway::{process_webhook_event, PaymentGateway, TransactionVerification};
use crate::orders::{settlement_rejection, OrderManager};

// =============================================================================
// Configuration
// =============================================================================

/// Reconciliation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconciliationConfig {
    /// Reject webhooks that carry no signature header.
    pub require_webhook_signature: bool,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        ReconciliationConfig {
            require_webhook_signature: true,
        }
    }
}

// =============================================================================
// Requests / Results
// =============================================================================

#[derive(Debug, Clone)]
pub struct InitiatePayment {
    pub owner_id: String,
    pub email: String,
    pub amount_minor: i64,
    pub method: PaymentMethod,
    pub purpose: String,
    pub reference_id: Option<String>,
    pub metadata: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiatedPayment {
    pub payment: Payment,
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedPayment {
    pub payment: Payment,
    /// Absent when the payment was already settled and the provider was not asked.
    pub verification: Option<TransactionVerification>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookAck {
    pub payment: Payment,
    /// Whether this delivery changed the stored status.
    pub applied: bool,
}

// =============================================================================
// Settlement Hook
// =============================================================================

/// Invoked once when a payment first becomes SUCCESSFUL.
#[async_trait]
pub trait SettlementHook: Send + Sync {
    async fn on_settled(&self, payment: &Payment) -> CommerceResult<()>;
}

/// Marks the order named by `reference_id` as paid, provided the payer
/// owns it and the amount equals its total.
#[derive(Clone)]
pub struct OrderSettlement {
    orders: OrderManager,
}

impl OrderSettlement {
    pub fn new(orders: OrderManager) -> Self {
        OrderSettlement { orders }
    }
}

#[async_trait]
impl SettlementHook for OrderSettlement {
    async fn on_settled(&self, payment: &Payment) -> CommerceResult<()> {
        let Some(order_id) = payment.reference_id.as_deref() else {
            debug!(payment_ref = %payment.payment_ref, "Settled payment has no order reference");
            return Ok(());
        };

        match self.orders.settle_payment(order_id, payment).await {
            Ok(_) => Ok(()),
            Err(CommerceError::Core(CoreError::AlreadyPaid(_))) => {
                info!(order_id = %order_id, payment_ref = %payment.payment_ref, "Order already paid");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(
                    order_id = %order_id,
                    payment_ref = %payment.payment_ref,
                    user_id = %payment.user_id,
                    "Settled payment references no order of its payer"
                );
                Ok(())
            }
            Err(CommerceError::Core(e)) => {
                warn!(
                    order_id = %order_id,
                    payment_ref = %payment.payment_ref,
                    amount_minor = payment.amount_minor,
                    error = %e,
                    "Settled payment not applied to order"
                );
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

// =============================================================================
// Service
// =============================================================================

/// Payment initiation and reconciliation.
#[derive(Clone)]
pub struct PaymentService {
    db: Database,
    gateway: Arc<dyn PaymentGateway>,
    settlement: Option<Arc<dyn SettlementHook>>,
    config: ReconciliationConfig,
}

impl PaymentService {
    pub fn new(db: Database, gateway: Arc<dyn PaymentGateway>, config: ReconciliationConfig) -> Self {
        PaymentService {
            db,
            gateway,
            settlement: None,
            config,
        }
    }

    pub fn with_settlement(mut self, hook: Arc<dyn SettlementHook>) -> Self {
        self.settlement = Some(hook);
        self
    }

    /// Creates a PENDING payment and a provider checkout for it.
    ///
    /// The payment row exists before the provider is called, so a provider
    /// failure leaves a PENDING payment behind and returns the gateway error.
    pub async fn initiate_payment(&self, request: InitiatePayment) -> CommerceResult<InitiatedPayment> {
        if request.method != PaymentMethod::Paystack {
            return Err(CoreError::UnsupportedMethod(request.method.as_str().to_string()).into());
        }
        validate_payment_amount(request.amount_minor)?;
        validate_purpose(&request.purpose)?;
        validate_email(&request.email)?;
        validate_metadata(request.metadata.as_ref())?;
        if let Some(reference_id) = request.reference_id.as_deref() {
            if let Some(order) = self.db.orders().get(reference_id).await? {
                if let Some(err) =
                    settlement_rejection(&order, &request.owner_id, request.amount_minor)
                {
                    return Err(err.into());
                }
            }
        }

        let now = Utc::now();
        let id = Uuid::new_v4().to_string();
        let payment_ref = generate_payment_ref();
        let metadata = merged_metadata(&request, &id);

        let payment = Payment {
            id: id.clone(),
            user_id: request.owner_id.clone(),
            amount_minor: request.amount_minor,
            method: request.method,
            payment_ref: payment_ref.clone(),
            purpose: request.purpose.trim().to_string(),
            reference_id: request.reference_id.clone(),
            metadata: Some(metadata.to_string()),
            status: PaymentStatus::Pending,
            paid_at: None,
            created_at: now,
            updated_at: now,
        };
        self.db.payments().insert(&payment).await?;

        let checkout = match self
            .gateway
            .initialize_transaction(request.amount_minor, request.email.trim(), &payment_ref, &metadata)
            .await
        {
            Ok(checkout) => checkout,
            Err(e) => {
                warn!(
                    payment_ref = %payment_ref,
                    error = %e,
                    "Gateway initialization failed; payment left pending"
                );
                return Err(e.into());
            }
        };

        info!(
            payment_id = %id,
            payment_ref = %payment_ref,
            user_id = %request.owner_id,
            amount_minor = request.amount_minor,
            "Payment initiated"
        );

        Ok(InitiatedPayment {
            payment,
            authorization_url: checkout.authorization_url,
            access_code: checkout.access_code,
            reference: checkout.reference,
        })
    }

    /// Asks the provider for the outcome and merges it.
    pub async fn verify_payment(&self, payment_ref: &str) -> CommerceResult<VerifiedPayment> {
        validate_payment_ref(payment_ref)?;
        let payment = self.load(payment_ref).await?;

        if payment.status == PaymentStatus::Successful {
            debug!(payment_ref = %payment_ref, "Payment already settled; skipping provider");
            return Ok(VerifiedPayment {
                payment,
                verification: None,
            });
        }

        let verification = self.gateway.verify_transaction(payment_ref).await?;
        let target = if verification.success {
            PaymentStatus::Successful
        } else if verification.provider_status == "failed" {
            PaymentStatus::Failed
        } else {
            PaymentStatus::Pending
        };

        self.reconcile(&payment, target, verification.amount, verification.paid_at, "verify")
            .await?;

        Ok(VerifiedPayment {
            payment: self.load(payment_ref).await?,
            verification: Some(verification),
        })
    }

    /// Processes a provider webhook delivery.
    ///
    /// Nothing is read or written before the signature is accepted.
    pub async fn handle_webhook(
        &self,
        raw_body: &[u8],
        signature: Option<&str>,
    ) -> CommerceResult<WebhookAck> {
        match signature {
            Some(signature) => {
                if !self.gateway.verify_webhook_signature(signature, raw_body) {
                    warn!(body_len = raw_body.len(), "Webhook signature mismatch; possible tampering");
                    return Err(CommerceError::Signature("invalid signature".to_string()));
                }
            }
            None if self.config.require_webhook_signature => {
                warn!(body_len = raw_body.len(), "Webhook without signature rejected");
                return Err(CommerceError::Signature("missing signature".to_string()));
            }
            None => warn!("Accepting unsigned webhook"),
        }

        let event = process_webhook_event(raw_body)?;
        let payment = self.load(&event.reference).await?;

        let applied = self
            .reconcile(&payment, event.status, event.amount, event.paid_at, "webhook")
            .await?;

        info!(
            event_type = %event.event_type,
            payment_ref = %event.reference,
            reported = %event.status,
            applied,
            "Webhook processed"
        );

        Ok(WebhookAck {
            payment: self.load(&event.reference).await?,
            applied,
        })
    }

    pub async fn list_payments_for_owner(
        &self,
        owner_id: &str,
        page: Page,
    ) -> CommerceResult<Paginated<Payment>> {
        let (payments, total) = self.db.payments().list_for_owner(owner_id, page).await?;
        Ok(Paginated::new(payments, total, page))
    }

    pub async fn payment_stats(&self) -> CommerceResult<PaymentStats> {
        Ok(self.db.payments().stats().await?)
    }

    // =========================================================================
    // Reconciliation
    // =========================================================================

    /// Merges a reported status; returns whether this call wrote it.
    async fn reconcile(
        &self,
        payment: &Payment,
        target: PaymentStatus,
        reported_amount: Option<i64>,
        paid_at: Option<DateTime<Utc>>,
        source: &'static str,
    ) -> CommerceResult<bool> {
        if payment.status.merge(target).is_none() {
            debug!(
                payment_ref = %payment.payment_ref,
                stored = %payment.status,
                reported = %target,
                source,
                "Nothing to merge"
            );
            return Ok(false);
        }

        if target == PaymentStatus::Successful {
            if let Some(amount) = reported_amount.filter(|a| *a != payment.amount_minor) {
                warn!(
                    payment_ref = %payment.payment_ref,
                    expected_minor = payment.amount_minor,
                    reported_minor = amount,
                    source,
                    "Amount mismatch; success not applied"
                );
                return Ok(false);
            }
        }

        let changed = self
            .db
            .payments()
            .apply_status(&payment.payment_ref, target, paid_at)
            .await?;

        if changed {
            info!(
                payment_ref = %payment.payment_ref,
                from = %payment.status,
                to = %target,
                source,
                "Payment status updated"
            );
            if target == PaymentStatus::Successful {
                self.settle(&payment.payment_ref).await?;
            }
        }

        Ok(changed)
    }

    async fn settle(&self, payment_ref: &str) -> CommerceResult<()> {
        let Some(hook) = &self.settlement else {
            return Ok(());
        };

        let payment = self.load(payment_ref).await?;
        if let Err(e) = hook.on_settled(&payment).await {
            // The payment stays settled; the hook will not run again for it.
            error!(payment_ref = %payment_ref, error = %e, "Settlement hook failed");
        }
        Ok(())
    }

    async fn load(&self, payment_ref: &str) -> CommerceResult<Payment> {
        self.db
            .payments()
            .get_by_ref(payment_ref)
            .await?
            .ok_or_else(|| CoreError::PaymentNotFound(payment_ref.to_string()).into())
    }
}

/// Caller metadata plus the system keys; system keys overwrite caller keys.
fn merged_metadata(request: &InitiatePayment, payment_id: &str) -> Value {
    let mut merged = match &request.metadata {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    };

    let system = json!({
        "userId": request.owner_id,
        "paymentId": payment_id,
        "purpose": request.purpose.trim(),
        "referenceId": request.reference_id,
    });
    if let Value::Object(system) = system {
        merged.extend(system);
    }

    Value::Object(merged)
}

// =============================================================================
// Unit Tests
// =============================================================================
