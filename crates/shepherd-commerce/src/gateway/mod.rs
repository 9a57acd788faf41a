//! # Payment Gateway Port
//!
//! The provider boundary used by [`PaymentService`](crate::payments::PaymentService).
//!
//! ## Call Shapes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PaymentService                       Provider (Paystack)               │
//! │                                                                         │
//! │  initialize_transaction ───POST /transaction/initialize───►             │
//! │        ◄── {authorization_url, access_code, reference}                  │
//! │                                                                         │
//! │  verify_transaction ──────GET /transaction/verify/{ref}───►             │
//! │        ◄── {status, amount, currency, paid_at, customer, ...}           │
//! │                                                                         │
//! │  webhook (inbound) ──► signature::verify ──► process_webhook_event      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Amounts cross this boundary in minor units (kobo), which is also the
//! unit Paystack expects; no scaling happens here.

pub mod events;
pub mod paystack;
pub mod signature;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use events::{process_webhook_event, NormalizedEvent};
pub use paystack::PaystackGateway;

// =============================================================================
// Configuration
// =============================================================================

/// Default Paystack API root.
pub const DEFAULT_BASE_URL: &str = "https://api.paystack.co";

/// Default bound on a single provider call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Gateway settings, built by the application and passed in.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Secret key; without it every call fails with `NotConfigured` and
    /// every signature check fails.
    pub secret_key: Option<String>,
    pub base_url: String,
    /// Where the provider redirects the customer after checkout.
    pub callback_url: String,
    pub request_timeout: Duration,
}

impl GatewayConfig {
    pub fn new(secret_key: Option<String>, callback_url: impl Into<String>) -> Self {
        GatewayConfig {
            secret_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            callback_url: callback_url.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Provider call failures.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Network-level failure (DNS, connect, TLS, reset).
    #[error("Payment provider unreachable: {0}")]
    Transport(String),

    /// No response within `request_timeout`.
    #[error("Payment provider timed out after {0:?}")]
    Timeout(Duration),

    /// The provider answered but refused the request.
    #[error("Payment provider rejected the request: {message}")]
    Provider { message: String },

    /// The provider answered with a body we could not understand.
    #[error("Unexpected payment provider response: {0}")]
    InvalidResponse(String),

    /// No secret key configured.
    #[error("Payment provider is not configured")]
    NotConfigured,
}

pub type GatewayResult<T> = Result<T, GatewayError>;

// =============================================================================
// DTOs
// =============================================================================

/// Checkout session created by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializedTransaction {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

/// Customer as reported by the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub email: Option<String>,
    pub name: Option<String>,
}

/// Provider's view of a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionVerification {
    /// True only when the provider status is exactly `success`.
    pub success: bool,
    /// Raw provider status (`success`, `failed`, `abandoned`, ...).
    pub provider_status: String,
    /// Minor units.
    pub amount: Option<i64>,
    pub currency: Option<String>,
    pub reference: String,
    pub paid_at: Option<DateTime<Utc>>,
    pub customer: CustomerInfo,
    pub metadata: Option<serde_json::Value>,
}

// =============================================================================
// Port
// =============================================================================

/// Outbound payment provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn initialize_transaction(
        &self,
        amount_minor: i64,
        email: &str,
        reference: &str,
        metadata: &serde_json::Value,
    ) -> GatewayResult<InitializedTransaction>;

    async fn verify_transaction(&self, reference: &str) -> GatewayResult<TransactionVerification>;

    /// Checks an inbound webhook signature against the raw body.
    fn verify_webhook_signature(&self, signature: &str, raw_body: &[u8]) -> bool;
}
