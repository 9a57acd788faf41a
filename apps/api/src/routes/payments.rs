//! Payment endpoints.
//!
//! The webhook takes the raw body: the signature covers the exact bytes the
//! provider sent, so it must be checked before any JSON parsing.

use axum::body::Bytes;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use serde_json::Value;
use shepherd_commerce::{InitiatePayment, InitiatedPayment, VerifiedPayment};
use shepherd_core::{Paginated, Payment, PaymentMethod, PaymentStats, PaymentStatus};

use super::PageParams;
use crate::error::ApiResult;
use crate::identity::Identity;
use crate::state::AppState;

pub const SIGNATURE_HEADER: &str = "x-paystack-signature";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/initiate", post(initiate_payment))
        .route("/verify", post(verify_payment).get(verify_callback))
        .route("/webhook", post(webhook))
        .route("/mine", get(list_my_payments))
        .route("/stats", get(payment_stats))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateRequest {
    /// Minor units (kobo).
    amount: i64,
    #[serde(default = "default_method")]
    method: PaymentMethod,
    purpose: String,
    reference_id: Option<String>,
    metadata: Option<Value>,
    /// Used when the identity carries no email.
    email: Option<String>,
}

fn default_method() -> PaymentMethod {
    PaymentMethod::Paystack
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    payment_ref: String,
}

/// Query string of the checkout redirect (`?trxref=..&reference=..`).
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    reference: Option<String>,
    trxref: Option<String>,
}

/// What the unauthenticated verify endpoints disclose about a payment.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    payment_ref: String,
    status: PaymentStatus,
    /// Minor units (kobo).
    amount: i64,
    purpose: String,
    reference_id: Option<String>,
    paid_at: Option<DateTime<Utc>>,
    /// Absent when the provider was not asked.
    provider_status: Option<String>,
}

impl From<VerifiedPayment> for PaymentReceipt {
    fn from(verified: VerifiedPayment) -> Self {
        let payment = verified.payment;
        PaymentReceipt {
            payment_ref: payment.payment_ref,
            status: payment.status,
            amount: payment.amount_minor,
            purpose: payment.purpose,
            reference_id: payment.reference_id,
            paid_at: payment.paid_at,
            provider_status: verified.verification.map(|v| v.provider_status),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    received: bool,
    applied: bool,
}

async fn initiate_payment(
    State(state): State<AppState>,
    identity: Identity,
    payload: Result<Json<InitiateRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<InitiatedPayment>)> {
    let Json(request) = payload?;
    let email = identity.email.or(request.email).unwrap_or_default();

    let initiated = state
        .payments
        .initiate_payment(InitiatePayment {
            owner_id: identity.user_id,
            email,
            amount_minor: request.amount,
            method: request.method,
            purpose: request.purpose,
            reference_id: request.reference_id,
            metadata: request.metadata,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(initiated)))
}

async fn verify_payment(
    State(state): State<AppState>,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> ApiResult<Json<PaymentReceipt>> {
    let Json(request) = payload?;
    let verified = state.payments.verify_payment(&request.payment_ref).await?;
    Ok(Json(verified.into()))
}

async fn verify_callback(
    State(state): State<AppState>,
    params: Result<Query<CallbackParams>, QueryRejection>,
) -> ApiResult<Json<PaymentReceipt>> {
    let Query(params) = params?;
    let payment_ref = params.reference.or(params.trxref).unwrap_or_default();
    let verified = state.payments.verify_payment(&payment_ref).await?;
    Ok(Json(verified.into()))
}

async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<WebhookResponse>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    let ack = state.payments.handle_webhook(&body, signature).await?;
    Ok(Json(WebhookResponse {
        received: true,
        applied: ack.applied,
    }))
}

async fn list_my_payments(
    State(state): State<AppState>,
    identity: Identity,
    params: Result<Query<PageParams>, QueryRejection>,
) -> ApiResult<Json<Paginated<Payment>>> {
    let Query(params) = params?;
    let payments = state
        .payments
        .list_payments_for_owner(&identity.user_id, params.page())
        .await?;
    Ok(Json(payments))
}

async fn payment_stats(
    State(state): State<AppState>,
    identity: Identity,
) -> ApiResult<Json<PaymentStats>> {
    identity.require_admin()?;
    Ok(Json(state.payments.payment_stats().await?))
}
