//! Order endpoints.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use shepherd_core::{
    DeliveryType, NewOrder, Order, OrderFilter, OrderStats, OrderStatus, OrderWithItems, Paginated,
    PaymentMethod,
};
use tracing::debug;

use super::PageParams;
use crate::error::ApiResult;
use crate::identity::Identity;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_order).get(list_orders))
        .route("/mine", get(list_my_orders))
        .route("/stats", get(order_stats))
        .route("/{id}", get(get_order).delete(remove_order))
        .route("/{id}/status", patch(update_status))
        .route("/{id}/cancel", post(cancel_order))
        .route("/{id}/process-payment", post(process_payment))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    page: Option<u32>,
    limit: Option<u32>,
    status: Option<OrderStatus>,
    delivery_type: Option<DeliveryType>,
    search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    status: OrderStatus,
    #[serde(default, alias = "adminNotes")]
    notes: Option<String>,
}

/// Payment taken at the counter or by transfer.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessPayment {
    payment_method: PaymentMethod,
    payment_ref: String,
}

async fn create_order(
    State(state): State<AppState>,
    identity: Identity,
    payload: Result<Json<NewOrder>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<OrderWithItems>)> {
    let Json(new_order) = payload?;
    let order = state.orders.create_order(&identity.user_id, new_order).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

async fn list_my_orders(
    State(state): State<AppState>,
    identity: Identity,
    params: Result<Query<PageParams>, QueryRejection>,
) -> ApiResult<Json<Paginated<Order>>> {
    let Query(params) = params?;
    let orders = state
        .orders
        .list_orders_for_owner(&identity.user_id, params.page())
        .await?;
    Ok(Json(orders))
}

async fn list_orders(
    State(state): State<AppState>,
    identity: Identity,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<Paginated<Order>>> {
    identity.require_admin()?;
    let Query(params) = params?;

    let page = PageParams {
        page: params.page,
        limit: params.limit,
    }
    .page();
    let filter = OrderFilter {
        status: params.status,
        delivery_type: params.delivery_type,
        search: params.search,
    };
    debug!(?filter, page = page.page, "Listing orders");

    Ok(Json(state.orders.list_orders(filter, page).await?))
}

async fn order_stats(
    State(state): State<AppState>,
    identity: Identity,
) -> ApiResult<Json<OrderStats>> {
    identity.require_admin()?;
    Ok(Json(state.orders.order_stats().await?))
}

async fn get_order(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> ApiResult<Json<OrderWithItems>> {
    let owner = (!identity.is_admin()).then_some(identity.user_id.as_str());
    Ok(Json(state.orders.get_order(&id, owner).await?))
}

async fn update_status(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
    payload: Result<Json<StatusUpdate>, JsonRejection>,
) -> ApiResult<Json<OrderWithItems>> {
    identity.require_admin()?;
    let Json(update) = payload?;
    let order = state
        .orders
        .update_status(&id, update.status, update.notes)
        .await?;
    Ok(Json(order))
}

async fn cancel_order(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> ApiResult<Json<OrderWithItems>> {
    Ok(Json(state.orders.cancel_order(&id, &identity.user_id).await?))
}

async fn process_payment(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
    payload: Result<Json<ProcessPayment>, JsonRejection>,
) -> ApiResult<Json<Order>> {
    identity.require_admin()?;
    let Json(payment) = payload?;
    let order = state
        .orders
        .mark_paid(&id, payment.payment_method, &payment.payment_ref, Utc::now())
        .await?;
    Ok(Json(order))
}

async fn remove_order(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    identity.require_admin()?;
    state.orders.remove_order(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
