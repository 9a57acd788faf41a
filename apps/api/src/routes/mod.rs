//! HTTP routes.
//!
//! ```text
//! /health
//! /api/v1/orders/...     orders.rs
//! /api/v1/payments/...   payments.rs
//! ```

pub mod orders;
pub mod payments;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use shepherd_core::Page;

use crate::state::AppState;

pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1/orders", orders::router())
        .nest("/api/v1/payments", payments::router())
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let database = state.db.health_check().await;
    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if database { "ok" } else { "degraded" },
            "database": database,
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}

/// `?page=&limit=` query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageParams {
    pub fn page(&self) -> Page {
        Page::new(self.page, self.limit)
    }
}
