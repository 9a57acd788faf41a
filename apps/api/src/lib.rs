//! # Shepherd API
//!
//! JSON over HTTP for the order and payment services.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Shepherd API                                  │
//! │                                                                         │
//! │  upstream auth ──► x-user-* headers ──► Identity extractor              │
//! │                                            │                            │
//! │  Paystack ──► /payments/webhook (raw) ─────┤                            │
//! │                                            ▼                            │
//! │                     routes ──► AppState { OrderManager, PaymentService }│
//! │                                            │                            │
//! │                                            ▼                            │
//! │                                    SQLite (shepherd-db)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod identity;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::trace::TraceLayer;

pub use config::{ApiConfig, ConfigError};
pub use error::{ApiError, ApiResult};
pub use identity::Identity;
pub use state::AppState;

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    routes::api_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use chrono::Utc;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use shepherd_commerce::gateway::signature;
    use shepherd_commerce::{GatewayConfig, PaystackGateway, ReconciliationConfig};
    use shepherd_core::{Book, Payment, PaymentMethod, PaymentStatus};
    use shepherd_db::{Database, DbConfig};
    use tower::ServiceExt;

    const SECRET: &str = "sk_test_router";

    async fn setup() -> (Router, Database) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        // Nothing listens on port 9; provider calls fail fast.
        let gateway = PaystackGateway::new(
            GatewayConfig::new(Some(SECRET.to_string()), "http://localhost/callback")
                .with_base_url("http://127.0.0.1:9")
                .with_timeout(std::time::Duration::from_secs(2)),
        )
        .unwrap();
        let state = AppState::new(db.clone(), Arc::new(gateway), ReconciliationConfig::default());
        (router(state), db)
    }

    async fn book(db: &Database, price_minor: i64, stock: i64) -> Book {
        db.books()
            .create("The Pilgrim's Progress", Some("John Bunyan"), price_minor, stock)
            .await
            .unwrap()
    }

    fn request(method: Method, uri: &str, user: Option<(&str, &str)>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some((user_id, role)) = user {
            builder = builder
                .header("x-user-id", user_id)
                .header("x-user-email", format!("{user_id}@church.test"))
                .header("x-user-role", role);
        }
        match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn place_order(app: &Router, db: &Database, user: &str) -> Value {
        let book = book(db, 25_000, 10).await;
        let (status, body) = send(
            app,
            request(
                Method::POST,
                "/api/v1/orders",
                Some((user, "member")),
                Some(json!({
                    "items": [{ "bookId": book.id, "quantity": 2 }],
                    "deliveryType": "PICKUP"
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }

    async fn pending_payment(db: &Database, owner: &str, amount_minor: i64, reference_id: &str) -> Payment {
        let now = Utc::now();
        let payment = Payment {
            id: format!("pay-{reference_id}"),
            user_id: owner.to_string(),
            amount_minor,
            method: PaymentMethod::Paystack,
            payment_ref: format!("ref_{reference_id}"),
            purpose: "order".to_string(),
            reference_id: Some(reference_id.to_string()),
            metadata: None,
            status: PaymentStatus::Pending,
            paid_at: None,
            created_at: now,
            updated_at: now,
        };
        db.payments().insert(&payment).await.unwrap();
        payment
    }

    fn signed_webhook(body: &Value, signature: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/api/v1/payments/webhook")
            .header("content-type", "application/json")
            .header("x-paystack-signature", signature)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _db) = setup().await;
        let (status, body) = send(&app, request(Method::GET, "/health", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["database"], true);
    }

    #[tokio::test]
    async fn test_missing_identity_is_unauthorized() {
        let (app, _db) = setup().await;
        let (status, body) = send(&app, request(Method::GET, "/api/v1/orders/mine", None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_create_and_fetch_own_order() {
        let (app, db) = setup().await;
        let created = place_order(&app, &db, "u1").await;
        assert_eq!(created["total_minor"], 50_000);
        assert_eq!(created["status"], "PENDING");

        let id = created["id"].as_str().unwrap();
        let uri = format!("/api/v1/orders/{id}");

        let (status, _) = send(&app, request(Method::GET, &uri, Some(("u1", "member")), None)).await;
        assert_eq!(status, StatusCode::OK);

        // Another member cannot see it; staff can.
        let (status, _) = send(&app, request(Method::GET, &uri, Some(("u2", "member")), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, request(Method::GET, &uri, Some(("staff", "admin")), None)).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) =
            send(&app, request(Method::GET, "/api/v1/orders/mine", Some(("u1", "member")), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);
    }

    #[tokio::test]
    async fn test_malformed_order_body() {
        let (app, _db) = setup().await;
        let (status, body) = send(
            &app,
            request(
                Method::POST,
                "/api/v1/orders",
                Some(("u1", "member")),
                Some(json!({ "items": "none" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION");
    }

    #[tokio::test]
    async fn test_insufficient_stock_is_conflict() {
        let (app, db) = setup().await;
        let book = book(&db, 1_000, 1).await;
        let (status, body) = send(
            &app,
            request(
                Method::POST,
                "/api/v1/orders",
                Some(("u1", "member")),
                Some(json!({
                    "items": [{ "bookId": book.id, "quantity": 3 }],
                    "deliveryType": "PICKUP"
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "INSUFFICIENT_STOCK");
    }

    #[tokio::test]
    async fn test_staff_only_endpoints() {
        let (app, _db) = setup().await;
        for uri in ["/api/v1/orders", "/api/v1/orders/stats", "/api/v1/payments/stats"] {
            let (status, _) = send(&app, request(Method::GET, uri, Some(("u1", "member")), None)).await;
            assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
            let (status, _) = send(&app, request(Method::GET, uri, Some(("staff", "super_admin")), None)).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_status_update_and_invalid_transition() {
        let (app, db) = setup().await;
        let created = place_order(&app, &db, "u1").await;
        let uri = format!("/api/v1/orders/{}/status", created["id"].as_str().unwrap());

        let (status, body) = send(
            &app,
            request(
                Method::PATCH,
                &uri,
                Some(("staff", "admin")),
                Some(json!({ "status": "CONFIRMED", "notes": "Ready Sunday" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["status"], "CONFIRMED");

        let (status, body) = send(
            &app,
            request(Method::PATCH, &uri, Some(("staff", "admin")), Some(json!({ "status": "PENDING" }))),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "INVALID_TRANSITION");
    }

    #[tokio::test]
    async fn test_cancel_then_remove() {
        let (app, db) = setup().await;
        let created = place_order(&app, &db, "u1").await;
        let id = created["id"].as_str().unwrap().to_string();

        let (status, _) = send(
            &app,
            request(Method::DELETE, &format!("/api/v1/orders/{id}"), Some(("staff", "admin")), None),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = send(
            &app,
            request(Method::POST, &format!("/api/v1/orders/{id}/cancel"), Some(("u1", "member")), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "CANCELLED");

        let (status, _) = send(
            &app,
            request(Method::DELETE, &format!("/api/v1/orders/{id}"), Some(("staff", "admin")), None),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_initiate_with_unreachable_provider() {
        let (app, db) = setup().await;
        let (status, body) = send(
            &app,
            request(
                Method::POST,
                "/api/v1/payments/initiate",
                Some(("u1", "member")),
                Some(json!({ "amount": 50_000, "purpose": "order" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["code"], "GATEWAY");

        // The payment row was written before the provider call.
        let (payments, total) = db
            .payments()
            .list_for_owner("u1", shepherd_core::Page::default())
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(payments[0].status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_initiate_rejects_cash() {
        let (app, _db) = setup().await;
        let (status, body) = send(
            &app,
            request(
                Method::POST,
                "/api/v1/payments/initiate",
                Some(("u1", "member")),
                Some(json!({ "amount": 50_000, "purpose": "order", "method": "CASH" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "UNSUPPORTED_METHOD");
    }

    #[tokio::test]
    async fn test_signed_webhook_settles_order() {
        let (app, db) = setup().await;
        let created = place_order(&app, &db, "u1").await;
        let order_id = created["id"].as_str().unwrap().to_string();
        let payment = pending_payment(&db, "u1", 50_000, &order_id).await;

        let event = json!({
            "event": "charge.success",
            "data": { "reference": payment.payment_ref, "amount": 50_000 }
        });
        let sig = signature::sign(SECRET, event.to_string().as_bytes());

        let (status, body) = send(&app, signed_webhook(&event, &sig)).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["applied"], true);

        // Redelivery is acknowledged without a second write.
        let (status, body) = send(&app, signed_webhook(&event, &sig)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["applied"], false);

        let (_, order) = send(
            &app,
            request(Method::GET, &format!("/api/v1/orders/{order_id}"), Some(("u1", "member")), None),
        )
        .await;
        assert_eq!(order["payment_status"], "SUCCESSFUL");
    }

    #[tokio::test]
    async fn test_webhook_for_foreign_payer_leaves_order_unpaid() {
        let (app, db) = setup().await;
        let created = place_order(&app, &db, "victim").await;
        let order_id = created["id"].as_str().unwrap().to_string();
        let payment = pending_payment(&db, "u1", 1_000, &order_id).await;

        let event = json!({
            "event": "charge.success",
            "data": { "reference": payment.payment_ref, "amount": 1_000 }
        });
        let sig = signature::sign(SECRET, event.to_string().as_bytes());
        let (status, body) = send(&app, signed_webhook(&event, &sig)).await;
        assert_eq!(status, StatusCode::OK, "{body}");

        let (_, order) = send(
            &app,
            request(Method::GET, &format!("/api/v1/orders/{order_id}"), Some(("victim", "member")), None),
        )
        .await;
        assert_eq!(order["payment_status"], "PENDING");

        let (status, body) = send(
            &app,
            request(Method::POST, &format!("/api/v1/orders/{order_id}/cancel"), Some(("victim", "member")), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["status"], "CANCELLED");
    }

    #[tokio::test]
    async fn test_initiate_for_foreign_order_not_found() {
        let (app, db) = setup().await;
        let created = place_order(&app, &db, "victim").await;
        let order_id = created["id"].clone();

        let (status, body) = send(
            &app,
            request(
                Method::POST,
                "/api/v1/payments/initiate",
                Some(("u1", "member")),
                Some(json!({ "amount": 50_000, "purpose": "order", "referenceId": order_id })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{body}");
        assert_eq!(db.payments().stats().await.unwrap().total_payments, 0);
    }

    #[tokio::test]
    async fn test_verify_discloses_receipt_only() {
        let (app, db) = setup().await;
        let created = place_order(&app, &db, "u1").await;
        let order_id = created["id"].as_str().unwrap().to_string();
        let payment = pending_payment(&db, "u1", 50_000, &order_id).await;

        let event = json!({
            "event": "charge.success",
            "data": { "reference": payment.payment_ref, "amount": 50_000 }
        });
        let sig = signature::sign(SECRET, event.to_string().as_bytes());
        send(&app, signed_webhook(&event, &sig)).await;

        // Settled payments are answered without asking the provider.
        let (status, body) = send(
            &app,
            request(
                Method::POST,
                "/api/v1/payments/verify",
                None,
                Some(json!({ "paymentRef": payment.payment_ref })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["paymentRef"], Value::String(payment.payment_ref.clone()));
        assert_eq!(body["status"], "SUCCESSFUL");
        assert_eq!(body["amount"], 50_000);
        assert_eq!(body["referenceId"], Value::String(order_id));
        assert_eq!(body["providerStatus"], Value::Null);
        for hidden in ["payment", "metadata", "user_id", "userId", "verification"] {
            assert!(body.get(hidden).is_none(), "{hidden} disclosed");
        }

        let uri = format!("/api/v1/payments/verify?reference={}", payment.payment_ref);
        let (status, body) = send(&app, request(Method::GET, &uri, None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "SUCCESSFUL");
        assert!(body.get("metadata").is_none());
    }

    #[tokio::test]
    async fn test_staff_process_payment() {
        let (app, db) = setup().await;
        let created = place_order(&app, &db, "u1").await;
        let uri = format!("/api/v1/orders/{}/process-payment", created["id"].as_str().unwrap());
        let body = json!({ "paymentMethod": "CASH", "paymentRef": "CASH-0042" });

        let (status, _) = send(&app, request(Method::POST, &uri, Some(("u1", "member")), Some(body.clone()))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, paid) = send(&app, request(Method::POST, &uri, Some(("staff", "admin")), Some(body.clone()))).await;
        assert_eq!(status, StatusCode::OK, "{paid}");
        assert_eq!(paid["payment_status"], "SUCCESSFUL");
        assert_eq!(paid["payment_method"], "CASH");
        assert_eq!(paid["payment_ref"], "CASH-0042");
        assert!(paid["paid_at"].is_string());

        let (status, body) = send(&app, request(Method::POST, &uri, Some(("staff", "admin")), Some(body))).await;
        assert_eq!(status, StatusCode::CONFLICT, "{body}");

        let (status, body) = send(
            &app,
            request(
                Method::POST,
                &uri,
                Some(("staff", "admin")),
                Some(json!({ "paymentMethod": "CASH", "paymentRef": "  " })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    }

    #[tokio::test]
    async fn test_tampered_webhook_rejected() {
        let (app, db) = setup().await;
        let payment = pending_payment(&db, "u1", 50_000, "order-x").await;

        let event = json!({
            "event": "charge.success",
            "data": { "reference": payment.payment_ref, "amount": 50_000 }
        });
        let sig = signature::sign("sk_wrong", event.to_string().as_bytes());

        let (status, body) = send(&app, signed_webhook(&event, &sig)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "SIGNATURE");

        let stored = db.payments().get_by_ref(&payment.payment_ref).await.unwrap().unwrap();
        assert_eq!(stored.status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_unsigned_webhook_rejected() {
        let (app, _db) = setup().await;
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/payments/webhook")
            .body(Body::from("{}"))
            .unwrap();
        let (status, _) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
