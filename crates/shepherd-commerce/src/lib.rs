//! # shepherd-commerce: Order and Payment Workflows
//!
//! Services that turn validated requests into committed state.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shepherd Architecture                            │
//! │                                                                         │
//! │  shepherd-api (axum handlers)                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │               shepherd-commerce (THIS CRATE)                    │    │
//! │  │                                                                 │    │
//! │  │  OrderManager ◄──── OrderSettlement ◄──── PaymentService        │    │
//! │  │       │               (SettlementHook)          │               │    │
//! │  │       │                                         ▼               │    │
//! │  │       │                               PaymentGateway (trait)    │    │
//! │  │       │                               └── PaystackGateway       │    │
//! │  │       ▼                                                         │    │
//! │  │  NotificationSink (trait) └── LogNotifier                       │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  shepherd-db (ledger, repositories)   shepherd-core (rules)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! let orders = OrderManager::new(db.clone(), Arc::new(LogNotifier));
//! let gateway = Arc::new(PaystackGateway::new(gateway_config)?);
//! let payments = PaymentService::new(db, gateway, ReconciliationConfig::default())
//!     .with_settlement(Arc::new(OrderSettlement::new(orders.clone())));
//! ```

pub mod error;
pub mod gateway;
pub mod notify;
pub mod orders;
pub mod payments;

pub use error::{CommerceError, CommerceResult};
pub use gateway::{GatewayConfig, GatewayError, PaymentGateway, PaystackGateway};
pub use notify::{LogNotifier, Notification, NotificationKind, NotificationSink};
pub use orders::OrderManager;
pub use payments::{
    InitiatePayment, InitiatedPayment, OrderSettlement, PaymentService, ReconciliationConfig,
    SettlementHook, VerifiedPayment, WebhookAck,
};
