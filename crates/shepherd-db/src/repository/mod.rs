//! # Repository Module
//!
//! Database repository implementations.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  OrderManager / PaymentService                                          │
//! │       │                                                                 │
//! │       │  db.orders().apply_transition(&transition)                      │
//! │       ▼                                                                 │
//! │  OrderRepository ──────► inventory::reserve_for_order (same tx)         │
//! │  BookRepository                                                         │
//! │  PaymentRepository                                                      │
//! │       │                                                                 │
//! │       │  SQL                                                            │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`BookRepository`](book::BookRepository) - Catalog reads
//! - [`InventoryLedger`](inventory::InventoryLedger) - Conditional stock changes
//! - [`OrderRepository`](order::OrderRepository) - Orders, items, transitions
//! - [`PaymentRepository`](payment::PaymentRepository) - Payments and status merge

pub mod book;
pub mod inventory;
pub mod order;
pub mod payment;
