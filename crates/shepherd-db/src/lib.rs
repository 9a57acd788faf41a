//! # shepherd-db: Database Layer for Shepherd Commerce
//!
//! SQLite storage for the catalog, orders and payments, using sqlx for async
//! operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shepherd Data Flow                               │
//! │                                                                         │
//! │  shepherd-commerce (OrderManager, PaymentService)                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                   shepherd-db (THIS CRATE)                      │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐   │    │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │   │    │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │   │    │
//! │  │   │               │    │ BookRepo       │    │              │   │    │
//! │  │   │ SqlitePool    │◄───│ OrderRepo      │    │ 001_initial  │   │    │
//! │  │   │ WAL, FKs      │    │ PaymentRepo    │    │ _schema.sql  │   │    │
//! │  │   │               │    │ InventoryLedger│    │              │   │    │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘   │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shepherd_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./shepherd.db")).await?;
//! let book = db.books().get_by_id(&book_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::book::BookRepository;
pub use repository::inventory::InventoryLedger;
pub use repository::order::{OrderQuery, OrderRepository, Transition, TransitionOutcome};
pub use repository::payment::PaymentRepository;
