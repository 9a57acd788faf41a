//! # Database Error Types
//!
//! Error types for database operations and inventory ledger outcomes.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds context and categorization                │
//! │       │                  Ledger: InsufficientStock, StaleState          │
//! │       ▼                                                                 │
//! │  CommerceError (shepherd-commerce)                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError {code, message}                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use shepherd_core::ErrorKind;
use sqlx::error::ErrorKind as SqlxErrorKind;
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Missing row; soft-deleted orders count as missing.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// `field` is `<table>.<column>` as reported by SQLite.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// CHECK constraint violation (e.g. stock would go negative).
    #[error("Constraint violation: {message}")]
    CheckViolation { message: String },

    /// The ledger could not take stock for a line.
    ///
    /// ## When This Occurs
    /// ```text
    /// UPDATE books SET stock_quantity = stock_quantity - 2
    ///  WHERE id = ? AND stock_quantity >= 2      ← 0 rows
    ///      │
    ///      ▼
    /// InsufficientStock { available: 1, requested: 2 }
    ///      │
    ///      ▼
    /// Transaction dropped → no book in the batch changed
    /// ```
    #[error("Insufficient stock for book {book_id}: available {available}, requested {requested}")]
    InsufficientStock {
        book_id: String,
        available: i64,
        requested: i64,
    },

    /// A compare-and-set write found the row in a different state.
    #[error("{entity} {id} was modified concurrently")]
    StaleState { entity: String, id: String },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Stored JSON could not be encoded or decoded.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// No connection became free within the acquire timeout.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn stale(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::StaleState {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Returns true if this is a unique violation on the given column.
    ///
    /// SQLite reports the column as `<table>.<column>`.
    pub fn is_unique_violation_on(&self, column: &str) -> bool {
        matches!(self, DbError::UniqueViolation { field, .. } if field.contains(column))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DbError::NotFound { .. } => ErrorKind::NotFound,
            DbError::UniqueViolation { .. } | DbError::StaleState { .. } => ErrorKind::Conflict,
            DbError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            DbError::ForeignKeyViolation { .. } | DbError::CheckViolation { .. } => {
                ErrorKind::Validation
            }
            DbError::ConnectionFailed(_)
            | DbError::MigrationFailed(_)
            | DbError::QueryFailed(_)
            | DbError::Serialization(_)
            | DbError::PoolExhausted
            | DbError::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// Maps driver errors onto storage categories.
///
/// ```text
/// RowNotFound          → NotFound
/// UNIQUE               → UniqueViolation
/// FOREIGN KEY          → ForeignKeyViolation
/// CHECK / NOT NULL     → CheckViolation
/// PoolTimedOut         → PoolExhausted
/// PoolClosed           → ConnectionFailed
/// other database error → QueryFailed
/// anything else        → Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),
            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                match db_err.kind() {
                    // SQLite names the column: "UNIQUE constraint failed: orders.order_number"
                    SqlxErrorKind::UniqueViolation => DbError::UniqueViolation {
                        field: message
                            .rsplit(": ")
                            .next()
                            .unwrap_or("unknown")
                            .to_string(),
                        value: "unknown".to_string(),
                    },
                    SqlxErrorKind::ForeignKeyViolation => DbError::ForeignKeyViolation { message },
                    SqlxErrorKind::CheckViolation | SqlxErrorKind::NotNullViolation => {
                        DbError::CheckViolation { message }
                    }
                    _ => DbError::QueryFailed(message),
                }
            }
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Serialization(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;
