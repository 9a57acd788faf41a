//! # Storage Handle
//!
//! Opens the bookshop database and hands out repositories.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Storage Handle                                 │
//! │                                                                         │
//! │  DbConfig { path, pool size, busy timeout }                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new ──► SqlitePool (WAL, foreign keys) ──► migrations        │
//! │       │                                                                 │
//! │       ├── books()      catalog reads, seeding                           │
//! │       ├── orders()     orders + items, transitions                      │
//! │       ├── payments()   conditional status merge                         │
//! │       └── inventory()  standalone stock batches                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every clone of [`Database`] shares one pool. SQLite serializes writers;
//! each write transaction here issues its write first, so a connection never
//! has to upgrade a read lock to a write lock mid-transaction.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::book::BookRepository;
use crate::repository::inventory::InventoryLedger;
use crate::repository::order::OrderRepository;
use crate::repository::payment::PaymentRepository;

const MEMORY_PATH: &str = ":memory:";

/// Where the database lives and how hard to wait for it.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_path: PathBuf,
    /// Upper bound on pooled connections. Forced to 1 in memory.
    pub max_connections: u32,
    /// Time to wait for a free pooled connection.
    pub acquire_timeout: Duration,
    /// Time a writer waits on SQLITE_BUSY before giving up.
    pub busy_timeout: Duration,
    pub run_migrations: bool,
}

impl DbConfig {
    /// File-backed database; the file is created on first open.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 8,
            acquire_timeout: Duration::from_secs(10),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    /// Private in-memory database, used by tests.
    ///
    /// An in-memory SQLite database belongs to a single connection, so the
    /// pool holds exactly one. Callers must not hold a connection while
    /// calling another repository.
    pub fn in_memory() -> Self {
        DbConfig {
            max_connections: 1,
            ..DbConfig::new(MEMORY_PATH)
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max.max(1);
        self
    }

    fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == MEMORY_PATH
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let url = if self.is_in_memory() {
            "sqlite::memory:".to_string()
        } else {
            format!("sqlite://{}?mode=rwc", self.database_path.display())
        };

        Ok(SqliteConnectOptions::from_str(&url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            // Off by default in SQLite
            .foreign_keys(true)
            .busy_timeout(self.busy_timeout)
            .create_if_missing(true))
    }
}

/// Shared handle to the bookshop database.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the pool and, unless disabled, applies pending migrations.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(path = %config.database_path.display(), "Opening database");

        let options = config.connect_options()?;
        let max_connections = if config.is_in_memory() {
            1
        } else {
            config.max_connections
        };

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .min_connections(1)
            .acquire_timeout(config.acquire_timeout);
        if config.is_in_memory() {
            // Dropping the last connection would drop the data.
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
        debug!(max_connections, "Pool ready");

        let db = Database { pool };
        if config.run_migrations {
            migrations::run_migrations(&db.pool).await?;
            info!("Schema up to date");
        }
        Ok(db)
    }

    /// Raw pool, for transactions that span repositories.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn books(&self) -> BookRepository {
        BookRepository::new(self.pool.clone())
    }

    pub fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.pool.clone())
    }

    pub fn payments(&self) -> PaymentRepository {
        PaymentRepository::new(self.pool.clone())
    }

    pub fn inventory(&self) -> InventoryLedger {
        InventoryLedger::new(self.pool.clone())
    }

    /// Waits for checked-out connections, then closes the pool.
    pub async fn close(&self) {
        info!("Closing database");
        self.pool.close().await;
    }

    /// True when a trivial query succeeds.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_opens_and_migrates() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.health_check().await);
        assert_eq!(db.books().count().await.unwrap(), 0);
    }

    #[test]
    fn test_config_defaults() {
        let file = DbConfig::new("/tmp/shepherd-test.db").with_max_connections(0);
        assert_eq!(file.max_connections, 1);
        assert!(!file.is_in_memory());

        let memory = DbConfig::in_memory();
        assert!(memory.is_in_memory());
        assert_eq!(memory.max_connections, 1);
        assert!(memory.run_migrations);
    }

    #[tokio::test]
    async fn test_closed_pool_fails_health_check() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.close().await;
        assert!(!db.health_check().await);
    }
}
