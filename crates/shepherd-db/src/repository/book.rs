//! # Book Repository
//!
//! Read access to the catalog plus the administrative writes used by the
//! seed binary and tests. Stock changes for orders go through the
//! [`inventory`](super::inventory) ledger, never through this repository.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use shepherd_core::Book;

const BOOK_COLUMNS: &str =
    "id, title, author, price_minor, stock_quantity, is_active, created_at, updated_at";

/// Repository for catalog books.
#[derive(Debug, Clone)]
pub struct BookRepository {
    pool: SqlitePool,
}

impl BookRepository {
    /// Creates a new BookRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BookRepository { pool }
    }

    /// Gets a book by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(&format!(
            "SELECT {} FROM books WHERE id = ?1",
            BOOK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(book)
    }

    /// Gets every book whose id is in `ids`. Missing ids are simply absent.
    pub async fn get_many(&self, ids: &[String]) -> DbResult<Vec<Book>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM books WHERE id IN (", BOOK_COLUMNS));
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(id.clone());
        }
        separated.push_unseparated(")");

        let books = query.build_query_as::<Book>().fetch_all(&self.pool).await?;
        Ok(books)
    }

    /// Inserts a new book.
    pub async fn insert(&self, book: &Book) -> DbResult<()> {
        debug!(id = %book.id, title = %book.title, "Inserting book");

        sqlx::query(
            r#"
            INSERT INTO books (
                id, title, author, price_minor, stock_quantity, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&book.id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.price_minor)
        .bind(book.stock_quantity)
        .bind(book.is_active)
        .bind(book.created_at)
        .bind(book.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Creates and inserts a book with a fresh id.
    pub async fn create(
        &self,
        title: &str,
        author: Option<&str>,
        price_minor: i64,
        stock_quantity: i64,
    ) -> DbResult<Book> {
        let now = Utc::now();
        let book = Book {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            author: author.map(str::to_string),
            price_minor,
            stock_quantity,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.insert(&book).await?;
        Ok(book)
    }

    /// Takes a book off sale without deleting it; past orders still reference it.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deactivating book");

        let result = sqlx::query("UPDATE books SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Book", id));
        }

        Ok(())
    }

    /// Current stock for a book.
    pub async fn stock_of(&self, id: &str) -> DbResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT stock_quantity FROM books WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Book", id))
    }

    /// Counts active books (for diagnostics and the seed binary).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
