use std::time::Duration;

use async_trait::async_trait;
use sqlx::{migrate::MigrateError, postgres::PgPoolOptions, PgPool};

use crate::{
    book::{Book, BookUpdate},
    server::DatabaseConfig,
};

use super::{BookStore, StoreError};

/// [`BookStore`] backed by the `books` table of a Postgres database.
#[derive(Debug, Clone)]
pub struct PgBookStore {
    pool: PgPool,
}

impl PgBookStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(name = "pg_connect", skip_all)]
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_in_seconds))
            .connect(&config.url)
            .await?;

        tracing::info!(max_connections = config.max_connections, "Connected");

        Ok(Self { pool })
    }

    #[tracing::instrument(name = "pg_migrate", skip_all)]
    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations applied");

        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn unavailable(err: sqlx::Error) -> StoreError {
    tracing::error!(%err, "Query failed");

    StoreError::Unavailable(err)
}

#[async_trait]
impl BookStore for PgBookStore {
    #[tracing::instrument(skip_all)]
    async fn list_all(&self) -> Result<Vec<Book>, StoreError> {
        sqlx::query_as::<_, Book>(
            r#"
            SELECT isbn, amazon_url, author, language, pages, publisher, title, year
            FROM books
            ORDER BY title
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)
    }

    #[tracing::instrument(skip(self))]
    async fn get_by_isbn(&self, isbn: &str) -> Result<Book, StoreError> {
        sqlx::query_as::<_, Book>(
            r#"
            SELECT isbn, amazon_url, author, language, pages, publisher, title, year
            FROM books
            WHERE isbn = $1
            "#,
        )
        .bind(isbn)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?
        .ok_or_else(|| StoreError::NotFound {
            isbn: isbn.to_string(),
        })
    }

    #[tracing::instrument(skip_all, fields(isbn = %book.isbn))]
    async fn insert(&self, book: &Book) -> Result<Book, StoreError> {
        sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (isbn, amazon_url, author, language, pages, publisher, title, year)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING isbn, amazon_url, author, language, pages, publisher, title, year
            "#,
        )
        .bind(&book.isbn)
        .bind(&book.amazon_url)
        .bind(&book.author)
        .bind(&book.language)
        .bind(book.pages)
        .bind(&book.publisher)
        .bind(&book.title)
        .bind(book.year)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                tracing::warn!("Duplicate isbn");

                StoreError::Conflict {
                    isbn: book.isbn.clone(),
                }
            }
            _ => unavailable(err),
        })
    }

    #[tracing::instrument(skip(self, update))]
    async fn update(&self, isbn: &str, update: &BookUpdate) -> Result<Book, StoreError> {
        sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET amazon_url = COALESCE($2, amazon_url),
                author = COALESCE($3, author),
                language = COALESCE($4, language),
                pages = COALESCE($5, pages),
                publisher = COALESCE($6, publisher),
                title = COALESCE($7, title),
                year = COALESCE($8, year)
            WHERE isbn = $1
            RETURNING isbn, amazon_url, author, language, pages, publisher, title, year
            "#,
        )
        .bind(isbn)
        .bind(&update.amazon_url)
        .bind(&update.author)
        .bind(&update.language)
        .bind(update.pages)
        .bind(&update.publisher)
        .bind(&update.title)
        .bind(update.year)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?
        .ok_or_else(|| StoreError::NotFound {
            isbn: isbn.to_string(),
        })
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, isbn: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM books WHERE isbn = $1")
            .bind(isbn)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                isbn: isbn.to_string(),
            });
        }

        Ok(())
    }
}
