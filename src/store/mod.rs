use async_trait::async_trait;

use crate::book::{Book, BookUpdate};

#[cfg(test)]
pub mod memory;
pub mod postgres;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Book with isbn {isbn} not found")]
    NotFound { isbn: String },
    #[error("Book with isbn {isbn} already exists")]
    Conflict { isbn: String },
    #[error("Store unavailable: {0}")]
    Unavailable(#[source] sqlx::Error),
}

/// Persistence for [`Book`] records.
///
/// Each method is a single round trip. Existence and uniqueness are enforced by the store
/// and reported as [`StoreError::NotFound`] and [`StoreError::Conflict`].
#[async_trait]
pub trait BookStore: Send + Sync {
    async fn list_all(&self) -> Result<Vec<Book>, StoreError>;

    async fn get_by_isbn(&self, isbn: &str) -> Result<Book, StoreError>;

    async fn insert(&self, book: &Book) -> Result<Book, StoreError>;

    /// Replaces the fields present in `update`, keeping the others.
    async fn update(&self, isbn: &str, update: &BookUpdate) -> Result<Book, StoreError>;

    async fn delete(&self, isbn: &str) -> Result<(), StoreError>;
}
