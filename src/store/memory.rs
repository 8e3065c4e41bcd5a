use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::book::{Book, BookUpdate};

use super::{BookStore, StoreError};

/// [`BookStore`] keeping the books in a map. Lists are ordered by title like the Postgres store.
#[derive(Debug, Default)]
pub struct InMemoryBookStore {
    books: RwLock<HashMap<String, Book>>,
}

impl InMemoryBookStore {
    pub fn with_books(books: impl IntoIterator<Item = Book>) -> Self {
        let books = books
            .into_iter()
            .map(|book| (book.isbn.clone(), book))
            .collect();

        Self {
            books: RwLock::new(books),
        }
    }

    pub async fn count(&self) -> usize {
        self.books.read().await.len()
    }
}

#[async_trait]
impl BookStore for InMemoryBookStore {
    async fn list_all(&self) -> Result<Vec<Book>, StoreError> {
        let mut books: Vec<Book> = self.books.read().await.values().cloned().collect();
        books.sort_by(|a, b| a.title.cmp(&b.title));

        Ok(books)
    }

    async fn get_by_isbn(&self, isbn: &str) -> Result<Book, StoreError> {
        self.books
            .read()
            .await
            .get(isbn)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                isbn: isbn.to_string(),
            })
    }

    async fn insert(&self, book: &Book) -> Result<Book, StoreError> {
        let mut books = self.books.write().await;

        if books.contains_key(&book.isbn) {
            return Err(StoreError::Conflict {
                isbn: book.isbn.clone(),
            });
        }

        books.insert(book.isbn.clone(), book.clone());

        Ok(book.clone())
    }

    async fn update(&self, isbn: &str, update: &BookUpdate) -> Result<Book, StoreError> {
        let mut books = self.books.write().await;

        let stored = books.get_mut(isbn).ok_or_else(|| StoreError::NotFound {
            isbn: isbn.to_string(),
        })?;

        *stored = update.apply_to(stored);

        Ok(stored.clone())
    }

    async fn delete(&self, isbn: &str) -> Result<(), StoreError> {
        self.books
            .write()
            .await
            .remove(isbn)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound {
                isbn: isbn.to_string(),
            })
    }
}
