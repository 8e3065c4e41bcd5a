use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use crate::{
    book::{Book, BookUpdate},
    error::ErrorVerbosity,
    store::{memory::InMemoryBookStore, BookStore, StoreError},
};

use super::{app_with_store, power_up, seeded_app, send, to_json};

/// A store whose every call fails as if the database were unreachable.
struct UnreachableBookStore;

fn unreachable() -> StoreError {
    StoreError::Unavailable(sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl BookStore for UnreachableBookStore {
    async fn list_all(&self) -> Result<Vec<Book>, StoreError> {
        Err(unreachable())
    }

    async fn get_by_isbn(&self, _isbn: &str) -> Result<Book, StoreError> {
        Err(unreachable())
    }

    async fn insert(&self, _book: &Book) -> Result<Book, StoreError> {
        Err(unreachable())
    }

    async fn update(&self, _isbn: &str, _update: &BookUpdate) -> Result<Book, StoreError> {
        Err(unreachable())
    }

    async fn delete(&self, _isbn: &str) -> Result<(), StoreError> {
        Err(unreachable())
    }
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let (app, _store) = seeded_app();

    let (status, body) = send(&app, Method::GET, "/authors", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_type"], "NotFound");
}

#[tokio::test]
async fn wrong_method_is_not_allowed() {
    let (app, _store) = seeded_app();

    let (status, body) = send(&app, Method::DELETE, "/books", None).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["error_type"], "MethodNotAllowed");
    assert_eq!(body["status"], 405);
}

#[tokio::test]
async fn store_failures_do_not_leak_details() {
    let app = app_with_store(Arc::new(UnreachableBookStore), ErrorVerbosity::Full);

    let (status, body) = send(&app, Method::GET, "/books", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({
            "error_type": "StoreUnavailable",
            "error": {},
            "status": 500,
            "message": "The store is currently unavailable",
        })
    );
}

#[tokio::test]
async fn validation_happens_before_the_store_is_called() {
    let app = app_with_store(Arc::new(UnreachableBookStore), ErrorVerbosity::Full);

    let (status, body) = send(&app, Method::POST, "/books", Some(json!({}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "Validation");
}

#[tokio::test]
async fn message_verbosity_returns_only_status_and_message() {
    let store = Arc::new(InMemoryBookStore::with_books([power_up()]));
    let app = app_with_store(store, ErrorVerbosity::Message);

    let (status, body) = send(&app, Method::POST, "/books", Some(to_json(&power_up()))).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body,
        json!({ "status": 409, "message": "The resource already exists" })
    );
}

#[tokio::test]
async fn type_verbosity_clears_error_reasons() {
    let store = Arc::new(InMemoryBookStore::default());
    let app = app_with_store(store, ErrorVerbosity::Type);

    let (status, body) = send(&app, Method::POST, "/books", Some(json!({ "isbn": "" }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "Validation");
    assert_eq!(body["error"]["violations"], Value::Null);
}

#[tokio::test]
async fn every_verbosity_keeps_status_and_message() {
    for verbosity in [ErrorVerbosity::Message, ErrorVerbosity::Type, ErrorVerbosity::Full] {
        let store = Arc::new(InMemoryBookStore::default());
        let app = app_with_store(store, verbosity);

        let (status, body) = send(&app, Method::GET, "/books/999999999", None).await;

        assert_eq!(status, StatusCode::NOT_FOUND, "{verbosity:?}");
        assert_eq!(body["status"], 404, "{verbosity:?}");
        assert_eq!(
            body["message"], "The requested resource was not found",
            "{verbosity:?}"
        );
    }
}
