use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    book::{Book, NewBook},
    error::{ApiError, InternalServerError},
    extractor::{json::ApiJson, validated::Validated},
    state::ApiState,
    traits::StateProvider,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateBookResponse {
    pub book: Book,
}

impl IntoResponse for CreateBookResponse {
    fn into_response(self) -> Response {
        (StatusCode::CREATED, Json(self)).into_response()
    }
}

#[tracing::instrument(skip_all)]
pub async fn create_book(
    State(state): State<ApiState>,
    Validated(ApiJson(new_book)): Validated<ApiJson<NewBook>>,
) -> Result<CreateBookResponse, ApiError> {
    let verbosity = state.error_verbosity();

    let book = new_book.into_book().ok_or_else(|| {
        InternalServerError::from_generic_error(
            verbosity,
            anyhow::anyhow!("Validated book is missing a field"),
        )
    })?;

    let book = state
        .book_store()
        .insert(&book)
        .await
        .map_err(|err| ApiError::from_store_error(verbosity, err))?;

    tracing::info!(isbn = %book.isbn, "Book created");

    Ok(CreateBookResponse { book })
}
