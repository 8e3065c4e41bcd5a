use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    book::{Book, BookUpdate},
    error::{ApiError, ValidationError},
    extractor::{json::ApiJson, path::ApiPath},
    state::ApiState,
    traits::StateProvider,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateBookResponse {
    pub book: Book,
}

impl IntoResponse for UpdateBookResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Replaces the fields present in the body. Omitted fields keep their stored value.
#[tracing::instrument(skip_all)]
pub async fn update_book(
    State(state): State<ApiState>,
    ApiPath(isbn): ApiPath<String>,
    ApiJson(update): ApiJson<BookUpdate>,
) -> Result<UpdateBookResponse, ApiError> {
    let verbosity = state.error_verbosity();

    if let Err(violations) = update.validate_for(&isbn) {
        tracing::warn!(?violations, "Validation errors");

        return Err(ValidationError::new(verbosity, violations).into());
    }

    let book = state
        .book_store()
        .update(&isbn, &update)
        .await
        .map_err(|err| ApiError::from_store_error(verbosity, err))?;

    tracing::info!(%isbn, "Book updated");

    Ok(UpdateBookResponse { book })
}
