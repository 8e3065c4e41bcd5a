use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, extractor::path::ApiPath, state::ApiState, traits::StateProvider};

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteBookResponse {
    pub message: String,
}

impl IntoResponse for DeleteBookResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[tracing::instrument(skip_all)]
pub async fn delete_book(
    State(state): State<ApiState>,
    ApiPath(isbn): ApiPath<String>,
) -> Result<DeleteBookResponse, ApiError> {
    state
        .book_store()
        .delete(&isbn)
        .await
        .map_err(|err| ApiError::from_store_error(state.error_verbosity(), err))?;

    tracing::info!(%isbn, "Book deleted");

    Ok(DeleteBookResponse {
        message: "Book deleted".to_string(),
    })
}
