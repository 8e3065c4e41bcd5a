use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    book::Book, error::ApiError, extractor::path::ApiPath, state::ApiState,
    traits::StateProvider,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct GetBookResponse {
    pub book: Book,
}

impl IntoResponse for GetBookResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[tracing::instrument(skip_all)]
pub async fn get_book(
    State(state): State<ApiState>,
    ApiPath(isbn): ApiPath<String>,
) -> Result<GetBookResponse, ApiError> {
    let book = state
        .book_store()
        .get_by_isbn(&isbn)
        .await
        .map_err(|err| ApiError::from_store_error(state.error_verbosity(), err))?;

    Ok(GetBookResponse { book })
}
