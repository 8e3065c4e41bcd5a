use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{book::Book, error::ApiError, state::ApiState, traits::StateProvider};

#[derive(Debug, Serialize, Deserialize)]
pub struct ListBooksResponse {
    pub books: Vec<Book>,
}

impl IntoResponse for ListBooksResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[tracing::instrument(skip_all)]
pub async fn list_books(State(state): State<ApiState>) -> Result<ListBooksResponse, ApiError> {
    let books = state
        .book_store()
        .list_all()
        .await
        .map_err(|err| ApiError::from_store_error(state.error_verbosity(), err))?;

    tracing::debug!(count = books.len(), "Listed books");

    Ok(ListBooksResponse { books })
}
