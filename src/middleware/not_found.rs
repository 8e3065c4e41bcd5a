use axum::extract::State;

use crate::{
    error::{ApiError, NotFoundError},
    state::ApiState,
    traits::StateProvider,
};

/// Fallback for requests that match no route.
pub async fn not_found(State(state): State<ApiState>) -> ApiError {
    tracing::warn!("No route matched");

    NotFoundError::new(state.error_verbosity()).into()
}
