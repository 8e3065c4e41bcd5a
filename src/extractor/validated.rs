use axum::{
    async_trait,
    extract::{FromRequest, Request},
};

use crate::{
    error::{ApiError, ValidationError},
    traits::{StateProvider, Violations},
};

use super::Extractor;

/// An extractor that validates the data extracted by another extractor.
///
/// Rejects with [`ApiError::Validation`] listing every violated constraint.
pub struct Validated<X>(pub X);

#[async_trait]
impl<X, S> FromRequest<S> for Validated<X>
where
    X: FromRequest<S, Rejection = ApiError> + Extractor + Send,
    <X as Extractor>::Extracted: Violations,
    S: Send + Sync + StateProvider,
{
    type Rejection = ApiError;

    #[tracing::instrument(name = "validated_extractor", skip_all)]
    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let inner = X::from_request(req, state).await?;
        let violations = inner.extracted().violations();

        if violations.is_empty() {
            tracing::trace!("Validated");

            return Ok(Validated(inner));
        }

        tracing::warn!(?violations, "Validation errors");

        Err(ValidationError::new(state.error_verbosity(), violations).into())
    }
}
