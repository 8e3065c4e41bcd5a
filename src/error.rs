use axum::{
    extract::rejection::PathRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use derive_more::From;
use serde::{Deserialize, Serialize};

use crate::store::StoreError;

/// How much detail error responses carry.
///
/// Every level keeps the status code of the error and a `{status, message}` body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ErrorVerbosity {
    /// Server returns only the status and the message with the appropriate status code.
    Message,
    /// Server returns the message, the error type with cleared error content and the appropriate status code.
    Type,
    /// Server returns the message, the error type with the error content and the appropriate status code.
    Full,
}

impl ErrorVerbosity {
    pub fn should_generate_error_reason(&self) -> bool {
        matches!(self, ErrorVerbosity::Full)
    }
}

#[derive(Debug, Serialize)]
struct ApiErrorResponse {
    #[serde(flatten)]
    error: ApiError,
    status: u16,
    message: &'static str,
}

#[derive(Debug, Serialize)]
struct ApiErrorMessage {
    status: u16,
    message: &'static str,
}

impl From<ApiErrorResponse> for ApiErrorMessage {
    fn from(response: ApiErrorResponse) -> Self {
        ApiErrorMessage {
            status: response.status,
            message: response.message,
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        let status_code = self.error.status_code();

        match self.error.verbosity() {
            ErrorVerbosity::Message => {
                (status_code, Json(ApiErrorMessage::from(self))).into_response()
            }
            ErrorVerbosity::Type | ErrorVerbosity::Full => {
                (status_code, Json(self)).into_response()
            }
        }
    }
}

#[derive(Debug, From, Serialize)]
#[serde(tag = "error_type", content = "error")]
/// API error
///
/// Every failure a handler, extractor or middleware can produce.
/// [`ApiError::status_code`] is the only place where an error is mapped to a status code.
pub enum ApiError {
    /// Internal server error
    ///
    /// This error is returned when an unexpected internal error occurs.
    InternalServerError(InternalServerError),
    /// Body error
    ///
    /// This error is returned when the body is not a JSON object.
    Body(BodyError),
    /// Path error
    ///
    /// This error is returned when the path parameters are not as expected.
    Path(PathError),
    /// Validation error
    ///
    /// This error is returned when one or more fields violate their constraints.
    Validation(ValidationError),
    /// Method not allowed
    ///
    /// This error is returned when the method is not allowed.
    MethodNotAllowed(MethodNotAllowedError),
    /// Not found error
    ///
    /// This error is returned when the requested route or book does not exist.
    NotFound(NotFoundError),
    /// Conflict error
    ///
    /// This error is returned when a book with the same isbn already exists.
    Conflict(ConflictError),
    /// Store unavailable
    ///
    /// This error is returned when the store failed to complete the operation.
    StoreUnavailable(StoreUnavailableError),
}

impl ApiError {
    /// Translates a [`StoreError`] into the client visible error.
    pub fn from_store_error(verbosity: ErrorVerbosity, err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => {
                NotFoundError::with_reason(verbosity, err.to_string()).into()
            }
            StoreError::Conflict { .. } => ConflictError::new(verbosity, err.to_string()).into(),
            StoreError::Unavailable(_) => StoreUnavailableError::new(verbosity, err).into(),
        }
    }

    fn verbosity(&self) -> ErrorVerbosity {
        match self {
            ApiError::InternalServerError(err) => err.verbosity,
            ApiError::Body(err) => err.verbosity,
            ApiError::Path(err) => err.verbosity,
            ApiError::Validation(err) => err.verbosity,
            ApiError::MethodNotAllowed(err) => err.verbosity,
            ApiError::NotFound(err) => err.verbosity,
            ApiError::Conflict(err) => err.verbosity,
            ApiError::StoreUnavailable(err) => err.verbosity,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            ApiError::InternalServerError(_) => "An internal server error has occurred",
            ApiError::Body(_) => "Failed to parse request body",
            ApiError::Path(_) => "Failed to parse path parameters",
            ApiError::Validation(_) => "Request body failed validation",
            ApiError::MethodNotAllowed(_) => "Method not allowed",
            ApiError::NotFound(_) => "The requested resource was not found",
            ApiError::Conflict(_) => "The resource already exists",
            ApiError::StoreUnavailable(_) => "The store is currently unavailable",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Body(_) => StatusCode::BAD_REQUEST,
            ApiError::Path(_) => StatusCode::BAD_REQUEST,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::StoreUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ApiError> for ApiErrorResponse {
    fn from(error: ApiError) -> Self {
        let message = error.message();
        let status = error.status_code().as_u16();

        ApiErrorResponse {
            error,
            status,
            message,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        ApiErrorResponse::from(self).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct InternalServerError {
    #[serde(skip)]
    verbosity: ErrorVerbosity,
    internal_server_error: Option<String>,
}

impl InternalServerError {
    pub fn from_generic_error<E: Into<anyhow::Error>>(verbosity: ErrorVerbosity, err: E) -> Self {
        let err: anyhow::Error = err.into();
        let err = format!("{err:#}");
        tracing::error!(%err, "Internal server error");

        let internal_server_error = verbosity.should_generate_error_reason().then_some(err);

        InternalServerError {
            verbosity,
            internal_server_error,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BodyError {
    #[serde(skip)]
    verbosity: ErrorVerbosity,
    body_error_reason: Option<String>,
    body_expected_schema: Option<String>,
}

impl BodyError {
    pub fn new(
        verbosity: ErrorVerbosity,
        body_error_reason: String,
        body_expected_schema: String,
    ) -> Self {
        let (body_error_reason, body_expected_schema) =
            match verbosity.should_generate_error_reason() {
                true => (Some(body_error_reason), Some(body_expected_schema)),
                false => (None, None),
            };

        BodyError {
            verbosity,
            body_error_reason,
            body_expected_schema,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PathError {
    #[serde(skip)]
    verbosity: ErrorVerbosity,
    path_error_reason: Option<String>,
}

impl PathError {
    pub fn new(verbosity: ErrorVerbosity, path_error_reason: String) -> Self {
        let path_error_reason = verbosity
            .should_generate_error_reason()
            .then_some(path_error_reason);

        PathError {
            verbosity,
            path_error_reason,
        }
    }

    pub fn from_path_rejection(verbosity: ErrorVerbosity, rejection: PathRejection) -> ApiError {
        match rejection {
            PathRejection::FailedToDeserializePathParams(err) => {
                PathError::new(verbosity, err.body_text()).into()
            }
            PathRejection::MissingPathParams(err) => {
                InternalServerError::from_generic_error(verbosity, anyhow::anyhow!(err.body_text()))
                    .into()
            }
            _ => PathError::new(verbosity, rejection.body_text()).into(),
        }
    }
}

/// A single violated constraint on a request body field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub code: String,
    pub message: Option<String>,
}

impl FieldViolation {
    pub fn new(field: &str, code: &str, message: String) -> Self {
        FieldViolation {
            field: field.to_string(),
            code: code.to_string(),
            message: Some(message),
        }
    }

    /// Flattens every field error of `errors`.
    pub fn from_validation_errors(errors: &validator::ValidationErrors) -> Vec<Self> {
        errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                let field = field.to_string();

                errors.iter().map(move |error| FieldViolation {
                    field: field.clone(),
                    code: error.code.to_string(),
                    message: error.message.as_ref().map(|message| message.to_string()),
                })
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
pub struct ValidationError {
    #[serde(skip)]
    verbosity: ErrorVerbosity,
    violations: Option<Vec<FieldViolation>>,
}

impl ValidationError {
    /// Violations are reported sorted by field name.
    pub fn new(verbosity: ErrorVerbosity, mut violations: Vec<FieldViolation>) -> Self {
        let violations = verbosity.should_generate_error_reason().then(|| {
            violations.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.code.cmp(&b.code)));

            violations
        });

        ValidationError {
            verbosity,
            violations,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MethodNotAllowedError {
    #[serde(skip)]
    verbosity: ErrorVerbosity,
}

impl MethodNotAllowedError {
    pub fn new(verbosity: ErrorVerbosity) -> Self {
        MethodNotAllowedError { verbosity }
    }
}

#[derive(Debug, Serialize)]
pub struct NotFoundError {
    #[serde(skip)]
    verbosity: ErrorVerbosity,
    #[serde(skip_serializing_if = "Option::is_none")]
    not_found_reason: Option<String>,
}

impl NotFoundError {
    pub fn new(verbosity: ErrorVerbosity) -> Self {
        NotFoundError {
            verbosity,
            not_found_reason: None,
        }
    }

    pub fn with_reason(verbosity: ErrorVerbosity, not_found_reason: String) -> Self {
        let not_found_reason = verbosity
            .should_generate_error_reason()
            .then_some(not_found_reason);

        NotFoundError {
            verbosity,
            not_found_reason,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConflictError {
    #[serde(skip)]
    verbosity: ErrorVerbosity,
    conflict_reason: Option<String>,
}

impl ConflictError {
    pub fn new(verbosity: ErrorVerbosity, conflict_reason: String) -> Self {
        let conflict_reason = verbosity
            .should_generate_error_reason()
            .then_some(conflict_reason);

        ConflictError {
            verbosity,
            conflict_reason,
        }
    }
}

/// Store failures never expose their cause to the client.
#[derive(Debug, Serialize)]
pub struct StoreUnavailableError {
    #[serde(skip)]
    verbosity: ErrorVerbosity,
}

impl StoreUnavailableError {
    pub fn new(verbosity: ErrorVerbosity, err: StoreError) -> Self {
        let err = format!("{:#}", anyhow::Error::new(err));
        tracing::error!(%err, "Store unavailable");

        StoreUnavailableError { verbosity }
    }
}
