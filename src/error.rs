use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A preference field that failed validation.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid: user_id field")]
    UserId,

    #[error("Invalid: source_language field")]
    EmptySource,

    #[error("Invalid: target_language field")]
    EmptyTarget,

    #[error("Invalid: target_language must not be \"auto\"")]
    AutoTarget,

    #[error("Invalid: source_language must be in a supported language code")]
    UnsupportedSource,

    #[error("Invalid: target_language must be in a supported language code")]
    UnsupportedTarget,

    #[error("Invalid: source_language and target_language are equal")]
    SameLanguage,
}

impl ValidationError {
    /// Name of the offending field as it appears on the wire.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::UserId => "user_id",
            ValidationError::EmptySource
            | ValidationError::UnsupportedSource
            | ValidationError::SameLanguage => "source_language",
            ValidationError::EmptyTarget
            | ValidationError::AutoTarget
            | ValidationError::UnsupportedTarget => "target_language",
        }
    }
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("No record found for user {0}")]
    NoRecordFound(String),

    #[error("Stored preference for user {user_id} is unreadable: {reason}")]
    Corrupt { user_id: String, reason: String },

    #[error("No post to translate: {0}")]
    PostNotFound(String),

    #[error("Caller identity is missing")]
    Unauthorized,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Language detection failed: {0}")]
    DetectionFailed(String),

    #[error("Translation failed: {0}")]
    TranslationFailed(String),

    #[error("Unable to save user info: {0}")]
    Persist(String),

    #[error("This relay is not configured: {0}")]
    Unconfigured(String),
}

impl RelayError {
    /// Machine-readable identifier sent to clients.
    pub fn id(&self) -> &'static str {
        match self {
            RelayError::Validation(_) => "invalid_user_info",
            RelayError::NoRecordFound(_) => "no_record_found",
            RelayError::Corrupt { .. } => "unable_to_unmarshal",
            RelayError::PostNotFound(_) => "no_post",
            RelayError::Unauthorized => "not_authorized",
            RelayError::InvalidParameter(_) => "invalid_parameter",
            RelayError::DetectionFailed(_) => "detection_failed",
            RelayError::TranslationFailed(_) => "translation_failed",
            RelayError::Persist(_) => "unable_to_save",
            RelayError::Unconfigured(_) => "not_configured",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::Unauthorized => StatusCode::UNAUTHORIZED,
            RelayError::Unconfigured(_) => StatusCode::NOT_IMPLEMENTED,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// JSON error body returned by every API endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiError {
    pub id: String,
    pub message: String,
    pub status_code: u16,
}

impl ApiError {
    pub fn new(id: &str, message: impl Into<String>, status: StatusCode) -> Self {
        Self {
            id: id.to_string(),
            message: message.into(),
            status_code: status.as_u16(),
        }
    }

    pub fn not_found() -> Self {
        Self::new("not_found", "Not Found", StatusCode::NOT_FOUND)
    }
}

impl From<&RelayError> for ApiError {
    fn from(err: &RelayError) -> Self {
        ApiError::new(err.id(), err.to_string(), err.status_code())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        ApiError::from(&self).into_response()
    }
}
