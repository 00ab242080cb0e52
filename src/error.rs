//! Error types for Loan Desk

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

use crate::models::LoanStatus;

/// Message shown when the backend gives no usable message
pub const GENERIC_MESSAGE: &str = "Something went wrong";

/// Symbolic error codes returned by the backend
///
/// Codes outside the known set are passed through verbatim as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Unauthorized,
    Forbidden,
    NotFound,
    ValidationError,
    UnknownError,
    Other(String),
}

impl ErrorCode {
    pub fn as_str(&self) -> &str {
        match self {
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::UnknownError => "UNKNOWN_ERROR",
            ErrorCode::Other(code) => code,
        }
    }
}

impl From<&str> for ErrorCode {
    fn from(code: &str) -> Self {
        match code {
            "UNAUTHORIZED" => ErrorCode::Unauthorized,
            "FORBIDDEN" => ErrorCode::Forbidden,
            "NOT_FOUND" => ErrorCode::NotFound,
            "VALIDATION_ERROR" => ErrorCode::ValidationError,
            "UNKNOWN_ERROR" => ErrorCode::UnknownError,
            other => ErrorCode::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ErrorCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(ErrorCode::from(raw.as_str()))
    }
}

/// Normalized failure of any backend call
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[error("{code} ({http_status}): {message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    pub http_status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Error body as sent by the backend; every field may be missing
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
    http_status: Option<u16>,
    details: Option<Value>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>, http_status: u16) -> Self {
        Self {
            code,
            message: message.into(),
            http_status,
            details: None,
        }
    }

    /// Normalize a non-success response from its status and raw body
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let body: ErrorBody = serde_json::from_slice(body).unwrap_or_default();

        Self {
            code: body
                .code
                .as_deref()
                .map(ErrorCode::from)
                .unwrap_or(ErrorCode::UnknownError),
            message: body.message.unwrap_or_else(|| GENERIC_MESSAGE.to_string()),
            http_status: body.http_status.unwrap_or(status),
            details: body.details,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.code == ErrorCode::NotFound
    }

    /// True for failures that mean the current session is not accepted
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.code, ErrorCode::Unauthorized | ErrorCode::Forbidden)
            || self.http_status == 401
    }

    /// Text shown to the user for this failure
    pub fn user_message(&self) -> String {
        match self.code {
            ErrorCode::Unauthorized => "You must sign in to continue".to_string(),
            ErrorCode::Forbidden => "You do not have permission to perform this action".to_string(),
            ErrorCode::NotFound => "The requested resource was not found".to_string(),
            _ => self.message.clone(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        tracing::debug!("Transport failure: {}", err);
        Self::new(
            ErrorCode::UnknownError,
            GENERIC_MESSAGE,
            err.status().map(|s| s.as_u16()).unwrap_or(500),
        )
    }
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Api(#[from] ApiError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Not permitted: {0}")]
    Forbidden(String),

    #[error("Loan slip {id} is {status} and can no longer be edited")]
    NotEditable { id: i64, status: LoanStatus },

    #[error("Loan slip {id} is {status} and cannot be deleted")]
    NotDeletable { id: i64, status: LoanStatus },

    #[error("Loan slip {0} is not in the current list")]
    NotLoaded(i64),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Token storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl AppError {
    /// The normalized backend error, when this failure came from the backend
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            AppError::Api(err) => Some(err),
            _ => None,
        }
    }

    /// Text shown to the user for this failure
    pub fn user_message(&self) -> String {
        match self {
            AppError::Api(err) => err.user_message(),
            AppError::Validation(_) => "Please correct the highlighted fields".to_string(),
            AppError::Forbidden(_) => {
                "You do not have permission to perform this action".to_string()
            }
            AppError::NotEditable { .. } => "This loan slip can no longer be edited".to_string(),
            AppError::NotDeletable { .. } => "Only loan slips still on loan can be deleted".to_string(),
            AppError::NotLoaded(_) => "The loan slip is no longer in the list, refresh and try again".to_string(),
            AppError::Session(_) | AppError::Storage(_) => "Your session could not be restored".to_string(),
            AppError::Config(_) => GENERIC_MESSAGE.to_string(),
        }
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
