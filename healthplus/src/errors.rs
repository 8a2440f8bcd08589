use crate::db::errors::DbError;
use crate::otp::OtpError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error as ThisError;
use utoipa::ToSchema;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Missing or malformed request data
    #[error("{message}")]
    Validation { message: String },

    /// OTP lookup, expiry or code comparison failed
    #[error(transparent)]
    Otp(#[from] OtpError),

    /// Registration attempted without a verified OTP for the email
    #[error("Please verify your email first")]
    VerificationRequired,

    /// The verified OTP is older than the registration window
    #[error("Email verification expired. Please verify again.")]
    VerificationExpired,

    /// Uniqueness rule violated, e.g. an email already registered
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Unknown account or wrong password. The two cases are indistinguishable to the caller.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Authentication required but not provided
    #[error("Not authenticated")]
    Unauthenticated { message: Option<String> },

    /// Credentials present but invalid, expired, or of the wrong kind
    #[error("Forbidden")]
    Forbidden { message: Option<String> },

    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// JSON body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation { .. }
            | Error::Otp(_)
            | Error::VerificationRequired
            | Error::VerificationExpired
            | Error::Conflict { .. } => StatusCode::BAD_REQUEST,
            Error::InvalidCredentials | Error::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Error::Forbidden { .. } => StatusCode::FORBIDDEN,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Internal { .. } | Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } | DbError::ForeignKeyViolation { .. } | DbError::CheckViolation { .. } => {
                    StatusCode::BAD_REQUEST
                }
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Validation { message } => message.clone(),
            Error::Otp(otp_err) => otp_err.to_string(),
            Error::VerificationRequired | Error::VerificationExpired | Error::InvalidCredentials => self.to_string(),
            Error::Conflict { message } => message.clone(),
            Error::Unauthenticated { message } => message
                .clone()
                .unwrap_or_else(|| "Authentication required. Please login first.".to_string()),
            Error::Forbidden { message } => message
                .clone()
                .unwrap_or_else(|| "Invalid or expired token. Please login again.".to_string()),
            Error::NotFound { resource, .. } => format!("{resource} not found"),
            Error::Internal { .. } | Error::Other(_) => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { constraint, .. } => match constraint.as_deref() {
                    Some("patients_email_unique") => "Email already registered".to_string(),
                    Some("patients_phone_unique") => "Phone number already registered".to_string(),
                    Some("doctors_email_unique") => "Email already exists".to_string(),
                    _ => "Resource already exists".to_string(),
                },
                DbError::ForeignKeyViolation { .. } => "Invalid reference to related resource".to_string(),
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::Other(_) => "Database error occurred".to_string(),
            },
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Database(_) => {
                tracing::warn!("Database constraint error: {}", self);
            }
            Error::InvalidCredentials | Error::Unauthenticated { .. } | Error::Forbidden { .. } => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::Conflict { .. } => {
                tracing::warn!("Conflict error: {}", self);
            }
            Error::Validation { .. }
            | Error::Otp(_)
            | Error::VerificationRequired
            | Error::VerificationExpired
            | Error::NotFound { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let body = ErrorBody {
            error: self.user_message(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

impl Error {
    /// Report a unique constraint violation as a [`Error::Conflict`] carrying its user-facing message
    pub fn conflict_on_unique(self) -> Self {
        if matches!(self, Error::Database(DbError::UniqueViolation { .. })) {
            Error::Conflict {
                message: self.user_message(),
            }
        } else {
            self
        }
    }
}

/// Malformed JSON bodies are reported with the same shape as every other client error.
impl From<axum::extract::rejection::JsonRejection> for Error {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        Error::Validation {
            message: rejection.body_text(),
        }
    }
}

impl From<axum::extract::rejection::PathRejection> for Error {
    fn from(rejection: axum::extract::rejection::PathRejection) -> Self {
        Error::Validation {
            message: rejection.body_text(),
        }
    }
}

impl From<axum::extract::rejection::QueryRejection> for Error {
    fn from(rejection: axum::extract::rejection::QueryRejection) -> Self {
        Error::Validation {
            message: rejection.body_text(),
        }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
