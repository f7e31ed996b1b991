//!
//! # Application Errors
//!
//! This module defines `AppError`, the single error type that flows out of the
//! services, the repositories and the HTTP handlers.
//!
//! Every variant maps to exactly one HTTP status. There is no catch-all
//! conversion from arbitrary errors: storage problems become `StorageFailure`,
//! anything else that cannot be classified must be raised explicitly as
//! `InternalServerError`.
//!
//! `From` implementations for `sqlx::Error`, `validator::ValidationErrors` and
//! `jsonwebtoken::errors::Error` let callers use `?`.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// Malformed request (HTTP 400).
    BadRequest(String),
    /// Missing or invalid credentials (HTTP 401).
    Unauthorized(String),
    /// Authenticated, but the caller's role does not allow the operation (HTTP 403).
    Forbidden(String),
    /// The requested resource does not exist (HTTP 404).
    NotFound(String),
    /// A resource with the same natural key already exists (HTTP 409).
    AlreadyExists(String),
    /// Input validation failed (HTTP 422).
    /// Wraps errors from the `validator` crate.
    ValidationError(String),
    /// The persistent store failed (HTTP 500). Never retried.
    StorageFailure(String),
    /// Unclassified fatal error (HTTP 500).
    InternalServerError(String),
}

impl AppError {
    /// Stable machine-readable code included in every error body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::AlreadyExists(_) => "ALREADY_EXISTS",
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::StorageFailure(_) => "STORAGE_FAILURE",
            AppError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    fn message(&self) -> &str {
        match self {
            AppError::BadRequest(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::AlreadyExists(msg)
            | AppError::ValidationError(msg)
            | AppError::StorageFailure(msg)
            | AppError::InternalServerError(msg) => msg,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::AlreadyExists(msg) => write!(f, "Already Exists: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
            AppError::StorageFailure(msg) => write!(f, "Storage Failure: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Converts `AppError` variants into `HttpResponse` objects.
///
/// The body is always `{"code": ..., "description": ...}`. Storage failures are
/// reported without the driver's message so connection details do not leak.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AlreadyExists(_) => StatusCode::CONFLICT,
            AppError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::StorageFailure(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let description = match self {
            AppError::StorageFailure(_) => "Storage failure",
            other => other.message(),
        };
        HttpResponse::build(self.status_code()).json(json!({
            "code": self.code(),
            "description": description
        }))
    }
}

/// Converts `sqlx::Error` into `AppError::StorageFailure`.
///
/// Lookups that may legitimately find nothing use `fetch_optional`, so a
/// `RowNotFound` reaching this point is a storage-level inconsistency too.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        log::error!("storage failure: {}", error);
        AppError::StorageFailure(error.to_string())
    }
}

impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

/// Converts `jsonwebtoken::errors::Error` into `AppError::Unauthorized`.
impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(error: jsonwebtoken::errors::Error) -> AppError {
        AppError::Unauthorized(format!("Invalid token: {}", error))
    }
}
