//!
//! # Custom Error Handling
//!
//! This module defines `AppError`, the error type every handler and service in the
//! application returns. Lower layers (record store, blob store, configuration) have
//! their own narrower error enums; `From` implementations fold them into `AppError`
//! so the `?` operator works across layer boundaries.
//!
//! `AppError` implements `actix_web::error::ResponseError`. Client-caused errors are
//! reported with their message; server-side failures are logged and answered with a
//! generic body so no internal detail reaches the client.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use validator::ValidationErrors;

use crate::blob::BlobError;
use crate::store::StoreError;

const GENERIC_INTERNAL_MESSAGE: &str = "Internal server error";

/// JSON body of every error response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    #[schema(example = "Car not found")]
    pub error: String,
}

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// A required field is missing or empty (HTTP 400).
    ValidationError(String),
    /// The request could not be decoded (HTTP 400).
    BadRequest(String),
    /// The username is already taken (HTTP 400).
    Conflict(String),
    /// Unknown username or wrong password (HTTP 400).
    /// Carries no detail so both cases are indistinguishable to the caller.
    InvalidCredentials,
    /// Missing, malformed, expired or badly signed bearer token (HTTP 401).
    Unauthorized(String),
    /// The car does not exist or belongs to someone else (HTTP 404).
    NotFound(String),
    /// A blob could not be written to or removed from the blob store (HTTP 500).
    StorageError(String),
    /// Errors from the record store (HTTP 500).
    DatabaseError(String),
    /// Any other unexpected server-side failure (HTTP 500).
    InternalServerError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::InvalidCredentials => write!(f, "Invalid credentials"),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::StorageError(msg) => write!(f, "Storage Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::BadRequest(_)
            | AppError::Conflict(_)
            | AppError::InvalidCredentials => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::StorageError(_)
            | AppError::DatabaseError(_)
            | AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::ValidationError(msg)
            | AppError::BadRequest(msg)
            | AppError::Conflict(msg)
            | AppError::Unauthorized(msg)
            | AppError::NotFound(msg) => msg.clone(),
            AppError::InvalidCredentials => "Invalid credentials".to_string(),
            AppError::StorageError(_)
            | AppError::DatabaseError(_)
            | AppError::InternalServerError(_) => {
                log::error!("{}", self);
                GENERIC_INTERNAL_MESSAGE.to_string()
            }
        };
        HttpResponse::build(self.status_code()).json(ErrorBody { error: message })
    }
}

/// `Duplicate` only arises from inserting a user, so it maps to `Conflict`.
impl From<StoreError> for AppError {
    fn from(error: StoreError) -> AppError {
        match error {
            StoreError::Duplicate(what) => AppError::Conflict(format!("{} already exists", what)),
            StoreError::Database(msg) => AppError::DatabaseError(msg),
        }
    }
}

impl From<BlobError> for AppError {
    fn from(error: BlobError) -> AppError {
        AppError::StorageError(error.to_string())
    }
}

impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}
