//! Unified error handling for the backend API.
//!
//! This module provides a centralized error type that implements `IntoResponse`,
//! allowing handlers to use `?` operator naturally while returning appropriate
//! HTTP status codes and error messages.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use diesel_async::pooled_connection::deadpool::PoolError;
use serde::Serialize;
use thiserror::Error;

use crate::auth::TokenError;

/// API error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Unified error type for API handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// Database connection pool error
    #[error("Database connection error")]
    ConnectionPool(#[source] PoolError),

    /// Database query error
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    /// Provider, store or signing failure
    #[error("{0}")]
    Internal(anyhow::Error),

    /// Resource not found
    #[error("{0} not found")]
    NotFound(String),

    /// Malformed or forged OAuth callback, failed code exchange
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Missing, invalid or expired bearer/refresh token
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Token failed validation; the kind is reported in `details`
    #[error("Unauthorized: {message}")]
    InvalidToken {
        message: String,
        #[source]
        source: TokenError,
    },
}

impl ApiError {
    /// Create a not found error with a custom message
    pub fn not_found(resource: impl Into<String>) -> Self {
        ApiError::NotFound(resource.into())
    }

    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn invalid_token(message: impl Into<String>, source: TokenError) -> Self {
        ApiError::InvalidToken {
            message: message.into(),
            source,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::ConnectionPool(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Database(diesel::result::Error::NotFound) => StatusCode::NOT_FOUND,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) | ApiError::InvalidToken { .. } => StatusCode::UNAUTHORIZED,
        }
    }
}

impl From<PoolError> for ApiError {
    fn from(err: PoolError) -> Self {
        ApiError::ConnectionPool(err)
    }
}

/// Store errors travel as `anyhow::Error`; recover the database cause so an unreachable
/// pool surfaces as 503 rather than a generic 500.
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        let err = match err.downcast::<PoolError>() {
            Ok(pool) => return ApiError::ConnectionPool(pool),
            Err(err) => err,
        };
        match err.downcast::<diesel::result::Error>() {
            Ok(db) => ApiError::Database(db),
            Err(err) => ApiError::Internal(err),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Signing(_) => {
                ApiError::Internal(anyhow::Error::new(err).context("failed to generate token"))
            }
            other => ApiError::invalid_token("invalid or expired token", other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error_message, details) = match &self {
            ApiError::ConnectionPool(e) => {
                tracing::error!("Connection pool error: {:?}", e);
                ("Database temporarily unavailable".to_string(), None)
            }
            ApiError::Database(diesel::result::Error::NotFound) => {
                ("Resource not found".to_string(), None)
            }
            ApiError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                ("Database operation failed".to_string(), None)
            }
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                ("Internal server error".to_string(), None)
            }
            ApiError::NotFound(resource) => (format!("{} not found", resource), None),
            ApiError::BadRequest(msg) => {
                tracing::warn!("Bad request: {}", msg);
                (msg.clone(), None)
            }
            ApiError::Unauthorized(msg) => (msg.clone(), None),
            ApiError::InvalidToken { message, source } => {
                tracing::warn!("Token rejected: {}", source);
                (message.clone(), Some(source.kind().to_string()))
            }
        };

        let body = Json(ErrorResponse {
            error: error_message,
            details,
        });

        (status, body).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
