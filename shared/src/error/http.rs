//! HTTP status code mapping for error codes
//!
//! The public contract only distinguishes 400 / 401 / 404 / 500. Duplicate
//! rows ("existed") surface as 400 like every other rejected input.

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Success
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::OrderNotFound
            | Self::OrderItemNotFound
            | Self::ProductNotFound => StatusCode::NOT_FOUND,

            // 401 Unauthorized (includes acting on another user's resource)
            Self::NotAuthenticated
            | Self::TokenExpired
            | Self::TokenInvalid
            | Self::NotOwner => StatusCode::UNAUTHORIZED,

            // 500 Internal Server Error
            Self::Unknown
            | Self::InternalError
            | Self::DatabaseError
            | Self::ConfigError
            | Self::TransactionConflict => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request (validation, business rules, duplicates)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}
