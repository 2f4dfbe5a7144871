//! Shared types for the shop backend
//!
//! Domain models, request payloads, paging and the unified error system
//! used by the server and by any client talking to it.

pub mod error;
pub mod models;
pub mod paging;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
pub use paging::{Page, Paging, PagingInfo};
