//! Utility module
//!
//! - [`logger`]: tracing subscriber setup
//! - [`validation`]: payload rules and id parsing
//! - [`AppJson`]: JSON body extractor with API-shaped rejections

pub mod extract;
pub mod logger;
pub mod validation;

pub use extract::AppJson;
pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCode};
