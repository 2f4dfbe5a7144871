//! Authentication
//!
//! - [`JwtService`]: HS256 token verification (and issuing, for tests)
//! - [`CurrentUser`]: extractor for the authenticated caller

pub mod extractor;
pub mod jwt;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
