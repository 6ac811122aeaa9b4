pub mod auth;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod router;
pub mod types;

pub use auth::{AuthenticatedUser, JwtVerifier};
pub use error::ApiError;
pub use extract::{ApiJson, ApiPath};
pub use router::create_router;
pub use types::*;
