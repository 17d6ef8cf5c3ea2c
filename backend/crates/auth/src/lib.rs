//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, collaborator traits
//! - `application/` - Token codec, session registry, auth service
//! - `infra/` - Postgres, Redis and in-memory implementations
//! - `presentation/` - HTTP handlers, DTOs, router, middleware
//!
//! ## Features
//! - Login with login + password, issuing an access/refresh JWT pair
//! - Single-use refresh token rotation bound to a client fingerprint
//! - Logout of a single session
//! - Bearer access-token middleware for downstream routers
//!
//! ## Security Model
//! - Unknown login and wrong password are indistinguishable
//! - At most `max_sessions` refresh tokens per user; reaching the cap
//!   revokes every session
//! - Replaying a consumed refresh token, or presenting it with another
//!   fingerprint, revokes every session of that user
//! - The cache is the only record of live sessions

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod testutil;
#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use application::token::{TokenCodec, TokenType, parse_algorithm};
pub use application::AuthService;
pub use error::{AuthError, AuthResult};
pub use infra::{MemoryCache, MemoryUserStore, PgTransactionManager, RedisCache};
pub use jsonwebtoken::Algorithm;
pub use presentation::router::{api_router, auth_router};
pub use presentation::AuthAppState;

// Re-export kernel error types for unified error handling
pub use kernel::error::{app_error::AppError, kind::ErrorKind};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}
