//! Application Layer
//!
//! Token codec, session registry and the auth service built on them.

pub mod auth_service;
pub mod config;
pub mod session_registry;
pub mod token;
pub mod transaction;

// Re-exports
pub use auth_service::{AuthService, IssuedTokens, LoginInput, Status};
pub use config::AuthConfig;
pub use session_registry::SessionRegistry;
pub use token::{EncodeOverrides, TokenCodec, TokenPayload, TokenType};
