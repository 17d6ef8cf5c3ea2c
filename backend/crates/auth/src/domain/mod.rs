//! Domain Layer
//!
//! Entities, value objects, and the collaborator traits the application
//! layer is written against.

pub mod cache;
pub mod entity;
pub mod password;
pub mod repository;
pub mod value_object;

// Re-exports
pub use cache::Cache;
pub use entity::user::User;
pub use password::PasswordVerifier;
pub use repository::{TransactionManager, UnitOfWork};
