//! Repository Traits
//!
//! One unit of work wraps one database transaction. Implementation is in
//! the infrastructure layer.

use std::future::Future;

use crate::domain::entity::user::User;
use crate::domain::value_object::UserId;
use crate::error::AuthResult;

/// Unit of work over the user store
///
/// Dropping an unfinished unit rolls it back.
#[trait_variant::make(UnitOfWork: Send)]
pub trait LocalUnitOfWork: Sized {
    /// Open the transaction; a second call is a no-op
    async fn create_transaction(&mut self) -> AuthResult<()>;

    /// Case-insensitive login lookup
    async fn find_user_by_login(&mut self, login: &str) -> AuthResult<Option<User>>;

    async fn find_user_by_id(&mut self, user_id: &UserId) -> AuthResult<Option<User>>;

    async fn commit(self) -> AuthResult<()>;

    async fn rollback(self) -> AuthResult<()>;
}

/// Hands out units of work with their transaction already open
pub trait TransactionManager: Send + Sync {
    type Unit: UnitOfWork + Send;

    fn begin(&self) -> impl Future<Output = AuthResult<Self::Unit>> + Send;
}
