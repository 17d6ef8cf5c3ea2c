//! Transactional Execution
//!
//! Every auth operation runs as `begin -> work -> finish`.

use crate::domain::repository::UnitOfWork;
use crate::error::AuthResult;

/// Commit on success, roll back on failure, then hand the result back
///
/// A failed rollback is logged and the original error is kept.
pub async fn finish<U, T>(unit: U, result: AuthResult<T>) -> AuthResult<T>
where
    U: UnitOfWork,
{
    match result {
        Ok(value) => {
            unit.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = unit.rollback().await {
                tracing::warn!(error = %rollback_err, "Rollback failed");
            }
            Err(err)
        }
    }
}
