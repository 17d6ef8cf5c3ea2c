//! PostgreSQL Unit of Work
//!
//! One `PgUnitOfWork` owns at most one open transaction. sqlx rolls an
//! unfinished transaction back when it is dropped and returns the
//! connection to the pool.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::entity::user::User;
use crate::domain::repository::{TransactionManager, UnitOfWork};
use crate::domain::value_object::UserId;
use crate::error::{AuthError, AuthResult};

/// Opens units of work on a Postgres pool
#[derive(Clone)]
pub struct PgTransactionManager {
    pool: PgPool,
}

impl PgTransactionManager {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl TransactionManager for PgTransactionManager {
    type Unit = PgUnitOfWork;

    async fn begin(&self) -> AuthResult<PgUnitOfWork> {
        let mut unit = PgUnitOfWork::new(self.pool.clone());
        unit.create_transaction().await?;
        Ok(unit)
    }
}

pub struct PgUnitOfWork {
    pool: PgPool,
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgUnitOfWork {
    pub fn new(pool: PgPool) -> Self {
        Self { pool, tx: None }
    }

    fn tx(&mut self) -> AuthResult<&mut Transaction<'static, Postgres>> {
        self.tx
            .as_mut()
            .ok_or_else(|| AuthError::Internal("Transaction not started".to_string()))
    }
}

impl UnitOfWork for PgUnitOfWork {
    async fn create_transaction(&mut self) -> AuthResult<()> {
        if self.tx.is_none() {
            self.tx = Some(self.pool.begin().await?);
        }
        Ok(())
    }

    async fn find_user_by_login(&mut self, login: &str) -> AuthResult<Option<User>> {
        let tx = self.tx()?;

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                id,
                login,
                password,
                created_at,
                updated_at
            FROM users
            WHERE lower(login) = lower($1)
            "#,
        )
        .bind(login)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(row.map(UserRow::into_user))
    }

    async fn find_user_by_id(&mut self, user_id: &UserId) -> AuthResult<Option<User>> {
        let tx = self.tx()?;

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                id,
                login,
                password,
                created_at,
                updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&mut **tx)
        .await?;

        Ok(row.map(UserRow::into_user))
    }

    async fn commit(self) -> AuthResult<()> {
        if let Some(tx) = self.tx {
            tx.commit().await?;
        }
        Ok(())
    }

    async fn rollback(self) -> AuthResult<()> {
        if let Some(tx) = self.tx {
            tx.rollback().await?;
        }
        Ok(())
    }
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    login: String,
    password: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> User {
        User {
            user_id: UserId::from_uuid(self.id),
            login: self.login,
            password_hash: self.password,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
