//! User Entity
//!
//! Read-only projection of a user row as seen by authentication.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::domain::value_object::UserId;

/// User entity
#[derive(Clone)]
pub struct User {
    /// Internal UUID identifier
    pub user_id: UserId,
    /// Login name (unique, compared case-insensitively)
    pub login: String,
    /// Stored password hash (PHC string)
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user
    pub fn new(login: impl Into<String>, password_hash: impl Into<String>) -> Self {
        let now = Utc::now();

        Self {
            user_id: UserId::new(),
            login: login.into(),
            password_hash: password_hash.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Case-insensitive login comparison
    pub fn has_login(&self, login: &str) -> bool {
        self.login.to_lowercase() == login.to_lowercase()
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("user_id", &self.user_id)
            .field("login", &self.login)
            .field("password_hash", &"[HASH]")
            .finish()
    }
}
