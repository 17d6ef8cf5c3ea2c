//! Argon2id password verification

use platform::password::{Argon2Hasher, ClearTextPassword};

use crate::domain::password::PasswordVerifier;

impl PasswordVerifier for Argon2Hasher {
    fn verify_password(&self, password_hash: &str, password: &ClearTextPassword) -> bool {
        self.verify(password_hash, password)
    }
}
