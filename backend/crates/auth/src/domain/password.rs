//! Password verification seam

use platform::password::ClearTextPassword;

/// Checks a clear-text password against a stored hash
pub trait PasswordVerifier: Send + Sync {
    fn verify_password(&self, password_hash: &str, password: &ClearTextPassword) -> bool;
}
