//! Password Hashing and Verification
//!
//! Argon2id hashing with:
//! - NFKC normalization of clear-text input
//! - Zeroization of clear-text memory on drop
//! - Optional application-wide pepper

use std::fmt;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use rand::rngs::OsRng;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Password hashing errors
#[derive(Debug, Error)]
pub enum PasswordHashError {
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),
}

/// Clear text password with automatic memory zeroization
///
/// - Implements `Zeroize` and `ZeroizeOnDrop`
/// - Does not implement `Clone` to prevent accidental copies
/// - Debug output is redacted
///
/// No length or strength policy is applied here. Sign-in must answer every
/// wrong password the same way, so rejecting input early would leak.
///
/// ```rust
/// use platform::password::ClearTextPassword;
///
/// let password = ClearTextPassword::new("my_secure_password".to_string());
/// assert!(format!("{password:?}").contains("REDACTED"));
/// ```
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword(String);

impl ClearTextPassword {
    /// Unicode is normalized using NFKC.
    pub fn new(mut raw: String) -> Self {
        let normalized: String = raw.nfkc().collect();
        raw.zeroize();
        Self(normalized)
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    fn peppered(&self, pepper: Option<&[u8]>) -> Zeroizing<Vec<u8>> {
        let mut combined = self.as_bytes().to_vec();
        if let Some(p) = pepper {
            combined.extend_from_slice(p);
        }
        Zeroizing::new(combined)
    }
}

impl fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClearTextPassword")
            .field(&"[REDACTED]")
            .finish()
    }
}

/// Argon2id hasher (OWASP parameters: m=19456, t=2, p=1)
///
/// ```rust
/// use platform::password::{Argon2Hasher, ClearTextPassword};
///
/// let hasher = Argon2Hasher::new(None);
/// let password = ClearTextPassword::new("correct horse".to_string());
/// let phc = hasher.hash(&password).unwrap();
/// assert!(hasher.verify(&phc, &password));
/// ```
#[derive(Clone, Default)]
pub struct Argon2Hasher {
    pepper: Option<Zeroizing<Vec<u8>>>,
}

impl Argon2Hasher {
    pub fn new(pepper: Option<Vec<u8>>) -> Self {
        Self {
            pepper: pepper.map(Zeroizing::new),
        }
    }

    fn pepper(&self) -> Option<&[u8]> {
        self.pepper.as_ref().map(|p| p.as_slice())
    }

    /// Hash a password into a PHC string
    pub fn hash(&self, password: &ClearTextPassword) -> Result<String, PasswordHashError> {
        let salt = SaltString::generate(OsRng);
        let input = password.peppered(self.pepper());

        Argon2::default()
            .hash_password(&input, &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))
    }

    /// Verify a password against a stored PHC string
    ///
    /// A malformed hash never verifies.
    pub fn verify(&self, phc: &str, password: &ClearTextPassword) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(phc) else {
            return false;
        };
        let input = password.peppered(self.pepper());

        // Argon2 uses constant-time comparison internally
        Argon2::default()
            .verify_password(&input, &parsed_hash)
            .is_ok()
    }
}

impl fmt::Debug for Argon2Hasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Argon2Hasher")
            .field("pepper", &self.pepper.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}
