//! Client Fingerprint
//!
//! Opaque device identifier sent by the client and stored next to each
//! refresh token.

use crate::domain::value_object::session_entry::SEPARATOR;
use crate::error::{AuthError, AuthResult};

/// Validated client fingerprint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Rejects values containing the session entry separator.
    pub fn new(raw: impl Into<String>) -> AuthResult<Self> {
        let raw = raw.into();
        if raw.contains(SEPARATOR) {
            return Err(AuthError::InvalidFingerprint);
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
