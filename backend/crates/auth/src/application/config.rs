//! Application Configuration
//!
//! Configuration for the Auth application layer.

use std::fmt;
use std::time::Duration;

use jsonwebtoken::Algorithm;
use platform::cookie::CookieConfig;

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

/// Default cap on concurrently registered refresh tokens per user
pub const MAX_SESSIONS: usize = 5;

/// Auth application configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// Token signing algorithm
    pub algorithm: Algorithm,
    /// HMAC secret, or PEM private key for asymmetric algorithms
    pub signing_key: Vec<u8>,
    /// PEM public key for asymmetric algorithms; HMAC falls back to the
    /// signing key when empty
    pub verification_key: Vec<u8>,
    /// Access token lifetime (15 minutes)
    pub access_token_ttl: Duration,
    /// Refresh token lifetime (30 days)
    pub refresh_token_ttl: Duration,
    /// Registered refresh tokens per user before a full wipe
    pub max_sessions: usize,
    /// Refresh token cookie name
    pub refresh_cookie_name: String,
    /// Whether to set the Secure cookie attribute
    pub cookie_secure: bool,
    /// SameSite policy
    pub cookie_same_site: SameSite,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::HS256,
            signing_key: Vec::new(),
            verification_key: Vec::new(),
            access_token_ttl: Duration::from_secs(15 * 60),
            refresh_token_ttl: Duration::from_secs(30 * 24 * 3600),
            max_sessions: MAX_SESSIONS,
            refresh_cookie_name: "refresh".to_string(),
            cookie_secure: true,
            cookie_same_site: SameSite::Lax,
            password_pepper: None,
        }
    }
}

impl AuthConfig {
    /// Create config with a random HS256 secret (for development)
    pub fn with_random_secret() -> Self {
        Self {
            algorithm: Algorithm::HS256,
            signing_key: platform::crypto::random_bytes(32),
            ..Default::default()
        }
    }

    /// Cookie attributes for the refresh token
    pub fn refresh_cookie(&self) -> CookieConfig {
        CookieConfig {
            secure: self.cookie_secure,
            same_site: self.cookie_same_site,
            ..CookieConfig::named(self.refresh_cookie_name.as_str())
        }
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("algorithm", &self.algorithm)
            .field("signing_key", &"[REDACTED]")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("max_sessions", &self.max_sessions)
            .field("refresh_cookie_name", &self.refresh_cookie_name)
            .field("cookie_secure", &self.cookie_secure)
            .field("cookie_same_site", &self.cookie_same_site)
            .finish_non_exhaustive()
    }
}
