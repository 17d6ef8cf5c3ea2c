//! Token Codec
//!
//! Signs and verifies the JWT access/refresh pair. Claims carry the user id
//! as 32-char lowercase hex in `sub` and the token kind in `type`.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use derive_more::Display;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::config::AuthConfig;
use crate::domain::value_object::UserId;
use crate::error::{AuthError, AuthResult};

/// Token kind carried in the `type` claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    #[display("access")]
    Access,
    #[display("refresh")]
    Refresh,
}

/// JWT claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    pub sub: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<TokenType>,
    pub iat: i64,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl TokenPayload {
    /// Subject as a user id; an unparsable subject is an invalid token
    pub fn subject_id(&self) -> AuthResult<UserId> {
        UserId::parse(&self.sub).map_err(|_| AuthError::TokenInvalid)
    }

    pub fn is(&self, expected: TokenType) -> bool {
        self.token_type == Some(expected)
    }
}

/// Per-call overrides for [`TokenCodec::encode_with`]
#[derive(Default, Clone, Copy)]
pub struct EncodeOverrides<'a> {
    pub key: Option<&'a EncodingKey>,
    pub algorithm: Option<Algorithm>,
    pub expires_in: Option<chrono::Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyFamily {
    Hmac,
    Rsa,
    Ec,
    Ed,
}

impl KeyFamily {
    fn of(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => KeyFamily::Hmac,
            Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512 => KeyFamily::Rsa,
            Algorithm::ES256 | Algorithm::ES384 => KeyFamily::Ec,
            Algorithm::EdDSA => KeyFamily::Ed,
        }
    }
}

/// Parse an algorithm name such as `HS256` or `EdDSA`
pub fn parse_algorithm(name: &str) -> AuthResult<Algorithm> {
    Algorithm::from_str(name.trim())
        .map_err(|_| AuthError::Configuration(format!("unsupported algorithm: {name}")))
}

/// Signs and verifies tokens with keys fixed at construction
#[derive(Clone)]
pub struct TokenCodec {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: chrono::Duration,
    refresh_ttl: chrono::Duration,
}

impl TokenCodec {
    /// Build keys for the configured algorithm family
    pub fn from_config(config: &AuthConfig) -> AuthResult<Self> {
        if config.signing_key.is_empty() {
            return Err(AuthError::Configuration("signing key is empty".into()));
        }

        let verification_key = if config.verification_key.is_empty() {
            &config.signing_key
        } else {
            &config.verification_key
        };

        let bad_key = |e: jsonwebtoken::errors::Error| {
            AuthError::Configuration(format!("invalid {:?} key: {e}", config.algorithm))
        };

        let (encoding_key, decoding_key) = match KeyFamily::of(config.algorithm) {
            KeyFamily::Hmac => (
                EncodingKey::from_secret(&config.signing_key),
                DecodingKey::from_secret(verification_key),
            ),
            KeyFamily::Rsa => (
                EncodingKey::from_rsa_pem(&config.signing_key).map_err(bad_key)?,
                DecodingKey::from_rsa_pem(verification_key).map_err(bad_key)?,
            ),
            KeyFamily::Ec => (
                EncodingKey::from_ec_pem(&config.signing_key).map_err(bad_key)?,
                DecodingKey::from_ec_pem(verification_key).map_err(bad_key)?,
            ),
            KeyFamily::Ed => (
                EncodingKey::from_ed_pem(&config.signing_key).map_err(bad_key)?,
                DecodingKey::from_ed_pem(verification_key).map_err(bad_key)?,
            ),
        };

        Ok(Self {
            algorithm: config.algorithm,
            encoding_key,
            decoding_key,
            access_ttl: to_chrono(config.access_token_ttl)?,
            refresh_ttl: to_chrono(config.refresh_token_ttl)?,
        })
    }

    /// Encode with the configured key, algorithm and lifetime
    pub fn encode(
        &self,
        subject: &str,
        token_type: TokenType,
    ) -> AuthResult<(DateTime<Utc>, String)> {
        self.encode_with(subject, Some(token_type), EncodeOverrides::default())
    }

    /// Encode a token, returning its expiry instant alongside it
    ///
    /// Without a type the access lifetime applies and no `type` claim is
    /// written. The lifetime must be at least one whole second.
    pub fn encode_with(
        &self,
        subject: &str,
        token_type: Option<TokenType>,
        overrides: EncodeOverrides<'_>,
    ) -> AuthResult<(DateTime<Utc>, String)> {
        let lifetime = match (overrides.expires_in, token_type) {
            (Some(lifetime), _) => lifetime,
            (None, Some(TokenType::Access)) => self.access_ttl,
            (None, Some(TokenType::Refresh)) => self.refresh_ttl,
            (None, None) => {
                tracing::warn!("Token type not given, using access token lifetime");
                self.access_ttl
            }
        };

        let lifetime_secs = lifetime.num_seconds();
        if lifetime_secs <= 0 {
            return Err(AuthError::Configuration(
                "token lifetime must be positive".into(),
            ));
        }

        let iat = Utc::now().timestamp();
        let exp = iat
            .checked_add(lifetime_secs)
            .ok_or_else(|| AuthError::Configuration("token lifetime overflows".into()))?;
        let expires_at = DateTime::from_timestamp(exp, 0)
            .ok_or_else(|| AuthError::Configuration("token expiry out of range".into()))?;

        let payload = TokenPayload {
            sub: subject.to_string(),
            token_type,
            iat,
            exp,
            jti: Some(Uuid::new_v4().simple().to_string()),
        };

        let header = Header::new(overrides.algorithm.unwrap_or(self.algorithm));
        let key = overrides.key.unwrap_or(&self.encoding_key);

        let token = jsonwebtoken::encode(&header, &payload, key)
            .map_err(|e| AuthError::Configuration(format!("token signing failed: {e}")))?;

        Ok((expires_at, token))
    }

    /// Verify with the configured key and algorithm
    pub fn decode(&self, token: &str) -> AuthResult<TokenPayload> {
        self.decode_with(token, None, None)
    }

    /// Verify signature and expiry with zero leeway
    ///
    /// Every failure is reported as [`AuthError::TokenInvalid`].
    pub fn decode_with(
        &self,
        token: &str,
        key: Option<&DecodingKey>,
        algorithm: Option<Algorithm>,
    ) -> AuthResult<TokenPayload> {
        let mut validation = Validation::new(algorithm.unwrap_or(self.algorithm));
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);

        let key = key.unwrap_or(&self.decoding_key);

        jsonwebtoken::decode::<TokenPayload>(token, key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Token rejected");
                AuthError::TokenInvalid
            })
    }
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.algorithm)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

fn to_chrono(duration: Duration) -> AuthResult<chrono::Duration> {
    chrono::Duration::from_std(duration)
        .map_err(|_| AuthError::Configuration("token lifetime out of range".into()))
}
