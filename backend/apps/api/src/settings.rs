//! Runtime settings
//!
//! Read from the environment (after `.env` is loaded), grouped by prefix:
//! `DB_*`, `REDIS_*`, `CIPHER_*`, `AUTH_*`, `COOKIE_*`, `SERVER_*`.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, bail};
use auth::AuthConfig;
use platform::crypto::from_base64;

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub db_max_connections: u32,
    pub redis_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub auth: AuthConfig,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Debug builds fall back to a random HS256 secret when none is set.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::load(&lookup, cfg!(debug_assertions))
    }

    fn load(
        lookup: &dyn Fn(&str) -> Option<String>,
        dev_fallback: bool,
    ) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL").context("DATABASE_URL must be set")?;
        let db_max_connections = parse_or(&get, "DB_MAX_CONNECTIONS", 10u32)?;

        let redis_url = match get("REDIS_URL") {
            Some(url) => url,
            None => {
                let host = get("REDIS_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
                let port = parse_or(&get, "REDIS_PORT", 6379u16)?;
                match get("REDIS_PASSWORD") {
                    Some(password) => format!("redis://:{password}@{host}:{port}"),
                    None => format!("redis://{host}:{port}"),
                }
            }
        };

        let auth = load_auth(&get, dev_fallback)?;

        Ok(Self {
            database_url,
            db_max_connections,
            redis_url,
            server_host: get("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            server_port: parse_or(&get, "SERVER_PORT", 8080u16)?,
            auth,
        })
    }

    pub fn bind_address(&self) -> anyhow::Result<SocketAddr> {
        let raw = format!("{}:{}", self.server_host, self.server_port);
        raw.parse()
            .with_context(|| format!("invalid bind address {raw}"))
    }
}

fn load_auth(
    get: &dyn Fn(&str) -> Option<String>,
    dev_fallback: bool,
) -> anyhow::Result<AuthConfig> {
    let algorithm_name = get("CIPHER_ALGORITHM").unwrap_or_else(|| "HS256".to_string());
    let algorithm = auth::parse_algorithm(&algorithm_name)?;

    let access_secs = parse_or(get, "CIPHER_ACCESS_TOKEN_EXPIRE_SECONDS", 15 * 60u64)?;
    let refresh_secs = parse_or(get, "CIPHER_REFRESH_TOKEN_EXPIRE_SECONDS", 30 * 24 * 3600u64)?;
    if access_secs == 0 || refresh_secs == 0 {
        bail!("token lifetimes must be positive");
    }

    let max_sessions = parse_or(get, "AUTH_MAX_SESSIONS", auth::config::MAX_SESSIONS)?;
    if max_sessions == 0 {
        bail!("AUTH_MAX_SESSIONS must be at least 1");
    }

    let base = match get("CIPHER_SECRET_KEY") {
        Some(secret) => AuthConfig {
            algorithm,
            signing_key: decode_key("CIPHER_SECRET_KEY", &secret)?,
            verification_key: get("CIPHER_PUBLIC_KEY")
                .map(|key| decode_key("CIPHER_PUBLIC_KEY", &key))
                .transpose()?
                .unwrap_or_default(),
            ..AuthConfig::default()
        },
        None if dev_fallback => {
            tracing::warn!("CIPHER_SECRET_KEY not set, using a random HS256 secret");
            AuthConfig::with_random_secret()
        }
        None => bail!("CIPHER_SECRET_KEY must be set"),
    };

    Ok(AuthConfig {
        access_token_ttl: Duration::from_secs(access_secs),
        refresh_token_ttl: Duration::from_secs(refresh_secs),
        max_sessions,
        cookie_secure: parse_bool(get, "COOKIE_SECURE", true)?,
        password_pepper: get("CIPHER_PASSWORD_PEPPER")
            .map(|p| decode_key("CIPHER_PASSWORD_PEPPER", &p))
            .transpose()?,
        ..base
    })
}

fn decode_key(name: &str, value: &str) -> anyhow::Result<Vec<u8>> {
    from_base64(value).with_context(|| format!("{name} must be base64"))
}

fn parse_or<T>(get: &dyn Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        None => Ok(default),
    }
}

fn parse_bool(
    get: &dyn Fn(&str) -> Option<String>,
    key: &str,
    default: bool,
) -> anyhow::Result<bool> {
    match get(key).map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None => Ok(default),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => bail!("{key} has an invalid value: {other}"),
    }
}
