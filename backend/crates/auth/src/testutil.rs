//! Test fixtures

use std::time::Duration;

use platform::password::ClearTextPassword;

use crate::application::config::AuthConfig;
use crate::application::token::TokenCodec;
use crate::application::{AuthService, LoginInput};
use crate::domain::entity::user::User;
use crate::domain::password::PasswordVerifier;
use crate::domain::value_object::Fingerprint;
use crate::infra::memory::{MemoryCache, MemoryUserStore};
use crate::presentation::handlers::AuthAppState;

pub const PASSWORD: &str = "correct horse battery";

/// Stored hash is the password itself
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainHasher;

impl PasswordVerifier for PlainHasher {
    fn verify_password(&self, password_hash: &str, password: &ClearTextPassword) -> bool {
        platform::crypto::constant_time_eq(password_hash.as_bytes(), password.as_bytes())
    }
}

pub type TestService = AuthService<MemoryUserStore, MemoryCache, PlainHasher>;

pub fn config() -> AuthConfig {
    AuthConfig {
        signing_key: b"test-signing-secret-for-auth-crate".to_vec(),
        access_token_ttl: Duration::from_secs(300),
        refresh_token_ttl: Duration::from_secs(3600),
        ..AuthConfig::default()
    }
}

pub struct Fixture {
    pub service: TestService,
    pub store: MemoryUserStore,
    pub cache: MemoryCache,
    pub user: User,
}

pub fn fixture() -> Fixture {
    fixture_with(config())
}

pub fn fixture_with(config: AuthConfig) -> Fixture {
    let user = User::new("alice", PASSWORD);
    let store = MemoryUserStore::with_users([user.clone()]);
    let cache = MemoryCache::new();
    let codec = TokenCodec::from_config(&config).unwrap();

    let service = AuthService::new(
        store.clone(),
        cache.clone(),
        PlainHasher,
        codec,
        config.max_sessions,
    );

    Fixture {
        service,
        store,
        cache,
        user,
    }
}

pub fn app_state(
    config: AuthConfig,
) -> (AuthAppState<MemoryUserStore, MemoryCache, PlainHasher>, User) {
    let Fixture { service, user, .. } = fixture_with(config.clone());
    (AuthAppState::new(service, config), user)
}

pub fn login_input(login: &str, password: &str, fingerprint: &str) -> LoginInput {
    LoginInput {
        login: login.to_string(),
        password: ClearTextPassword::new(password.to_string()),
        fingerprint: Fingerprint::new(fingerprint).unwrap(),
    }
}

pub fn fp(value: &str) -> Fingerprint {
    Fingerprint::new(value).unwrap()
}
