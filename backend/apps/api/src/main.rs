//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors; request-level errors are
//! `auth::AuthError` rendered through `kernel::error::AppError`.

mod settings;

use auth::{AuthAppState, AuthService, PgTransactionManager, RedisCache, TokenCodec, api_router};
use platform::password::Argon2Hasher;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,auth=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env()?;
    tracing::info!(config = ?settings.auth, "Settings loaded");

    // Database connection
    let pool = PgPoolOptions::new()
        .max_connections(settings.db_max_connections)
        .connect(&settings.database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    // Session registry cache
    let cache = RedisCache::connect(&settings.redis_url).await?;
    cache.ping().await?;

    tracing::info!("Connected to cache");

    // Token keys are validated here so a bad key fails the boot
    let codec = TokenCodec::from_config(&settings.auth)?;
    let hasher = Argon2Hasher::new(settings.auth.pepper().map(<[u8]>::to_vec));

    let service = AuthService::new(
        PgTransactionManager::new(pool),
        cache,
        hasher,
        codec,
        settings.auth.max_sessions,
    );
    let state = AuthAppState::new(service, settings.auth.clone());

    // Build router
    let app = api_router(state).layer(TraceLayer::new_for_http());

    // Start server
    let addr = settings.bind_address()?;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
