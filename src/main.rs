//! UserHub - user management web service
//! Mission: CRUD on user records with stateless token-based session auth

use anyhow::{Context, Result};
use dotenv::dotenv;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use userhub_backend::{
    auth::{AuthState, TokenLedger, TokenService, UserStore},
    config::AppConfig,
    routes::create_router,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize environment and logging
    let _ = dotenv();
    init_tracing();

    let config = AppConfig::from_env()?;

    info!("🚀 UserHub starting");

    // Stores share one SQLite database; the user table must exist before
    // the ledger declares its foreign key.
    let users = Arc::new(UserStore::new(&config.db_path)?);
    let ledger = Arc::new(TokenLedger::new(&config.db_path)?);
    let tokens = Arc::new(TokenService::new(
        config.jwt_secret.clone(),
        config.token_ttl_minutes,
        users.clone(),
        ledger,
    ));

    info!("📊 Database initialized at: {}", config.db_path);
    info!(
        "🔐 Token service ready (TTL: {} minutes)",
        config.token_ttl_minutes
    );

    let app = create_router(AuthState { users, tokens }).layer(CorsLayer::permissive());

    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!("🎯 API server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Initialize tracing with env-filter overrides
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "userhub_backend=debug,userhub=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
