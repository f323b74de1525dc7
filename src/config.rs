//! Service configuration.
//!
//! Loaded once at process start from the environment; shared immutably
//! afterwards. The signing secret is always injected, never hard-coded.

use anyhow::{bail, Context, Result};
use std::env;

/// Runtime configuration for the service
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP server binds to.
    pub bind_addr: String,
    /// Path of the SQLite database holding users and the token ledger.
    pub db_path: String,
    /// HMAC secret for token signing.
    pub jwt_secret: String,
    /// Token time-to-live, the single source of truth for both the claim
    /// expiry and the ledger expiry.
    pub token_ttl_minutes: i64,
}

impl AppConfig {
    /// Read configuration from the environment.
    pub fn from_env() -> Result<Self> {
        let jwt_secret =
            env::var("JWT_SECRET").context("JWT_SECRET must be set (injected signing secret)")?;
        if jwt_secret.trim().is_empty() {
            bail!("JWT_SECRET must not be empty");
        }

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let db_path = env::var("DB_PATH").unwrap_or_else(|_| "userhub.db".to_string());

        let token_ttl_minutes = env::var("TOKEN_TTL_MINUTES")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|&v| v > 0)
            .unwrap_or(30);

        Ok(Self {
            bind_addr,
            db_path,
            jwt_secret,
            token_ttl_minutes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test so the process-wide environment is not mutated
    // concurrently.
    #[test]
    fn test_from_env() {
        env::remove_var("JWT_SECRET");
        env::remove_var("BIND_ADDR");
        env::remove_var("DB_PATH");
        env::remove_var("TOKEN_TTL_MINUTES");

        assert!(AppConfig::from_env().is_err());

        env::set_var("JWT_SECRET", "test-secret-key-12345");
        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.db_path, "userhub.db");
        assert_eq!(config.token_ttl_minutes, 30);

        env::set_var("TOKEN_TTL_MINUTES", "not-a-number");
        assert_eq!(AppConfig::from_env().unwrap().token_ttl_minutes, 30);

        env::set_var("TOKEN_TTL_MINUTES", "5");
        env::set_var("BIND_ADDR", "127.0.0.1:8080");
        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.token_ttl_minutes, 5);
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
    }
}
