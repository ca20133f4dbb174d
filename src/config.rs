//! Runtime configuration read from the environment
//!
//! Values come from process environment variables, optionally seeded from a
//! `.env` file by `dotenvy` in `main`.

use std::env;

use crate::error::AppError;

/// Default bcrypt work factor for new password hashes
pub const DEFAULT_BCRYPT_COST: u32 = 10;

/// Lifetime of an issued session token
pub const TOKEN_TTL_DAYS: i64 = 30;

/// Application configuration shared by all handlers
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Port the HTTP server binds to
    pub port: u16,

    /// Path of the embedded database file
    pub database_url: String,

    /// HMAC secret used to sign session tokens
    pub jwt_secret: String,

    /// bcrypt cost used when hashing new passwords
    pub bcrypt_cost: u32,
}

impl AppConfig {
    /// Configuration with defaults for everything except the signing secret
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            port: 5000,
            database_url: "skillswap.db".to_string(),
            jwt_secret: jwt_secret.into(),
            bcrypt_cost: DEFAULT_BCRYPT_COST,
        }
    }

    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    /// Reads configuration from the environment
    ///
    /// # Environment Variables
    ///
    /// - `JWT_SECRET` - Token signing secret (required)
    /// - `PORT` - Server port number (default: 5000)
    /// - `DATABASE_URL` - Path to database file (default: "skillswap.db")
    /// - `BCRYPT_COST` - Password hashing cost (default: 10)
    pub fn from_env() -> Result<Self, AppError> {
        let jwt_secret = env::var("JWT_SECRET")
            .ok()
            .filter(|secret| !secret.is_empty())
            .ok_or_else(|| AppError::Config("JWT_SECRET must be set".to_string()))?;

        let mut config = Self::new(jwt_secret);

        if let Ok(port) = env::var("PORT") {
            config.port = port
                .parse()
                .map_err(|_| AppError::Config(format!("PORT is not a valid port: {port}")))?;
        }

        if let Ok(path) = env::var("DATABASE_URL") {
            config.database_url = path;
        }

        if let Ok(cost) = env::var("BCRYPT_COST") {
            config.bcrypt_cost = cost
                .parse()
                .map_err(|_| AppError::Config(format!("BCRYPT_COST is not a number: {cost}")))?;
        }

        Ok(config)
    }
}
