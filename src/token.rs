//! Session tokens
//!
//! HS256 JWTs carrying the user id in `sub`, valid for
//! [`TOKEN_TTL_DAYS`](crate::config::TOKEN_TTL_DAYS) days.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::TOKEN_TTL_DAYS;
use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

pub fn issue(user_id: Uuid, secret: &str) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::days(TOKEN_TTL_DAYS)).timestamp(),
    };

    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

/// Returns the user id carried by a valid, unexpired token
pub fn verify(token: &str, secret: &str) -> Result<Uuid, AppError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|err| {
        tracing::warn!(error = %err, "rejected session token");
        AppError::unauthorized("Not authorized, invalid token")
    })?;

    Uuid::parse_str(&data.claims.sub)
        .map_err(|_| AppError::unauthorized("Not authorized, invalid token"))
}
