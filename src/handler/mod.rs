//! HTTP request handlers
//!
//! - `auth` - registration, login, profile and role management
//! - `course` - course listing, creation, videos, enrollment and reviews
//! - `swap` - skill swap requests between dual-role users

pub mod auth;
pub mod course;
pub mod swap;

use axum::Json;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::AppError;

/// `GET /` greeting
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Welcome to SkillSwap API!" }))
}

/// Trimmed value of an optional field, `None` when absent or blank
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_id(raw: &str, not_found: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::not_found(not_found))
}

fn max_len(value: &str, max: usize, field: &str) -> Result<(), AppError> {
    if value.chars().count() > max {
        return Err(AppError::validation(format!(
            "{field} cannot be longer than {max} characters"
        )));
    }
    Ok(())
}

/// Star ratings are whole numbers from 1 to 5
fn star_rating(rating: Option<i64>) -> Result<u8, AppError> {
    match rating {
        Some(value @ 1..=5) => Ok(value as u8),
        _ => Err(AppError::validation("Rating must be between 1 and 5")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn present_drops_blank_values() {
        assert_eq!(present(Some("  bob ".into())), Some("bob".to_string()));
        assert_eq!(present(Some("   ".into())), None);
        assert_eq!(present(None), None);
    }

    #[test]
    fn star_rating_bounds() {
        assert_eq!(star_rating(Some(1)).unwrap(), 1);
        assert_eq!(star_rating(Some(5)).unwrap(), 5);
        assert!(star_rating(Some(0)).is_err());
        assert!(star_rating(Some(6)).is_err());
        assert!(star_rating(None).is_err());
    }
}
