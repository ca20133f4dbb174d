use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use redb::ReadableDatabase;

use crate::database::{get_json, AppState, TABLE_USERS};
use crate::error::AppError;
use crate::model::User;
use crate::token;

/// The authenticated caller, inserted into request extensions by [`require_auth`]
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

/// Extracts `<token>` from an `Authorization: Bearer <token>` header
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

/// Middleware that rejects requests without a valid bearer token
///
/// On success the caller's current user document is loaded and attached to
/// the request as [`CurrentUser`]. Missing, malformed or expired tokens and
/// tokens for deleted users all yield 401.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = {
        let token = bearer_token(request.headers())
            .ok_or_else(|| AppError::unauthorized("Not authorized, no token provided"))?;
        token::verify(token, &state.config.jwt_secret)?
    };

    let user: User = {
        let read_txn = state.db.begin_read()?;
        let users = read_txn.open_table(TABLE_USERS)?;
        get_json(&users, &user_id.to_string())?
            .ok_or_else(|| AppError::unauthorized("User not found"))?
    };

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn reads_bearer_tokens() {
        assert_eq!(bearer_token(&headers("Bearer abc.def")), Some("abc.def"));
    }

    #[test]
    fn ignores_other_schemes_and_empty_tokens() {
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
