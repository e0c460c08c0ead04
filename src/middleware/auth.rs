// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT session middleware.

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Session cookie holding the JWT.
pub const SESSION_COOKIE: &str = "goldenchat_token";

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject: the user key, `<externalId>@<provider>`
    pub sub: String,
    /// Expiry, seconds since the Unix epoch
    pub exp: usize,
    /// Issue time, seconds since the Unix epoch
    pub iat: usize,
}

/// The session user a valid JWT resolves to.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_key: String,
}

/// Session user on routes that answer both authenticated and anonymous.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthUser>);

/// Middleware that requires a valid JWT session.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(&jar, &request).ok_or(AppError::Unauthorized)?;
    let user_key = decode_user_key(&token, &state.config.jwt_signing_key)?;

    request.extensions_mut().insert(AuthUser { user_key });
    Ok(next.run(request).await)
}

/// Middleware that attaches the session user when present, never rejecting.
///
/// `/api/me` must answer `loggedIn: false` to anonymous callers rather than
/// 401, so an absent or invalid token just means no user here.
pub async fn optional_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let user = extract_token(&jar, &request)
        .and_then(|token| decode_user_key(&token, &state.config.jwt_signing_key).ok())
        .map(|user_key| AuthUser { user_key });

    request.extensions_mut().insert(MaybeUser(user));
    next.run(request).await
}

/// Pull the session token from the cookie, falling back to the header.
fn extract_token(jar: &CookieJar, request: &Request) -> Option<String> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }

    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|token| token.to_string())
}

/// Decode and validate a session token, returning the user key.
fn decode_user_key(token: &str, signing_key: &[u8]) -> Result<String, AppError> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);

    let token_data =
        decode::<Claims>(token, &key, &validation).map_err(|_| AppError::InvalidToken)?;

    Ok(token_data.claims.sub)
}

/// Create a JWT for a user session.
pub fn create_jwt(user_key: &str, signing_key: &[u8]) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: user_key.to_string(),
        iat: now,
        exp: now + 30 * 24 * 60 * 60, // 30 days
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}
