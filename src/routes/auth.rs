// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth authentication routes (Google, GitHub).

use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    routing::get,
    Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::{Config, OAuthCredentials};
use crate::error::{AppError, Result};
use crate::middleware::auth::create_jwt;
use crate::services::derive_key;
use crate::services::oauth::{provider_by_name, ProviderEndpoints};
use crate::AppState;

type HmacSha256 = Hmac<Sha256>;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/logout", get(logout))
        .route("/auth/{provider}", get(auth_start))
        .route("/auth/{provider}/callback", get(auth_callback))
}

/// Query parameters for starting the OAuth flow.
#[derive(Deserialize)]
pub struct AuthStartParams {
    /// Frontend URL to send the user back to after login.
    /// Falls back to the configured frontend URL.
    #[serde(default)]
    redirect_uri: Option<String>,
}

/// Resolve a provider path segment to its endpoints and configured credentials.
fn resolve_provider<'a>(
    config: &'a Config,
    name: &str,
) -> Result<(&'static ProviderEndpoints, &'a OAuthCredentials)> {
    let provider =
        provider_by_name(name).ok_or_else(|| AppError::NotFound(format!("OAuth provider {}", name)))?;

    let credentials = match provider.name {
        "google" => config.google.as_ref(),
        "github" => config.github.as_ref(),
        _ => None,
    }
    .ok_or_else(|| AppError::NotFound(format!("OAuth provider {} is not configured", name)))?;

    Ok((provider, credentials))
}

/// Derive this service's callback URL for a provider from the request Host.
fn callback_url(headers: &axum::http::HeaderMap, provider: &ProviderEndpoints) -> String {
    let host = match headers.get(axum::http::header::HOST).and_then(|h| h.to_str().ok()) {
        Some(h) => h.to_string(),
        None => std::env::var("API_HOST").unwrap_or_else(|_| "localhost:8080".to_string()),
    };

    // Local hosts are plain http; anything reachable by a provider is https.
    let scheme = if host.contains("localhost") || host.contains("127.0.0.1") {
        "http"
    } else {
        "https"
    };

    format!("{}://{}/auth/{}/callback", scheme, host, provider.name)
}

/// Build the signed OAuth state: `<frontend_url>|<timestamp_hex>|<signature_hex>`,
/// base64url-encoded. The URL rides along so the callback knows where to send
/// the user; the signature stops redirect tampering.
fn sign_state(frontend_url: &str, key: &[u8]) -> Result<String> {
    let now_millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
        .as_millis();

    let payload = format!("{}|{:x}", frontend_url, now_millis);

    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(payload.as_bytes());
    let tag = hex::encode(mac.finalize().into_bytes());

    Ok(URL_SAFE_NO_PAD.encode(format!("{}|{}", payload, tag)))
}

/// Check the signature on an OAuth state value and recover the frontend URL.
///
/// Any structural or signature failure yields `None`; the caller falls back to
/// the configured frontend rather than failing the whole login.
fn verify_state(state: &str, key: &[u8]) -> Option<String> {
    let decoded = URL_SAFE_NO_PAD.decode(state).ok()?;
    let text = String::from_utf8(decoded).ok()?;

    // The signature covers everything before the last separator.
    let (payload, tag_hex) = text.rsplit_once('|')?;
    let tag = hex::decode(tag_hex).ok()?;

    let mut mac = HmacSha256::new_from_slice(key).ok()?;
    mac.update(payload.as_bytes());
    if mac.verify_slice(&tag).is_err() {
        tracing::error!("OAuth state signature mismatch");
        return None;
    }

    // Payload is `<frontend_url>|<timestamp_hex>`. The URL may itself contain
    // the separator; the timestamp never does, so split from the right.
    let (frontend_url, _timestamp) = payload.rsplit_once('|')?;
    Some(frontend_url.to_string())
}

/// Start OAuth flow - redirect to the provider's authorization page.
async fn auth_start(
    State(state): State<Arc<AppState>>,
    Path(provider_name): Path<String>,
    Query(params): Query<AuthStartParams>,
    headers: axum::http::HeaderMap,
) -> Result<Redirect> {
    let (provider, credentials) = resolve_provider(&state.config, &provider_name)?;

    // Where to send the user once the whole dance is over.
    let frontend_url = params
        .redirect_uri
        .unwrap_or_else(|| state.config.frontend_url.clone());

    let oauth_state = sign_state(&frontend_url, &state.config.oauth_state_key)?;
    let callback = callback_url(&headers, provider);

    let auth_url = format!(
        "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}",
        provider.authorize_url,
        credentials.client_id,
        urlencoding::encode(&callback),
        urlencoding::encode(provider.scope),
        oauth_state
    );

    tracing::info!(
        provider = provider.name,
        frontend_url = %frontend_url,
        "Starting OAuth flow, redirecting to provider"
    );

    Ok(Redirect::temporary(&auth_url))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    /// Absent when the provider reports an error instead.
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: String,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - exchange code, create or fetch the account, mint a session.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    Path(provider_name): Path<String>,
    headers: axum::http::HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Result<Redirect> {
    let frontend_url = verify_state(&params.state, &state.config.oauth_state_key)
        .unwrap_or_else(|| {
            tracing::warn!(
                "Invalid or tampered state parameter, falling back to default frontend URL"
            );
            state.config.frontend_url.clone()
        });

    // A provider-side refusal (user hit cancel, consent denied) goes straight
    // back to the frontend.
    if let Some(error) = params.error {
        tracing::warn!(provider = %provider_name, error = %error, "OAuth error from provider");
        let redirect = format!("{}?error={}", frontend_url, urlencoding::encode(&error));
        return Ok(Redirect::temporary(&redirect));
    }

    let code = params
        .code
        .ok_or_else(|| AppError::BadRequest("Missing authorization code".to_string()))?;

    let (provider, credentials) = resolve_provider(&state.config, &provider_name)?;

    tracing::info!(provider = provider.name, "Exchanging authorization code for tokens");

    let redirect_uri = callback_url(&headers, provider);

    let access_token = state
        .oauth
        .exchange_code(provider, credentials, &code, &redirect_uri)
        .await?;

    let profile = state.oauth.fetch_profile(provider, &access_token).await?;

    let external_id = profile.external_id()?;
    let user_key = derive_key(&external_id, provider.name)?;

    let account = state
        .ledger
        .get_or_create_account(&user_key, &profile.display_name(), &profile.email())
        .await?;

    tracing::info!(
        user_key = %account.key,
        provider = provider.name,
        "OAuth successful, account ready"
    );

    let jwt = create_jwt(&account.key, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    let redirect_url = format!("{}/callback?token={}", frontend_url, jwt);

    Ok(Redirect::temporary(&redirect_url))
}

/// Sessions are bearer JWTs; logging out is the client discarding its copy.
/// This endpoint only routes the browser back home.
async fn logout() -> Redirect {
    Redirect::temporary("/")
}
