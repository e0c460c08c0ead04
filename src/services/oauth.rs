// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth provider registry and token exchange client.
//!
//! Handles:
//! - Provider endpoint lookup (Google, GitHub)
//! - Authorization-code exchange
//! - Userinfo fetch and profile normalization

use crate::config::OAuthCredentials;
use crate::error::AppError;
use serde::Deserialize;

/// Endpoint set for one OAuth provider.
#[derive(Debug, Clone, Copy)]
pub struct ProviderEndpoints {
    pub name: &'static str,
    pub authorize_url: &'static str,
    pub token_url: &'static str,
    pub userinfo_url: &'static str,
    pub scope: &'static str,
}

pub const GOOGLE: ProviderEndpoints = ProviderEndpoints {
    name: "google",
    authorize_url: "https://accounts.google.com/o/oauth2/v2/auth",
    token_url: "https://oauth2.googleapis.com/token",
    userinfo_url: "https://openidconnect.googleapis.com/v1/userinfo",
    scope: "openid email profile",
};

pub const GITHUB: ProviderEndpoints = ProviderEndpoints {
    name: "github",
    authorize_url: "https://github.com/login/oauth/authorize",
    token_url: "https://github.com/login/oauth/access_token",
    userinfo_url: "https://api.github.com/user",
    scope: "read:user user:email",
};

/// Look up a provider by its path name.
pub fn provider_by_name(name: &str) -> Option<&'static ProviderEndpoints> {
    match name {
        "google" => Some(&GOOGLE),
        "github" => Some(&GITHUB),
        _ => None,
    }
}

/// Userinfo payload, covering both providers' field spellings.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderProfile {
    /// OIDC subject (Google).
    #[serde(default)]
    sub: Option<String>,
    /// Numeric account ID (GitHub).
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    name: Option<String>,
    /// Login handle (GitHub); display-name fallback.
    #[serde(default)]
    login: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

impl ProviderProfile {
    /// The provider-stable external ID, whichever field carries it.
    pub fn external_id(&self) -> Result<String, AppError> {
        self.sub
            .clone()
            .or_else(|| self.id.map(|id| id.to_string()))
            .ok_or_else(|| {
                AppError::InvalidIdentity("userinfo payload has no subject ID".to_string())
            })
    }

    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.login.clone())
            .unwrap_or_default()
    }

    pub fn email(&self) -> String {
        self.email.clone().unwrap_or_default()
    }
}

/// Token exchange response. Both providers return at least `access_token`.
#[derive(Debug, Deserialize)]
struct TokenExchangeResponse {
    access_token: String,
}

/// OAuth token exchange and userinfo client.
#[derive(Clone, Default)]
pub struct OAuthClient {
    http: reqwest::Client,
}

impl OAuthClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    /// Exchange an authorization code for an access token.
    pub async fn exchange_code(
        &self,
        provider: &ProviderEndpoints,
        credentials: &OAuthCredentials,
        code: &str,
        redirect_uri: &str,
    ) -> Result<String, AppError> {
        let response = self
            .http
            .post(provider.token_url)
            // GitHub answers form-encoded unless JSON is requested.
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", redirect_uri),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AppError::OAuth(format!("Token exchange request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                provider = provider.name,
                status = %status,
                body = %body,
                "OAuth token exchange failed"
            );
            return Err(AppError::OAuth(format!(
                "Token exchange failed with status {}",
                status
            )));
        }

        let token: TokenExchangeResponse = response
            .json()
            .await
            .map_err(|e| AppError::OAuth(format!("Failed to parse token response: {}", e)))?;

        Ok(token.access_token)
    }

    /// Fetch the authenticated user's profile.
    pub async fn fetch_profile(
        &self,
        provider: &ProviderEndpoints,
        access_token: &str,
    ) -> Result<ProviderProfile, AppError> {
        let response = self
            .http
            .get(provider.userinfo_url)
            .bearer_auth(access_token)
            // GitHub rejects requests without a User-Agent.
            .header(reqwest::header::USER_AGENT, "goldenchat")
            .send()
            .await
            .map_err(|e| AppError::OAuth(format!("Userinfo request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::OAuth(format!(
                "Userinfo fetch failed: HTTP {}: {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::OAuth(format!("Failed to parse userinfo: {}", e)))
    }
}
