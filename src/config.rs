//! Application configuration loaded from environment variables.
//!
//! Secrets are read once at startup and cached in memory; deployments
//! inject them as environment variables.

use std::env;
use std::str::FromStr;

/// OAuth client credentials for one identity provider.
///
/// A provider is only offered on the login surface when both its client ID
/// and client secret are configured.
#[derive(Debug, Clone)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Deployment ---
    /// Frontend URL for OAuth redirects
    pub frontend_url: String,
    /// Path of the JSON user store document
    pub store_path: String,
    /// Directory of static HTML pages
    pub static_dir: String,
    /// Server port
    pub port: u16,
    /// Golden units granted to a freshly created account
    pub signup_bonus: u64,

    // --- OAuth providers ---
    /// Google OAuth credentials (login disabled for the provider when unset)
    pub google: Option<OAuthCredentials>,
    /// GitHub OAuth credentials
    pub github: Option<OAuthCredentials>,

    // --- Inference API ---
    /// Base URL of the OpenAI-compatible inference API
    pub inference_api_base: String,
    /// Inference API key
    pub inference_api_key: String,
    /// Model used for standard-plan requests
    pub standard_model: String,
    /// Model used for premium-plan requests
    pub premium_model: String,
    /// Model used for image generation
    pub image_model: String,
    /// Completion token cap per request
    pub max_tokens: u32,

    // --- Secrets ---
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// HMAC key for OAuth state signatures (raw bytes)
    pub oauth_state_key: Vec<u8>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// For local development, secrets can be set via a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            frontend_url: var_or("FRONTEND_URL", "http://localhost:5173"),
            store_path: var_or("STORE_PATH", "data/users.json"),
            static_dir: var_or("STATIC_DIR", "public"),
            port: var_or_parse("PORT", 8080),
            signup_bonus: var_or_parse("SIGNUP_BONUS", 100),

            google: credentials_from_env("GOOGLE_CLIENT_ID", "GOOGLE_CLIENT_SECRET"),
            github: credentials_from_env("GITHUB_CLIENT_ID", "GITHUB_CLIENT_SECRET"),

            inference_api_base: var_or("INFERENCE_API_BASE", "https://api.openai.com/v1"),
            inference_api_key: required("INFERENCE_API_KEY")?,
            standard_model: var_or("STANDARD_MODEL", "gpt-4o-mini"),
            premium_model: var_or("PREMIUM_MODEL", "gpt-4o"),
            image_model: var_or("IMAGE_MODEL", "dall-e-3"),
            max_tokens: var_or_parse("MAX_COMPLETION_TOKENS", 1024),

            jwt_signing_key: required("JWT_SIGNING_KEY")?.into_bytes(),
            oauth_state_key: required("OAUTH_STATE_KEY")?.into_bytes(),
        })
    }

    /// Default config for tests only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            store_path: String::new(),
            static_dir: "public".to_string(),
            port: 8080,
            signup_bonus: 100,
            google: Some(OAuthCredentials {
                client_id: "test_google_id".to_string(),
                client_secret: "test_google_secret".to_string(),
            }),
            github: None,
            inference_api_base: "http://localhost:9/v1".to_string(),
            inference_api_key: "test_inference_key".to_string(),
            standard_model: "gpt-4o-mini".to_string(),
            premium_model: "gpt-4o".to_string(),
            image_model: "dall-e-3".to_string(),
            max_tokens: 256,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            oauth_state_key: b"test_state_key_32_bytes_minimum".to_vec(),
        }
    }
}

/// The variable's value, or `default` when it is unset.
fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

/// The variable parsed as `T`; unset or unparseable values fall back to `default`.
fn var_or_parse<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// A secret that must be present. Trimmed, since injected values often carry
/// a trailing newline.
fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .map(|v| v.trim().to_string())
        .map_err(|_| ConfigError::Missing(name))
}

/// Read one provider's credential pair, present only when both vars are set.
fn credentials_from_env(id_var: &str, secret_var: &str) -> Option<OAuthCredentials> {
    match (env::var(id_var), env::var(secret_var)) {
        (Ok(client_id), Ok(client_secret)) => Some(OAuthCredentials {
            client_id: client_id.trim().to_string(),
            client_secret: client_secret.trim().to_string(),
        }),
        _ => None,
    }
}

/// Problems found while reading the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),
}
