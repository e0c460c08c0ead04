// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! The error taxonomy and its mapping onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Everything a handler can fail with. Each variant renders as a JSON body
/// with a stable error code; upstream causes are logged, not put on the wire.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Insufficient balance: have {balance}, need {cost}")]
    InsufficientBalance { balance: u64, cost: u64 },

    #[error("Premium subscription required")]
    PremiumRequired,

    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("OAuth provider error: {0}")]
    OAuth(String),

    #[error("Inference API error: {0}")]
    Inference(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Wire shape of an error.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", None),
            AppError::InsufficientBalance { balance, cost } => (
                StatusCode::BAD_REQUEST,
                "insufficient_balance",
                Some(format!("balance is {}, cost is {}", balance, cost)),
            ),
            AppError::PremiumRequired => (
                StatusCode::FORBIDDEN,
                "premium_required",
                Some("this plan requires an active premium subscription".to_string()),
            ),
            AppError::InvalidIdentity(msg) => {
                tracing::error!(error = %msg, "Invalid identity");
                (StatusCode::INTERNAL_SERVER_ERROR, "invalid_identity", None)
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::OAuth(msg) => {
                tracing::warn!(error = %msg, "OAuth provider error");
                (StatusCode::BAD_GATEWAY, "oauth_error", None)
            }
            AppError::Inference(msg) => {
                tracing::warn!(error = %msg, "Inference API error");
                (StatusCode::BAD_GATEWAY, "inference_error", None)
            }
            AppError::Store(msg) => {
                tracing::error!(error = %msg, "Store error");
                (StatusCode::INTERNAL_SERVER_ERROR, "store_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };
        (status, Json(body)).into_response()
    }
}

/// Handler result alias.
pub type Result<T> = std::result::Result<T, AppError>;
