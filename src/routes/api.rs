// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for the ledger and the inference gateway.

use crate::error::{AppError, Result};
use crate::middleware::auth::{AuthUser, MaybeUser};
use crate::models::ChatTurn;
use crate::services::ledger::{self, Plan};
use crate::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Image size used when the request does not specify one.
const DEFAULT_IMAGE_SIZE: &str = "1024x1024";

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/unlock-feature", post(unlock_feature))
        .route("/api/generate", post(generate))
        .route("/api/history", get(get_history).delete(clear_history))
}

/// Routes that answer both authenticated and anonymous callers.
/// The optional-auth middleware is applied in routes/mod.rs.
pub fn me_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/me", get(get_me))
}

// ─── User Profile ────────────────────────────────────────────

/// Current user response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MeResponse {
    pub logged_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub balance: u64,
    pub premium: bool,
}

/// Get the current session's profile and balance.
///
/// Anonymous callers get `loggedIn: false` with a zero balance, not a 401.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(MaybeUser(user)): Extension<MaybeUser>,
) -> Result<Json<MeResponse>> {
    let Some(user) = user else {
        return Ok(Json(MeResponse {
            logged_in: false,
            name: None,
            balance: 0,
            premium: false,
        }));
    };

    let account = state.store.get_user(&user.user_key).await;
    let premium = state.ledger.is_premium(&user.user_key).await;

    Ok(Json(MeResponse {
        logged_in: true,
        name: account.as_ref().map(|a| a.display_name.clone()),
        balance: account.map(|a| a.golden_balance).unwrap_or(0),
        premium,
    }))
}

// ─── Feature Unlock ──────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct UnlockFeatureRequest {
    #[validate(length(min = 1, max = 64))]
    pub feature: String,
    pub cost: u64,
}

/// Unlock response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UnlockFeatureResponse {
    pub success: bool,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub new_balance: u64,
}

/// Debit the session user's balance and unlock a feature for 30 days.
async fn unlock_feature(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<UnlockFeatureRequest>,
) -> Result<Json<UnlockFeatureResponse>> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let new_balance = state
        .ledger
        .unlock_feature(&user.user_key, &req.feature, req.cost)
        .await?;

    Ok(Json(UnlockFeatureResponse {
        success: true,
        new_balance,
    }))
}

// ─── Generation Gateway ──────────────────────────────────────

/// Generation request, dispatched on the `action` tag.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum GenerateRequest {
    Chat {
        prompt: String,
        #[serde(default)]
        plan: Plan,
    },
    Image {
        prompt: String,
        #[serde(default)]
        size: Option<String>,
        #[serde(default)]
        plan: Plan,
    },
    Code {
        prompt: String,
        #[serde(default)]
        language: Option<String>,
        #[serde(default)]
        plan: Plan,
    },
    Translate {
        text: String,
        target_language: String,
        #[serde(default)]
        plan: Plan,
    },
}

impl GenerateRequest {
    /// The plan requested, common to every action.
    fn plan(&self) -> Plan {
        match self {
            GenerateRequest::Chat { plan, .. }
            | GenerateRequest::Image { plan, .. }
            | GenerateRequest::Code { plan, .. }
            | GenerateRequest::Translate { plan, .. } => *plan,
        }
    }
}

/// Generation result, tagged by payload kind.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum GenerateResponse {
    Text { content: String },
    Image { url: String },
}

fn require_non_empty(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{} must not be empty", field)));
    }
    Ok(())
}

/// Gate on plan, pick a model, and delegate to the inference API.
///
/// Chat requests carry the user's recent history; the prompt and reply are
/// only recorded after the inference call succeeds.
async fn generate(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>> {
    let plan = req.plan();
    let premium = state.ledger.is_premium(&user.user_key).await;
    ledger::require_premium(plan, premium)?;

    let model = match plan {
        Plan::Premium => state.config.premium_model.as_str(),
        Plan::Standard => state.config.standard_model.as_str(),
    };

    let response = match req {
        GenerateRequest::Chat { prompt, .. } => {
            require_non_empty(&prompt, "prompt")?;

            let mut turns = state.history.recent(&user.user_key);
            turns.push(ChatTurn::user(prompt.clone()));

            let reply = state.inference.chat_completion(model, None, &turns).await?;

            state.history.append(&user.user_key, ChatTurn::user(prompt));
            state
                .history
                .append(&user.user_key, ChatTurn::assistant(reply.clone()));

            GenerateResponse::Text { content: reply }
        }
        GenerateRequest::Image { prompt, size, .. } => {
            require_non_empty(&prompt, "prompt")?;
            let size = size.as_deref().unwrap_or(DEFAULT_IMAGE_SIZE);

            let url = state
                .inference
                .generate_image(&state.config.image_model, &prompt, size)
                .await?;

            GenerateResponse::Image { url }
        }
        GenerateRequest::Code { prompt, language, .. } => {
            require_non_empty(&prompt, "prompt")?;

            let system = match language.as_deref() {
                Some(lang) => format!(
                    "You are an expert {} programmer. Reply with code only, no prose.",
                    lang
                ),
                None => "You are an expert programmer. Reply with code only, no prose.".to_string(),
            };

            let turns = [ChatTurn::user(prompt)];
            let content = state
                .inference
                .chat_completion(model, Some(&system), &turns)
                .await?;

            GenerateResponse::Text { content }
        }
        GenerateRequest::Translate {
            text,
            target_language,
            ..
        } => {
            require_non_empty(&text, "text")?;
            require_non_empty(&target_language, "target_language")?;

            let system = format!(
                "You are a translator. Translate the user's text into {}. Reply with the translation only.",
                target_language
            );

            let turns = [ChatTurn::user(text)];
            let content = state
                .inference
                .chat_completion(model, Some(&system), &turns)
                .await?;

            GenerateResponse::Text { content }
        }
    };

    Ok(Json(response))
}

// ─── Chat History ────────────────────────────────────────────

/// Retained chat turns, oldest first.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HistoryResponse {
    pub turns: Vec<ChatTurn>,
}

async fn get_history(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<HistoryResponse> {
    Json(HistoryResponse {
        turns: state.history.recent(&user.user_key),
    })
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ClearHistoryResponse {
    pub success: bool,
}

async fn clear_history(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<ClearHistoryResponse> {
    state.history.clear(&user.user_key);
    Json(ClearHistoryResponse { success: true })
}
