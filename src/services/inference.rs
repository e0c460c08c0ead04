// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client for the OpenAI-compatible inference API.
//!
//! Handles:
//! - Chat completions (also the vehicle for code and translation requests)
//! - Image generation
//! - Rate limit / upstream failure mapping to `AppError::Inference`
//!
//! One attempt per request with a hard 30-second budget. Failures surface to
//! the caller; nothing here retries.

use crate::error::AppError;
use crate::models::ChatTurn;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Total time budget for a single inference request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Async client for the inference API.
#[derive(Clone)]
pub struct InferenceClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    max_tokens: u32,
}

// ── Wire types (only what we need from the API) ──────────────────

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<WireMessage>,
}

#[derive(Serialize)]
struct WireMessage {
    role: String,
    content: String,
}

impl From<&ChatTurn> for WireMessage {
    fn from(turn: &ChatTurn) -> Self {
        Self {
            role: turn.role.clone(),
            content: turn.content.clone(),
        }
    }
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Serialize)]
struct ImageGenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u32,
    size: &'a str,
}

#[derive(Deserialize)]
struct ImageGenerationResponse {
    data: Vec<GeneratedImage>,
}

#[derive(Deserialize)]
struct GeneratedImage {
    url: String,
}

/// Prepend an optional system instruction to the conversation turns.
fn build_messages(system: Option<&str>, turns: &[ChatTurn]) -> Vec<WireMessage> {
    let mut wire = Vec::with_capacity(turns.len() + 1);
    if let Some(system) = system {
        wire.push(WireMessage {
            role: "system".to_string(),
            content: system.to_string(),
        });
    }
    wire.extend(turns.iter().map(WireMessage::from));
    wire
}

// ─────────────────────────────────────────────────────────────────

impl InferenceClient {
    pub fn new(base_url: String, api_key: String, max_tokens: u32) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest client");
        Self {
            http,
            base_url,
            api_key,
            max_tokens,
        }
    }

    /// Run a chat completion and return the assistant's reply text.
    pub async fn chat_completion(
        &self,
        model: &str,
        system: Option<&str>,
        turns: &[ChatTurn],
    ) -> Result<String, AppError> {
        let request_body = ChatCompletionRequest {
            model,
            max_tokens: self.max_tokens,
            messages: build_messages(system, turns),
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| AppError::Inference(format!("Chat completion request failed: {}", e)))?;

        let parsed: ChatCompletionResponse = check_response_json(response).await?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| AppError::Inference("Chat completion returned no choices".to_string()))
    }

    /// Generate an image and return its URL.
    pub async fn generate_image(
        &self,
        model: &str,
        prompt: &str,
        size: &str,
    ) -> Result<String, AppError> {
        let request_body = ImageGenerationRequest {
            model,
            prompt,
            n: 1,
            size,
        };

        let response = self
            .http
            .post(format!("{}/images/generations", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| AppError::Inference(format!("Image generation request failed: {}", e)))?;

        let parsed: ImageGenerationResponse = check_response_json(response).await?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|image| image.url)
            .ok_or_else(|| AppError::Inference("Image generation returned no images".to_string()))
    }
}

/// Check response status and parse the JSON body.
async fn check_response_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, AppError> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status.as_u16() == 429 {
            tracing::warn!("Inference API rate limit hit (429)");
            return Err(AppError::Inference("Rate limited by inference API".to_string()));
        }

        if status.is_server_error() {
            return Err(AppError::Inference(format!(
                "Inference API unavailable: HTTP {}",
                status
            )));
        }

        return Err(AppError::Inference(format!("HTTP {}: {}", status, body)));
    }

    response
        .json()
        .await
        .map_err(|e| AppError::Inference(format!("JSON parse error: {}", e)))
}
