// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use goldenchat::config::Config;
use goldenchat::models::UserAccount;
use goldenchat::routes::create_router;
use goldenchat::services::{ChatHistory, InferenceClient, LedgerService, OAuthClient};
use goldenchat::store::UserStore;
use goldenchat::AppState;
use std::collections::HashMap;
use std::sync::Arc;

/// Create a test app backed by an in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let store = UserStore::in_memory();

    let ledger_locks = Arc::new(dashmap::DashMap::new());
    let ledger = LedgerService::new(store.clone(), ledger_locks, config.signup_bonus);
    let inference = InferenceClient::new(
        config.inference_api_base.clone(),
        config.inference_api_key.clone(),
        config.max_tokens,
    );
    let oauth = OAuthClient::new();
    let history = ChatHistory::new();

    let state = Arc::new(AppState {
        config,
        store,
        ledger,
        oauth,
        inference,
        history,
    });

    (create_router(state.clone()), state)
}

/// Create a signed session token for the given user key.
#[allow(dead_code)]
pub fn create_test_jwt(user_key: &str, signing_key: &[u8]) -> String {
    goldenchat::middleware::auth::create_jwt(user_key, signing_key)
        .expect("Failed to create JWT")
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    serde_json::from_slice(&bytes).expect("Response body should be JSON")
}

/// Insert an account directly into the store, bypassing the login flow.
#[allow(dead_code)]
pub async fn seed_account(state: &AppState, key: &str, balance: u64) -> UserAccount {
    let account = UserAccount {
        key: key.to_string(),
        display_name: "Test User".to_string(),
        email: "test@example.com".to_string(),
        golden_balance: balance,
        subscriptions: HashMap::new(),
        created_at: "2026-01-01T00:00:00Z".to_string(),
    };
    state
        .store
        .upsert_user(&account)
        .await
        .expect("Failed to seed account");
    account
}
