// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GoldenChat API Server
//!
//! Signs users in via OAuth, tracks per-user golden balances, and proxies
//! chat/image/code/translation requests to an external inference API.

use goldenchat::{
    config::Config,
    services::{ChatHistory, InferenceClient, LedgerService, OAuthClient},
    store::UserStore,
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Environment-driven configuration, plus .env in development
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting GoldenChat API");

    // Open the user store (hard failure on a damaged document)
    let store = UserStore::open(&config.store_path).expect("Failed to open user store");

    // Per-user mutation locks, shared across all LedgerService clones
    let ledger_locks = Arc::new(dashmap::DashMap::new());
    let ledger = LedgerService::new(store.clone(), ledger_locks, config.signup_bonus);

    // Inference client (30s budget, single attempt)
    let inference = InferenceClient::new(
        config.inference_api_base.clone(),
        config.inference_api_key.clone(),
        config.max_tokens,
    );
    tracing::info!(
        api_base = %config.inference_api_base,
        standard_model = %config.standard_model,
        premium_model = %config.premium_model,
        "Inference client initialized"
    );

    // OAuth token exchange client
    let oauth = OAuthClient::new();

    // In-process chat history rings
    let history = ChatHistory::new();

    // Shared state handed to every handler
    let state = Arc::new(AppState {
        config: config.clone(),
        store,
        ledger,
        oauth,
        inference,
        history,
    });

    let app = goldenchat::routes::create_router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging, with env-filter overrides.
fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("goldenchat=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_target(false)
                .with_current_span(true)
                .flatten_event(true),
        )
        .init();
}
