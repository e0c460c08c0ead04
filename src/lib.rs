// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! GoldenChat: OAuth login, a golden-balance ledger, and an inference gateway
//!
//! This crate provides the backend API that signs users in via third-party
//! OAuth providers, tracks their spendable golden balance, and proxies
//! generation requests to an external inference API.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod time_utils;

use config::Config;
use services::{ChatHistory, InferenceClient, LedgerService, OAuthClient};
use store::UserStore;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: UserStore,
    pub ledger: LedgerService,
    pub oauth: OAuthClient,
    pub inference: InferenceClient,
    pub history: ChatHistory,
}
