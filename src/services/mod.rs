// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod history;
pub mod identity;
pub mod inference;
pub mod ledger;
pub mod oauth;

pub use history::ChatHistory;
pub use identity::derive_key;
pub use inference::InferenceClient;
pub use ledger::{LedgerService, Plan, PREMIUM_FEATURE};
pub use oauth::OAuthClient;
