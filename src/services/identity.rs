// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity key derivation for OAuth accounts.
//!
//! Every account is keyed by `<externalId>@<provider>` so the same person
//! arriving via Google and GitHub gets two distinct ledger accounts, and two
//! providers reusing the same numeric ID can never collide.

use crate::error::AppError;

/// Derive the canonical account key from an OAuth identity.
///
/// Both parts are trimmed; an empty external ID or provider after trimming
/// is rejected rather than silently producing keys like `"@google"`.
pub fn derive_key(external_id: &str, provider: &str) -> Result<String, AppError> {
    let external_id = external_id.trim();
    let provider = provider.trim();

    if external_id.is_empty() {
        return Err(AppError::InvalidIdentity(
            "OAuth profile has an empty subject ID".to_string(),
        ));
    }
    if provider.is_empty() {
        return Err(AppError::InvalidIdentity(
            "OAuth provider name is empty".to_string(),
        ));
    }

    Ok(format!("{}@{}", external_id, provider))
}
