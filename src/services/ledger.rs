// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Golden-balance ledger and feature subscriptions.
//!
//! The only component allowed to mutate `golden_balance` or `subscriptions`.
//! Every mutation holds a per-key mutex across read → check → write, so
//! concurrent unlocks for the same account serialize (no lost debits) while
//! distinct accounts proceed in parallel.

use crate::error::AppError;
use crate::models::UserAccount;
use crate::store::UserStore;
use crate::time_utils;
use chrono::{Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// How long a feature unlock stays active (30 days from purchase).
const UNLOCK_DURATION_DAYS: i64 = 30;

/// Feature name whose active subscription marks an account as premium.
pub const PREMIUM_FEATURE: &str = "premium";

/// Shared per-key mutation locks type for use in AppState.
pub type LedgerLocks = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// Pricing plan requested on a generation call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Standard,
    Premium,
}

/// Gate for the paid inference path: a premium-plan request requires an
/// active premium subscription.
pub fn require_premium(requested_plan: Plan, user_is_premium: bool) -> Result<(), AppError> {
    if requested_plan == Plan::Premium && !user_is_premium {
        return Err(AppError::PremiumRequired);
    }
    Ok(())
}

/// Credit ledger over the user store.
#[derive(Clone)]
pub struct LedgerService {
    store: UserStore,
    /// Per-user mutex to serialize balance mutations.
    locks: LedgerLocks,
    /// Golden units granted to a freshly created account.
    signup_bonus: u64,
}

impl LedgerService {
    /// Create a ledger over `store`.
    ///
    /// The `locks` map should be shared across all `LedgerService` clones so
    /// per-key serialization holds process-wide.
    pub fn new(store: UserStore, locks: LedgerLocks, signup_bonus: u64) -> Self {
        Self {
            store,
            locks,
            signup_bonus,
        }
    }

    // ─── Reads ───────────────────────────────────────────────────

    /// Spendable balance for a user key. Unknown keys read as zero.
    pub async fn get_balance(&self, user_key: &str) -> u64 {
        self.store
            .get_user(user_key)
            .await
            .map(|user| user.golden_balance)
            .unwrap_or(0)
    }

    /// Whether a feature subscription exists and has not yet expired.
    ///
    /// Unlocks grant a 30-day window, so the stored expiry is compared to
    /// the current time. An expiry we cannot parse grants nothing.
    pub async fn is_feature_active(&self, user_key: &str, feature: &str) -> bool {
        let Some(user) = self.store.get_user(user_key).await else {
            return false;
        };
        let Some(expiry) = user.subscriptions.get(feature) else {
            return false;
        };

        match time_utils::parse_rfc3339(expiry) {
            Some(expires_at) => expires_at > Utc::now(),
            None => {
                tracing::warn!(
                    user_key,
                    feature,
                    expiry = %expiry,
                    "Subscription expiry is not a valid timestamp, treating as inactive"
                );
                false
            }
        }
    }

    /// Whether the account holds an active premium subscription.
    pub async fn is_premium(&self, user_key: &str) -> bool {
        self.is_feature_active(user_key, PREMIUM_FEATURE).await
    }

    // ─── Mutations ───────────────────────────────────────────────

    /// Debit `cost` and grant `feature` for the next 30 days.
    ///
    /// Fails with `InsufficientBalance` (and no mutation) when the balance
    /// cannot cover the cost. Re-unlocking an existing feature debits again
    /// and restarts the expiry window. Returns the new balance.
    pub async fn unlock_feature(
        &self,
        user_key: &str,
        feature: &str,
        cost: u64,
    ) -> Result<u64, AppError> {
        let lock = self.mutation_lock(user_key);
        let _guard = lock.lock().await;

        let Some(mut user) = self.store.get_user(user_key).await else {
            // Unknown keys read as zero balance. A zero-cost unlock still
            // has no account to attach the subscription to.
            if cost > 0 {
                return Err(AppError::InsufficientBalance { balance: 0, cost });
            }
            return Err(AppError::NotFound(format!("account {}", user_key)));
        };

        let new_balance =
            user.golden_balance
                .checked_sub(cost)
                .ok_or(AppError::InsufficientBalance {
                    balance: user.golden_balance,
                    cost,
                })?;

        let expires_at = Utc::now() + Duration::days(UNLOCK_DURATION_DAYS);
        user.golden_balance = new_balance;
        user.subscriptions
            .insert(feature.to_string(), time_utils::format_utc_rfc3339(expires_at));

        self.store.upsert_user(&user).await?;

        tracing::info!(user_key, feature, cost, new_balance, "Feature unlocked");
        Ok(new_balance)
    }

    /// Add golden units to an existing account. Returns the new balance.
    pub async fn credit(&self, user_key: &str, amount: u64) -> Result<u64, AppError> {
        let lock = self.mutation_lock(user_key);
        let _guard = lock.lock().await;

        let mut user = self
            .store
            .get_user(user_key)
            .await
            .ok_or_else(|| AppError::NotFound(format!("account {}", user_key)))?;

        user.golden_balance = user.golden_balance.saturating_add(amount);
        self.store.upsert_user(&user).await?;

        tracing::info!(
            user_key,
            amount,
            new_balance = user.golden_balance,
            "Balance credited"
        );
        Ok(user.golden_balance)
    }

    /// Fetch the account for `user_key`, creating it on first login.
    ///
    /// A fresh account starts with the signup bonus. An existing account only
    /// has its profile fields refreshed; balance and subscriptions are never
    /// touched here (first login wins the record).
    pub async fn get_or_create_account(
        &self,
        user_key: &str,
        display_name: &str,
        email: &str,
    ) -> Result<UserAccount, AppError> {
        let lock = self.mutation_lock(user_key);
        let _guard = lock.lock().await;

        if let Some(mut user) = self.store.get_user(user_key).await {
            if user.display_name != display_name || user.email != email {
                user.display_name = display_name.to_string();
                user.email = email.to_string();
                self.store.upsert_user(&user).await?;
            }
            return Ok(user);
        }

        let user = UserAccount {
            key: user_key.to_string(),
            display_name: display_name.to_string(),
            email: email.to_string(),
            golden_balance: self.signup_bonus,
            subscriptions: HashMap::new(),
            created_at: time_utils::format_utc_rfc3339(Utc::now()),
        };

        self.store.upsert_user(&user).await?;

        tracing::info!(
            user_key,
            signup_bonus = self.signup_bonus,
            "Account created on first login"
        );
        Ok(user)
    }

    /// Per-key mutex, created on first use and shared thereafter.
    fn mutation_lock(&self, user_key: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(user_key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
