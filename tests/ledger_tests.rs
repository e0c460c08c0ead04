// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Concurrency tests for the golden-balance ledger.
//!
//! These tests reproduce the lost-update race: if the balance were read
//! outside the per-key critical section, two concurrent unlocks could read
//! the same starting balance, both debit it, and one debit would vanish on
//! the write-back.

use goldenchat::error::AppError;
use goldenchat::models::UserAccount;
use goldenchat::services::LedgerService;
use goldenchat::store::UserStore;
use goldenchat::time_utils;
use std::collections::HashMap;
use std::sync::Arc;

const NUM_CONCURRENT_UNLOCKS: u64 = 10;
const UNLOCK_COST: u64 = 10;

fn test_ledger() -> (LedgerService, UserStore) {
    let store = UserStore::in_memory();
    let locks = Arc::new(dashmap::DashMap::new());
    let ledger = LedgerService::new(store.clone(), locks, 100);
    (ledger, store)
}

async fn seed_account(store: &UserStore, key: &str, balance: u64) {
    let account = UserAccount {
        key: key.to_string(),
        display_name: "Race Condition".to_string(),
        email: "race@example.com".to_string(),
        golden_balance: balance,
        subscriptions: HashMap::new(),
        created_at: time_utils::format_utc_rfc3339(chrono::Utc::now()),
    };
    store
        .upsert_user(&account)
        .await
        .expect("Failed to seed account");
}

#[tokio::test]
async fn test_concurrent_unlocks_lose_no_debits() {
    let (ledger, store) = test_ledger();
    seed_account(&store, "race@google", NUM_CONCURRENT_UNLOCKS * UNLOCK_COST).await;

    let mut handles = vec![];
    for i in 0..NUM_CONCURRENT_UNLOCKS {
        let ledger = ledger.clone();
        handles.push(tokio::spawn(async move {
            let feature = format!("feature-{}", i);
            ledger
                .unlock_feature("race@google", &feature, UNLOCK_COST)
                .await
        }));
    }

    // Wait for all
    for handle in handles {
        handle.await.expect("Task join failed").expect("Unlock failed");
    }

    assert_eq!(
        ledger.get_balance("race@google").await,
        0,
        "Balance mismatch: a concurrent debit was lost"
    );

    let account = store
        .get_user("race@google")
        .await
        .expect("Account should exist");
    assert_eq!(
        account.subscriptions.len(),
        NUM_CONCURRENT_UNLOCKS as usize,
        "Every successful unlock should have recorded its subscription"
    );
}

#[tokio::test]
async fn test_concurrent_unlocks_against_partial_balance() {
    // 10 attempts at cost 25 against a balance of 100: exactly 4 can
    // succeed, whichever order the tasks run in.
    let (ledger, store) = test_ledger();
    seed_account(&store, "contended@google", 100).await;

    let mut handles = vec![];
    for i in 0..10u64 {
        let ledger = ledger.clone();
        handles.push(tokio::spawn(async move {
            let feature = format!("feature-{}", i);
            ledger.unlock_feature("contended@google", &feature, 25).await
        }));
    }

    let mut successes = 0;
    let mut rejections = 0;
    for handle in handles {
        match handle.await.expect("Task join failed") {
            Ok(_) => successes += 1,
            Err(AppError::InsufficientBalance { .. }) => rejections += 1,
            Err(other) => panic!("Unexpected unlock error: {}", other),
        }
    }

    assert_eq!(successes, 4);
    assert_eq!(rejections, 6);
    assert_eq!(ledger.get_balance("contended@google").await, 0);

    let account = store
        .get_user("contended@google")
        .await
        .expect("Account should exist");
    assert_eq!(account.subscriptions.len(), 4);
}

#[tokio::test]
async fn test_concurrent_first_logins_grant_bonus_once() {
    // Two sessions completing the login callback at the same time must not
    // both take the account-creation path.
    let (ledger, store) = test_ledger();

    let mut handles = vec![];
    for _ in 0..5 {
        let ledger = ledger.clone();
        handles.push(tokio::spawn(async move {
            ledger
                .get_or_create_account("new@github", "Grace", "grace@example.com")
                .await
        }));
    }

    for handle in handles {
        handle.await.expect("Task join failed").expect("Login failed");
    }

    assert_eq!(store.user_count().await, 1);
    assert_eq!(
        ledger.get_balance("new@github").await,
        100,
        "Signup bonus granted more than once"
    );
}

#[tokio::test]
async fn test_unlocks_on_distinct_accounts_run_independently() {
    let (ledger, store) = test_ledger();
    for i in 0..4u64 {
        seed_account(&store, &format!("user-{}@google", i), 50).await;
    }

    let mut handles = vec![];
    for i in 0..4u64 {
        let ledger = ledger.clone();
        handles.push(tokio::spawn(async move {
            let key = format!("user-{}@google", i);
            ledger.unlock_feature(&key, "turbo", 20).await
        }));
    }

    for handle in handles {
        let new_balance = handle.await.expect("Task join failed").expect("Unlock failed");
        assert_eq!(new_balance, 30);
    }
}

#[tokio::test]
async fn test_unlock_expiry_is_thirty_days_out() {
    let (ledger, store) = test_ledger();
    seed_account(&store, "ada@google", 100).await;

    ledger
        .unlock_feature("ada@google", "premium", 50)
        .await
        .expect("Unlock failed");

    assert!(ledger.is_premium("ada@google").await);

    let account = store
        .get_user("ada@google")
        .await
        .expect("Account should exist");
    let expiry = account
        .subscriptions
        .get("premium")
        .expect("Subscription should be recorded");
    let expires_at = time_utils::parse_rfc3339(expiry).expect("Expiry should be RFC3339");

    let days_out = (expires_at - chrono::Utc::now()).num_days();
    assert!(
        (29..=30).contains(&days_out),
        "Expiry should be ~30 days out, got {} days",
        days_out
    );

    // A repeat unlock debits again and restarts the window from now, not
    // from the old expiry. The stored stamp has second precision, so step
    // past a tick boundary before the second unlock.
    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

    let new_balance = ledger
        .unlock_feature("ada@google", "premium", 50)
        .await
        .expect("Repeat unlock failed");
    assert_eq!(new_balance, 0, "Repeat unlock should debit again");

    let account = store
        .get_user("ada@google")
        .await
        .expect("Account should exist");
    let renewed = account
        .subscriptions
        .get("premium")
        .expect("Subscription should still be recorded");
    let renewed_at = time_utils::parse_rfc3339(renewed).expect("Expiry should be RFC3339");

    assert!(
        renewed_at > expires_at,
        "Repeat unlock should move the expiry forward, got {} then {}",
        expires_at,
        renewed_at
    );
    let days_out = (renewed_at - chrono::Utc::now()).num_days();
    assert!(
        (29..=30).contains(&days_out),
        "Renewed expiry should be ~30 days out, got {} days",
        days_out
    );
}
