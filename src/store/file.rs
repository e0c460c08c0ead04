// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! File-backed user store with typed operations.
//!
//! The whole user map lives in memory behind an `RwLock`; the JSON document
//! on disk is only ever a committed snapshot of it. Writes go
//! clone → persist → commit, so a failed file write leaves both the map and
//! the document on the previous state. Callers that need read-modify-write
//! atomicity per user key serialize above this layer (see the ledger's
//! per-key locks).

use crate::error::AppError;
use crate::models::UserAccount;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// On-disk document layout: `{ "users": { "<externalId>@<provider>": {...} } }`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreState {
    #[serde(default)]
    users: HashMap<String, UserAccount>,
}

/// In-memory user store with optional JSON file persistence.
#[derive(Clone)]
pub struct UserStore {
    state: Arc<RwLock<StoreState>>,
    path: Option<PathBuf>,
}

impl UserStore {
    /// Open the store backed by the JSON document at `path`.
    ///
    /// A missing file is a clean first boot (empty store). An unreadable or
    /// unparseable file is an error: booting a credit ledger with an empty
    /// map and persisting over the damaged document would destroy balances.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let path = path.into();
        let state = load_state(&path)?;

        tracing::info!(
            path = %path.display(),
            users = state.users.len(),
            "User store loaded"
        );

        Ok(Self {
            state: Arc::new(RwLock::new(state)),
            path: Some(path),
        })
    }

    /// Create an ephemeral in-memory store (no file persistence). For tests.
    pub fn in_memory() -> Self {
        Self {
            state: Arc::new(RwLock::new(StoreState::default())),
            path: None,
        }
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user account by its identity key.
    pub async fn get_user(&self, key: &str) -> Option<UserAccount> {
        self.state.read().await.users.get(key).cloned()
    }

    /// Number of stored accounts.
    pub async fn user_count(&self) -> usize {
        self.state.read().await.users.len()
    }

    /// Create or replace a user account and persist the new snapshot.
    ///
    /// Memory is only updated after the file write succeeds, so failure
    /// leaves no partially applied state on either side.
    pub async fn upsert_user(&self, user: &UserAccount) -> Result<(), AppError> {
        let mut state = self.state.write().await;

        let mut next = state.clone();
        next.users.insert(user.key.clone(), user.clone());

        self.persist(&next).await?;
        *state = next;
        Ok(())
    }

    // ─── Persistence ─────────────────────────────────────────────

    /// Write a snapshot to disk via a temp file and atomic rename.
    async fn persist(&self, snapshot: &StoreState) -> Result<(), AppError> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    AppError::Store(format!(
                        "failed to prepare store directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let payload = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| AppError::Store(format!("failed to encode user store: {}", e)))?;

        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, payload).await.map_err(|e| {
            AppError::Store(format!(
                "failed to write user store {}: {}",
                temp_path.display(),
                e
            ))
        })?;

        tokio::fs::rename(&temp_path, path).await.map_err(|e| {
            AppError::Store(format!(
                "failed to finalize user store {}: {}",
                path.display(),
                e
            ))
        })?;

        Ok(())
    }
}

/// Load the store document, treating a missing file as an empty store.
fn load_state(path: &Path) -> Result<StoreState, AppError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "No user store document yet, starting empty");
            return Ok(StoreState::default());
        }
        Err(e) => {
            return Err(AppError::Store(format!(
                "failed to read user store {}: {}",
                path.display(),
                e
            )))
        }
    };

    serde_json::from_str(&raw).map_err(|e| {
        AppError::Store(format!(
            "failed to parse user store {}: {}",
            path.display(),
            e
        ))
    })
}
