// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod history;
pub mod user;

pub use history::ChatTurn;
pub use user::UserAccount;
