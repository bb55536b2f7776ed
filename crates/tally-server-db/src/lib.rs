// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Database layer for the Tally server.
//!
//! All state lives in SQLite behind repository structs that own a cloned
//! [`sqlx::SqlitePool`]. The ledger repository is the only writer of
//! balances and ledger entries; every balance mutation and its log append
//! happen inside one transaction.

pub mod api_key;
pub mod error;
pub mod ledger;
pub mod migrations;
pub mod pool;
pub mod testing;
pub mod user;

pub use api_key::{ApiKey, ApiKeyRepository, ApiKeyStore};
pub use error::DbError;
pub use ledger::{LedgerEntry, LedgerRepository, LedgerStore, SortOrder};
pub use migrations::run_migrations;
pub use pool::create_pool;
pub use user::{User, UserRepository, UserStore};
