// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared test fixtures for repository tests.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use tally_server_auth::UserId;

use crate::migrations::run_migrations;

/// In-memory pool pinned to a single connection so every query sees the
/// same database.
pub async fn create_test_pool() -> SqlitePool {
	let options = SqliteConnectOptions::from_str(":memory:")
		.unwrap()
		.create_if_missing(true);

	SqlitePoolOptions::new()
		.max_connections(1)
		.connect_with(options)
		.await
		.expect("Failed to create test pool")
}

/// In-memory pool with the full schema applied.
pub async fn create_migrated_test_pool() -> SqlitePool {
	let pool = create_test_pool().await;
	run_migrations(&pool).await.unwrap();
	pool
}

/// File-backed pool with multiple connections, for tests that exercise
/// concurrent writers. WAL mode plus a busy timeout so contending
/// transactions queue instead of erroring.
pub async fn create_file_test_pool(path: &Path) -> SqlitePool {
	let options = SqliteConnectOptions::new()
		.filename(path)
		.journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
		.busy_timeout(Duration::from_secs(5))
		.create_if_missing(true);

	let pool = SqlitePoolOptions::new()
		.max_connections(4)
		.connect_with(options)
		.await
		.expect("Failed to create file-backed test pool");
	run_migrations(&pool).await.unwrap();
	pool
}

/// Insert a bare user row with a zero balance and return its id.
pub async fn insert_test_user(pool: &SqlitePool, email: &str) -> UserId {
	let id = UserId::generate();
	let now = chrono::Utc::now().to_rfc3339();
	sqlx::query(
		"INSERT INTO users (id, email, password_hash, token_balance, created_at, updated_at)
		 VALUES (?, ?, 'test-hash', 0, ?, ?)",
	)
	.bind(id.to_string())
	.bind(email)
	.bind(&now)
	.bind(&now)
	.execute(pool)
	.await
	.unwrap();
	id
}
