// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

#[derive(Debug, thiserror::Error)]
pub enum DbError {
	#[error("Database error: {0}")]
	Sqlx(#[from] sqlx::Error),

	#[error("Account not found: {0}")]
	AccountNotFound(String),

	#[error("Insufficient balance")]
	InsufficientBalance,

	#[error("Invalid amount: {0}")]
	InvalidAmount(i64),

	#[error("Conflict: {0}")]
	Conflict(String),

	#[error("Serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	#[error("Internal: {0}")]
	Internal(String),
}

pub type Result<T> = std::result::Result<T, DbError>;
