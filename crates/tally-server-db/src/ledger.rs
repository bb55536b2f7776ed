// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Token ledger repository: account balances plus their append-only
//! transaction log.
//!
//! Every balance mutation and its log append execute inside a single
//! transaction; either both land or neither does. The balance check in
//! [`LedgerRepository::deduct`] is part of the conditional UPDATE itself,
//! so concurrent deductions against one account serialize on the store's
//! write lock and can never jointly drive a balance negative.
//!
//! The repository holds no state beyond the pool; balances are never
//! cached across calls.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqlitePool, Row};

use tally_server_auth::{EntryId, EntryKind, UserId};

use crate::error::DbError;

/// One immutable record of a balance change.
///
/// `amount` is signed: negative for deductions, positive for credits.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LedgerEntry {
	pub id: EntryId,
	pub user_id: UserId,
	pub amount: i64,
	pub kind: EntryKind,
	pub description: Option<String>,
	pub created_at: DateTime<Utc>,
}

/// Chronological ordering for ledger history queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
	Ascending,
	Descending,
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
	async fn balance(&self, user_id: &UserId) -> Result<i64, DbError>;
	async fn deduct(
		&self,
		user_id: &UserId,
		amount: i64,
		description: &str,
	) -> Result<i64, DbError>;
	async fn credit(
		&self,
		user_id: &UserId,
		amount: i64,
		kind: EntryKind,
		description: &str,
	) -> Result<i64, DbError>;
	async fn entries(&self, user_id: &UserId, order: SortOrder)
		-> Result<Vec<LedgerEntry>, DbError>;
	async fn entry_total(&self, user_id: &UserId) -> Result<i64, DbError>;
}

#[async_trait]
impl LedgerStore for LedgerRepository {
	async fn balance(&self, user_id: &UserId) -> Result<i64, DbError> {
		self.balance(user_id).await
	}

	async fn deduct(
		&self,
		user_id: &UserId,
		amount: i64,
		description: &str,
	) -> Result<i64, DbError> {
		self.deduct(user_id, amount, description).await
	}

	async fn credit(
		&self,
		user_id: &UserId,
		amount: i64,
		kind: EntryKind,
		description: &str,
	) -> Result<i64, DbError> {
		self.credit(user_id, amount, kind, description).await
	}

	async fn entries(
		&self,
		user_id: &UserId,
		order: SortOrder,
	) -> Result<Vec<LedgerEntry>, DbError> {
		self.entries(user_id, order).await
	}

	async fn entry_total(&self, user_id: &UserId) -> Result<i64, DbError> {
		self.entry_total(user_id).await
	}
}

/// Repository mediating all balance reads and mutations.
#[derive(Clone)]
pub struct LedgerRepository {
	pool: SqlitePool,
}

impl LedgerRepository {
	/// Create a new ledger repository with the given pool.
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Current token balance for an account.
	///
	/// Soft-deleted accounts still report their balance; an unknown id is
	/// `DbError::AccountNotFound`.
	#[tracing::instrument(skip(self), fields(user_id = %user_id))]
	pub async fn balance(&self, user_id: &UserId) -> Result<i64, DbError> {
		let row = sqlx::query("SELECT token_balance FROM users WHERE id = ?")
			.bind(user_id.to_string())
			.fetch_optional(&self.pool)
			.await?;

		match row {
			Some(row) => Ok(row.get("token_balance")),
			None => Err(DbError::AccountNotFound(user_id.to_string())),
		}
	}

	/// Atomically deduct `amount` tokens and append the matching entry.
	///
	/// The conditional UPDATE checks `token_balance >= amount` in the same
	/// statement that subtracts, so the check-then-act cannot be split by a
	/// concurrent writer. A missing account and an insufficient balance are
	/// deliberately indistinguishable.
	///
	/// # Returns
	/// The balance after the deduction.
	#[tracing::instrument(skip(self), fields(user_id = %user_id, amount))]
	pub async fn deduct(
		&self,
		user_id: &UserId,
		amount: i64,
		description: &str,
	) -> Result<i64, DbError> {
		if amount <= 0 {
			return Err(DbError::InvalidAmount(amount));
		}

		let mut tx = self.pool.begin().await?;

		let result = sqlx::query(
			r#"
			UPDATE users
			SET token_balance = token_balance - ?1
			WHERE id = ?2 AND token_balance >= ?1
			"#,
		)
		.bind(amount)
		.bind(user_id.to_string())
		.execute(&mut *tx)
		.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::InsufficientBalance);
		}

		let new_balance: i64 = sqlx::query_scalar("SELECT token_balance FROM users WHERE id = ?")
			.bind(user_id.to_string())
			.fetch_one(&mut *tx)
			.await?;

		append_entry(&mut tx, user_id, -amount, EntryKind::Deduction, description).await?;

		tx.commit().await?;

		tracing::debug!(user_id = %user_id, amount, new_balance, "tokens deducted");
		Ok(new_balance)
	}

	/// Atomically credit `amount` tokens and append the matching entry.
	///
	/// # Arguments
	/// * `kind` - `EntryKind::Purchase` for paid top-ups, `EntryKind::Grant`
	///   for system-issued tokens
	///
	/// # Returns
	/// The balance after the credit.
	#[tracing::instrument(skip(self), fields(user_id = %user_id, amount, kind = %kind))]
	pub async fn credit(
		&self,
		user_id: &UserId,
		amount: i64,
		kind: EntryKind,
		description: &str,
	) -> Result<i64, DbError> {
		if amount <= 0 {
			return Err(DbError::InvalidAmount(amount));
		}

		let mut tx = self.pool.begin().await?;

		let result = sqlx::query(
			r#"
			UPDATE users
			SET token_balance = token_balance + ?1
			WHERE id = ?2
			"#,
		)
		.bind(amount)
		.bind(user_id.to_string())
		.execute(&mut *tx)
		.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::AccountNotFound(user_id.to_string()));
		}

		let new_balance: i64 = sqlx::query_scalar("SELECT token_balance FROM users WHERE id = ?")
			.bind(user_id.to_string())
			.fetch_one(&mut *tx)
			.await?;

		append_entry(&mut tx, user_id, amount, kind, description).await?;

		tx.commit().await?;

		tracing::debug!(user_id = %user_id, amount, new_balance, "tokens credited");
		Ok(new_balance)
	}

	/// Full transaction history for an account.
	///
	/// Each call queries a fresh snapshot; entries are immutable once
	/// written so re-reads are always consistent.
	#[tracing::instrument(skip(self), fields(user_id = %user_id))]
	pub async fn entries(
		&self,
		user_id: &UserId,
		order: SortOrder,
	) -> Result<Vec<LedgerEntry>, DbError> {
		let sql = match order {
			SortOrder::Ascending => {
				r#"
				SELECT id, user_id, amount, kind, description, created_at
				FROM ledger_entries
				WHERE user_id = ?
				ORDER BY created_at ASC, rowid ASC
				"#
			}
			SortOrder::Descending => {
				r#"
				SELECT id, user_id, amount, kind, description, created_at
				FROM ledger_entries
				WHERE user_id = ?
				ORDER BY created_at DESC, rowid DESC
				"#
			}
		};

		let rows = sqlx::query(sql)
			.bind(user_id.to_string())
			.fetch_all(&self.pool)
			.await?;

		let mut entries = Vec::with_capacity(rows.len());
		for row in rows {
			entries.push(parse_entry_row(&row)?);
		}
		tracing::debug!(user_id = %user_id, count = entries.len(), "listed ledger entries");
		Ok(entries)
	}

	/// Sum of all entry amounts for an account.
	///
	/// For a consistent store this equals the account's current balance;
	/// exposed for audit checks and tests.
	#[tracing::instrument(skip(self), fields(user_id = %user_id))]
	pub async fn entry_total(&self, user_id: &UserId) -> Result<i64, DbError> {
		let total: i64 = sqlx::query_scalar(
			"SELECT COALESCE(SUM(amount), 0) FROM ledger_entries WHERE user_id = ?",
		)
		.bind(user_id.to_string())
		.fetch_one(&self.pool)
		.await?;
		Ok(total)
	}
}

/// Append one entry inside the caller's transaction. Never exposed
/// outside this module; the log is only written alongside a balance
/// mutation.
async fn append_entry(
	tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
	user_id: &UserId,
	amount: i64,
	kind: EntryKind,
	description: &str,
) -> Result<(), DbError> {
	let id = EntryId::generate();
	let now = Utc::now();

	sqlx::query(
		r#"
		INSERT INTO ledger_entries (id, user_id, amount, kind, description, created_at)
		VALUES (?, ?, ?, ?, ?, ?)
		"#,
	)
	.bind(id.to_string())
	.bind(user_id.to_string())
	.bind(amount)
	.bind(kind.as_str())
	.bind(description)
	.bind(now.to_rfc3339())
	.execute(&mut **tx)
	.await?;

	Ok(())
}

fn parse_entry_row(row: &sqlx::sqlite::SqliteRow) -> Result<LedgerEntry, DbError> {
	let id_str: String = row.get("id");
	let user_id_str: String = row.get("user_id");
	let amount: i64 = row.get("amount");
	let kind_str: String = row.get("kind");
	let description: Option<String> = row.get("description");
	let created_at_str: String = row.get("created_at");

	let id = uuid::Uuid::parse_str(&id_str)
		.map(EntryId::new)
		.map_err(|e| DbError::Internal(format!("Invalid entry id UUID: {e}")))?;
	let user_id = uuid::Uuid::parse_str(&user_id_str)
		.map(UserId::new)
		.map_err(|e| DbError::Internal(format!("Invalid user_id UUID: {e}")))?;

	let kind = EntryKind::parse(&kind_str)
		.ok_or_else(|| DbError::Internal(format!("Unknown entry kind: {kind_str}")))?;

	let created_at = DateTime::parse_from_rfc3339(&created_at_str)
		.map_err(|e| DbError::Internal(format!("Invalid created_at: {e}")))?
		.with_timezone(&Utc);

	Ok(LedgerEntry {
		id,
		user_id,
		amount,
		kind,
		description,
		created_at,
	})
}
