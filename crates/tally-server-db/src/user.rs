// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! User account repository.
//!
//! Accounts are soft-deleted: `deleted_at` is set and the row stays put,
//! balance included. Lookups used for authentication and profile updates
//! exclude deleted rows; lookup by id does not, because the ledger keeps
//! serving soft-deleted accounts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqlitePool, Row};
use uuid::Uuid;

use tally_server_auth::UserId;

use crate::error::DbError;

/// A user account and its token balance.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct User {
	pub id: UserId,
	pub name: Option<String>,
	pub email: String,
	/// PHC-format Argon2id hash; never expose in API responses.
	pub password_hash: String,
	pub token_balance: i64,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
	/// Returns true if this account has been soft-deleted.
	pub fn is_deleted(&self) -> bool {
		self.deleted_at.is_some()
	}
}

#[async_trait]
pub trait UserStore: Send + Sync {
	async fn create_user(
		&self,
		email: &str,
		password_hash: &str,
		name: Option<&str>,
	) -> Result<User, DbError>;
	async fn get_user_by_id(&self, id: &UserId) -> Result<Option<User>, DbError>;
	async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DbError>;
	async fn update_profile(
		&self,
		id: &UserId,
		name: Option<&str>,
		email: &str,
	) -> Result<bool, DbError>;
	async fn update_password(&self, id: &UserId, password_hash: &str) -> Result<bool, DbError>;
	async fn soft_delete_user(&self, id: &UserId) -> Result<bool, DbError>;
}

#[async_trait]
impl UserStore for UserRepository {
	async fn create_user(
		&self,
		email: &str,
		password_hash: &str,
		name: Option<&str>,
	) -> Result<User, DbError> {
		self.create_user(email, password_hash, name).await
	}

	async fn get_user_by_id(&self, id: &UserId) -> Result<Option<User>, DbError> {
		self.get_user_by_id(id).await
	}

	async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
		self.get_user_by_email(email).await
	}

	async fn update_profile(
		&self,
		id: &UserId,
		name: Option<&str>,
		email: &str,
	) -> Result<bool, DbError> {
		self.update_profile(id, name, email).await
	}

	async fn update_password(&self, id: &UserId, password_hash: &str) -> Result<bool, DbError> {
		self.update_password(id, password_hash).await
	}

	async fn soft_delete_user(&self, id: &UserId) -> Result<bool, DbError> {
		self.soft_delete_user(id).await
	}
}

/// Repository for user account database operations.
#[derive(Clone)]
pub struct UserRepository {
	pool: SqlitePool,
}

impl UserRepository {
	/// Create a new user repository with the given pool.
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Create a new account with a zero token balance.
	///
	/// The starting balance is granted separately through the ledger so
	/// that the transaction log accounts for every token from day one.
	///
	/// # Errors
	/// `DbError::Conflict` if a live account already uses this email.
	#[tracing::instrument(skip(self, password_hash), fields(email = %email))]
	pub async fn create_user(
		&self,
		email: &str,
		password_hash: &str,
		name: Option<&str>,
	) -> Result<User, DbError> {
		let id = UserId::generate();
		let now = Utc::now();

		let result = sqlx::query(
			r#"
			INSERT INTO users (id, name, email, password_hash, token_balance, created_at, updated_at)
			VALUES (?, ?, ?, ?, 0, ?, ?)
			"#,
		)
		.bind(id.to_string())
		.bind(name)
		.bind(email)
		.bind(password_hash)
		.bind(now.to_rfc3339())
		.bind(now.to_rfc3339())
		.execute(&self.pool)
		.await;

		match result {
			Ok(_) => {}
			Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
				return Err(DbError::Conflict(format!(
					"email already registered: {email}"
				)));
			}
			Err(e) => return Err(e.into()),
		}

		tracing::info!(user_id = %id, "user created");
		Ok(User {
			id,
			name: name.map(str::to_string),
			email: email.to_string(),
			password_hash: password_hash.to_string(),
			token_balance: 0,
			created_at: now,
			updated_at: now,
			deleted_at: None,
		})
	}

	/// Get an account by id, including soft-deleted rows.
	///
	/// Callers that must not see deleted accounts check
	/// [`User::is_deleted`].
	#[tracing::instrument(skip(self), fields(user_id = %id))]
	pub async fn get_user_by_id(&self, id: &UserId) -> Result<Option<User>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, name, email, password_hash, token_balance, created_at, updated_at, deleted_at
			FROM users
			WHERE id = ?
			"#,
		)
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		match row {
			Some(row) => Ok(Some(parse_user_row(&row)?)),
			None => Ok(None),
		}
	}

	/// Get a live account by email. Used on the credential path; deleted
	/// accounts cannot sign in.
	#[tracing::instrument(skip(self), fields(email = %email))]
	pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, name, email, password_hash, token_balance, created_at, updated_at, deleted_at
			FROM users
			WHERE email = ? AND deleted_at IS NULL
			"#,
		)
		.bind(email)
		.fetch_optional(&self.pool)
		.await?;

		match row {
			Some(row) => Ok(Some(parse_user_row(&row)?)),
			None => Ok(None),
		}
	}

	/// Update name and email of a live account.
	///
	/// # Returns
	/// `false` if the account is missing or deleted.
	#[tracing::instrument(skip(self), fields(user_id = %id))]
	pub async fn update_profile(
		&self,
		id: &UserId,
		name: Option<&str>,
		email: &str,
	) -> Result<bool, DbError> {
		let now = Utc::now();

		let result = sqlx::query(
			r#"
			UPDATE users
			SET name = ?, email = ?, updated_at = ?
			WHERE id = ? AND deleted_at IS NULL
			"#,
		)
		.bind(name)
		.bind(email)
		.bind(now.to_rfc3339())
		.bind(id.to_string())
		.execute(&self.pool)
		.await;

		match result {
			Ok(r) => Ok(r.rows_affected() > 0),
			Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(DbError::Conflict(
				format!("email already registered: {email}"),
			)),
			Err(e) => Err(e.into()),
		}
	}

	/// Replace the stored password hash of a live account.
	#[tracing::instrument(skip(self, password_hash), fields(user_id = %id))]
	pub async fn update_password(&self, id: &UserId, password_hash: &str) -> Result<bool, DbError> {
		let now = Utc::now();

		let result = sqlx::query(
			r#"
			UPDATE users
			SET password_hash = ?, updated_at = ?
			WHERE id = ? AND deleted_at IS NULL
			"#,
		)
		.bind(password_hash)
		.bind(now.to_rfc3339())
		.bind(id.to_string())
		.execute(&self.pool)
		.await?;

		Ok(result.rows_affected() > 0)
	}

	/// Soft-delete an account by stamping `deleted_at`.
	///
	/// The row, its balance, and its ledger entries are retained.
	///
	/// # Returns
	/// `false` if the account is missing or already deleted.
	#[tracing::instrument(skip(self), fields(user_id = %id))]
	pub async fn soft_delete_user(&self, id: &UserId) -> Result<bool, DbError> {
		let now = Utc::now();

		let result = sqlx::query(
			r#"
			UPDATE users
			SET deleted_at = ?, updated_at = ?
			WHERE id = ? AND deleted_at IS NULL
			"#,
		)
		.bind(now.to_rfc3339())
		.bind(now.to_rfc3339())
		.bind(id.to_string())
		.execute(&self.pool)
		.await?;

		let deleted = result.rows_affected() > 0;
		if deleted {
			tracing::info!(user_id = %id, "user soft-deleted");
		}
		Ok(deleted)
	}
}

fn parse_user_row(row: &sqlx::sqlite::SqliteRow) -> Result<User, DbError> {
	let id_str: String = row.get("id");
	let name: Option<String> = row.get("name");
	let email: String = row.get("email");
	let password_hash: String = row.get("password_hash");
	let token_balance: i64 = row.get("token_balance");
	let created_at_str: String = row.get("created_at");
	let updated_at_str: String = row.get("updated_at");
	let deleted_at_str: Option<String> = row.get("deleted_at");

	let id = Uuid::parse_str(&id_str)
		.map(UserId::new)
		.map_err(|e| DbError::Internal(format!("Invalid user id UUID: {e}")))?;

	let created_at = DateTime::parse_from_rfc3339(&created_at_str)
		.map_err(|e| DbError::Internal(format!("Invalid created_at: {e}")))?
		.with_timezone(&Utc);
	let updated_at = DateTime::parse_from_rfc3339(&updated_at_str)
		.map_err(|e| DbError::Internal(format!("Invalid updated_at: {e}")))?
		.with_timezone(&Utc);
	let deleted_at = deleted_at_str
		.map(|s| {
			DateTime::parse_from_rfc3339(&s)
				.map(|dt| dt.with_timezone(&Utc))
				.map_err(|e| DbError::Internal(format!("Invalid deleted_at: {e}")))
		})
		.transpose()?;

	Ok(User {
		id,
		name,
		email,
		password_hash,
		token_balance,
		created_at,
		updated_at,
		deleted_at,
	})
}
