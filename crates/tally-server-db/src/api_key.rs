// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! API key repository.
//!
//! Keys are account-scoped bearer credentials for non-interactive
//! callers. Only the SHA-256 hash of a key is stored; revocation flips
//! the status and stamps `revoked_at` without deleting the row, so the
//! audit trail survives.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqlitePool, Row};
use uuid::Uuid;

use tally_server_auth::{ApiKeyId, ApiKeyStatus, UserId};

use crate::error::DbError;

/// A stored API key record. Holds the hash, never the plaintext.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ApiKey {
	pub id: ApiKeyId,
	pub user_id: UserId,
	pub token_hash: String,
	pub status: ApiKeyStatus,
	pub created_at: DateTime<Utc>,
	pub last_used_at: Option<DateTime<Utc>>,
	pub revoked_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait ApiKeyStore: Send + Sync {
	async fn create_api_key(&self, user_id: &UserId, token_hash: &str) -> Result<ApiKey, DbError>;
	async fn find_active_by_hash(&self, token_hash: &str) -> Result<Option<ApiKey>, DbError>;
	async fn list_active_for_user(&self, user_id: &UserId) -> Result<Vec<ApiKey>, DbError>;
	async fn revoke_api_key(&self, user_id: &UserId, id: &ApiKeyId) -> Result<bool, DbError>;
	async fn touch_last_used(&self, id: &ApiKeyId) -> Result<(), DbError>;
}

#[async_trait]
impl ApiKeyStore for ApiKeyRepository {
	async fn create_api_key(&self, user_id: &UserId, token_hash: &str) -> Result<ApiKey, DbError> {
		self.create_api_key(user_id, token_hash).await
	}

	async fn find_active_by_hash(&self, token_hash: &str) -> Result<Option<ApiKey>, DbError> {
		self.find_active_by_hash(token_hash).await
	}

	async fn list_active_for_user(&self, user_id: &UserId) -> Result<Vec<ApiKey>, DbError> {
		self.list_active_for_user(user_id).await
	}

	async fn revoke_api_key(&self, user_id: &UserId, id: &ApiKeyId) -> Result<bool, DbError> {
		self.revoke_api_key(user_id, id).await
	}

	async fn touch_last_used(&self, id: &ApiKeyId) -> Result<(), DbError> {
		self.touch_last_used(id).await
	}
}

/// Repository for API key database operations.
#[derive(Clone)]
pub struct ApiKeyRepository {
	pool: SqlitePool,
}

impl ApiKeyRepository {
	/// Create a new API key repository with the given pool.
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Store a freshly issued key in `active` status.
	///
	/// # Arguments
	/// * `token_hash` - SHA-256 hash of the plaintext key (never store
	///   plaintext)
	#[tracing::instrument(skip(self, token_hash), fields(user_id = %user_id))]
	pub async fn create_api_key(
		&self,
		user_id: &UserId,
		token_hash: &str,
	) -> Result<ApiKey, DbError> {
		let id = ApiKeyId::generate();
		let now = Utc::now();

		sqlx::query(
			r#"
			INSERT INTO api_keys (id, user_id, token_hash, status, created_at)
			VALUES (?, ?, ?, 'active', ?)
			"#,
		)
		.bind(id.to_string())
		.bind(user_id.to_string())
		.bind(token_hash)
		.bind(now.to_rfc3339())
		.execute(&self.pool)
		.await?;

		tracing::debug!(api_key_id = %id, user_id = %user_id, "API key created");
		Ok(ApiKey {
			id,
			user_id: *user_id,
			token_hash: token_hash.to_string(),
			status: ApiKeyStatus::Active,
			created_at: now,
			last_used_at: None,
			revoked_at: None,
		})
	}

	/// Authentication lookup: resolve a token hash to its key, active
	/// keys only. Revoked keys are rejected here without being deleted.
	#[tracing::instrument(skip(self, token_hash))]
	pub async fn find_active_by_hash(&self, token_hash: &str) -> Result<Option<ApiKey>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, user_id, token_hash, status, created_at, last_used_at, revoked_at
			FROM api_keys
			WHERE token_hash = ? AND status = 'active'
			"#,
		)
		.bind(token_hash)
		.fetch_optional(&self.pool)
		.await?;

		match row {
			Some(row) => {
				let key = parse_api_key_row(&row)?;
				tracing::debug!(api_key_id = %key.id, user_id = %key.user_id, "API key found by hash");
				Ok(Some(key))
			}
			None => Ok(None),
		}
	}

	/// List the active keys of an account, newest first.
	#[tracing::instrument(skip(self), fields(user_id = %user_id))]
	pub async fn list_active_for_user(&self, user_id: &UserId) -> Result<Vec<ApiKey>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT id, user_id, token_hash, status, created_at, last_used_at, revoked_at
			FROM api_keys
			WHERE user_id = ? AND status = 'active'
			ORDER BY created_at DESC
			"#,
		)
		.bind(user_id.to_string())
		.fetch_all(&self.pool)
		.await?;

		let mut keys = Vec::with_capacity(rows.len());
		for row in rows {
			keys.push(parse_api_key_row(&row)?);
		}
		tracing::debug!(user_id = %user_id, count = keys.len(), "listed active API keys");
		Ok(keys)
	}

	/// Revoke a key owned by `user_id`.
	///
	/// # Returns
	/// `true` if the key was revoked, `false` if already revoked, not
	/// found, or owned by someone else.
	#[tracing::instrument(skip(self), fields(user_id = %user_id, api_key_id = %id))]
	pub async fn revoke_api_key(&self, user_id: &UserId, id: &ApiKeyId) -> Result<bool, DbError> {
		let now = Utc::now();

		let result = sqlx::query(
			r#"
			UPDATE api_keys
			SET status = 'revoked', revoked_at = ?
			WHERE id = ? AND user_id = ? AND status = 'active'
			"#,
		)
		.bind(now.to_rfc3339())
		.bind(id.to_string())
		.bind(user_id.to_string())
		.execute(&self.pool)
		.await?;

		let revoked = result.rows_affected() > 0;
		if revoked {
			tracing::info!(api_key_id = %id, user_id = %user_id, "API key revoked");
		}
		Ok(revoked)
	}

	/// Update the last used timestamp after a successful authentication.
	#[tracing::instrument(skip(self), fields(api_key_id = %id))]
	pub async fn touch_last_used(&self, id: &ApiKeyId) -> Result<(), DbError> {
		let now = Utc::now();

		sqlx::query("UPDATE api_keys SET last_used_at = ? WHERE id = ?")
			.bind(now.to_rfc3339())
			.bind(id.to_string())
			.execute(&self.pool)
			.await?;

		Ok(())
	}
}

fn parse_api_key_row(row: &sqlx::sqlite::SqliteRow) -> Result<ApiKey, DbError> {
	let id_str: String = row.get("id");
	let user_id_str: String = row.get("user_id");
	let token_hash: String = row.get("token_hash");
	let status_str: String = row.get("status");
	let created_at_str: String = row.get("created_at");
	let last_used_at_str: Option<String> = row.get("last_used_at");
	let revoked_at_str: Option<String> = row.get("revoked_at");

	let id = Uuid::parse_str(&id_str)
		.map(ApiKeyId::new)
		.map_err(|e| DbError::Internal(format!("Invalid api_key id UUID: {e}")))?;
	let user_id = Uuid::parse_str(&user_id_str)
		.map(UserId::new)
		.map_err(|e| DbError::Internal(format!("Invalid user_id UUID: {e}")))?;

	let status = ApiKeyStatus::parse(&status_str)
		.ok_or_else(|| DbError::Internal(format!("Unknown api_key status: {status_str}")))?;

	let created_at = DateTime::parse_from_rfc3339(&created_at_str)
		.map_err(|e| DbError::Internal(format!("Invalid created_at: {e}")))?
		.with_timezone(&Utc);
	let last_used_at = last_used_at_str
		.map(|s| {
			DateTime::parse_from_rfc3339(&s)
				.map(|dt| dt.with_timezone(&Utc))
				.map_err(|e| DbError::Internal(format!("Invalid last_used_at: {e}")))
		})
		.transpose()?;
	let revoked_at = revoked_at_str
		.map(|s| {
			DateTime::parse_from_rfc3339(&s)
				.map(|dt| dt.with_timezone(&Utc))
				.map_err(|e| DbError::Internal(format!("Invalid revoked_at: {e}")))
		})
		.transpose()?;

	Ok(ApiKey {
		id,
		user_id,
		token_hash,
		status,
		created_at,
		last_used_at,
		revoked_at,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{create_migrated_test_pool, insert_test_user};
	use tally_server_auth::{generate_api_key, hash_api_key};

	async fn make_repo() -> (ApiKeyRepository, UserId) {
		let pool = create_migrated_test_pool().await;
		let user_id = insert_test_user(&pool, "keys@example.com").await;
		(ApiKeyRepository::new(pool), user_id)
	}

	#[tokio::test]
	async fn test_issue_and_lookup_by_hash() {
		let (repo, user_id) = make_repo().await;
		let plaintext = generate_api_key("test-secret").unwrap();
		let hash = hash_api_key(&plaintext);

		let key = repo.create_api_key(&user_id, &hash).await.unwrap();
		assert_eq!(key.status, ApiKeyStatus::Active);
		assert!(key.revoked_at.is_none());

		let found = repo.find_active_by_hash(&hash).await.unwrap().unwrap();
		assert_eq!(found.id, key.id);
		assert_eq!(found.user_id, user_id);
	}

	#[tokio::test]
	async fn test_revoked_key_rejected_but_retained() {
		let (repo, user_id) = make_repo().await;
		let hash1 = hash_api_key(&generate_api_key("test-secret").unwrap());
		let hash2 = hash_api_key(&generate_api_key("test-secret").unwrap());
		assert_ne!(hash1, hash2);

		let key1 = repo.create_api_key(&user_id, &hash1).await.unwrap();
		let key2 = repo.create_api_key(&user_id, &hash2).await.unwrap();
		assert_ne!(key1.id, key2.id);

		assert!(repo.revoke_api_key(&user_id, &key1.id).await.unwrap());
		// Second revocation is a no-op.
		assert!(!repo.revoke_api_key(&user_id, &key1.id).await.unwrap());

		// key1 no longer authenticates, key2 still does.
		assert!(repo.find_active_by_hash(&hash1).await.unwrap().is_none());
		assert!(repo.find_active_by_hash(&hash2).await.unwrap().is_some());

		// The revoked row is retained for audit.
		let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM api_keys")
			.fetch_one(&repo.pool)
			.await
			.unwrap();
		assert_eq!(count, 2);

		let active = repo.list_active_for_user(&user_id).await.unwrap();
		assert_eq!(active.len(), 1);
		assert_eq!(active[0].id, key2.id);
	}

	#[tokio::test]
	async fn test_revocation_is_owner_scoped() {
		let (repo, user_id) = make_repo().await;
		let other = insert_test_user(&repo.pool, "other@example.com").await;

		let hash = hash_api_key(&generate_api_key("test-secret").unwrap());
		let key = repo.create_api_key(&user_id, &hash).await.unwrap();

		assert!(!repo.revoke_api_key(&other, &key.id).await.unwrap());
		assert!(repo.find_active_by_hash(&hash).await.unwrap().is_some());
	}

	#[tokio::test]
	async fn test_touch_last_used() {
		let (repo, user_id) = make_repo().await;
		let hash = hash_api_key(&generate_api_key("test-secret").unwrap());
		let key = repo.create_api_key(&user_id, &hash).await.unwrap();
		assert!(key.last_used_at.is_none());

		repo.touch_last_used(&key.id).await.unwrap();
		let found = repo.find_active_by_hash(&hash).await.unwrap().unwrap();
		assert!(found.last_used_at.is_some());
	}
}
