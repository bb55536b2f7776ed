// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! API key management HTTP handlers.
//!
//! Key creation authenticates with email and password so a fresh account
//! can mint its first key. The plaintext key is returned exactly once;
//! only its SHA-256 hash is stored.

use axum::{
	extract::{Path, State},
	http::StatusCode,
	Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tally_server_auth::{generate_api_key, hash_api_key, verify_password, ApiKeyId};
use tally_server_db::ApiKey;

use crate::{
	api::AppState,
	auth_middleware::RequireAuth,
	error::ServerError,
	validation::{parse_api_key_id, sanitize_email},
};

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CreateKeyRequest {
	pub email: String,
	pub password: String,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CreateKeyResponse {
	#[schema(value_type = uuid::Uuid)]
	pub id: ApiKeyId,
	/// The plaintext key. Shown once; store it securely.
	pub api_key: String,
	pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct KeySummary {
	#[schema(value_type = uuid::Uuid)]
	pub id: ApiKeyId,
	pub created_at: DateTime<Utc>,
	pub last_used_at: Option<DateTime<Utc>>,
}

impl From<ApiKey> for KeySummary {
	fn from(key: ApiKey) -> Self {
		Self {
			id: key.id,
			created_at: key.created_at,
			last_used_at: key.last_used_at,
		}
	}
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ListKeysResponse {
	pub keys: Vec<KeySummary>,
}

#[utoipa::path(
    post,
    path = "/api/keys",
    request_body = CreateKeyRequest,
    responses(
        (status = 201, description = "API key created", body = CreateKeyResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse)
    ),
    tag = "keys"
)]
/// POST /api/keys - Mint a new API key using email and password.
#[tracing::instrument(skip(state, request))]
pub async fn create_key(
	State(state): State<AppState>,
	Json(request): Json<CreateKeyRequest>,
) -> Result<(StatusCode, Json<CreateKeyResponse>), ServerError> {
	let email = sanitize_email(&request.email);

	let Some(user) = state.users.get_user_by_email(&email).await? else {
		return Err(ServerError::InvalidCredentials);
	};
	let password_ok = verify_password(&request.password, &user.password_hash)
		.map_err(|e| ServerError::Internal(format!("password verification failed: {e}")))?;
	if !password_ok {
		return Err(ServerError::InvalidCredentials);
	}

	let plaintext = generate_api_key(&state.auth_config.api_key_secret)
		.map_err(|e| ServerError::Internal(format!("api key generation failed: {e}")))?;
	let token_hash = hash_api_key(&plaintext);

	let key = state.api_keys.create_api_key(&user.id, &token_hash).await?;

	tracing::info!(user_id = %user.id, key_id = %key.id, "api key created");
	Ok((
		StatusCode::CREATED,
		Json(CreateKeyResponse {
			id: key.id,
			api_key: plaintext,
			created_at: key.created_at,
		}),
	))
}

#[utoipa::path(
    get,
    path = "/api/keys",
    responses(
        (status = 200, description = "Active API keys", body = ListKeysResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = [])),
    tag = "keys"
)]
/// GET /api/keys - List the account's active keys, newest first.
#[tracing::instrument(skip(state, current))]
pub async fn list_keys(
	RequireAuth(current): RequireAuth,
	State(state): State<AppState>,
) -> Result<Json<ListKeysResponse>, ServerError> {
	let keys = state
		.api_keys
		.list_active_for_user(&current.user_id)
		.await?;
	Ok(Json(ListKeysResponse {
		keys: keys.into_iter().map(Into::into).collect(),
	}))
}

#[utoipa::path(
    delete,
    path = "/api/keys/{id}",
    params(
        ("id" = String, Path, description = "API key ID")
    ),
    responses(
        (status = 204, description = "API key revoked"),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 404, description = "API key not found", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = [])),
    tag = "keys"
)]
/// DELETE /api/keys/{id} - Revoke one of the account's keys.
///
/// The row is retained with status `revoked` for audit history.
#[tracing::instrument(skip(state, current), fields(key_id = %id))]
pub async fn revoke_key(
	RequireAuth(current): RequireAuth,
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<StatusCode, ServerError> {
	let key_id = parse_api_key_id(&id)?;

	let revoked = state
		.api_keys
		.revoke_api_key(&current.user_id, &key_id)
		.await?;
	if !revoked {
		return Err(ServerError::NotFound("API key not found".to_string()));
	}

	tracing::info!(user_id = %current.user_id, key_id = %key_id, "api key revoked");
	Ok(StatusCode::NO_CONTENT)
}
