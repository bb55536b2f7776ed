// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Account management HTTP handlers.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tally_server_auth::{hash_password, verify_password, UserId};
use tally_server_db::User;

use crate::{
	api::AppState,
	auth_middleware::RequireAuth,
	error::ServerError,
	validation::{sanitize_email, validate_email, validate_name, validate_password},
};

/// Public view of a user account. Never carries the password hash.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AccountResponse {
	#[schema(value_type = uuid::Uuid)]
	pub id: UserId,
	pub name: Option<String>,
	pub email: String,
	pub token_balance: i64,
	pub created_at: DateTime<Utc>,
}

impl AccountResponse {
	pub fn from_user(user: &User) -> Self {
		Self {
			id: user.id,
			name: user.name.clone(),
			email: user.email.clone(),
			token_balance: user.token_balance,
			created_at: user.created_at,
		}
	}
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UpdateAccountRequest {
	pub name: Option<String>,
	pub email: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UpdatePasswordRequest {
	pub current_password: String,
	pub new_password: String,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DeleteAccountRequest {
	pub password: String,
}

/// Fetch the live account backing the current credentials.
async fn require_live_user(state: &AppState, user_id: &UserId) -> Result<User, ServerError> {
	let user = state
		.users
		.get_user_by_id(user_id)
		.await?
		.filter(|u| !u.is_deleted())
		.ok_or_else(|| ServerError::NotFound("Account not found".to_string()))?;
	Ok(user)
}

#[utoipa::path(
    get,
    path = "/api/account",
    responses(
        (status = 200, description = "Current account", body = AccountResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 404, description = "Account not found", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = [])),
    tag = "account"
)]
/// GET /api/account - Current account profile.
#[tracing::instrument(skip(state, current))]
pub async fn get_account(
	RequireAuth(current): RequireAuth,
	State(state): State<AppState>,
) -> Result<Json<AccountResponse>, ServerError> {
	let user = require_live_user(&state, &current.user_id).await?;
	Ok(Json(AccountResponse::from_user(&user)))
}

#[utoipa::path(
    patch,
    path = "/api/account",
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Updated account", body = AccountResponse),
        (status = 400, description = "Validation failed", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = [])),
    tag = "account"
)]
/// PATCH /api/account - Update name and/or email.
#[tracing::instrument(skip(state, current, request))]
pub async fn update_account(
	RequireAuth(current): RequireAuth,
	State(state): State<AppState>,
	Json(request): Json<UpdateAccountRequest>,
) -> Result<Json<AccountResponse>, ServerError> {
	let user = require_live_user(&state, &current.user_id).await?;

	let name = match request.name {
		Some(name) => {
			let name = name.trim().to_string();
			validate_name(&name)?;
			Some(name)
		}
		None => user.name.clone(),
	};

	let email = match request.email {
		Some(email) => {
			let email = sanitize_email(&email);
			validate_email(&email)?;
			email
		}
		None => user.email.clone(),
	};

	let updated = state
		.users
		.update_profile(&current.user_id, name.as_deref(), &email)
		.await?;
	if !updated {
		return Err(ServerError::NotFound("Account not found".to_string()));
	}

	let user = require_live_user(&state, &current.user_id).await?;
	tracing::info!(user_id = %user.id, "account profile updated");
	Ok(Json(AccountResponse::from_user(&user)))
}

#[utoipa::path(
    put,
    path = "/api/account/password",
    request_body = UpdatePasswordRequest,
    responses(
        (status = 204, description = "Password updated"),
        (status = 400, description = "Validation failed", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = [])),
    tag = "account"
)]
/// PUT /api/account/password - Change the account password.
#[tracing::instrument(skip(state, current, request))]
pub async fn update_password(
	RequireAuth(current): RequireAuth,
	State(state): State<AppState>,
	Json(request): Json<UpdatePasswordRequest>,
) -> Result<StatusCode, ServerError> {
	let user = require_live_user(&state, &current.user_id).await?;

	let current_ok = verify_password(&request.current_password, &user.password_hash)
		.map_err(|e| ServerError::Internal(format!("password verification failed: {e}")))?;
	if !current_ok {
		return Err(ServerError::validation(
			"invalid_current_password",
			"Current password is incorrect",
		));
	}

	if request.new_password == request.current_password {
		return Err(ServerError::validation(
			"password_unchanged",
			"New password must be different from the current password",
		));
	}
	validate_password(&request.new_password)?;

	let password_hash = hash_password(&request.new_password)
		.map_err(|e| ServerError::Internal(format!("password hashing failed: {e}")))?;
	let updated = state
		.users
		.update_password(&current.user_id, &password_hash)
		.await?;
	if !updated {
		return Err(ServerError::NotFound("Account not found".to_string()));
	}

	tracing::info!(user_id = %user.id, "account password updated");
	Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/api/account",
    request_body = DeleteAccountRequest,
    responses(
        (status = 204, description = "Account deleted"),
        (status = 400, description = "Password incorrect", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = [])),
    tag = "account"
)]
/// DELETE /api/account - Soft-delete the account.
///
/// The row is retained with `deleted_at` set so the ledger history stays
/// intact. The email becomes reusable for new signups.
#[tracing::instrument(skip(state, current, request))]
pub async fn delete_account(
	RequireAuth(current): RequireAuth,
	State(state): State<AppState>,
	Json(request): Json<DeleteAccountRequest>,
) -> Result<StatusCode, ServerError> {
	let user = require_live_user(&state, &current.user_id).await?;

	let password_ok = verify_password(&request.password, &user.password_hash)
		.map_err(|e| ServerError::Internal(format!("password verification failed: {e}")))?;
	if !password_ok {
		return Err(ServerError::validation(
			"invalid_password",
			"Password is incorrect",
		));
	}

	let deleted = state.users.soft_delete_user(&current.user_id).await?;
	if !deleted {
		return Err(ServerError::NotFound("Account not found".to_string()));
	}

	tracing::info!(user_id = %user.id, "account soft-deleted");
	Ok(StatusCode::NO_CONTENT)
}
