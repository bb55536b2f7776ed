// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Signup and signin HTTP handlers.
//!
//! Signup creates the account and, when configured, issues the signup
//! grant as a ledger credit so the balance always equals the entry sum.
//! Signin verifies credentials and returns the profile; API keys are
//! minted separately via `/api/keys`.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use tally_server_auth::{hash_password, verify_password, EntryKind};

use crate::{
	api::AppState,
	error::ServerError,
	routes::account::AccountResponse,
	validation::{sanitize_email, validate_email, validate_name, validate_password},
};

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SignupRequest {
	pub email: String,
	pub password: String,
	pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SigninRequest {
	pub email: String,
	pub password: String,
}

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = AccountResponse),
        (status = 400, description = "Validation failed", body = crate::error::ErrorResponse),
        (status = 403, description = "Signups disabled", body = crate::error::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::error::ErrorResponse)
    ),
    tag = "auth"
)]
/// POST /api/auth/signup - Create a new account.
#[tracing::instrument(skip(state, request))]
pub async fn signup(
	State(state): State<AppState>,
	Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), ServerError> {
	if state.auth_config.signups_disabled {
		return Err(ServerError::SignupsDisabled);
	}

	let email = sanitize_email(&request.email);
	validate_email(&email)?;
	validate_password(&request.password)?;
	let name = match request.name {
		Some(name) => {
			let name = name.trim().to_string();
			validate_name(&name)?;
			Some(name)
		}
		None => None,
	};

	let password_hash = hash_password(&request.password)
		.map_err(|e| ServerError::Internal(format!("password hashing failed: {e}")))?;

	let mut user = state
		.users
		.create_user(&email, &password_hash, name.as_deref())
		.await?;

	let grant = state.tokens_config.signup_grant;
	if grant > 0 {
		user.token_balance = state
			.ledger
			.credit(&user.id, grant, EntryKind::Grant, "Signup grant")
			.await?;
	}

	tracing::info!(user_id = %user.id, "account created");
	Ok((StatusCode::CREATED, Json(AccountResponse::from_user(&user))))
}

#[utoipa::path(
    post,
    path = "/api/auth/signin",
    request_body = SigninRequest,
    responses(
        (status = 200, description = "Credentials accepted", body = AccountResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse)
    ),
    tag = "auth"
)]
/// POST /api/auth/signin - Verify credentials and return the profile.
///
/// Unknown emails and wrong passwords produce the same response.
#[tracing::instrument(skip(state, request))]
pub async fn signin(
	State(state): State<AppState>,
	Json(request): Json<SigninRequest>,
) -> Result<Json<AccountResponse>, ServerError> {
	let email = sanitize_email(&request.email);

	let Some(user) = state.users.get_user_by_email(&email).await? else {
		return Err(ServerError::InvalidCredentials);
	};

	let password_ok = verify_password(&request.password, &user.password_hash)
		.map_err(|e| ServerError::Internal(format!("password verification failed: {e}")))?;
	if !password_ok {
		return Err(ServerError::InvalidCredentials);
	}

	tracing::debug!(user_id = %user.id, "signin succeeded");
	Ok(Json(AccountResponse::from_user(&user)))
}
