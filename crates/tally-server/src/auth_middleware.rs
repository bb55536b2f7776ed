// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! API key authentication extractor.
//!
//! Handlers that require authentication take a [`RequireAuth`] argument.
//! The extractor reads the `Authorization: Bearer` header, hashes the
//! presented key, and looks it up among active keys. Revoked or unknown
//! keys are rejected with 401 before the handler runs.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use tally_server_auth::{extract_bearer_token, hash_api_key, is_api_key, CurrentAccount};

use crate::api::AppState;
use crate::error::ServerError;

/// Extractor that authenticates the request via API key.
pub struct RequireAuth(pub CurrentAccount);

impl FromRequestParts<AppState> for RequireAuth {
	type Rejection = ServerError;

	async fn from_request_parts(
		parts: &mut Parts,
		state: &AppState,
	) -> Result<Self, Self::Rejection> {
		let token = extract_bearer_token(&parts.headers).ok_or(ServerError::Unauthorized)?;

		if !is_api_key(&token) {
			return Err(ServerError::Unauthorized);
		}

		let token_hash = hash_api_key(&token);
		let key = state
			.api_keys
			.find_active_by_hash(&token_hash)
			.await?
			.ok_or_else(|| {
				tracing::debug!("rejected unknown or revoked api key");
				ServerError::Unauthorized
			})?;

		// Best effort; a failed timestamp update must not fail the request.
		if let Err(e) = state.api_keys.touch_last_used(&key.id).await {
			tracing::warn!(error = %e, "failed to update api key last_used_at");
		}

		Ok(RequireAuth(CurrentAccount::from_api_key(
			key.user_id,
			key.id,
		)))
	}
}
