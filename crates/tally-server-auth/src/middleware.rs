// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Request credential extraction for the authentication layer.
//!
//! The ledger trusts the account identifier it is handed; this module is
//! where that identifier gets established. Flow:
//!
//! ```text
//! Request → Authorization: Bearer tally_sk_… → hash → active key lookup
//! ```
//!
//! Token values are never logged.

use http::header::AUTHORIZATION;
use http::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::types::{ApiKeyId, UserId};

/// The currently authenticated account, established from request context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAccount {
	/// The authenticated account.
	pub user_id: UserId,
	/// API key used to authenticate, if bearer-authenticated.
	pub api_key_id: Option<ApiKeyId>,
}

impl CurrentAccount {
	/// Create a context from an API key authentication.
	pub fn from_api_key(user_id: UserId, api_key_id: ApiKeyId) -> Self {
		Self {
			user_id,
			api_key_id: Some(api_key_id),
		}
	}

	/// Create a context for an already-authenticated identifier
	/// (e.g. resolved by the fronting session layer).
	pub fn from_user(user_id: UserId) -> Self {
		Self {
			user_id,
			api_key_id: None,
		}
	}

	/// Returns true if authenticated via API key.
	pub fn is_api_key_auth(&self) -> bool {
		self.api_key_id.is_some()
	}
}

/// Extract a bearer token from the Authorization header.
///
/// Expects the format `Authorization: Bearer <token>`; returns `None`
/// when the header is absent or malformed.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
	let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
	let token = value.strip_prefix("Bearer ")?.trim();
	if token.is_empty() {
		None
	} else {
		Some(token.to_string())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use http::HeaderValue;

	fn headers_with_auth(value: &str) -> HeaderMap {
		let mut headers = HeaderMap::new();
		headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
		headers
	}

	#[test]
	fn test_extracts_bearer_token() {
		let headers = headers_with_auth("Bearer tally_sk_deadbeef");
		assert_eq!(
			extract_bearer_token(&headers).as_deref(),
			Some("tally_sk_deadbeef")
		);
	}

	#[test]
	fn test_rejects_missing_or_malformed() {
		assert_eq!(extract_bearer_token(&HeaderMap::new()), None);
		assert_eq!(extract_bearer_token(&headers_with_auth("Basic abc")), None);
		assert_eq!(extract_bearer_token(&headers_with_auth("Bearer ")), None);
	}

	#[test]
	fn test_current_account_constructors() {
		let user_id = UserId::generate();
		let key_id = ApiKeyId::generate();

		let ctx = CurrentAccount::from_api_key(user_id, key_id);
		assert!(ctx.is_api_key_auth());
		assert_eq!(ctx.user_id, user_id);

		let ctx = CurrentAccount::from_user(user_id);
		assert!(!ctx.is_api_key_auth());
	}
}
