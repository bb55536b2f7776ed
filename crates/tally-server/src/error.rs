// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Server error type and its HTTP mapping.
//!
//! Repository errors carry the ledger taxonomy; this module decides what
//! each one looks like on the wire. Internal details are logged, never
//! returned to the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use tally_server_db::DbError;

/// JSON body returned for every error response.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorResponse {
	pub error: String,
	pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
	#[error(transparent)]
	Db(#[from] DbError),

	#[error("authentication required")]
	Unauthorized,

	#[error("invalid credentials")]
	InvalidCredentials,

	#[error("{message}")]
	Validation { error: String, message: String },

	#[error("signups are disabled")]
	SignupsDisabled,

	#[error("not found: {0}")]
	NotFound(String),

	#[error("internal error: {0}")]
	Internal(String),
}

impl ServerError {
	pub fn validation(error: impl Into<String>, message: impl Into<String>) -> Self {
		Self::Validation {
			error: error.into(),
			message: message.into(),
		}
	}
}

impl IntoResponse for ServerError {
	fn into_response(self) -> Response {
		let (status, error, message) = match self {
			ServerError::Db(DbError::InsufficientBalance) => (
				StatusCode::PAYMENT_REQUIRED,
				"insufficient_balance".to_string(),
				"Insufficient token balance".to_string(),
			),
			ServerError::Db(DbError::AccountNotFound(_)) => (
				StatusCode::NOT_FOUND,
				"account_not_found".to_string(),
				"Account not found".to_string(),
			),
			ServerError::Db(DbError::InvalidAmount(amount)) => (
				StatusCode::BAD_REQUEST,
				"invalid_amount".to_string(),
				format!("Amount must be positive, got {amount}"),
			),
			ServerError::Db(DbError::Conflict(message)) => {
				(StatusCode::CONFLICT, "conflict".to_string(), message)
			}
			ServerError::Db(e) => {
				tracing::error!(error = %e, "database error");
				(
					StatusCode::INTERNAL_SERVER_ERROR,
					"internal_error".to_string(),
					"Internal server error".to_string(),
				)
			}
			ServerError::Unauthorized => (
				StatusCode::UNAUTHORIZED,
				"unauthorized".to_string(),
				"Authentication required".to_string(),
			),
			ServerError::InvalidCredentials => (
				StatusCode::UNAUTHORIZED,
				"invalid_credentials".to_string(),
				"Invalid email or password".to_string(),
			),
			ServerError::Validation { error, message } => {
				(StatusCode::BAD_REQUEST, error, message)
			}
			ServerError::SignupsDisabled => (
				StatusCode::FORBIDDEN,
				"signups_disabled".to_string(),
				"New signups are currently disabled".to_string(),
			),
			ServerError::NotFound(message) => {
				(StatusCode::NOT_FOUND, "not_found".to_string(), message)
			}
			ServerError::Internal(message) => {
				tracing::error!(message, "internal error");
				(
					StatusCode::INTERNAL_SERVER_ERROR,
					"internal_error".to_string(),
					"Internal server error".to_string(),
				)
			}
		};

		(status, Json(ErrorResponse { error, message })).into_response()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_ledger_errors_map_to_statuses() {
		let cases = [
			(
				ServerError::Db(DbError::InsufficientBalance),
				StatusCode::PAYMENT_REQUIRED,
			),
			(
				ServerError::Db(DbError::AccountNotFound("x".into())),
				StatusCode::NOT_FOUND,
			),
			(
				ServerError::Db(DbError::InvalidAmount(0)),
				StatusCode::BAD_REQUEST,
			),
			(
				ServerError::Db(DbError::Conflict("dup".into())),
				StatusCode::CONFLICT,
			),
			(ServerError::Unauthorized, StatusCode::UNAUTHORIZED),
			(ServerError::SignupsDisabled, StatusCode::FORBIDDEN),
		];
		for (err, expected) in cases {
			assert_eq!(err.into_response().status(), expected);
		}
	}

	#[test]
	fn test_internal_details_are_not_leaked() {
		let response =
			ServerError::Internal("secret connection string".to_string()).into_response();
		assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
	}
}
