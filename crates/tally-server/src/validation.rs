// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared validation utilities for API handlers.
//!
//! This module provides common validation functions for emails, passwords,
//! and IDs. Use these utilities to ensure consistent validation across all
//! handlers.

use regex::Regex;
use std::sync::LazyLock;
use tally_server_auth::{ApiKeyId, UserId};
use uuid::Uuid;

use crate::error::ServerError;

static EMAIL_REGEX: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

pub const EMAIL_MAX_LEN: usize = 255;
pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 100;
pub const NAME_MAX_LEN: usize = 100;

/// Sanitize an email address by trimming whitespace and lowercasing.
pub fn sanitize_email(email: &str) -> String {
	email.trim().to_lowercase()
}

/// Validate an email address (assumes it has been sanitized first).
pub fn validate_email(email: &str) -> Result<(), ServerError> {
	if email.is_empty() || email.len() > EMAIL_MAX_LEN {
		return Err(ServerError::validation(
			"invalid_email",
			format!("Email must be between 1 and {EMAIL_MAX_LEN} characters"),
		));
	}
	if !EMAIL_REGEX.is_match(email) {
		return Err(ServerError::validation(
			"invalid_email",
			"Email address is not valid",
		));
	}
	Ok(())
}

/// Validate password length constraints.
pub fn validate_password(password: &str) -> Result<(), ServerError> {
	if password.len() < PASSWORD_MIN_LEN || password.len() > PASSWORD_MAX_LEN {
		return Err(ServerError::validation(
			"invalid_password",
			format!(
				"Password must be between {PASSWORD_MIN_LEN} and {PASSWORD_MAX_LEN} characters"
			),
		));
	}
	Ok(())
}

/// Validate an optional display name.
pub fn validate_name(name: &str) -> Result<(), ServerError> {
	if name.is_empty() || name.len() > NAME_MAX_LEN {
		return Err(ServerError::validation(
			"invalid_name",
			format!("Name must be between 1 and {NAME_MAX_LEN} characters"),
		));
	}
	Ok(())
}

/// Parse a string as a UserId.
pub fn parse_user_id(id_str: &str) -> Result<UserId, ServerError> {
	Uuid::parse_str(id_str)
		.map(UserId::new)
		.map_err(|_| ServerError::validation("invalid_id", "Invalid user ID"))
}

/// Parse a string as an ApiKeyId.
pub fn parse_api_key_id(id_str: &str) -> Result<ApiKeyId, ServerError> {
	Uuid::parse_str(id_str)
		.map(ApiKeyId::new)
		.map_err(|_| ServerError::validation("invalid_id", "Invalid API key ID"))
}
