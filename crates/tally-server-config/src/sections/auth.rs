// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Authentication configuration.

use serde::Deserialize;

/// Fallback signing secret for local development only.
pub const DEV_API_KEY_SECRET: &str = "tally-dev-secret";

/// Auth configuration (runtime, fully resolved).
#[derive(Debug, Clone)]
pub struct AuthConfig {
	/// Server-held secret keying API key generation (HMAC-SHA256).
	pub api_key_secret: String,
	/// Disable new user signups (existing users can still sign in).
	pub signups_disabled: bool,
}

impl Default for AuthConfig {
	fn default() -> Self {
		Self {
			api_key_secret: DEV_API_KEY_SECRET.to_string(),
			signups_disabled: false,
		}
	}
}

/// Auth configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfigLayer {
	#[serde(default)]
	pub api_key_secret: Option<String>,
	#[serde(default)]
	pub signups_disabled: Option<bool>,
}

impl AuthConfigLayer {
	pub fn merge(&mut self, other: AuthConfigLayer) {
		if other.api_key_secret.is_some() {
			self.api_key_secret = other.api_key_secret;
		}
		if other.signups_disabled.is_some() {
			self.signups_disabled = other.signups_disabled;
		}
	}

	pub fn finalize(self) -> AuthConfig {
		if self.api_key_secret.is_none() {
			tracing::warn!("auth.api_key_secret not set, using the development fallback");
		}
		AuthConfig {
			api_key_secret: self
				.api_key_secret
				.unwrap_or_else(|| DEV_API_KEY_SECRET.to_string()),
			signups_disabled: self.signups_disabled.unwrap_or(false),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults() {
		let config = AuthConfigLayer::default().finalize();
		assert_eq!(config.api_key_secret, DEV_API_KEY_SECRET);
		assert!(!config.signups_disabled);
	}

	#[test]
	fn test_merge_keeps_higher_precedence() {
		let mut base = AuthConfigLayer {
			api_key_secret: Some("from-file".to_string()),
			signups_disabled: Some(false),
		};
		base.merge(AuthConfigLayer {
			api_key_secret: Some("from-env".to_string()),
			signups_disabled: None,
		});
		let config = base.finalize();
		assert_eq!(config.api_key_secret, "from-env");
		assert!(!config.signups_disabled);
	}
}
