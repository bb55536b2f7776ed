// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Token economy configuration: the signup grant and the purchasable
//! packages the payments collaborator maps checkout sessions onto.

use serde::Deserialize;

/// A purchasable token package.
///
/// `id` is the identifier the payments collaborator reports back on a
/// successful checkout (price/product id); `tokens` is the amount
/// credited.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenPackage {
	pub id: String,
	pub tokens: i64,
}

/// Token configuration (runtime, fully resolved).
#[derive(Debug, Clone)]
pub struct TokensConfig {
	/// Tokens granted to every new account at signup.
	pub signup_grant: i64,
	/// Purchasable packages, keyed by external price/product id.
	pub packages: Vec<TokenPackage>,
}

impl TokensConfig {
	/// Look up a package by its external id.
	pub fn package(&self, id: &str) -> Option<&TokenPackage> {
		self.packages.iter().find(|p| p.id == id)
	}
}

impl Default for TokensConfig {
	fn default() -> Self {
		Self {
			signup_grant: 1000,
			packages: vec![
				TokenPackage {
					id: "starter".to_string(),
					tokens: 10_000,
				},
				TokenPackage {
					id: "growth".to_string(),
					tokens: 50_000,
				},
				TokenPackage {
					id: "scale".to_string(),
					tokens: 120_000,
				},
			],
		}
	}
}

/// Token configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokensConfigLayer {
	#[serde(default)]
	pub signup_grant: Option<i64>,
	#[serde(default)]
	pub packages: Option<Vec<TokenPackage>>,
}

impl TokensConfigLayer {
	pub fn merge(&mut self, other: TokensConfigLayer) {
		if other.signup_grant.is_some() {
			self.signup_grant = other.signup_grant;
		}
		if other.packages.is_some() {
			self.packages = other.packages;
		}
	}

	pub fn finalize(self) -> TokensConfig {
		let defaults = TokensConfig::default();
		TokensConfig {
			signup_grant: self.signup_grant.unwrap_or(defaults.signup_grant),
			packages: self.packages.unwrap_or(defaults.packages),
		}
	}
}
