// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Core type definitions shared across the Tally server crates.
//!
//! - **ID newtypes**: Type-safe wrappers around UUIDs for different entity
//!   types ([`UserId`], [`ApiKeyId`], [`EntryId`]) preventing accidental
//!   mixing
//! - **Ledger entry kinds**: Classification of balance changes ([`EntryKind`])
//! - **API key lifecycle**: Credential status ([`ApiKeyStatus`])
//!
//! All ID types implement transparent serde serialization (as UUID strings)
//! and provide conversion to/from [`uuid::Uuid`].

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// =============================================================================
// ID Newtypes
// =============================================================================

macro_rules! define_id_type {
	($name:ident, $doc:expr) => {
		#[doc = $doc]
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(Uuid);

		impl $name {
			/// Create a new ID from a UUID.
			pub fn new(id: Uuid) -> Self {
				Self(id)
			}

			/// Generate a new random ID.
			pub fn generate() -> Self {
				Self(Uuid::new_v4())
			}

			/// Get the inner UUID value.
			pub fn into_inner(self) -> Uuid {
				self.0
			}

			/// Get a reference to the inner UUID.
			pub fn as_uuid(&self) -> &Uuid {
				&self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}", self.0)
			}
		}

		impl From<Uuid> for $name {
			fn from(id: Uuid) -> Self {
				Self(id)
			}
		}

		impl From<$name> for Uuid {
			fn from(id: $name) -> Self {
				id.0
			}
		}
	};
}

define_id_type!(UserId, "Unique identifier for a user account.");
define_id_type!(ApiKeyId, "Unique identifier for an API key.");
define_id_type!(EntryId, "Unique identifier for a ledger entry.");

// =============================================================================
// Ledger Entry Kinds
// =============================================================================

/// Classification of a balance-changing ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
	/// Tokens bought through the payments collaborator.
	Purchase,
	/// Tokens consumed by metered usage.
	Deduction,
	/// Tokens granted by the system (e.g. the signup starting balance).
	Grant,
	/// Manual correction applied by an operator.
	Adjustment,
}

impl EntryKind {
	/// Returns all known entry kinds.
	pub fn all() -> &'static [EntryKind] {
		&[
			EntryKind::Purchase,
			EntryKind::Deduction,
			EntryKind::Grant,
			EntryKind::Adjustment,
		]
	}

	/// Stable string form used in the database.
	pub fn as_str(&self) -> &'static str {
		match self {
			EntryKind::Purchase => "purchase",
			EntryKind::Deduction => "deduction",
			EntryKind::Grant => "grant",
			EntryKind::Adjustment => "adjustment",
		}
	}

	/// Parse the database string form back into a kind.
	pub fn parse(s: &str) -> Option<EntryKind> {
		match s {
			"purchase" => Some(EntryKind::Purchase),
			"deduction" => Some(EntryKind::Deduction),
			"grant" => Some(EntryKind::Grant),
			"adjustment" => Some(EntryKind::Adjustment),
			_ => None,
		}
	}
}

impl fmt::Display for EntryKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

// =============================================================================
// API Key Status
// =============================================================================

/// Lifecycle status of an API key.
///
/// Revoked keys are retained for audit and must be rejected by every
/// authentication lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiKeyStatus {
	Active,
	Revoked,
}

impl ApiKeyStatus {
	/// Stable string form used in the database.
	pub fn as_str(&self) -> &'static str {
		match self {
			ApiKeyStatus::Active => "active",
			ApiKeyStatus::Revoked => "revoked",
		}
	}

	/// Parse the database string form back into a status.
	pub fn parse(s: &str) -> Option<ApiKeyStatus> {
		match s {
			"active" => Some(ApiKeyStatus::Active),
			"revoked" => Some(ApiKeyStatus::Revoked),
			_ => None,
		}
	}
}

impl fmt::Display for ApiKeyStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.as_str())
	}
}
