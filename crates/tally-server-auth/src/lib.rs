// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Authentication primitives and domain types for Tally.
//!
//! This crate holds everything the persistence and HTTP layers share
//! without touching the database:
//!
//! - ID newtypes and domain enums ([`types`])
//! - Password hashing with Argon2id ([`password`])
//! - API key generation and storage hashing ([`api_key`])
//! - Request credential extraction helpers ([`middleware`])

pub mod api_key;
pub mod error;
pub mod middleware;
pub mod password;
pub mod types;

pub use api_key::{generate_api_key, hash_api_key, is_api_key, API_KEY_PREFIX};
pub use error::AuthError;
pub use middleware::{extract_bearer_token, CurrentAccount};
pub use password::{hash_password, verify_password};
pub use types::{ApiKeyId, ApiKeyStatus, EntryId, EntryKind, UserId};
