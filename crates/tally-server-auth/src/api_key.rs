// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! API key generation and storage hashing.
//!
//! Keys are opaque bearer credentials bound to an account. The plaintext
//! value is `tally_sk_<hex>` where `<hex>` is an HMAC-SHA256 over the
//! issuance timestamp and 32 bytes from the OS CSPRNG, keyed by a
//! server-held secret. The namespace prefix makes leaked keys easy to
//! recognise in logs and scanners.
//!
//! Only the SHA-256 hash of the key is ever stored; authentication hashes
//! the presented bearer token and looks the hash up.

use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::AuthError;

/// Namespace prefix for every Tally API key.
pub const API_KEY_PREFIX: &str = "tally_sk_";

type HmacSha256 = Hmac<Sha256>;

/// Generate a new API key plaintext.
///
/// # Arguments
/// * `secret` - Server-held signing secret (`auth.api_key_secret`)
///
/// The result is globally unique and unguessable: 32 CSPRNG bytes are
/// mixed with the current timestamp under the HMAC, so even a repeated
/// timestamp cannot collide.
pub fn generate_api_key(secret: &str) -> Result<String, AuthError> {
	let mut random = [0u8; 32];
	rand::rngs::OsRng.fill_bytes(&mut random);

	let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
		.map_err(|e| AuthError::Internal(format!("invalid HMAC key: {e}")))?;
	mac.update(Utc::now().timestamp_millis().to_string().as_bytes());
	mac.update(&random);
	let tag = mac.finalize().into_bytes();

	Ok(format!("{API_KEY_PREFIX}{}", hex::encode(tag)))
}

/// SHA-256 hash of an API key plaintext, as stored in `token_hash`.
pub fn hash_api_key(plaintext: &str) -> String {
	hex::encode(Sha256::digest(plaintext.as_bytes()))
}

/// Returns true if the token carries the Tally API key namespace prefix.
pub fn is_api_key(token: &str) -> bool {
	token.starts_with(API_KEY_PREFIX)
}
