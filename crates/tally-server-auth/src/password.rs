// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Password hashing with Argon2id.
//!
//! Uses production-strength parameters in release builds and fast,
//! reduced-cost parameters under `#[cfg(test)]` so the test suite stays
//! quick. Test parameters are intentionally weak and MUST NOT be used in
//! production.

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, SaltString};
use argon2::{Argon2, PasswordVerifier};

use crate::error::AuthError;

/// Returns an Argon2 instance configured appropriately for the build context.
#[inline]
fn argon2_instance() -> Argon2<'static> {
	#[cfg(test)]
	{
		use argon2::{Algorithm, Params, Version};
		// Fast, insecure parameters for tests ONLY.
		let params = Params::new(
			1024, // memory_kib: 1 MiB
			1,    // iterations
			1,    // parallelism
			None, // output length = default
		)
		.expect("valid Argon2 params for tests");
		Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
	}

	#[cfg(not(test))]
	{
		// Argon2id with memory=19456 KiB, iterations=2, parallelism=1
		Argon2::default()
	}
}

/// Hash a plaintext password for storage.
///
/// Produces a PHC-format string (`$argon2id$...`) embedding the salt and
/// parameters, suitable for the `password_hash` column.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
	let salt = SaltString::generate(&mut OsRng);
	let hash = argon2_instance()
		.hash_password(password.as_bytes(), &salt)
		.map_err(|e| AuthError::Hashing(e.to_string()))?;
	Ok(hash.to_string())
}

/// Verify a plaintext password against a stored PHC-format hash.
///
/// Returns `Ok(true)` on a match, `Ok(false)` on a mismatch, and an error
/// only when the stored hash is malformed.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, AuthError> {
	let parsed = PasswordHash::new(password_hash).map_err(|e| AuthError::Hashing(e.to_string()))?;
	Ok(argon2_instance()
		.verify_password(password.as_bytes(), &parsed)
		.is_ok())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_hash_and_verify_roundtrip() {
		let hash = hash_password("correct horse battery staple").unwrap();
		assert!(hash.starts_with("$argon2id$"));
		assert!(verify_password("correct horse battery staple", &hash).unwrap());
	}

	#[test]
	fn test_wrong_password_rejected() {
		let hash = hash_password("hunter2hunter2").unwrap();
		assert!(!verify_password("hunter3hunter3", &hash).unwrap());
	}

	#[test]
	fn test_hashes_are_salted() {
		let a = hash_password("same-password").unwrap();
		let b = hash_password("same-password").unwrap();
		assert_ne!(a, b);
	}

	#[test]
	fn test_malformed_hash_is_an_error() {
		assert!(verify_password("whatever", "not-a-phc-string").is_err());
	}
}
