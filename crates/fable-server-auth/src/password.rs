// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Argon2 password hashing and verification.

use argon2::password_hash::{rand_core::OsRng, PasswordHash, SaltString};
use argon2::{PasswordHasher, PasswordVerifier};

use crate::argon2_config::argon2_instance;
use crate::error::AuthError;

/// Hash a plaintext password for storage.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
	let salt = SaltString::generate(&mut OsRng);
	let hash = argon2_instance()
		.hash_password(password.as_bytes(), &salt)
		.map_err(|e| AuthError::Hashing(e.to_string()))?;
	Ok(hash.to_string())
}

/// Verify a plaintext password against a stored hash.
///
/// Returns `AuthError::InvalidCredentials` on mismatch so callers cannot
/// distinguish a bad password from a missing account.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<(), AuthError> {
	let parsed = PasswordHash::new(stored_hash).map_err(|e| AuthError::Hashing(e.to_string()))?;
	argon2_instance()
		.verify_password(password.as_bytes(), &parsed)
		.map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_hash_and_verify() {
		let hash = hash_password("hunter2").unwrap();
		assert!(hash.starts_with("$argon2"));
		verify_password("hunter2", &hash).unwrap();
	}

	#[test]
	fn test_wrong_password_rejected() {
		let hash = hash_password("hunter2").unwrap();
		assert!(matches!(
			verify_password("hunter3", &hash),
			Err(AuthError::InvalidCredentials)
		));
	}

	#[test]
	fn test_hashes_are_salted() {
		let a = hash_password("same").unwrap();
		let b = hash_password("same").unwrap();
		assert_ne!(a, b);
	}
}
