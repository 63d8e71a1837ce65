// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Opaque bearer token generation and hashing.
//!
//! Tokens are 32 random bytes, hex-encoded, with a `fbl_` prefix so they are
//! recognizable in logs and support tickets without revealing the value.
//! Only the SHA-256 digest of a token is ever persisted.

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Prefix for all Fable bearer tokens.
pub const TOKEN_PREFIX: &str = "fbl_";

/// Generate a new opaque bearer token.
pub fn generate_token() -> String {
	let mut bytes = [0u8; 32];
	rand::thread_rng().fill_bytes(&mut bytes);
	format!("{TOKEN_PREFIX}{}", hex::encode(bytes))
}

/// Hash a token for storage or lookup.
pub fn hash_token(token: &str) -> String {
	hex::encode(Sha256::digest(token.as_bytes()))
}
