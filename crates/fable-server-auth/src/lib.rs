// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Bearer token and password primitives for Fable server.
//!
//! This crate provides:
//! - Opaque bearer token generation and digest hashing (`fbl_*` tokens)
//! - Argon2 password hashing and verification
//! - [`CurrentUser`] - authenticated user context shared by the HTTP
//!   middleware and the WebSocket gateway
//!
//! # Security Notes
//!
//! - Tokens are stored as SHA-256 digests, never in plaintext
//! - Token values are never logged
//! - Passwords are hashed with Argon2id

mod argon2_config;
pub mod error;
pub mod middleware;
pub mod password;
pub mod token;

pub use error::AuthError;
pub use middleware::{extract_bearer_token, CurrentUser};
pub use password::{hash_password, verify_password};
pub use token::{generate_token, hash_token, TOKEN_PREFIX};

use serde::{Deserialize, Serialize};

/// Global role attached to a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	User,
	Admin,
}

impl Role {
	pub fn as_str(&self) -> &'static str {
		match self {
			Role::User => "user",
			Role::Admin => "admin",
		}
	}

	pub fn parse(raw: &str) -> Result<Self, AuthError> {
		match raw {
			"user" => Ok(Role::User),
			"admin" => Ok(Role::Admin),
			other => Err(AuthError::UnknownRole(other.to_string())),
		}
	}
}
