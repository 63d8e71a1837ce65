// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared authentication context and bearer extraction.
//!
//! The HTTP auth extractor and the WebSocket gateway both resolve tokens
//! through this module so there is exactly one verification path.

use http::header::AUTHORIZATION;
use http::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::error::AuthError;
use crate::token::TOKEN_PREFIX;
use crate::Role;

/// The currently authenticated user, extracted from request context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
	pub id: i64,
	pub nickname: String,
	pub email: String,
	pub role: Role,
}

impl CurrentUser {
	pub fn is_admin(&self) -> bool {
		self.role == Role::Admin
	}
}

/// Extract a bearer token from the `Authorization` header.
///
/// Accepts `Authorization: Bearer fbl_...`. A header with the wrong scheme or
/// a token without the `fbl_` prefix is rejected as invalid rather than
/// missing, so clients get a precise error.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
	let raw = headers
		.get(AUTHORIZATION)
		.and_then(|v| v.to_str().ok())
		.ok_or(AuthError::MissingToken)?;

	let token = raw
		.strip_prefix("Bearer ")
		.ok_or(AuthError::InvalidToken)?
		.trim();

	if !token.starts_with(TOKEN_PREFIX) {
		return Err(AuthError::InvalidToken);
	}

	Ok(token)
}
