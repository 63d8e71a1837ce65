// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
	#[error("Missing bearer token")]
	MissingToken,

	#[error("Invalid bearer token")]
	InvalidToken,

	#[error("Token expired")]
	TokenExpired,

	#[error("Invalid credentials")]
	InvalidCredentials,

	#[error("Unknown role: {0}")]
	UnknownRole(String),

	#[error("Password hashing failed: {0}")]
	Hashing(String),
}
