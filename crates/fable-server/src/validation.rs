// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Request payload validation helpers.

use crate::error::ServerError;

const NICKNAME_MAX: usize = 20;
const PASSWORD_MIN: usize = 3;
const PASSWORD_MAX: usize = 8;

pub fn validate_nickname(nickname: &str) -> Result<(), ServerError> {
	let len = nickname.chars().count();
	if len == 0 || len > NICKNAME_MAX {
		return Err(ServerError::BadRequest(format!(
			"nickname must be between 1 and {NICKNAME_MAX} characters"
		)));
	}
	Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ServerError> {
	let len = password.chars().count();
	if !(PASSWORD_MIN..=PASSWORD_MAX).contains(&len) {
		return Err(ServerError::BadRequest(format!(
			"password must be between {PASSWORD_MIN} and {PASSWORD_MAX} characters"
		)));
	}
	Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ServerError> {
	if email.is_empty() || !email.contains('@') {
		return Err(ServerError::BadRequest(
			"email must be a valid address".to_string(),
		));
	}
	Ok(())
}

pub fn validate_non_empty(value: &str, field: &str) -> Result<(), ServerError> {
	if value.trim().is_empty() {
		return Err(ServerError::BadRequest(format!("{field} must not be empty")));
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_nickname_bounds() {
		assert!(validate_nickname("a").is_ok());
		assert!(validate_nickname(&"x".repeat(20)).is_ok());
		assert!(validate_nickname("").is_err());
		assert!(validate_nickname(&"x".repeat(21)).is_err());
	}

	#[test]
	fn test_password_bounds() {
		assert!(validate_password("abc").is_ok());
		assert!(validate_password("abcdefgh").is_ok());
		assert!(validate_password("ab").is_err());
		assert!(validate_password("abcdefghi").is_err());
	}

	#[test]
	fn test_email_shape() {
		assert!(validate_email("a@b.com").is_ok());
		assert!(validate_email("nope").is_err());
		assert!(validate_email("").is_err());
	}

	#[test]
	fn test_non_empty() {
		assert!(validate_non_empty("hello", "title").is_ok());
		assert!(validate_non_empty("  ", "title").is_err());
	}
}
