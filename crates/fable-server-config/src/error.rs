// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("Invalid value for {key}: {value} ({reason})")]
	InvalidValue {
		key: String,
		value: String,
		reason: String,
	},
}

impl ConfigError {
	pub fn invalid(key: &str, value: &str, reason: impl Into<String>) -> Self {
		Self::InvalidValue {
			key: key.to_string(),
			value: value.to_string(),
			reason: reason.into(),
		}
	}
}
