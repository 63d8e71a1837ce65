// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Configuration sections, each resolved independently from the environment.

use crate::error::ConfigError;

fn env_var(key: &str) -> Option<String> {
	std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
	match env_var(key) {
		Some(raw) => raw
			.parse::<T>()
			.map(Some)
			.map_err(|_| ConfigError::invalid(key, &raw, "not parseable")),
		None => Ok(None),
	}
}

/// HTTP listener settings.
#[derive(Debug, Clone)]
pub struct HttpConfig {
	pub host: String,
	pub port: u16,
	/// Absolute base URL clients reach this server at. Pagination next-links
	/// are built against this value.
	pub public_base_url: String,
}

impl Default for HttpConfig {
	fn default() -> Self {
		Self {
			host: "127.0.0.1".to_string(),
			port: 3000,
			public_base_url: "http://localhost:3000".to_string(),
		}
	}
}

impl HttpConfig {
	pub fn from_env() -> Result<Self, ConfigError> {
		let defaults = Self::default();
		let host = env_var("FABLE_SERVER_HOST").unwrap_or(defaults.host);
		let port = env_parse::<u16>("FABLE_SERVER_PORT")?.unwrap_or(defaults.port);
		let public_base_url = env_var("FABLE_SERVER_PUBLIC_URL")
			.unwrap_or_else(|| format!("http://{host}:{port}"));

		Ok(Self {
			host,
			port,
			public_base_url,
		})
	}
}

/// Database settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
	/// SQLite connection string (e.g. `sqlite:./fable.db`).
	pub url: String,
}

impl Default for DatabaseConfig {
	fn default() -> Self {
		Self {
			url: "sqlite:./fable.db".to_string(),
		}
	}
}

impl DatabaseConfig {
	pub fn from_env() -> Self {
		Self {
			url: env_var("FABLE_SERVER_DATABASE_URL").unwrap_or_else(|| Self::default().url),
		}
	}
}

/// Authentication settings.
#[derive(Debug, Clone)]
pub struct AuthConfig {
	/// Lifetime of issued bearer tokens, in seconds.
	pub session_ttl_secs: u64,
	/// How long an unauthenticated WebSocket may sit idle before being closed.
	pub ws_auth_timeout_secs: u64,
}

impl Default for AuthConfig {
	fn default() -> Self {
		Self {
			session_ttl_secs: 60 * 60 * 24,
			ws_auth_timeout_secs: 5,
		}
	}
}

impl AuthConfig {
	pub fn from_env() -> Result<Self, ConfigError> {
		let defaults = Self::default();
		Ok(Self {
			session_ttl_secs: env_parse::<u64>("FABLE_SERVER_SESSION_TTL_SECS")?
				.unwrap_or(defaults.session_ttl_secs),
			ws_auth_timeout_secs: env_parse::<u64>("FABLE_SERVER_WS_AUTH_TIMEOUT_SECS")?
				.unwrap_or(defaults.ws_auth_timeout_secs),
		})
	}
}

/// Logging settings.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
	/// Default tracing filter when `RUST_LOG` is unset.
	pub level: String,
}

impl Default for LoggingConfig {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
		}
	}
}

impl LoggingConfig {
	pub fn from_env() -> Self {
		Self {
			level: env_var("FABLE_SERVER_LOG_LEVEL").unwrap_or_else(|| Self::default().level),
		}
	}
}
