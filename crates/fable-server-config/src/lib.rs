// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Centralized configuration management for Fable server.
//!
//! This crate provides:
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`FABLE_SERVER_*`)
//! - Built-in defaults suitable for local development
//!
//! # Usage
//!
//! ```ignore
//! use fable_server_config::load_config;
//!
//! let config = load_config()?;
//! println!("Server listening on {}:{}", config.http.host, config.http.port);
//! ```

pub mod error;
pub mod sections;

pub use error::ConfigError;
pub use sections::{AuthConfig, DatabaseConfig, HttpConfig, LoggingConfig};

use tracing::debug;

/// Fully resolved server configuration.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
	pub http: HttpConfig,
	pub database: DatabaseConfig,
	pub auth: AuthConfig,
	pub logging: LoggingConfig,
}

impl ServerConfig {
	/// Get the socket address string for binding.
	pub fn socket_addr(&self) -> String {
		format!("{}:{}", self.http.host, self.http.port)
	}
}

/// Load configuration from environment variables with built-in defaults.
///
/// Recognized variables:
/// - `FABLE_SERVER_HOST` / `FABLE_SERVER_PORT`
/// - `FABLE_SERVER_PUBLIC_URL` (absolute base URL used in pagination links)
/// - `FABLE_SERVER_DATABASE_URL`
/// - `FABLE_SERVER_SESSION_TTL_SECS`
/// - `FABLE_SERVER_LOG_LEVEL`
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	let http = HttpConfig::from_env()?;
	let database = DatabaseConfig::from_env();
	let auth = AuthConfig::from_env()?;
	let logging = LoggingConfig::from_env();

	debug!(
		host = %http.host,
		port = http.port,
		database = %database.url,
		"configuration resolved"
	);

	Ok(ServerConfig {
		http,
		database,
		auth,
		logging,
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_socket_addr() {
		let config = ServerConfig {
			http: HttpConfig {
				host: "0.0.0.0".to_string(),
				port: 8080,
				public_base_url: "http://localhost:8080".to_string(),
			},
			..Default::default()
		};
		assert_eq!(config.socket_addr(), "0.0.0.0:8080");
	}
}
