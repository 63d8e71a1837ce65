// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Session repository.
//!
//! Sessions store only the SHA-256 hash of the opaque token. Expiry is
//! evaluated in Rust with parsed timestamps rather than string comparison.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;

use crate::error::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Session {
	pub id: i64,
	pub user_id: i64,
	pub token_hash: String,
	pub created_at: String,
	pub expires_at: String,
}

impl Session {
	pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
		match DateTime::parse_from_rfc3339(&self.expires_at) {
			Ok(expires) => expires <= now,
			// an unparseable expiry is treated as expired
			Err(_) => true,
		}
	}
}

/// Repository for session database operations.
#[derive(Clone)]
pub struct SessionRepository {
	pool: SqlitePool,
}

impl SessionRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	pub async fn create_session(
		&self,
		user_id: i64,
		token_hash: &str,
		ttl_secs: u64,
	) -> Result<(), DbError> {
		let now = Utc::now();
		let expires = now + chrono::Duration::seconds(ttl_secs as i64);

		sqlx::query(
			"INSERT INTO sessions (user_id, token_hash, created_at, expires_at) \
			 VALUES (?, ?, ?, ?)",
		)
		.bind(user_id)
		.bind(token_hash)
		.bind(now.to_rfc3339())
		.bind(expires.to_rfc3339())
		.execute(&self.pool)
		.await?;

		tracing::debug!(user_id, "session created");
		Ok(())
	}

	pub async fn get_session(&self, token_hash: &str) -> Result<Option<Session>, DbError> {
		let session =
			sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE token_hash = ?")
				.bind(token_hash)
				.fetch_optional(&self.pool)
				.await?;
		Ok(session)
	}

	pub async fn delete_session(&self, token_hash: &str) -> Result<(), DbError> {
		sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
			.bind(token_hash)
			.execute(&self.pool)
			.await?;
		Ok(())
	}
}
