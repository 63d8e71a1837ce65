// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared helpers for database tests.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::migrations::run_migrations;

/// In-memory pool with the schema applied.
///
/// A single connection, because every pooled connection would otherwise open
/// its own private in-memory database.
pub async fn create_test_pool() -> SqlitePool {
	let options = SqliteConnectOptions::from_str("sqlite::memory:")
		.expect("valid sqlite url")
		.foreign_keys(true);

	let pool = SqlitePoolOptions::new()
		.max_connections(1)
		.connect_with(options)
		.await
		.expect("failed to create test pool");

	run_migrations(&pool).await.expect("failed to run migrations");
	pool
}

/// Insert a user directly and return its id.
pub async fn seed_user(pool: &SqlitePool, nickname: &str) -> i64 {
	let now = chrono::Utc::now().to_rfc3339();
	let result = sqlx::query(
		"INSERT INTO users (nickname, email, password_hash, created_at, updated_at) \
		 VALUES (?, ?, 'test-hash', ?, ?)",
	)
	.bind(nickname)
	.bind(format!("{nickname}@example.com"))
	.bind(&now)
	.bind(&now)
	.execute(pool)
	.await
	.expect("failed to seed user");
	result.last_insert_rowid()
}

/// Insert a post directly and return its id.
pub async fn seed_post(pool: &SqlitePool, author_id: i64, title: &str, content: &str) -> i64 {
	let now = chrono::Utc::now().to_rfc3339();
	let result = sqlx::query(
		"INSERT INTO posts (author_id, title, content, created_at, updated_at) \
		 VALUES (?, ?, ?, ?, ?)",
	)
	.bind(author_id)
	.bind(title)
	.bind(content)
	.bind(&now)
	.bind(&now)
	.execute(pool)
	.await
	.expect("failed to seed post");
	result.last_insert_rowid()
}
