// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Idempotent schema setup, run at boot.
//!
//! Every statement is `IF NOT EXISTS` so re-running against an existing
//! database is a no-op. Timestamps are RFC 3339 TEXT throughout.

use sqlx::sqlite::SqlitePool;

use crate::error::DbError;

const SCHEMA: &[&str] = &[
	r#"
	CREATE TABLE IF NOT EXISTS users (
		id INTEGER PRIMARY KEY AUTOINCREMENT,
		nickname TEXT NOT NULL UNIQUE,
		email TEXT NOT NULL UNIQUE,
		password_hash TEXT NOT NULL,
		role TEXT NOT NULL DEFAULT 'user' CHECK (role IN ('user', 'admin')),
		follower_count INTEGER NOT NULL DEFAULT 0,
		followee_count INTEGER NOT NULL DEFAULT 0,
		created_at TEXT NOT NULL,
		updated_at TEXT NOT NULL
	)
	"#,
	r#"
	CREATE TABLE IF NOT EXISTS posts (
		id INTEGER PRIMARY KEY AUTOINCREMENT,
		author_id INTEGER NOT NULL REFERENCES users(id),
		title TEXT NOT NULL,
		content TEXT NOT NULL,
		like_count INTEGER NOT NULL DEFAULT 0,
		comment_count INTEGER NOT NULL DEFAULT 0,
		created_at TEXT NOT NULL,
		updated_at TEXT NOT NULL
	)
	"#,
	r#"
	CREATE TABLE IF NOT EXISTS comments (
		id INTEGER PRIMARY KEY AUTOINCREMENT,
		post_id INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
		author_id INTEGER NOT NULL REFERENCES users(id),
		comment TEXT NOT NULL,
		like_count INTEGER NOT NULL DEFAULT 0,
		created_at TEXT NOT NULL,
		updated_at TEXT NOT NULL
	)
	"#,
	r#"
	CREATE TABLE IF NOT EXISTS user_follows (
		id INTEGER PRIMARY KEY AUTOINCREMENT,
		follower_id INTEGER NOT NULL REFERENCES users(id),
		followee_id INTEGER NOT NULL REFERENCES users(id),
		is_confirmed INTEGER NOT NULL DEFAULT 0,
		created_at TEXT NOT NULL,
		updated_at TEXT NOT NULL,
		UNIQUE (follower_id, followee_id)
	)
	"#,
	r#"
	CREATE TABLE IF NOT EXISTS chats (
		id INTEGER PRIMARY KEY AUTOINCREMENT,
		created_at TEXT NOT NULL,
		updated_at TEXT NOT NULL
	)
	"#,
	r#"
	CREATE TABLE IF NOT EXISTS chat_users (
		chat_id INTEGER NOT NULL REFERENCES chats(id) ON DELETE CASCADE,
		user_id INTEGER NOT NULL REFERENCES users(id),
		PRIMARY KEY (chat_id, user_id)
	)
	"#,
	r#"
	CREATE TABLE IF NOT EXISTS messages (
		id INTEGER PRIMARY KEY AUTOINCREMENT,
		chat_id INTEGER NOT NULL REFERENCES chats(id) ON DELETE CASCADE,
		author_id INTEGER NOT NULL REFERENCES users(id),
		message TEXT NOT NULL,
		created_at TEXT NOT NULL,
		updated_at TEXT NOT NULL
	)
	"#,
	r#"
	CREATE TABLE IF NOT EXISTS sessions (
		id INTEGER PRIMARY KEY AUTOINCREMENT,
		user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
		token_hash TEXT NOT NULL,
		created_at TEXT NOT NULL,
		expires_at TEXT NOT NULL
	)
	"#,
	"CREATE INDEX IF NOT EXISTS idx_sessions_token_hash ON sessions(token_hash)",
	"CREATE INDEX IF NOT EXISTS idx_posts_author ON posts(author_id)",
	"CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id)",
	"CREATE INDEX IF NOT EXISTS idx_messages_chat ON messages(chat_id)",
];

/// Apply the schema to the given pool.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), DbError> {
	for statement in SCHEMA {
		sqlx::query(statement).execute(pool).await?;
	}

	tracing::debug!("database schema ready");
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::create_test_pool;

	#[tokio::test]
	async fn test_migrations_are_idempotent() {
		let pool = create_test_pool().await;
		// testing::create_test_pool already ran them once
		run_migrations(&pool).await.unwrap();
		run_migrations(&pool).await.unwrap();
	}
}
