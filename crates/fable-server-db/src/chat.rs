// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Chat and message repository.

use serde::Serialize;
use sqlx::sqlite::SqlitePool;

use crate::error::DbError;
use crate::query::{EntityFields, FieldDef, FieldKind, PagedEntity};
use crate::uow::UnitOfWork;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
	pub id: i64,
	pub created_at: String,
	pub updated_at: String,
}

impl PagedEntity for Chat {
	const TABLE: &'static str = "chats";
	const FIELDS: EntityFields = EntityFields::new(&[
		FieldDef::new("id", "id", FieldKind::Integer),
		FieldDef::new("createdAt", "created_at", FieldKind::Timestamp),
		FieldDef::new("updatedAt", "updated_at", FieldKind::Timestamp),
	]);

	fn row_id(&self) -> i64 {
		self.id
	}
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
	pub id: i64,
	pub chat_id: i64,
	pub author_id: i64,
	pub message: String,
	pub created_at: String,
	pub updated_at: String,
}

impl PagedEntity for ChatMessage {
	const TABLE: &'static str = "messages";
	const FIELDS: EntityFields = EntityFields::new(&[
		FieldDef::new("id", "id", FieldKind::Integer),
		FieldDef::new("chatId", "chat_id", FieldKind::Integer),
		FieldDef::new("authorId", "author_id", FieldKind::Integer),
		FieldDef::new("message", "message", FieldKind::Text),
		FieldDef::new("createdAt", "created_at", FieldKind::Timestamp),
		FieldDef::new("updatedAt", "updated_at", FieldKind::Timestamp),
	]);

	fn row_id(&self) -> i64 {
		self.id
	}
}

/// Repository for chat database operations.
#[derive(Clone)]
pub struct ChatRepository {
	pool: SqlitePool,
}

impl ChatRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Create a chat and enrol all given users. The chat row and the
	/// membership rows land together, so this runs inside a unit of work.
	pub async fn create_chat(
		&self,
		user_ids: &[i64],
		uow: &mut UnitOfWork,
	) -> Result<Chat, DbError> {
		let now = chrono::Utc::now().to_rfc3339();
		let result = sqlx::query("INSERT INTO chats (created_at, updated_at) VALUES (?, ?)")
			.bind(&now)
			.bind(&now)
			.execute(uow.conn())
			.await?;
		let chat_id = result.last_insert_rowid();

		for user_id in user_ids {
			sqlx::query("INSERT INTO chat_users (chat_id, user_id) VALUES (?, ?)")
				.bind(chat_id)
				.bind(user_id)
				.execute(uow.conn())
				.await?;
		}

		let chat = sqlx::query_as::<_, Chat>("SELECT * FROM chats WHERE id = ?")
			.bind(chat_id)
			.fetch_optional(uow.conn())
			.await?
			.ok_or_else(|| DbError::Internal("chat missing after insert".to_string()))?;

		tracing::info!(chat_id, members = user_ids.len(), "chat created");
		Ok(chat)
	}

	pub async fn chat_exists(&self, chat_id: i64) -> Result<bool, DbError> {
		let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chats WHERE id = ?")
			.bind(chat_id)
			.fetch_one(&self.pool)
			.await?;
		Ok(count > 0)
	}

	pub async fn is_chat_member(&self, chat_id: i64, user_id: i64) -> Result<bool, DbError> {
		let count: i64 =
			sqlx::query_scalar("SELECT COUNT(*) FROM chat_users WHERE chat_id = ? AND user_id = ?")
				.bind(chat_id)
				.bind(user_id)
				.fetch_one(&self.pool)
				.await?;
		Ok(count > 0)
	}

	pub async fn create_message(
		&self,
		chat_id: i64,
		author_id: i64,
		message: &str,
	) -> Result<ChatMessage, DbError> {
		let now = chrono::Utc::now().to_rfc3339();
		let result = sqlx::query(
			"INSERT INTO messages (chat_id, author_id, message, created_at, updated_at) \
			 VALUES (?, ?, ?, ?, ?)",
		)
		.bind(chat_id)
		.bind(author_id)
		.bind(message)
		.bind(&now)
		.bind(&now)
		.execute(&self.pool)
		.await?;

		sqlx::query_as::<_, ChatMessage>("SELECT * FROM messages WHERE id = ?")
			.bind(result.last_insert_rowid())
			.fetch_optional(&self.pool)
			.await?
			.ok_or_else(|| DbError::Internal("message missing after insert".to_string()))
	}
}
