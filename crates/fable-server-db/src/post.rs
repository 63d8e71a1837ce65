// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Post repository for database operations.

use serde::Serialize;
use sqlx::sqlite::SqlitePool;
use sqlx::SqliteExecutor;

use crate::error::DbError;
use crate::query::{EntityFields, FieldDef, FieldKind, PagedEntity};
use crate::uow::UnitOfWork;

/// A blog post row. `comment_count` is a materialized aggregate of the
/// post's comments, maintained incrementally alongside comment writes.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
	pub id: i64,
	pub author_id: i64,
	pub title: String,
	pub content: String,
	pub like_count: i64,
	pub comment_count: i64,
	pub created_at: String,
	pub updated_at: String,
}

impl PagedEntity for Post {
	const TABLE: &'static str = "posts";
	const FIELDS: EntityFields = EntityFields::new(&[
		FieldDef::new("id", "id", FieldKind::Integer),
		FieldDef::new("authorId", "author_id", FieldKind::Integer),
		FieldDef::new("title", "title", FieldKind::Text),
		FieldDef::new("content", "content", FieldKind::Text),
		FieldDef::new("likeCount", "like_count", FieldKind::Integer),
		FieldDef::new("commentCount", "comment_count", FieldKind::Integer),
		FieldDef::new("createdAt", "created_at", FieldKind::Timestamp),
		FieldDef::new("updatedAt", "updated_at", FieldKind::Timestamp),
	]);

	fn row_id(&self) -> i64 {
		self.id
	}
}

/// Repository for post database operations.
#[derive(Clone)]
pub struct PostRepository {
	pool: SqlitePool,
}

impl PostRepository {
	/// Create a new repository from an existing pool.
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Create a post, optionally inside a unit of work.
	pub async fn create_post(
		&self,
		author_id: i64,
		title: &str,
		content: &str,
		uow: Option<&mut UnitOfWork>,
	) -> Result<Post, DbError> {
		match uow {
			Some(uow) => {
				let id = Self::insert_post(uow.conn(), author_id, title, content).await?;
				Self::fetch_post(uow.conn(), id)
					.await?
					.ok_or_else(|| DbError::Internal("post missing after insert".to_string()))
			}
			None => {
				let id = Self::insert_post(&self.pool, author_id, title, content).await?;
				Self::fetch_post(&self.pool, id)
					.await?
					.ok_or_else(|| DbError::Internal("post missing after insert".to_string()))
			}
		}
	}

	/// Get a post by id, optionally through an open unit of work so a
	/// transactional route reads its own uncommitted writes.
	pub async fn get_post(
		&self,
		id: i64,
		uow: Option<&mut UnitOfWork>,
	) -> Result<Post, DbError> {
		let post = match uow {
			Some(uow) => Self::fetch_post(uow.conn(), id).await?,
			None => Self::fetch_post(&self.pool, id).await?,
		};
		post.ok_or_else(|| DbError::NotFound(format!("post {id}")))
	}

	pub async fn update_post(
		&self,
		id: i64,
		title: Option<&str>,
		content: Option<&str>,
	) -> Result<Post, DbError> {
		let existing = self.get_post(id, None).await?;
		let now = chrono::Utc::now().to_rfc3339();

		sqlx::query("UPDATE posts SET title = ?, content = ?, updated_at = ? WHERE id = ?")
			.bind(title.unwrap_or(&existing.title))
			.bind(content.unwrap_or(&existing.content))
			.bind(&now)
			.bind(id)
			.execute(&self.pool)
			.await?;

		self.get_post(id, None).await
	}

	pub async fn delete_post(&self, id: i64) -> Result<(), DbError> {
		let result = sqlx::query("DELETE FROM posts WHERE id = ?")
			.bind(id)
			.execute(&self.pool)
			.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound(format!("post {id}")));
		}

		tracing::debug!(post_id = id, "post deleted");
		Ok(())
	}

	pub async fn post_exists(&self, id: i64) -> Result<bool, DbError> {
		let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE id = ?")
			.bind(id)
			.fetch_one(&self.pool)
			.await?;
		Ok(count > 0)
	}

	pub async fn is_post_author(&self, post_id: i64, user_id: i64) -> Result<bool, DbError> {
		let count: i64 =
			sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE id = ? AND author_id = ?")
				.bind(post_id)
				.bind(user_id)
				.fetch_one(&self.pool)
				.await?;
		Ok(count > 0)
	}

	/// Atomically bump `comment_count`. The adjustment happens entirely at
	/// the storage layer; the counter is never read first.
	pub async fn increment_comment_count(
		&self,
		post_id: i64,
		uow: Option<&mut UnitOfWork>,
	) -> Result<(), DbError> {
		self.adjust_comment_count(post_id, 1, uow).await
	}

	pub async fn decrement_comment_count(
		&self,
		post_id: i64,
		uow: Option<&mut UnitOfWork>,
	) -> Result<(), DbError> {
		self.adjust_comment_count(post_id, -1, uow).await
	}

	async fn adjust_comment_count(
		&self,
		post_id: i64,
		delta: i64,
		uow: Option<&mut UnitOfWork>,
	) -> Result<(), DbError> {
		let query = sqlx::query(
			"UPDATE posts SET comment_count = comment_count + ? WHERE id = ?",
		)
		.bind(delta)
		.bind(post_id);

		// Zero rows affected means the post is gone; callers validate
		// existence, so this stays a no-op.
		match uow {
			Some(uow) => query.execute(uow.conn()).await?,
			None => query.execute(&self.pool).await?,
		};
		Ok(())
	}

	async fn insert_post(
		conn: impl SqliteExecutor<'_>,
		author_id: i64,
		title: &str,
		content: &str,
	) -> Result<i64, DbError> {
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
		.execute(conn)
		.await?;
		Ok(result.last_insert_rowid())
	}

	async fn fetch_post(
		conn: impl SqliteExecutor<'_>,
		id: i64,
	) -> Result<Option<Post>, DbError> {
		let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = ?")
			.bind(id)
			.fetch_optional(conn)
			.await?;
		Ok(post)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{create_test_pool, seed_user};

	#[tokio::test]
	async fn test_create_and_get_post() {
		let pool = create_test_pool().await;
		let author = seed_user(&pool, "alice").await;
		let repo = PostRepository::new(pool);

		let post = repo
			.create_post(author, "hello", "world", None)
			.await
			.unwrap();
		assert_eq!(post.author_id, author);
		assert_eq!(post.comment_count, 0);

		let fetched = repo.get_post(post.id, None).await.unwrap();
		assert_eq!(fetched.title, "hello");
	}

	#[tokio::test]
	async fn test_get_missing_post_is_not_found() {
		let pool = create_test_pool().await;
		let repo = PostRepository::new(pool);

		assert!(matches!(
			repo.get_post(999, None).await,
			Err(DbError::NotFound(_))
		));
	}

	#[tokio::test]
	async fn test_update_post_partial() {
		let pool = create_test_pool().await;
		let author = seed_user(&pool, "alice").await;
		let repo = PostRepository::new(pool);

		let post = repo
			.create_post(author, "hello", "world", None)
			.await
			.unwrap();
		let updated = repo
			.update_post(post.id, Some("revised"), None)
			.await
			.unwrap();
		assert_eq!(updated.title, "revised");
		assert_eq!(updated.content, "world");
	}

	#[tokio::test]
	async fn test_delete_post() {
		let pool = create_test_pool().await;
		let author = seed_user(&pool, "alice").await;
		let repo = PostRepository::new(pool);

		let post = repo
			.create_post(author, "hello", "world", None)
			.await
			.unwrap();
		repo.delete_post(post.id).await.unwrap();
		assert!(!repo.post_exists(post.id).await.unwrap());
		assert!(matches!(
			repo.delete_post(post.id).await,
			Err(DbError::NotFound(_))
		));
	}

	#[tokio::test]
	async fn test_concurrent_increments_lose_no_updates() {
		let pool = create_test_pool().await;
		let author = seed_user(&pool, "alice").await;
		let repo = PostRepository::new(pool.clone());

		let post = repo
			.create_post(author, "hello", "world", None)
			.await
			.unwrap();

		let mut handles = Vec::new();
		for _ in 0..20 {
			let repo = repo.clone();
			let post_id = post.id;
			handles.push(tokio::spawn(async move {
				repo.increment_comment_count(post_id, None).await.unwrap();
			}));
		}
		for handle in handles {
			handle.await.unwrap();
		}

		let fetched = repo.get_post(post.id, None).await.unwrap();
		assert_eq!(fetched.comment_count, 20);
	}

	#[tokio::test]
	async fn test_adjust_missing_post_is_noop() {
		let pool = create_test_pool().await;
		let repo = PostRepository::new(pool);

		repo.increment_comment_count(999, None).await.unwrap();
	}
}
