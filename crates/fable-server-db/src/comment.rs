// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Comment repository for database operations.

use serde::Serialize;
use sqlx::sqlite::SqlitePool;
use sqlx::SqliteExecutor;

use crate::error::DbError;
use crate::query::{EntityFields, FieldDef, FieldKind, PagedEntity};
use crate::uow::UnitOfWork;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
	pub id: i64,
	pub post_id: i64,
	pub author_id: i64,
	pub comment: String,
	pub like_count: i64,
	pub created_at: String,
	pub updated_at: String,
}

impl PagedEntity for Comment {
	const TABLE: &'static str = "comments";
	const FIELDS: EntityFields = EntityFields::new(&[
		FieldDef::new("id", "id", FieldKind::Integer),
		FieldDef::new("postId", "post_id", FieldKind::Integer),
		FieldDef::new("authorId", "author_id", FieldKind::Integer),
		FieldDef::new("comment", "comment", FieldKind::Text),
		FieldDef::new("likeCount", "like_count", FieldKind::Integer),
		FieldDef::new("createdAt", "created_at", FieldKind::Timestamp),
		FieldDef::new("updatedAt", "updated_at", FieldKind::Timestamp),
	]);

	fn row_id(&self) -> i64 {
		self.id
	}
}

/// Repository for comment database operations.
#[derive(Clone)]
pub struct CommentRepository {
	pool: SqlitePool,
}

impl CommentRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Create a comment. Runs inside the caller's unit of work when given one,
	/// so the companion counter bump lands in the same transaction.
	pub async fn create_comment(
		&self,
		post_id: i64,
		author_id: i64,
		comment: &str,
		uow: Option<&mut UnitOfWork>,
	) -> Result<Comment, DbError> {
		match uow {
			Some(uow) => {
				let id = Self::insert_comment(uow.conn(), post_id, author_id, comment).await?;
				Self::fetch_comment(uow.conn(), id)
					.await?
					.ok_or_else(|| DbError::Internal("comment missing after insert".to_string()))
			}
			None => {
				let id = Self::insert_comment(&self.pool, post_id, author_id, comment).await?;
				Self::fetch_comment(&self.pool, id)
					.await?
					.ok_or_else(|| DbError::Internal("comment missing after insert".to_string()))
			}
		}
	}

	pub async fn get_comment(&self, id: i64) -> Result<Comment, DbError> {
		Self::fetch_comment(&self.pool, id)
			.await?
			.ok_or_else(|| DbError::NotFound(format!("comment {id}")))
	}

	pub async fn update_comment(&self, id: i64, comment: &str) -> Result<Comment, DbError> {
		let now = chrono::Utc::now().to_rfc3339();
		let result = sqlx::query("UPDATE comments SET comment = ?, updated_at = ? WHERE id = ?")
			.bind(comment)
			.bind(&now)
			.bind(id)
			.execute(&self.pool)
			.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound(format!("comment {id}")));
		}
		self.get_comment(id).await
	}

	pub async fn delete_comment(
		&self,
		id: i64,
		uow: Option<&mut UnitOfWork>,
	) -> Result<(), DbError> {
		let query = sqlx::query("DELETE FROM comments WHERE id = ?").bind(id);
		let result = match uow {
			Some(uow) => query.execute(uow.conn()).await?,
			None => query.execute(&self.pool).await?,
		};

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound(format!("comment {id}")));
		}
		Ok(())
	}

	pub async fn is_comment_author(
		&self,
		comment_id: i64,
		user_id: i64,
	) -> Result<bool, DbError> {
		let count: i64 =
			sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE id = ? AND author_id = ?")
				.bind(comment_id)
				.bind(user_id)
				.fetch_one(&self.pool)
				.await?;
		Ok(count > 0)
	}

	async fn insert_comment(
		conn: impl SqliteExecutor<'_>,
		post_id: i64,
		author_id: i64,
		comment: &str,
	) -> Result<i64, DbError> {
		let now = chrono::Utc::now().to_rfc3339();
		let result = sqlx::query(
			"INSERT INTO comments (post_id, author_id, comment, created_at, updated_at) \
			 VALUES (?, ?, ?, ?, ?)",
		)
		.bind(post_id)
		.bind(author_id)
		.bind(comment)
		.bind(&now)
		.bind(&now)
		.execute(conn)
		.await?;
		Ok(result.last_insert_rowid())
	}

	async fn fetch_comment(
		conn: impl SqliteExecutor<'_>,
		id: i64,
	) -> Result<Option<Comment>, DbError> {
		let comment = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = ?")
			.bind(id)
			.fetch_optional(conn)
			.await?;
		Ok(comment)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::post::PostRepository;
	use crate::testing::{create_test_pool, seed_post, seed_user};
	use crate::uow::run_in_unit_of_work;

	#[tokio::test]
	async fn test_create_and_get_comment() {
		let pool = create_test_pool().await;
		let author = seed_user(&pool, "alice").await;
		let post = seed_post(&pool, author, "hello", "world").await;
		let repo = CommentRepository::new(pool);

		let comment = repo
			.create_comment(post, author, "nice post", None)
			.await
			.unwrap();
		assert_eq!(comment.post_id, post);

		let fetched = repo.get_comment(comment.id).await.unwrap();
		assert_eq!(fetched.comment, "nice post");
	}

	#[tokio::test]
	async fn test_update_missing_comment_is_not_found() {
		let pool = create_test_pool().await;
		let repo = CommentRepository::new(pool);

		assert!(matches!(
			repo.update_comment(999, "x").await,
			Err(DbError::NotFound(_))
		));
	}

	#[tokio::test]
	async fn test_comment_and_counter_commit_together() {
		let pool = create_test_pool().await;
		let author = seed_user(&pool, "alice").await;
		let post = seed_post(&pool, author, "hello", "world").await;
		let comments = CommentRepository::new(pool.clone());
		let posts = PostRepository::new(pool.clone());

		run_in_unit_of_work(&pool, |uow| {
			let comments = comments.clone();
			let posts = posts.clone();
			Box::pin(async move {
				comments
					.create_comment(post, author, "nice post", Some(&mut *uow))
					.await?;
				posts.increment_comment_count(post, Some(&mut *uow)).await?;
				Ok(())
			})
		})
		.await
		.unwrap();

		let fetched = posts.get_post(post, None).await.unwrap();
		assert_eq!(fetched.comment_count, 1);
	}

	#[tokio::test]
	async fn test_delete_rolls_counter_back_atomically() {
		let pool = create_test_pool().await;
		let author = seed_user(&pool, "alice").await;
		let post = seed_post(&pool, author, "hello", "world").await;
		let comments = CommentRepository::new(pool.clone());
		let posts = PostRepository::new(pool.clone());

		let comment = comments
			.create_comment(post, author, "nice post", None)
			.await
			.unwrap();
		posts.increment_comment_count(post, None).await.unwrap();

		run_in_unit_of_work(&pool, |uow| {
			let comments = comments.clone();
			let posts = posts.clone();
			let comment_id = comment.id;
			Box::pin(async move {
				comments.delete_comment(comment_id, Some(&mut *uow)).await?;
				posts.decrement_comment_count(post, Some(&mut *uow)).await?;
				Ok(())
			})
		})
		.await
		.unwrap();

		let fetched = posts.get_post(post, None).await.unwrap();
		assert_eq!(fetched.comment_count, 0);
		assert!(matches!(
			comments.get_comment(comment.id).await,
			Err(DbError::NotFound(_))
		));
	}

	#[tokio::test]
	async fn test_failed_counter_update_discards_comment() {
		let pool = create_test_pool().await;
		let author = seed_user(&pool, "alice").await;
		let post = seed_post(&pool, author, "hello", "world").await;
		let comments = CommentRepository::new(pool.clone());
		let posts = PostRepository::new(pool.clone());

		let err = run_in_unit_of_work(&pool, |uow| {
			let comments = comments.clone();
			Box::pin(async move {
				comments
					.create_comment(post, author, "nice post", Some(&mut *uow))
					.await?;
				// the paired counter write trips the NOT NULL constraint,
				// failing after the comment row already landed
				sqlx::query("UPDATE posts SET comment_count = NULL WHERE id = ?")
					.bind(post)
					.execute(uow.conn())
					.await?;
				Ok(())
			})
		})
		.await
		.unwrap_err();
		assert!(matches!(err, DbError::TransactionFailed(_)));

		let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE post_id = ?")
			.bind(post)
			.fetch_one(&pool)
			.await
			.unwrap();
		assert_eq!(count, 0);
		let fetched = posts.get_post(post, None).await.unwrap();
		assert_eq!(fetched.comment_count, 0);
	}
}
