// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! User and follow-graph repository.

use serde::Serialize;
use sqlx::sqlite::SqlitePool;

use crate::error::DbError;
use crate::query::{EntityFields, FieldDef, FieldKind, PagedEntity};
use crate::uow::UnitOfWork;

/// A user row. The password hash never leaves the server.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
	pub id: i64,
	pub nickname: String,
	pub email: String,
	#[serde(skip_serializing)]
	pub password_hash: String,
	pub role: String,
	pub follower_count: i64,
	pub followee_count: i64,
	pub created_at: String,
	pub updated_at: String,
}

impl PagedEntity for User {
	const TABLE: &'static str = "users";
	const FIELDS: EntityFields = EntityFields::new(&[
		FieldDef::new("id", "id", FieldKind::Integer),
		FieldDef::new("nickname", "nickname", FieldKind::Text),
		FieldDef::new("email", "email", FieldKind::Text),
		FieldDef::new("role", "role", FieldKind::Text),
		FieldDef::new("followerCount", "follower_count", FieldKind::Integer),
		FieldDef::new("followeeCount", "followee_count", FieldKind::Integer),
		FieldDef::new("createdAt", "created_at", FieldKind::Timestamp),
		FieldDef::new("updatedAt", "updated_at", FieldKind::Timestamp),
	]);

	fn row_id(&self) -> i64 {
		self.id
	}
}

/// One edge of the follow graph, joined with the follower's identity for the
/// followers listing.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Follower {
	pub id: i64,
	pub nickname: String,
	pub email: String,
	pub is_confirmed: bool,
}

/// Repository for user database operations.
#[derive(Clone)]
pub struct UserRepository {
	pool: SqlitePool,
}

impl UserRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Create a user. Nickname and email must both be unused; the checks run
	/// up front so the caller gets a conflict naming the offending field.
	pub async fn create_user(
		&self,
		nickname: &str,
		email: &str,
		password_hash: &str,
	) -> Result<User, DbError> {
		let nickname_taken: i64 =
			sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE nickname = ?")
				.bind(nickname)
				.fetch_one(&self.pool)
				.await?;
		if nickname_taken > 0 {
			return Err(DbError::Conflict(format!("nickname {nickname} already exists")));
		}

		let email_taken: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ?")
			.bind(email)
			.fetch_one(&self.pool)
			.await?;
		if email_taken > 0 {
			return Err(DbError::Conflict(format!("email {email} already exists")));
		}

		let now = chrono::Utc::now().to_rfc3339();
		let result = sqlx::query(
			"INSERT INTO users (nickname, email, password_hash, created_at, updated_at) \
			 VALUES (?, ?, ?, ?, ?)",
		)
		.bind(nickname)
		.bind(email)
		.bind(password_hash)
		.bind(&now)
		.bind(&now)
		.execute(&self.pool)
		.await?;

		tracing::info!(nickname, "user created");
		self.get_by_id(result.last_insert_rowid()).await
	}

	pub async fn get_by_id(&self, id: i64) -> Result<User, DbError> {
		sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
			.bind(id)
			.fetch_optional(&self.pool)
			.await?
			.ok_or_else(|| DbError::NotFound(format!("user {id}")))
	}

	pub async fn get_by_email(&self, email: &str) -> Result<User, DbError> {
		sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
			.bind(email)
			.fetch_optional(&self.pool)
			.await?
			.ok_or_else(|| DbError::NotFound(format!("user with email {email}")))
	}

	pub async fn list_users(&self) -> Result<Vec<User>, DbError> {
		let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY id")
			.fetch_all(&self.pool)
			.await?;
		Ok(users)
	}

	/// Request to follow another user. The edge starts unconfirmed; a
	/// duplicate request surfaces as a conflict via the unique pair index.
	pub async fn follow_user(&self, follower_id: i64, followee_id: i64) -> Result<(), DbError> {
		let now = chrono::Utc::now().to_rfc3339();
		let result = sqlx::query(
			"INSERT INTO user_follows (follower_id, followee_id, created_at, updated_at) \
			 VALUES (?, ?, ?, ?)",
		)
		.bind(follower_id)
		.bind(followee_id)
		.bind(&now)
		.bind(&now)
		.execute(&self.pool)
		.await;

		match result {
			Ok(_) => Ok(()),
			Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(DbError::Conflict(
				format!("user {follower_id} already follows user {followee_id}"),
			)),
			Err(err) => Err(err.into()),
		}
	}

	pub async fn get_followers(
		&self,
		followee_id: i64,
		include_not_confirmed: bool,
	) -> Result<Vec<Follower>, DbError> {
		let sql = if include_not_confirmed {
			"SELECT u.id, u.nickname, u.email, f.is_confirmed \
			 FROM user_follows f JOIN users u ON u.id = f.follower_id \
			 WHERE f.followee_id = ? ORDER BY f.id"
		} else {
			"SELECT u.id, u.nickname, u.email, f.is_confirmed \
			 FROM user_follows f JOIN users u ON u.id = f.follower_id \
			 WHERE f.followee_id = ? AND f.is_confirmed = 1 ORDER BY f.id"
		};

		let followers = sqlx::query_as::<_, Follower>(sql)
			.bind(followee_id)
			.fetch_all(&self.pool)
			.await?;
		Ok(followers)
	}

	/// Confirm a pending follow request from `follower_id`. The edge must
	/// exist; confirmation is what the follower counter bump is keyed on.
	pub async fn confirm_follow(
		&self,
		follower_id: i64,
		followee_id: i64,
		uow: Option<&mut UnitOfWork>,
	) -> Result<(), DbError> {
		// only pending edges match, so a repeated confirm cannot double-bump
		// the follower counter
		let query = sqlx::query(
			"UPDATE user_follows SET is_confirmed = 1 \
			 WHERE follower_id = ? AND followee_id = ? AND is_confirmed = 0",
		)
		.bind(follower_id)
		.bind(followee_id);

		let result = match uow {
			Some(uow) => query.execute(uow.conn()).await?,
			None => query.execute(&self.pool).await?,
		};

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound(format!(
				"follow request from user {follower_id} to user {followee_id}"
			)));
		}
		Ok(())
	}

	pub async fn delete_follow(
		&self,
		follower_id: i64,
		followee_id: i64,
		uow: Option<&mut UnitOfWork>,
	) -> Result<(), DbError> {
		let query = sqlx::query(
			"DELETE FROM user_follows WHERE follower_id = ? AND followee_id = ?",
		)
		.bind(follower_id)
		.bind(followee_id);

		let result = match uow {
			Some(uow) => query.execute(uow.conn()).await?,
			None => query.execute(&self.pool).await?,
		};

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound(format!(
				"follow from user {follower_id} to user {followee_id}"
			)));
		}
		Ok(())
	}

	pub async fn increment_follower_count(
		&self,
		user_id: i64,
		uow: Option<&mut UnitOfWork>,
	) -> Result<(), DbError> {
		self.adjust_follower_count(user_id, 1, uow).await
	}

	pub async fn decrement_follower_count(
		&self,
		user_id: i64,
		uow: Option<&mut UnitOfWork>,
	) -> Result<(), DbError> {
		self.adjust_follower_count(user_id, -1, uow).await
	}

	async fn adjust_follower_count(
		&self,
		user_id: i64,
		delta: i64,
		uow: Option<&mut UnitOfWork>,
	) -> Result<(), DbError> {
		let query = sqlx::query(
			"UPDATE users SET follower_count = follower_count + ? WHERE id = ?",
		)
		.bind(delta)
		.bind(user_id);

		match uow {
			Some(uow) => query.execute(uow.conn()).await?,
			None => query.execute(&self.pool).await?,
		};
		Ok(())
	}
}
