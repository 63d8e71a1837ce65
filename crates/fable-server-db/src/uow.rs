// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Request-scoped unit-of-work.
//!
//! A [`UnitOfWork`] owns exactly one open transaction. `commit` and
//! `rollback` consume the handle, so a closed handle cannot be reused and
//! every exit path releases the underlying connection (dropping an open
//! handle rolls back).
//!
//! Operations that must be atomic together receive the same handle
//! explicitly as `Option<&mut UnitOfWork>`; `None` selects the plain pooled
//! path. There is no ambient/task-local propagation.

use futures::future::BoxFuture;
use sqlx::sqlite::SqlitePool;
use sqlx::{Sqlite, SqliteConnection, Transaction};

use crate::error::DbError;

/// An open transaction bound to one inbound request.
pub struct UnitOfWork {
	tx: Transaction<'static, Sqlite>,
}

impl UnitOfWork {
	/// Open a transaction on a pooled connection.
	///
	/// Fails if the store is unreachable or the pool is exhausted; no retry
	/// is performed here.
	pub async fn begin(pool: &SqlitePool) -> Result<Self, DbError> {
		let tx = pool.begin().await?;
		tracing::trace!("unit of work started");
		Ok(Self { tx })
	}

	/// The connection all participating operations execute on.
	pub fn conn(&mut self) -> &mut SqliteConnection {
		&mut self.tx
	}

	/// Make all effects visible atomically and release the connection.
	pub async fn commit(self) -> Result<(), DbError> {
		self.tx.commit().await?;
		tracing::trace!("unit of work committed");
		Ok(())
	}

	/// Discard all effects and release the connection.
	pub async fn rollback(self) -> Result<(), DbError> {
		self.tx.rollback().await?;
		tracing::trace!("unit of work rolled back");
		Ok(())
	}
}

/// Request-boundary adapter: begin a unit of work, run `f` with the handle,
/// commit on success, roll back on any error.
///
/// The original failure is preserved inside [`DbError::TransactionFailed`],
/// never swallowed; partial effects are never observable after an error.
pub async fn run_in_unit_of_work<T, F>(pool: &SqlitePool, f: F) -> Result<T, DbError>
where
	F: for<'a> FnOnce(&'a mut UnitOfWork) -> BoxFuture<'a, Result<T, DbError>>,
{
	let mut uow = UnitOfWork::begin(pool).await?;

	match f(&mut uow).await {
		Ok(value) => {
			uow.commit().await?;
			Ok(value)
		}
		Err(cause) => {
			if let Err(rollback_err) = uow.rollback().await {
				tracing::error!(error = %rollback_err, "rollback failed after operation error");
			}
			Err(DbError::TransactionFailed(Box::new(cause)))
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{create_test_pool, seed_user};

	async fn count_users(pool: &SqlitePool) -> i64 {
		sqlx::query_scalar("SELECT COUNT(*) FROM users")
			.fetch_one(pool)
			.await
			.unwrap()
	}

	async fn insert_marker_user(uow: &mut UnitOfWork, nickname: &str) -> Result<(), DbError> {
		let now = chrono::Utc::now().to_rfc3339();
		sqlx::query(
			"INSERT INTO users (nickname, email, password_hash, created_at, updated_at) \
			 VALUES (?, ?, 'x', ?, ?)",
		)
		.bind(nickname)
		.bind(format!("{nickname}@example.com"))
		.bind(&now)
		.bind(&now)
		.execute(uow.conn())
		.await?;
		Ok(())
	}

	#[tokio::test]
	async fn test_commit_makes_effects_visible() {
		let pool = create_test_pool().await;

		let mut uow = UnitOfWork::begin(&pool).await.unwrap();
		insert_marker_user(&mut uow, "alice").await.unwrap();
		uow.commit().await.unwrap();

		assert_eq!(count_users(&pool).await, 1);
	}

	#[tokio::test]
	async fn test_rollback_discards_effects() {
		let pool = create_test_pool().await;

		let mut uow = UnitOfWork::begin(&pool).await.unwrap();
		insert_marker_user(&mut uow, "alice").await.unwrap();
		uow.rollback().await.unwrap();

		assert_eq!(count_users(&pool).await, 0);
	}

	#[tokio::test]
	async fn test_drop_releases_and_rolls_back() {
		let pool = create_test_pool().await;

		{
			let mut uow = UnitOfWork::begin(&pool).await.unwrap();
			insert_marker_user(&mut uow, "alice").await.unwrap();
			// dropped without commit
		}

		assert_eq!(count_users(&pool).await, 0);
	}

	#[tokio::test]
	async fn test_run_in_unit_of_work_commits_on_ok() {
		let pool = create_test_pool().await;

		run_in_unit_of_work(&pool, |uow| {
			Box::pin(async move { insert_marker_user(uow, "alice").await })
		})
		.await
		.unwrap();

		assert_eq!(count_users(&pool).await, 1);
	}

	#[tokio::test]
	async fn test_run_in_unit_of_work_rolls_back_and_wraps_error() {
		let pool = create_test_pool().await;
		seed_user(&pool, "alice").await;

		let err = run_in_unit_of_work(&pool, |uow| {
			Box::pin(async move {
				insert_marker_user(uow, "bob").await?;
				// duplicate nickname forces a failure after the first insert
				insert_marker_user(uow, "alice").await?;
				Ok(())
			})
		})
		.await
		.unwrap_err();

		assert!(matches!(err, DbError::TransactionFailed(_)));
		// the cause is preserved in the message
		assert!(err.to_string().contains("Transaction rolled back"));
		// bob's insert was discarded along with the failure
		assert_eq!(count_users(&pool).await, 1);
	}
}
