// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use crate::query::QueryError;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
	#[error("Database error: {0}")]
	Sqlx(#[from] sqlx::Error),

	#[error("Not found: {0}")]
	NotFound(String),

	#[error("Conflict: {0}")]
	Conflict(String),

	#[error("Internal: {0}")]
	Internal(String),

	#[error("Query error: {0}")]
	Query(#[from] QueryError),

	/// A unit-of-work was rolled back. The original failure is preserved as
	/// the source so callers can log the cause.
	#[error("Transaction rolled back: {0}")]
	TransactionFailed(#[source] Box<DbError>),
}

pub type Result<T> = std::result::Result<T, DbError>;
