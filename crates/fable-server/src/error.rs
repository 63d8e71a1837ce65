// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Server error types and HTTP response conversions.

use axum::{
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use serde::Serialize;

use fable_server_auth::AuthError;
use fable_server_db::query::QueryError;
use fable_server_db::DbError;

/// Server error types for request handling.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
	/// Invalid request payload or query.
	#[error("Invalid request: {0}")]
	BadRequest(String),

	/// Unauthorized (authentication failed).
	#[error("Unauthorized: {0}")]
	Unauthorized(String),

	/// Forbidden (insufficient permissions).
	#[error("Forbidden: {0}")]
	Forbidden(String),

	/// Resource not found.
	#[error("Not found: {0}")]
	NotFound(String),

	/// Conflict with existing state.
	#[error("Conflict: {0}")]
	Conflict(String),

	/// A unit of work was rolled back.
	#[error("Transaction rolled back: {0}")]
	Transaction(String),

	/// Internal server error.
	#[error("Internal error: {0}")]
	Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
	pub error: String,
	pub message: String,
}

impl From<DbError> for ServerError {
	fn from(err: DbError) -> Self {
		match err {
			DbError::NotFound(msg) => ServerError::NotFound(msg),
			DbError::Conflict(msg) => ServerError::Conflict(msg),
			// a rolled-back unit of work keeps its cause in the message
			DbError::TransactionFailed(_) => ServerError::Transaction(err.to_string()),
			DbError::Query(query_err) => query_err.into(),
			DbError::Sqlx(_) | DbError::Internal(_) => ServerError::Internal(err.to_string()),
		}
	}
}

impl From<QueryError> for ServerError {
	fn from(err: QueryError) -> Self {
		// an unregistered operator is a server configuration fault, not a
		// client mistake
		if err.is_user_error() {
			ServerError::BadRequest(err.to_string())
		} else {
			ServerError::Internal(err.to_string())
		}
	}
}

impl From<AuthError> for ServerError {
	fn from(err: AuthError) -> Self {
		match err {
			AuthError::Hashing(msg) => ServerError::Internal(msg),
			other => ServerError::Unauthorized(other.to_string()),
		}
	}
}

impl IntoResponse for ServerError {
	fn into_response(self) -> Response {
		let (status, error_response) = match &self {
			ServerError::BadRequest(msg) => (
				StatusCode::BAD_REQUEST,
				ErrorResponse {
					error: "bad_request".to_string(),
					message: msg.clone(),
				},
			),
			ServerError::Unauthorized(msg) => {
				tracing::warn!(error = %msg, "unauthorized");
				(
					StatusCode::UNAUTHORIZED,
					ErrorResponse {
						error: "unauthorized".to_string(),
						message: msg.clone(),
					},
				)
			}
			ServerError::Forbidden(msg) => {
				tracing::warn!(error = %msg, "forbidden");
				(
					StatusCode::FORBIDDEN,
					ErrorResponse {
						error: "forbidden".to_string(),
						message: msg.clone(),
					},
				)
			}
			ServerError::NotFound(msg) => (
				StatusCode::NOT_FOUND,
				ErrorResponse {
					error: "not_found".to_string(),
					message: msg.clone(),
				},
			),
			ServerError::Conflict(msg) => (
				StatusCode::CONFLICT,
				ErrorResponse {
					error: "conflict".to_string(),
					message: msg.clone(),
				},
			),
			ServerError::Transaction(msg) => {
				// full cause goes to the log, not the wire
				tracing::error!(error = %msg, "transaction rolled back");
				(
					StatusCode::INTERNAL_SERVER_ERROR,
					ErrorResponse {
						error: "transaction_failed".to_string(),
						message: "The operation was rolled back".to_string(),
					},
				)
			}
			ServerError::Internal(msg) => {
				tracing::error!(error = %msg, "internal error");
				(
					StatusCode::INTERNAL_SERVER_ERROR,
					ErrorResponse {
						error: "internal_error".to_string(),
						message: "An internal error occurred".to_string(),
					},
				)
			}
		};

		(status, Json(error_response)).into_response()
	}
}
