// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Comment HTTP handlers.
//!
//! Comment creation and deletion also adjust the post's `comment_count`, so
//! both run inside a unit of work; the comment row and the counter move
//! together or not at all.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use fable_server_db::query::{paginate, FilterValue, PagedEntity, Paginated, QueryDescriptor};
use fable_server_db::{run_in_unit_of_work, Comment};

use crate::api::{AppState, MAX_PAGE_SIZE};
use crate::auth_middleware::RequireAuth;
use crate::error::ServerError;
use crate::validation::validate_non_empty;

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
	pub comment: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
	pub comment: String,
}

/// GET /posts/{post_id}/comments - paginated, pinned to the post.
pub async fn list_comments(
	State(state): State<AppState>,
	Path(post_id): Path<i64>,
	Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Paginated<Comment>>, ServerError> {
	if !state.posts.post_exists(post_id).await? {
		return Err(ServerError::NotFound(format!("post {post_id}")));
	}

	let mut descriptor = QueryDescriptor::from_pairs(pairs).map_err(ServerError::from)?;
	descriptor.clamp_take(MAX_PAGE_SIZE);

	// the path constraint wins over any client-supplied postId filter
	let pin = Comment::FIELDS
		.equals("postId", FilterValue::Int(post_id))
		.map_err(ServerError::from)?;

	let page = paginate::<Comment>(
		&state.pool,
		&descriptor,
		&[pin],
		&format!("/posts/{post_id}/comments"),
		&state.config.http.public_base_url,
	)
	.await?;
	Ok(Json(page))
}

/// GET /posts/{post_id}/comments/{id}
pub async fn get_comment(
	State(state): State<AppState>,
	Path((post_id, id)): Path<(i64, i64)>,
) -> Result<Json<Comment>, ServerError> {
	let comment = state.comments.get_comment(id).await?;
	if comment.post_id != post_id {
		return Err(ServerError::NotFound(format!("comment {id}")));
	}
	Ok(Json(comment))
}

/// POST /posts/{post_id}/comments - create and bump the counter atomically.
pub async fn create_comment(
	State(state): State<AppState>,
	RequireAuth(user): RequireAuth,
	Path(post_id): Path<i64>,
	Json(payload): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, ServerError> {
	validate_non_empty(&payload.comment, "comment")?;

	if !state.posts.post_exists(post_id).await? {
		return Err(ServerError::NotFound(format!("post {post_id}")));
	}

	let comments = state.comments.clone();
	let posts = state.posts.clone();
	let author_id = user.id;
	let body = payload.comment;

	let comment = run_in_unit_of_work(&state.pool, move |uow| {
		Box::pin(async move {
			let comment = comments
				.create_comment(post_id, author_id, &body, Some(&mut *uow))
				.await?;
			posts.increment_comment_count(post_id, Some(&mut *uow)).await?;
			Ok(comment)
		})
	})
	.await?;

	Ok((StatusCode::CREATED, Json(comment)))
}

/// PATCH /posts/{post_id}/comments/{id} - author or admin only.
pub async fn update_comment(
	State(state): State<AppState>,
	RequireAuth(user): RequireAuth,
	Path((post_id, id)): Path<(i64, i64)>,
	Json(payload): Json<UpdateCommentRequest>,
) -> Result<Json<Comment>, ServerError> {
	validate_non_empty(&payload.comment, "comment")?;
	ensure_comment_author(&state, post_id, id, &user).await?;

	let comment = state.comments.update_comment(id, &payload.comment).await?;
	Ok(Json(comment))
}

/// DELETE /posts/{post_id}/comments/{id} - delete and decrement atomically.
pub async fn delete_comment(
	State(state): State<AppState>,
	RequireAuth(user): RequireAuth,
	Path((post_id, id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, ServerError> {
	ensure_comment_author(&state, post_id, id, &user).await?;

	let comments = state.comments.clone();
	let posts = state.posts.clone();

	run_in_unit_of_work(&state.pool, move |uow| {
		Box::pin(async move {
			comments.delete_comment(id, Some(&mut *uow)).await?;
			posts.decrement_comment_count(post_id, Some(&mut *uow)).await?;
			Ok(())
		})
	})
	.await?;

	Ok(StatusCode::NO_CONTENT)
}

async fn ensure_comment_author(
	state: &AppState,
	post_id: i64,
	comment_id: i64,
	user: &fable_server_auth::CurrentUser,
) -> Result<(), ServerError> {
	let comment = state.comments.get_comment(comment_id).await?;
	if comment.post_id != post_id {
		return Err(ServerError::NotFound(format!("comment {comment_id}")));
	}
	if user.is_admin() || comment.author_id == user.id {
		return Ok(());
	}
	Err(ServerError::Forbidden(
		"only the author may modify this comment".to_string(),
	))
}
