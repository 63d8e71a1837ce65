// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Post HTTP handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use fable_server_db::query::{paginate, Paginated, QueryDescriptor};
use fable_server_db::{run_in_unit_of_work, Post};

use crate::api::{AppState, MAX_PAGE_SIZE};
use crate::auth_middleware::{RequireAdmin, RequireAuth};
use crate::error::ServerError;
use crate::validation::validate_non_empty;

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
	pub title: String,
	pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
	pub title: Option<String>,
	pub content: Option<String>,
}

/// GET /posts - paginated post listing.
pub async fn list_posts(
	State(state): State<AppState>,
	Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Paginated<Post>>, ServerError> {
	let mut descriptor = QueryDescriptor::from_pairs(pairs).map_err(ServerError::from)?;
	descriptor.clamp_take(MAX_PAGE_SIZE);

	let page = paginate::<Post>(
		&state.pool,
		&descriptor,
		&[],
		"/posts",
		&state.config.http.public_base_url,
	)
	.await?;
	Ok(Json(page))
}

/// GET /posts/{id}
pub async fn get_post(
	State(state): State<AppState>,
	Path(id): Path<i64>,
) -> Result<Json<Post>, ServerError> {
	let post = state.posts.get_post(id, None).await?;
	Ok(Json(post))
}

/// POST /posts - runs in a unit of work so future companion writes stay
/// atomic with the insert.
pub async fn create_post(
	State(state): State<AppState>,
	RequireAuth(user): RequireAuth,
	Json(payload): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, ServerError> {
	validate_non_empty(&payload.title, "title")?;
	validate_non_empty(&payload.content, "content")?;

	let posts = state.posts.clone();
	let author_id = user.id;
	let post = run_in_unit_of_work(&state.pool, move |uow| {
		Box::pin(async move {
			posts
				.create_post(author_id, &payload.title, &payload.content, Some(&mut *uow))
				.await
		})
	})
	.await?;
	Ok((StatusCode::CREATED, Json(post)))
}

/// PATCH /posts/{id} - author or admin only.
pub async fn update_post(
	State(state): State<AppState>,
	RequireAuth(user): RequireAuth,
	Path(id): Path<i64>,
	Json(payload): Json<UpdatePostRequest>,
) -> Result<Json<Post>, ServerError> {
	ensure_post_author(&state, id, &user).await?;

	if let Some(title) = &payload.title {
		validate_non_empty(title, "title")?;
	}
	if let Some(content) = &payload.content {
		validate_non_empty(content, "content")?;
	}

	let post = state
		.posts
		.update_post(id, payload.title.as_deref(), payload.content.as_deref())
		.await?;
	Ok(Json(post))
}

/// DELETE /posts/{id} - admin only.
pub async fn delete_post(
	State(state): State<AppState>,
	RequireAdmin(_admin): RequireAdmin,
	Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServerError> {
	state.posts.delete_post(id).await?;
	Ok(StatusCode::NO_CONTENT)
}

async fn ensure_post_author(
	state: &AppState,
	post_id: i64,
	user: &fable_server_auth::CurrentUser,
) -> Result<(), ServerError> {
	if !state.posts.post_exists(post_id).await? {
		return Err(ServerError::NotFound(format!("post {post_id}")));
	}
	if user.is_admin() {
		return Ok(());
	}
	if !state.posts.is_post_author(post_id, user.id).await? {
		return Err(ServerError::Forbidden(
			"only the author may modify this post".to_string(),
		));
	}
	Ok(())
}
