// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! User and follow-graph HTTP handlers.
//!
//! Confirming or removing a follow also adjusts the followee's
//! `follower_count`, so those handlers run inside a unit of work.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use fable_server_db::{run_in_unit_of_work, Follower, User};

use crate::api::AppState;
use crate::auth_middleware::{RequireAdmin, RequireAuth};
use crate::error::ServerError;

#[derive(Debug, Deserialize)]
pub struct FollowerListQuery {
	#[serde(default)]
	pub include_not_confirmed: bool,
}

/// GET /users - admin only.
pub async fn list_users(
	State(state): State<AppState>,
	RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<User>>, ServerError> {
	let users = state.users.list_users().await?;
	Ok(Json(users))
}

/// GET /users/me
pub async fn get_me(
	State(state): State<AppState>,
	RequireAuth(user): RequireAuth,
) -> Result<Json<User>, ServerError> {
	let user = state.users.get_by_id(user.id).await?;
	Ok(Json(user))
}

/// POST /users/follow/{id} - request to follow another user.
pub async fn follow_user(
	State(state): State<AppState>,
	RequireAuth(user): RequireAuth,
	Path(followee_id): Path<i64>,
) -> Result<impl IntoResponse, ServerError> {
	if followee_id == user.id {
		return Err(ServerError::BadRequest("cannot follow yourself".to_string()));
	}
	// surfaces a 404 before the insert hits the foreign key
	state.users.get_by_id(followee_id).await?;

	state.users.follow_user(user.id, followee_id).await?;
	Ok(StatusCode::CREATED)
}

/// GET /users/follow/me - my followers.
pub async fn get_my_followers(
	State(state): State<AppState>,
	RequireAuth(user): RequireAuth,
	Query(query): Query<FollowerListQuery>,
) -> Result<Json<Vec<Follower>>, ServerError> {
	let followers = state
		.users
		.get_followers(user.id, query.include_not_confirmed)
		.await?;
	Ok(Json(followers))
}

/// PATCH /users/follow/{id}/confirm - accept a pending request and bump the
/// follower counter atomically.
pub async fn confirm_follow(
	State(state): State<AppState>,
	RequireAuth(user): RequireAuth,
	Path(follower_id): Path<i64>,
) -> Result<impl IntoResponse, ServerError> {
	let users = state.users.clone();
	let followee_id = user.id;

	run_in_unit_of_work(&state.pool, move |uow| {
		Box::pin(async move {
			users
				.confirm_follow(follower_id, followee_id, Some(&mut *uow))
				.await?;
			users
				.increment_follower_count(followee_id, Some(&mut *uow))
				.await?;
			Ok(())
		})
	})
	.await?;

	Ok(StatusCode::OK)
}

/// DELETE /users/follow/{id} - unfollow and decrement atomically.
pub async fn delete_follow(
	State(state): State<AppState>,
	RequireAuth(user): RequireAuth,
	Path(followee_id): Path<i64>,
) -> Result<impl IntoResponse, ServerError> {
	let users = state.users.clone();
	let follower_id = user.id;

	run_in_unit_of_work(&state.pool, move |uow| {
		Box::pin(async move {
			users
				.delete_follow(follower_id, followee_id, Some(&mut *uow))
				.await?;
			users
				.decrement_follower_count(followee_id, Some(&mut *uow))
				.await?;
			Ok(())
		})
	})
	.await?;

	Ok(StatusCode::NO_CONTENT)
}
