// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Chat HTTP handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use fable_server_db::query::{paginate, FilterValue, PagedEntity, Paginated, QueryDescriptor};
use fable_server_db::{run_in_unit_of_work, Chat, ChatMessage};

use crate::api::{AppState, MAX_PAGE_SIZE};
use crate::auth_middleware::RequireAuth;
use crate::error::ServerError;

#[derive(Debug, Deserialize)]
pub struct CreateChatRequest {
	#[serde(rename = "userIds")]
	pub user_ids: Vec<i64>,
}

/// GET /chats - paginated chat listing.
pub async fn list_chats(
	State(state): State<AppState>,
	RequireAuth(_user): RequireAuth,
	Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Paginated<Chat>>, ServerError> {
	let mut descriptor = QueryDescriptor::from_pairs(pairs).map_err(ServerError::from)?;
	descriptor.clamp_take(MAX_PAGE_SIZE);

	let page = paginate::<Chat>(
		&state.pool,
		&descriptor,
		&[],
		"/chats",
		&state.config.http.public_base_url,
	)
	.await?;
	Ok(Json(page))
}

/// POST /chats - create a chat; the creator is always enrolled.
pub async fn create_chat(
	State(state): State<AppState>,
	RequireAuth(user): RequireAuth,
	Json(payload): Json<CreateChatRequest>,
) -> Result<impl IntoResponse, ServerError> {
	let mut user_ids = payload.user_ids;
	if !user_ids.contains(&user.id) {
		user_ids.push(user.id);
	}
	for user_id in &user_ids {
		state.users.get_by_id(*user_id).await?;
	}

	let chats = state.chats.clone();
	let chat = run_in_unit_of_work(&state.pool, move |uow| {
		Box::pin(async move { chats.create_chat(&user_ids, uow).await })
	})
	.await?;

	Ok((StatusCode::CREATED, Json(chat)))
}

/// GET /chats/{chat_id}/messages - paginated, pinned to the chat.
pub async fn list_messages(
	State(state): State<AppState>,
	RequireAuth(_user): RequireAuth,
	Path(chat_id): Path<i64>,
	Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Paginated<ChatMessage>>, ServerError> {
	if !state.chats.chat_exists(chat_id).await? {
		return Err(ServerError::NotFound(format!("chat {chat_id}")));
	}

	let mut descriptor = QueryDescriptor::from_pairs(pairs).map_err(ServerError::from)?;
	descriptor.clamp_take(MAX_PAGE_SIZE);

	let pin = ChatMessage::FIELDS
		.equals("chatId", FilterValue::Int(chat_id))
		.map_err(ServerError::from)?;

	let page = paginate::<ChatMessage>(
		&state.pool,
		&descriptor,
		&[pin],
		&format!("/chats/{chat_id}/messages"),
		&state.config.http.public_base_url,
	)
	.await?;
	Ok(Json(page))
}
