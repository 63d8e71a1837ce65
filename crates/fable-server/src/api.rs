// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Application state and router assembly.

use std::sync::Arc;

use axum::routing::{delete, get, patch, post};
use axum::Router;
use sqlx::SqlitePool;

use fable_server_config::ServerConfig;
use fable_server_db::{
	ChatRepository, CommentRepository, PostRepository, SessionRepository, UserRepository,
};

use crate::routes;
use crate::websocket::{self, ChatHub};

/// Upper bound applied to every listing's `take`.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
	pub pool: SqlitePool,
	pub config: Arc<ServerConfig>,
	pub users: UserRepository,
	pub posts: PostRepository,
	pub comments: CommentRepository,
	pub chats: ChatRepository,
	pub sessions: SessionRepository,
	pub hub: ChatHub,
}

/// Create the application state from a pool and configuration.
pub fn create_app_state(pool: SqlitePool, config: ServerConfig) -> AppState {
	AppState {
		users: UserRepository::new(pool.clone()),
		posts: PostRepository::new(pool.clone()),
		comments: CommentRepository::new(pool.clone()),
		chats: ChatRepository::new(pool.clone()),
		sessions: SessionRepository::new(pool.clone()),
		hub: ChatHub::new(),
		config: Arc::new(config),
		pool,
	}
}

/// Build the full router.
pub fn create_router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(routes::health::health_check))
		.route("/auth/register", post(routes::auth::register))
		.route("/auth/login", post(routes::auth::login))
		.route("/auth/logout", post(routes::auth::logout))
		.route("/users", get(routes::users::list_users))
		.route("/users/me", get(routes::users::get_me))
		.route("/users/follow/me", get(routes::users::get_my_followers))
		.route("/users/follow/{id}", post(routes::users::follow_user))
		.route(
			"/users/follow/{id}/confirm",
			patch(routes::users::confirm_follow),
		)
		.route("/users/follow/{id}", delete(routes::users::delete_follow))
		.route("/posts", get(routes::posts::list_posts))
		.route("/posts", post(routes::posts::create_post))
		.route("/posts/{id}", get(routes::posts::get_post))
		.route("/posts/{id}", patch(routes::posts::update_post))
		.route("/posts/{id}", delete(routes::posts::delete_post))
		.route(
			"/posts/{id}/comments",
			get(routes::comments::list_comments),
		)
		.route(
			"/posts/{id}/comments",
			post(routes::comments::create_comment),
		)
		.route(
			"/posts/{id}/comments/{cid}",
			get(routes::comments::get_comment),
		)
		.route(
			"/posts/{id}/comments/{cid}",
			patch(routes::comments::update_comment),
		)
		.route(
			"/posts/{id}/comments/{cid}",
			delete(routes::comments::delete_comment),
		)
		.route("/chats", get(routes::chats::list_chats))
		.route("/chats", post(routes::chats::create_chat))
		.route("/chats/{chat_id}/messages", get(routes::chats::list_messages))
		.route("/ws/chats", get(websocket::ws_upgrade_handler))
		.with_state(state)
}
