// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Request extractors for authenticated routes.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use fable_server_auth::middleware::{extract_bearer_token, CurrentUser};
use fable_server_auth::token::hash_token;
use fable_server_auth::{AuthError, Role};

use crate::api::AppState;
use crate::error::ServerError;

/// Resolve a bearer token to its user.
///
/// This is the single verification path; the HTTP extractor and the chat
/// gateway both go through it.
pub async fn authenticate_token(state: &AppState, token: &str) -> Result<CurrentUser, ServerError> {
	let token_hash = hash_token(token);

	let session = state
		.sessions
		.get_session(&token_hash)
		.await?
		.ok_or(AuthError::InvalidToken)?;

	if session.is_expired(chrono::Utc::now()) {
		return Err(AuthError::TokenExpired.into());
	}

	let user = state.users.get_by_id(session.user_id).await.map_err(|_| {
		// session row points at a deleted user
		ServerError::from(AuthError::InvalidToken)
	})?;

	let role = Role::parse(&user.role).map_err(ServerError::from)?;

	Ok(CurrentUser {
		id: user.id,
		nickname: user.nickname,
		email: user.email,
		role,
	})
}

/// Extractor that requires a valid session token.
pub struct RequireAuth(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAuth {
	type Rejection = ServerError;

	async fn from_request_parts(
		parts: &mut Parts,
		state: &AppState,
	) -> Result<Self, Self::Rejection> {
		let token = extract_bearer_token(&parts.headers)?;
		let user = authenticate_token(state, token).await?;
		Ok(RequireAuth(user))
	}
}

/// Extractor that requires an authenticated admin.
pub struct RequireAdmin(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAdmin {
	type Rejection = ServerError;

	async fn from_request_parts(
		parts: &mut Parts,
		state: &AppState,
	) -> Result<Self, Self::Rejection> {
		let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;
		if !user.is_admin() {
			return Err(ServerError::Forbidden("admin role required".to_string()));
		}
		Ok(RequireAdmin(user))
	}
}
