// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Registration, login and logout handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use fable_server_auth::{
	extract_bearer_token, hash_password, hash_token, generate_token, verify_password, AuthError,
};

use crate::api::AppState;
use crate::auth_middleware::RequireAuth;
use crate::error::ServerError;
use crate::validation::{validate_email, validate_nickname, validate_password};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
	pub nickname: String,
	pub email: String,
	pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
	pub email: String,
	pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
	pub token: String,
	#[serde(rename = "userId")]
	pub user_id: i64,
}

/// POST /auth/register - create an account and issue a session token.
pub async fn register(
	State(state): State<AppState>,
	Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ServerError> {
	validate_nickname(&payload.nickname)?;
	validate_email(&payload.email)?;
	validate_password(&payload.password)?;

	let password_hash = hash_password(&payload.password)?;
	let user = state
		.users
		.create_user(&payload.nickname, &payload.email, &password_hash)
		.await?;

	let token = issue_session(&state, user.id).await?;
	Ok((
		StatusCode::CREATED,
		Json(TokenResponse {
			token,
			user_id: user.id,
		}),
	))
}

/// POST /auth/login - verify credentials and issue a session token.
pub async fn login(
	State(state): State<AppState>,
	Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ServerError> {
	let user = state
		.users
		.get_by_email(&payload.email)
		.await
		.map_err(|_| ServerError::from(AuthError::InvalidCredentials))?;

	verify_password(&payload.password, &user.password_hash)?;

	let token = issue_session(&state, user.id).await?;
	Ok(Json(TokenResponse {
		token,
		user_id: user.id,
	}))
}

/// POST /auth/logout - revoke the presented session token.
pub async fn logout(
	State(state): State<AppState>,
	RequireAuth(_user): RequireAuth,
	headers: axum::http::HeaderMap,
) -> Result<impl IntoResponse, ServerError> {
	let token = extract_bearer_token(&headers)?;
	state.sessions.delete_session(&hash_token(token)).await?;
	Ok(StatusCode::NO_CONTENT)
}

async fn issue_session(state: &AppState, user_id: i64) -> Result<String, ServerError> {
	let token = generate_token();
	state
		.sessions
		.create_session(user_id, &hash_token(&token), state.config.auth.session_ttl_secs)
		.await?;
	Ok(token)
}
