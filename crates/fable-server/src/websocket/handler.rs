// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! WebSocket chat gateway with first-message authentication.
//!
//! The upgrade itself is unauthenticated; the client must send an `auth`
//! event as its first message, within the configured timeout, before any
//! chat event is accepted. Token verification goes through the same path as
//! the HTTP extractor.

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use fable_server_auth::CurrentUser;

use crate::api::AppState;
use crate::auth_middleware::authenticate_token;

const OUTBOUND_QUEUE_SIZE: usize = 64;

/// Events accepted from the client.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientEvent {
	Auth {
		token: String,
	},
	EnterChat {
		#[serde(rename = "chatIds")]
		chat_ids: Vec<i64>,
	},
	SendMessage {
		#[serde(rename = "chatId")]
		chat_id: i64,
		message: String,
	},
}

/// Events emitted to the client.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerEvent {
	AuthOk {
		#[serde(rename = "userId")]
		user_id: i64,
	},
	ReceiveMessage {
		#[serde(rename = "chatId")]
		chat_id: i64,
		#[serde(rename = "authorId")]
		author_id: i64,
		message: String,
	},
	Error {
		message: String,
	},
}

/// GET /ws/chats - upgrade to the chat gateway.
pub async fn ws_upgrade_handler(
	ws: WebSocketUpgrade,
	State(state): State<AppState>,
) -> impl IntoResponse {
	ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

async fn handle_ws_connection(socket: WebSocket, state: AppState) {
	let conn_id = state.hub.allocate_conn_id();
	let (mut sender, mut receiver) = socket.split();
	let (tx, mut rx) = mpsc::channel::<Message>(OUTBOUND_QUEUE_SIZE);

	let send_task = tokio::spawn(async move {
		while let Some(msg) = rx.recv().await {
			if sender.send(msg).await.is_err() {
				break;
			}
		}
	});

	// first message must authenticate, within the deadline
	let auth_timeout = Duration::from_secs(state.config.auth.ws_auth_timeout_secs);
	let user = match tokio::time::timeout(auth_timeout, receiver.next()).await {
		Ok(Some(Ok(Message::Text(text)))) => {
			match serde_json::from_str::<ClientEvent>(&text) {
				Ok(ClientEvent::Auth { token }) => {
					match authenticate_token(&state, &token).await {
						Ok(user) => {
							send_event(&tx, &ServerEvent::AuthOk { user_id: user.id }).await;
							Some(user)
						}
						Err(err) => {
							tracing::warn!(conn_id, error = %err, "websocket auth failed");
							send_error(&tx, "authentication failed").await;
							None
						}
					}
				}
				_ => {
					send_error(&tx, "expected auth event").await;
					None
				}
			}
		}
		Ok(_) => {
			send_error(&tx, "expected auth event").await;
			None
		}
		Err(_) => {
			tracing::warn!(conn_id, "websocket auth timeout");
			send_error(&tx, "authentication timeout").await;
			None
		}
	};

	if let Some(user) = user {
		tracing::info!(conn_id, user_id = user.id, "websocket authenticated");

		while let Some(Ok(msg)) = receiver.next().await {
			match msg {
				Message::Text(text) => {
					handle_client_event(&state, &user, conn_id, &tx, &text).await;
				}
				Message::Close(_) => break,
				// pings are answered by axum
				_ => {}
			}
		}
	}

	state.hub.leave_all(conn_id).await;
	drop(tx);
	let _ = send_task.await;
	tracing::debug!(conn_id, "websocket connection closed");
}

async fn handle_client_event(
	state: &AppState,
	user: &CurrentUser,
	conn_id: u64,
	tx: &mpsc::Sender<Message>,
	text: &str,
) {
	let event = match serde_json::from_str::<ClientEvent>(text) {
		Ok(event) => event,
		Err(_) => {
			send_error(tx, "malformed event").await;
			return;
		}
	};

	match event {
		ClientEvent::Auth { .. } => {
			// already authenticated; ignore
		}
		ClientEvent::EnterChat { chat_ids } => {
			for chat_id in chat_ids {
				match state.chats.chat_exists(chat_id).await {
					Ok(true) => {
						state.hub.join(chat_id, conn_id, tx.clone()).await;
					}
					Ok(false) => {
						send_error(tx, &format!("chat {chat_id} does not exist")).await;
					}
					Err(err) => {
						tracing::error!(chat_id, error = %err, "enter_chat lookup failed");
						send_error(tx, "internal error").await;
					}
				}
			}
		}
		ClientEvent::SendMessage { chat_id, message } => {
			if !state.hub.is_member(chat_id, conn_id).await {
				send_error(tx, &format!("chat {chat_id} has not been entered")).await;
				return;
			}

			match state.chats.create_message(chat_id, user.id, &message).await {
				Ok(stored) => {
					let event = ServerEvent::ReceiveMessage {
						chat_id,
						author_id: user.id,
						message: stored.message,
					};
					if let Ok(json) = serde_json::to_string(&event) {
						state.hub.broadcast(chat_id, conn_id, json).await;
					}
				}
				Err(err) => {
					tracing::error!(chat_id, error = %err, "failed to persist chat message");
					send_error(tx, "failed to send message").await;
				}
			}
		}
	}
}

async fn send_event(tx: &mpsc::Sender<Message>, event: &ServerEvent) {
	if let Ok(json) = serde_json::to_string(event) {
		let _ = tx.send(Message::Text(json.into())).await;
	}
}

async fn send_error(tx: &mpsc::Sender<Message>, message: &str) {
	send_event(
		tx,
		&ServerEvent::Error {
			message: message.to_string(),
		},
	)
	.await;
}
