// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! In-process chat room registry.
//!
//! Each connected socket registers an outbound channel per chat room it has
//! entered. Broadcast walks the room and drops channels whose receiver is
//! gone or whose queue is full, so a dead or wedged connection cleans
//! itself up on the next send.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::ws::Message;
use tokio::sync::{mpsc, RwLock};

#[derive(Clone)]
pub struct ChatHub {
	rooms: Arc<RwLock<HashMap<i64, Vec<RoomMember>>>>,
	next_conn_id: Arc<AtomicU64>,
}

struct RoomMember {
	conn_id: u64,
	tx: mpsc::Sender<Message>,
}

impl ChatHub {
	pub fn new() -> Self {
		Self {
			rooms: Arc::new(RwLock::new(HashMap::new())),
			next_conn_id: Arc::new(AtomicU64::new(1)),
		}
	}

	/// Allocate an id for a new connection.
	pub fn allocate_conn_id(&self) -> u64 {
		self.next_conn_id.fetch_add(1, Ordering::Relaxed)
	}

	/// Register `tx` as a member of `chat_id`. Re-entering a room the
	/// connection is already in is a no-op.
	pub async fn join(&self, chat_id: i64, conn_id: u64, tx: mpsc::Sender<Message>) {
		let mut rooms = self.rooms.write().await;
		let members = rooms.entry(chat_id).or_default();
		if members.iter().any(|m| m.conn_id == conn_id) {
			return;
		}
		members.push(RoomMember { conn_id, tx });
		tracing::debug!(chat_id, conn_id, "connection joined chat room");
	}

	/// Remove the connection from every room it entered.
	pub async fn leave_all(&self, conn_id: u64) {
		let mut rooms = self.rooms.write().await;
		for members in rooms.values_mut() {
			members.retain(|m| m.conn_id != conn_id);
		}
		rooms.retain(|_, members| !members.is_empty());
	}

	/// Send `text` to every member of `chat_id` except `exclude_conn_id`.
	///
	/// Delivery happens outside the room lock so a slow connection cannot
	/// block joins or other broadcasts. A member whose outbound queue is
	/// full or closed is evicted from every room.
	pub async fn broadcast(&self, chat_id: i64, exclude_conn_id: u64, text: String) {
		let recipients: Vec<(u64, mpsc::Sender<Message>)> = {
			let rooms = self.rooms.read().await;
			let Some(members) = rooms.get(&chat_id) else {
				return;
			};
			members
				.iter()
				.filter(|m| m.conn_id != exclude_conn_id)
				.map(|m| (m.conn_id, m.tx.clone()))
				.collect()
		};

		let mut stale = Vec::new();
		for (conn_id, tx) in recipients {
			// a full queue means the send task stopped draining, so the
			// connection is treated the same as a closed one
			if tx.try_send(Message::Text(text.clone().into())).is_err() {
				stale.push(conn_id);
			}
		}

		for conn_id in stale {
			self.leave_all(conn_id).await;
		}
	}

	/// Whether the connection has entered `chat_id`.
	pub async fn is_member(&self, chat_id: i64, conn_id: u64) -> bool {
		let rooms = self.rooms.read().await;
		rooms
			.get(&chat_id)
			.is_some_and(|members| members.iter().any(|m| m.conn_id == conn_id))
	}
}

impl Default for ChatHub {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_join_and_broadcast_excludes_sender() {
		let hub = ChatHub::new();
		let (tx_a, mut rx_a) = mpsc::channel(8);
		let (tx_b, mut rx_b) = mpsc::channel(8);
		let a = hub.allocate_conn_id();
		let b = hub.allocate_conn_id();

		hub.join(1, a, tx_a).await;
		hub.join(1, b, tx_b).await;

		hub.broadcast(1, a, "hello".to_string()).await;

		assert!(rx_a.try_recv().is_err());
		match rx_b.recv().await.unwrap() {
			Message::Text(text) => assert_eq!(text.as_str(), "hello"),
			other => panic!("unexpected message: {other:?}"),
		}
	}

	#[tokio::test]
	async fn test_leave_all_removes_membership() {
		let hub = ChatHub::new();
		let (tx, _rx) = mpsc::channel(8);
		let conn = hub.allocate_conn_id();

		hub.join(1, conn, tx.clone()).await;
		hub.join(2, conn, tx).await;
		assert!(hub.is_member(1, conn).await);

		hub.leave_all(conn).await;
		assert!(!hub.is_member(1, conn).await);
		assert!(!hub.is_member(2, conn).await);
	}

	#[tokio::test]
	async fn test_stale_member_is_evicted_on_broadcast() {
		let hub = ChatHub::new();
		let (tx_dead, rx_dead) = mpsc::channel(8);
		let (tx_live, mut rx_live) = mpsc::channel(8);
		let dead = hub.allocate_conn_id();
		let live = hub.allocate_conn_id();

		hub.join(1, dead, tx_dead).await;
		hub.join(1, live, tx_live).await;
		drop(rx_dead);

		hub.broadcast(1, 0, "ping".to_string()).await;
		assert!(!hub.is_member(1, dead).await);
		assert!(hub.is_member(1, live).await);
		assert!(rx_live.recv().await.is_some());
	}

	#[tokio::test]
	async fn test_full_queue_does_not_stall_broadcast() {
		let hub = ChatHub::new();
		let (tx_full, _rx_full) = mpsc::channel(1);
		let (tx_live, mut rx_live) = mpsc::channel(8);
		let full = hub.allocate_conn_id();
		let live = hub.allocate_conn_id();

		hub.join(1, full, tx_full.clone()).await;
		hub.join(1, live, tx_live).await;
		// saturate the first member's queue without draining it
		tx_full
			.send(Message::Text("backlog".to_string().into()))
			.await
			.unwrap();

		hub.broadcast(1, 0, "ping".to_string()).await;

		assert!(!hub.is_member(1, full).await);
		assert!(hub.is_member(1, live).await);
		match rx_live.recv().await.unwrap() {
			Message::Text(text) => assert_eq!(text.as_str(), "ping"),
			other => panic!("unexpected message: {other:?}"),
		}
	}
}
