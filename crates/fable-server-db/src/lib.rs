// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Database layer for the Fable server.
//!
//! Repositories own a pool and expose typed operations. Writes that must be
//! atomic together take an optional [`uow::UnitOfWork`] handle; the generic
//! query engine in [`query`] serves every paginated listing.

pub mod chat;
pub mod comment;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod post;
pub mod query;
pub mod session;
pub mod testing;
pub mod user;
pub mod uow;

pub use chat::{Chat, ChatMessage, ChatRepository};
pub use comment::{Comment, CommentRepository};
pub use error::DbError;
pub use migrations::run_migrations;
pub use pool::create_pool;
pub use post::{Post, PostRepository};
pub use session::{Session, SessionRepository};
pub use user::{Follower, User, UserRepository};
pub use uow::{run_in_unit_of_work, UnitOfWork};
