// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Fable blog and chat server.
//!
//! This crate provides the HTTP and WebSocket surface over the repositories
//! in `fable-server-db`.

pub mod api;
pub mod auth_middleware;
pub mod error;
pub mod routes;
pub mod validation;
pub mod websocket;

pub use api::{create_app_state, create_router, AppState};
pub use error::ServerError;
pub use fable_server_config::ServerConfig;
