// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! WebSocket chat gateway.

pub mod handler;
pub mod hub;

pub use handler::ws_upgrade_handler;
pub use hub::ChatHub;
