// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Health check HTTP handler.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::api::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
	pub status: &'static str,
	pub timestamp: String,
}

/// GET /health - liveness check that also verifies database connectivity.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
	let db_ok = sqlx::query_scalar::<_, i64>("SELECT 1")
		.fetch_one(&state.pool)
		.await
		.is_ok();

	let (status, body) = if db_ok {
		(StatusCode::OK, "ok")
	} else {
		(StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
	};

	(
		status,
		Json(HealthResponse {
			status: body,
			timestamp: chrono::Utc::now().to_rfc3339(),
		}),
	)
}
