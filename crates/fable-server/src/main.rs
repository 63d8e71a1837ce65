// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Fable server binary.

use clap::{Parser, Subcommand};
use fable_server::{create_app_state, create_router};
use tower_http::{
	cors::{Any, CorsLayer},
	trace::TraceLayer,
};

/// Fable server - blog and chat backend.
#[derive(Parser, Debug)]
#[command(name = "fable-server", about = "Fable blog and chat server", version)]
struct Args {
	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Show version information
	Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	if let Some(Command::Version) = args.command {
		println!("fable-server {}", env!("CARGO_PKG_VERSION"));
		return Ok(());
	}

	// Load .env file if present
	dotenvy::dotenv().ok();

	let config = fable_server_config::load_config()?;

	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| config.logging.level.clone().into()),
		)
		.init();

	tracing::info!(
		host = %config.http.host,
		port = config.http.port,
		database = %config.database.url,
		"starting fable-server"
	);

	let pool = fable_server_db::create_pool(&config.database.url).await?;
	fable_server_db::run_migrations(&pool).await?;

	let addr = config.socket_addr();
	let state = create_app_state(pool, config);

	let app = create_router(state)
		.layer(TraceLayer::new_for_http())
		.layer(
			CorsLayer::new()
				.allow_origin(Any)
				.allow_methods(Any)
				.allow_headers(Any),
		);

	tracing::info!("listening on {}", addr);
	let listener = tokio::net::TcpListener::bind(&addr).await?;

	tokio::select! {
		result = axum::serve(listener, app) => {
			if let Err(e) = result {
				tracing::error!(error = %e, "server error");
			}
		}
		_ = tokio::signal::ctrl_c() => {
			tracing::info!("received shutdown signal");
		}
	}

	tracing::info!("server shutdown complete");
	Ok(())
}
