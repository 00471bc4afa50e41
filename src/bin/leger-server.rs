// ABOUTME: Server binary: configuration, logging, router assembly, serve loop
// ABOUTME: Environment-driven with a couple of CLI overrides
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Léger AI

//! # Léger Server Binary
//!
//! Starts the HTTP API with authentication, subscription billing, and the
//! demo chat streaming endpoint.

use anyhow::Result;
use clap::Parser;
use leger_server::{
    auth::AuthManager,
    config::ServerConfig,
    database::Database,
    llm::DemoProvider,
    logging,
    resources::ServerResources,
    routes,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[derive(Parser)]
#[command(name = "leger-server")]
#[command(about = "Léger AI - brand intelligence web backend")]
struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override database URL
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(database_url) = args.database_url {
        config.database.url = database_url;
    }

    logging::init_from_env()?;

    info!("Starting Léger server");
    info!("{}", config.summary());

    let database = Database::new(&config.database.url).await?;

    let jwt_secret = config.auth.jwt_secret.as_bytes().to_vec();
    let auth_manager = AuthManager::new(jwt_secret, config.auth.jwt_expiry_hours);

    let config = Arc::new(config);
    let resources = Arc::new(ServerResources::new(
        database,
        auth_manager,
        Arc::new(DemoProvider::new()),
        config.clone(),
    ));

    let app = routes::router(resources)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.http_port)).await?;
    info!("HTTP server listening on port {}", config.http_port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::error!("Failed to install shutdown signal handler");
    }
}
