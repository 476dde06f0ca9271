// ABOUTME: Foodgram API server binary
// ABOUTME: Loads configuration, opens the database, and serves the HTTP API until shutdown
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Foodgram Contributors

#![recursion_limit = "256"]

//! # Foodgram API Server Binary
//!
//! Starts the recipe API with token authentication, `SQLite` storage and
//! local media serving.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use foodgram_server::{
    config::environment::ServerConfig,
    database::Database,
    logging,
    resources::ServerResources,
    server::{FoodgramServer, ENDPOINTS},
};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "foodgram-server")]
#[command(about = "Foodgram API - recipe sharing backend")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override `DATABASE_URL`
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_from_env()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http.port = http_port;
    }
    if let Some(database_url) = args.database_url {
        config.database.url = database_url;
    }
    config.validate()?;

    info!("Starting Foodgram API");
    info!("{}", config.summary());

    let database = Database::new(&config.database.url).await?;
    info!("Database initialized: {}", config.database.url);

    let resources = Arc::new(ServerResources::new(database, Arc::new(config)));
    display_available_endpoints(&resources);

    if let Err(e) = FoodgramServer::new(resources).run().await {
        error!("Server error: {e:#}");
        return Err(e);
    }

    Ok(())
}

/// Display all available API endpoints
fn display_available_endpoints(resources: &ServerResources) {
    let http = &resources.config.http;
    let base = http
        .public_base_url
        .clone()
        .unwrap_or_else(|| format!("http://{}:{}", http.host, http.port));

    info!("=== Available API Endpoints ===");
    for (methods, path) in ENDPOINTS {
        info!("   {methods:<18} {base}{path}");
    }
    info!(
        "   {:<18} {base}{}",
        "GET",
        resources.config.media.url_prefix
    );
    info!("=== End of Endpoint List ===");
}
