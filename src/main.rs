// SPDX-License-Identifier: MIT

//! Triblock-Tracker API Server
//!
//! Backend for a two-competitor triathlon challenge: syncs Strava
//! activities into fixed calendar blocks and scores each block once its
//! window closes.

use anyhow::Context;
use std::sync::Arc;
use triblock_tracker::{
    config::Config,
    db::FirestoreDb,
    services::{DashboardService, ScoringService, StravaClient, SyncService},
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(port = config.port, "Starting Triblock-Tracker API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .context("Failed to connect to Firestore")?;

    // Seed the block calendar and player slots (idempotent)
    db.seed_blocks().await.context("Failed to seed blocks")?;
    db.seed_players(&config.player_names)
        .await
        .context("Failed to seed player slots")?;
    tracing::info!("Calendar and player slots seeded");

    // Initialize Strava client and services
    let strava = StravaClient::new(
        config.strava_client_id.clone(),
        config.strava_client_secret.clone(),
    );

    let state = Arc::new(AppState {
        config: config.clone(),
        db: db.clone(),
        scoring: ScoringService::new(db.clone()),
        dashboard: DashboardService::new(db.clone()),
        sync: SyncService::new(strava, db),
    });

    // Build router
    let app = triblock_tracker::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("triblock_tracker=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
