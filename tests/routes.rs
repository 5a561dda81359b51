// SPDX-License-Identifier: MIT

//! Router wiring tests against an offline store.
//!
//! The mock store fails every read, so these assert routing and error
//! mapping: a wired route surfaces a typed application error, while an
//! unwired path gets a router-level 404.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::sync::Arc;
use tower::ServiceExt;
use triblock_tracker::config::Config;
use triblock_tracker::db::FirestoreDb;
use triblock_tracker::routes::create_router;
use triblock_tracker::services::{DashboardService, ScoringService, StravaClient, SyncService};
use triblock_tracker::AppState;

fn offline_app() -> axum::Router {
    let config = Config::default();
    let db = FirestoreDb::new_mock();
    let strava = StravaClient::new(
        config.strava_client_id.clone(),
        config.strava_client_secret.clone(),
    );
    let state = Arc::new(AppState {
        config,
        db: db.clone(),
        scoring: ScoringService::new(db.clone()),
        dashboard: DashboardService::new(db.clone()),
        sync: SyncService::new(strava, db),
    });
    create_router(state)
}

async fn status_of(method: &str, uri: &str) -> StatusCode {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    offline_app().oneshot(request).await.unwrap().status()
}

#[tokio::test]
async fn test_health_is_wired() {
    assert_eq!(status_of("GET", "/health").await, StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_path_is_404() {
    assert_eq!(status_of("GET", "/api/nope").await, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_block_calculation_is_404() {
    // Rejected by the calendar before any store access.
    let request = Request::builder()
        .method("POST")
        .uri("/api/scores/calculate/block_99")
        .body(Body::empty())
        .unwrap();
    let response = offline_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "unknown_block");
}

#[tokio::test]
async fn test_activity_routes_are_wired() {
    // The offline store turns these into 500s; an unwired route would be
    // a router-level 404 instead.
    assert_eq!(
        status_of("GET", "/api/activities/player_1").await,
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        status_of("POST", "/api/activities/sync-all").await,
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[tokio::test]
async fn test_sync_and_player_routes_are_wired() {
    assert_eq!(
        status_of("POST", "/api/sync/player_1").await,
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        status_of("GET", "/api/players").await,
        StatusCode::INTERNAL_SERVER_ERROR
    );
}
