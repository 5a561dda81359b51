// SPDX-License-Identifier: MIT

//! Sync routes: pull Strava activities into the record store.

use crate::error::Result;
use crate::services::sync::SyncSummary;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/sync/{player_id}", post(sync_player))
}

#[derive(Serialize)]
pub struct SyncResponse {
    pub status: String,
    pub synced: SyncSummary,
}

/// Sync a player's Strava activities across all unlocked block windows.
async fn sync_player(
    State(state): State<Arc<AppState>>,
    Path(player_id): Path<String>,
) -> Result<Json<SyncResponse>> {
    let synced = state.sync.sync_player(&player_id).await?;
    Ok(Json(SyncResponse {
        status: "ok".to_string(),
        synced,
    }))
}
