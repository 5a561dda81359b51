// SPDX-License-Identifier: MIT

//! Activity routes: bulk sync for the scheduler and per-player listings.

use crate::error::{AppError, Result};
use crate::models::Activity;
use crate::services::sync::SyncSummary;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/activities/sync-all", post(sync_all))
        .route("/api/activities/{player_id}", get(list_player_activities))
}

/// Per-player outcome of a bulk sync run.
#[derive(Serialize)]
#[serde(untagged)]
pub enum PlayerSyncOutcome {
    Synced(SyncSummary),
    Failed { error: String },
}

#[derive(Serialize)]
pub struct SyncAllResponse {
    pub status: String,
    pub results: BTreeMap<String, PlayerSyncOutcome>,
}

/// Sync every connected player in one call (the scheduler hits this).
///
/// One player's failure never aborts the run; it is recorded in that
/// player's slot of the results map.
async fn sync_all(State(state): State<Arc<AppState>>) -> Result<Json<SyncAllResponse>> {
    let players = state.db.list_connected_players().await?;
    let mut results = BTreeMap::new();

    for player in players {
        match state.sync.sync_player(&player.player_id).await {
            Ok(summary) => {
                results.insert(player.player_id, PlayerSyncOutcome::Synced(summary));
            }
            Err(err) => {
                tracing::warn!(player_id = %player.player_id, error = %err, "Player sync failed");
                results.insert(
                    player.player_id,
                    PlayerSyncOutcome::Failed {
                        error: err.to_string(),
                    },
                );
            }
        }
    }

    Ok(Json(SyncAllResponse {
        status: "ok".to_string(),
        results,
    }))
}

#[derive(Serialize)]
pub struct ActivitiesResponse {
    pub player_id: String,
    pub activities: Vec<Activity>,
}

/// List a player's stored activities, oldest first.
async fn list_player_activities(
    State(state): State<Arc<AppState>>,
    Path(player_id): Path<String>,
) -> Result<Json<ActivitiesResponse>> {
    if state.db.get_player(&player_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Player {} not found", player_id)));
    }

    let activities = state.db.activities_for_player(&player_id).await?;
    Ok(Json(ActivitiesResponse {
        player_id,
        activities,
    }))
}
