// SPDX-License-Identifier: MIT

//! Player routes: public slot listing (no credential material).

use crate::error::Result;
use crate::models::PlayerSummary;
use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/players", get(list_players))
}

#[derive(Serialize)]
pub struct PlayersResponse {
    pub players: Vec<PlayerSummary>,
}

/// List player slots with connection status.
async fn list_players(State(state): State<Arc<AppState>>) -> Result<Json<PlayersResponse>> {
    let players = state.db.list_players().await?;
    Ok(Json(PlayersResponse {
        players: players.iter().map(PlayerSummary::from).collect(),
    }))
}
