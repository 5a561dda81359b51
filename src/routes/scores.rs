// SPDX-License-Identifier: MIT

//! Score routes: trigger scoring, read scores, blocks, and the dashboard.

use crate::error::{AppError, Result};
use crate::models::{Block, ScoreRecord};
use crate::services::dashboard::Dashboard;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/scores/calculate/{block_id}", post(calculate_scores))
        .route("/api/scores/calculate-job", post(calculate_job))
        .route("/api/scores", get(list_scores))
        .route("/api/scores/{block_id}", get(get_score))
        .route("/api/blocks", get(list_blocks))
        .route("/api/dashboard", get(dashboard))
}

#[derive(Serialize)]
pub struct CalculateResponse {
    pub status: String,
    pub scores: ScoreRecord,
}

/// Manually trigger scoring for a specific block.
///
/// Fails with 409 if the block is already locked and 404 if the block ID
/// is not in the calendar.
async fn calculate_scores(
    State(state): State<Arc<AppState>>,
    Path(block_id): Path<String>,
) -> Result<Json<CalculateResponse>> {
    let record = state.scoring.calculate_block_scores(&block_id).await?;
    Ok(Json(CalculateResponse {
        status: "ok".to_string(),
        scores: record,
    }))
}

#[derive(Serialize)]
pub struct CalculateJobResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scores: Option<ScoreRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Scheduled job endpoint: score the most recently closed block.
///
/// Called every Monday by the scheduler; responds with `no_block` when
/// every closed block is already locked.
async fn calculate_job(State(state): State<Arc<AppState>>) -> Result<Json<CalculateJobResponse>> {
    match state.scoring.score_pending_block(chrono::Utc::now()).await? {
        Some(record) => Ok(Json(CalculateJobResponse {
            status: "ok".to_string(),
            block_id: Some(record.block_id.clone()),
            scores: Some(record),
            message: None,
        })),
        None => Ok(Json(CalculateJobResponse {
            status: "no_block".to_string(),
            block_id: None,
            scores: None,
            message: Some("No unlocked closed blocks to score".to_string()),
        })),
    }
}

#[derive(Serialize)]
pub struct ScoresResponse {
    pub scores: Vec<ScoreRecord>,
}

/// Retrieve all scored blocks.
async fn list_scores(State(state): State<Arc<AppState>>) -> Result<Json<ScoresResponse>> {
    let scores = state.db.list_scores().await?;
    Ok(Json(ScoresResponse { scores }))
}

/// Retrieve the score record for one block.
async fn get_score(
    State(state): State<Arc<AppState>>,
    Path(block_id): Path<String>,
) -> Result<Json<ScoreRecord>> {
    let score = state
        .db
        .get_score(&block_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Score not found for block {}", block_id)))?;
    Ok(Json(score))
}

#[derive(Serialize)]
pub struct BlocksResponse {
    pub blocks: Vec<Block>,
}

/// List all blocks with their lock status.
async fn list_blocks(State(state): State<Arc<AppState>>) -> Result<Json<BlocksResponse>> {
    let blocks = state.db.list_blocks().await?;
    Ok(Json(BlocksResponse { blocks }))
}

/// Aggregated dashboard data for all panels.
async fn dashboard(State(state): State<Arc<AppState>>) -> Result<Json<Dashboard>> {
    let data = state.dashboard.dashboard().await?;
    Ok(Json(data))
}
