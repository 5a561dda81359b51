// SPDX-License-Identifier: MIT

//! Score record model: the immutable output of scoring a block.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::Sport;

/// Per-player, per-sport reporting rollup. Never affects points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SportDetail {
    pub calories: f64,
    pub distance_meters: f64,
    pub moving_time_seconds: u64,
    pub count: u32,
}

/// Score document stored in Firestore, keyed by block ID.
///
/// Written exactly once per block and never mutated afterwards. All maps
/// are `BTreeMap` so iteration order (and serialized output) is
/// deterministic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub block_id: String,
    /// Summed calories per sport per player
    pub calories_by_sport: BTreeMap<Sport, BTreeMap<String, f64>>,
    /// Awarded points per sport per player
    pub points_by_sport: BTreeMap<Sport, BTreeMap<String, u32>>,
    /// Whether each player logged every eligible sport of the block
    pub clean_sweep_eligible: BTreeMap<String, bool>,
    pub clean_sweep_achieved: bool,
    pub clean_sweep_winner: Option<String>,
    /// Bonus points per player (0 or 1)
    pub bonus_points: BTreeMap<String, u32>,
    /// Sport points plus bonus, per player
    pub total_points: BTreeMap<String, u32>,
    /// Reporting rollups per player per sport
    pub details_by_player_sport: BTreeMap<String, BTreeMap<Sport, SportDetail>>,
    pub calculated_at: DateTime<Utc>,
    /// Always true once written
    pub locked: bool,
}

impl ScoreRecord {
    /// Maximum points a single player can earn in a block with the given
    /// eligible sports: 2 per sport plus the clean-sweep bonus.
    pub fn max_points_for(sports: &[Sport]) -> u32 {
        2 * sports.len() as u32 + 1
    }
}
