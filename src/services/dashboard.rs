// SPDX-License-Identifier: MIT

//! Dashboard aggregator — read-only rollups over locked score records.
//!
//! No scoring decisions happen here: the inputs are the immutable score
//! documents, and the outputs are running totals, per-sport breakdowns,
//! and a simple linear projection once enough blocks are locked.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::calendar;
use crate::db::FirestoreDb;
use crate::error::Result;
use crate::models::{Block, PlayerSummary, ScoreRecord, Sport};

/// Blocks that must be locked before projecting.
const MIN_LOCKED_FOR_PROJECTION: usize = 2;

#[derive(Debug, Clone, Serialize)]
pub struct Scoreboard {
    pub totals: BTreeMap<String, u32>,
    pub leader: Option<String>,
    pub margin: u32,
    pub is_tied: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SportBreakdown {
    pub cumulative_calories: BTreeMap<String, BTreeMap<Sport, f64>>,
    pub cumulative_points: BTreeMap<String, BTreeMap<Sport, u32>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Projection {
    pub projected_totals: BTreeMap<String, f64>,
    pub remaining_blocks: usize,
    pub avg_bonus_rate: f64,
    pub projected_winner: Option<String>,
    pub projected_margin: f64,
    /// Whether sweeping every remaining block could still flip the lead
    pub clean_sweep_can_change_outcome: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub players: Vec<PlayerSummary>,
    pub scoreboard: Scoreboard,
    pub block_scores: Vec<ScoreRecord>,
    pub blocks: Vec<Block>,
    pub sport_breakdown: SportBreakdown,
    pub projection: Option<Projection>,
}

/// Builds dashboard rollups from the record store.
#[derive(Clone)]
pub struct DashboardService {
    db: FirestoreDb,
}

impl DashboardService {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    /// Aggregate everything the dashboard needs in one response.
    pub async fn dashboard(&self) -> Result<Dashboard> {
        let players = self.db.list_players().await?;
        let player_ids: Vec<String> = players.iter().map(|p| p.player_id.clone()).collect();

        let all_scores = self.db.list_scores().await?;
        let blocks = self.db.list_blocks().await?;

        let mut totals: BTreeMap<String, u32> =
            player_ids.iter().map(|pid| (pid.clone(), 0)).collect();
        let mut cumulative_calories: BTreeMap<String, BTreeMap<Sport, f64>> = BTreeMap::new();
        let mut cumulative_points: BTreeMap<String, BTreeMap<Sport, u32>> = BTreeMap::new();

        let mut locked_count = 0;
        let mut total_bonus = 0u32;

        for score in &all_scores {
            if !score.locked {
                continue;
            }
            locked_count += 1;

            for pid in &player_ids {
                if let Some(points) = score.total_points.get(pid) {
                    *totals.entry(pid.clone()).or_insert(0) += points;
                }
            }

            for (sport, by_player) in &score.calories_by_sport {
                for pid in &player_ids {
                    if let Some(calories) = by_player.get(pid) {
                        *cumulative_calories
                            .entry(pid.clone())
                            .or_default()
                            .entry(*sport)
                            .or_insert(0.0) += calories;
                    }
                }
            }
            for (sport, by_player) in &score.points_by_sport {
                for pid in &player_ids {
                    if let Some(points) = by_player.get(pid) {
                        *cumulative_points
                            .entry(pid.clone())
                            .or_default()
                            .entry(*sport)
                            .or_insert(0) += points;
                    }
                }
            }

            total_bonus += score.bonus_points.values().sum::<u32>();
        }

        let scoreboard = build_scoreboard(&player_ids, &totals);
        let projection = build_projection(&player_ids, &totals, &blocks, locked_count, total_bonus);

        Ok(Dashboard {
            players: players.iter().map(PlayerSummary::from).collect(),
            scoreboard,
            block_scores: all_scores,
            blocks,
            sport_breakdown: SportBreakdown {
                cumulative_calories,
                cumulative_points,
            },
            projection,
        })
    }
}

fn build_scoreboard(player_ids: &[String], totals: &BTreeMap<String, u32>) -> Scoreboard {
    let mut ranked: Vec<&String> = player_ids.iter().collect();
    ranked.sort_by(|a, b| totals[*b].cmp(&totals[*a]).then(a.cmp(b)));

    let leader = ranked.first().map(|pid| (*pid).clone());
    let (margin, is_tied) = if ranked.len() >= 2 {
        let margin = totals[ranked[0]] - totals[ranked[1]];
        (margin, margin == 0)
    } else {
        (0, false)
    };

    Scoreboard {
        totals: totals.clone(),
        leader,
        margin,
        is_tied,
    }
}

fn build_projection(
    player_ids: &[String],
    totals: &BTreeMap<String, u32>,
    blocks: &[Block],
    locked_count: usize,
    total_bonus: u32,
) -> Option<Projection> {
    if locked_count < MIN_LOCKED_FOR_PROJECTION || player_ids.len() < 2 {
        return None;
    }

    let total_blocks = calendar::definitions().len();
    let remaining = total_blocks.saturating_sub(locked_count);

    // Extrapolate each player's average points per locked block.
    let projected_totals: BTreeMap<String, f64> = player_ids
        .iter()
        .map(|pid| {
            let current = totals[pid] as f64;
            let avg = current / locked_count as f64;
            (pid.clone(), round1(current + avg * remaining as f64))
        })
        .collect();

    let mut ranked: Vec<&String> = player_ids.iter().collect();
    ranked.sort_by(|a, b| {
        projected_totals[*b]
            .partial_cmp(&projected_totals[*a])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(b))
    });

    let projected_margin = round1(projected_totals[ranked[0]] - projected_totals[ranked[1]]);
    let projected_winner = if projected_margin > 0.0 {
        Some(ranked[0].clone())
    } else {
        None
    };

    // Could the trailing player still flip the outcome by sweeping every
    // remaining (unlocked) block at its maximum value?
    let max_catch_up: u32 = blocks
        .iter()
        .filter(|b| !b.is_locked())
        .map(|b| ScoreRecord::max_points_for(&b.sports))
        .sum();
    let trailer = ranked[ranked.len() - 1];
    let clean_sweep_can_change_outcome = totals[trailer] + max_catch_up > totals[ranked[0]];

    Some(Projection {
        projected_totals,
        remaining_blocks: remaining,
        avg_bonus_rate: round2(total_bonus as f64 / locked_count as f64),
        projected_winner,
        projected_margin,
        clean_sweep_can_change_outcome,
    })
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn totals(pairs: &[(&str, u32)]) -> BTreeMap<String, u32> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_scoreboard_leader_and_margin() {
        let board = build_scoreboard(&ids(&["p1", "p2"]), &totals(&[("p1", 10), ("p2", 7)]));
        assert_eq!(board.leader.as_deref(), Some("p1"));
        assert_eq!(board.margin, 3);
        assert!(!board.is_tied);
    }

    #[test]
    fn test_scoreboard_tie() {
        let board = build_scoreboard(&ids(&["p1", "p2"]), &totals(&[("p1", 7), ("p2", 7)]));
        assert_eq!(board.margin, 0);
        assert!(board.is_tied);
    }

    #[test]
    fn test_no_projection_before_two_locked_blocks() {
        let projection =
            build_projection(&ids(&["p1", "p2"]), &totals(&[("p1", 3), ("p2", 0)]), &[], 1, 1);
        assert!(projection.is_none());
    }

    #[test]
    fn test_projection_extrapolates_average() {
        // p1 averages 5/block over 2 locked blocks; 3 blocks remain.
        let projection = build_projection(
            &ids(&["p1", "p2"]),
            &totals(&[("p1", 10), ("p2", 4)]),
            &[],
            2,
            1,
        )
        .unwrap();

        assert_eq!(projection.remaining_blocks, 3);
        assert_eq!(projection.projected_totals["p1"], 25.0);
        assert_eq!(projection.projected_totals["p2"], 10.0);
        assert_eq!(projection.projected_winner.as_deref(), Some("p1"));
        assert_eq!(projection.avg_bonus_rate, 0.5);
    }
}
