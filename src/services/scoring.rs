// SPDX-License-Identifier: MIT

//! Scoring engine — calculates and locks block scores.
//!
//! Scoring rules, per eligible sport of a block:
//! - Higher summed calories = 2 pts, lower = 0 pts, full tie = 1 pt each.
//! - Solo (only one player logged) = 2 pts. Nobody logged = 0 pts.
//! - Clean sweep: if every participating player logged every eligible
//!   sport AND one player won them all, the winner gets +1.
//! - Reduced single-sport blocks: whoever takes the sole sport gets the
//!   +1 directly.
//!
//! The point math lives in [`score_block`], a pure function over already
//! materialized records; the service wrapper adds the store reads and the
//! atomic lock-and-commit.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::calendar::{self, BlockDefinition};
use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::models::{Activity, ScoreRecord, Sport, SportDetail};

/// Scoring engine over the record store.
#[derive(Clone)]
pub struct ScoringService {
    db: FirestoreDb,
}

impl ScoringService {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    /// Calculate and commit scores for a block.
    ///
    /// Fails with `UnknownBlock` if the ID is not in the calendar and
    /// `AlreadyLocked` if the block has been scored before. Safe to retry
    /// after a persistence failure: the transactional commit makes the
    /// first success final and every later attempt a rejection.
    pub async fn calculate_block_scores(&self, block_id: &str) -> Result<ScoreRecord> {
        let def = calendar::find_block(block_id)
            .ok_or_else(|| AppError::UnknownBlock(block_id.to_string()))?;

        // Fast-path rejection; the commit re-checks under the transaction.
        if let Some(block) = self.db.get_block(block_id).await? {
            block.ensure_unlocked()?;
        }

        let players = self.db.list_connected_players().await?;
        let player_ids: Vec<String> = players.into_iter().map(|p| p.player_id).collect();

        let activities = self.db.activities_for_block(block_id).await?;

        tracing::info!(
            block_id,
            players = player_ids.len(),
            activities = activities.len(),
            "Scoring block"
        );

        let record = score_block(def, &player_ids, &activities, Utc::now());

        self.db.commit_score(&record).await?;

        Ok(record)
    }

    /// Scheduled-job entry point: score the most recently closed block
    /// that is not yet locked, or return `None` if there is nothing to do.
    pub async fn score_pending_block(&self, now: DateTime<Utc>) -> Result<Option<ScoreRecord>> {
        for def in calendar::closed_blocks(now) {
            let locked = match self.db.get_block(def.block_id).await? {
                Some(block) => block.is_locked(),
                None => false,
            };
            if !locked {
                let record = self.calculate_block_scores(def.block_id).await?;
                return Ok(Some(record));
            }
        }
        Ok(None)
    }
}

/// Compute the score record for a block from materialized inputs.
///
/// Deterministic: players are evaluated in sorted ID order, so the
/// clean-sweep scan awards at most one bonus no matter how the inputs
/// were ordered.
pub fn score_block(
    def: &BlockDefinition,
    player_ids: &[String],
    activities: &[Activity],
    now: DateTime<Utc>,
) -> ScoreRecord {
    let mut player_ids = player_ids.to_vec();
    player_ids.sort();

    // Aggregate calories and reporting details per (player, sport).
    // Multiple activities per player per sport are summed.
    let mut summed: BTreeMap<(String, Sport), f64> = BTreeMap::new();
    let mut details: BTreeMap<String, BTreeMap<Sport, SportDetail>> = BTreeMap::new();

    for activity in activities {
        if !player_ids.contains(&activity.player_id) {
            continue;
        }
        let key = (activity.player_id.clone(), activity.sport_category);
        *summed.entry(key).or_insert(0.0) += activity.calories;

        let detail = details
            .entry(activity.player_id.clone())
            .or_default()
            .entry(activity.sport_category)
            .or_default();
        detail.calories += activity.calories;
        detail.distance_meters += activity.distance_meters;
        detail.moving_time_seconds += activity.moving_time_seconds;
        detail.count += 1;
    }

    let calories_of = |pid: &str, sport: Sport| -> f64 {
        summed
            .get(&(pid.to_string(), sport))
            .copied()
            .unwrap_or(0.0)
    };

    // Score each eligible sport independently.
    let mut calories_by_sport: BTreeMap<Sport, BTreeMap<String, f64>> = BTreeMap::new();
    let mut points_by_sport: BTreeMap<Sport, BTreeMap<String, u32>> = BTreeMap::new();

    for &sport in def.sports {
        let totals: BTreeMap<String, f64> = player_ids
            .iter()
            .map(|pid| (pid.clone(), calories_of(pid, sport)))
            .collect();

        let logged: Vec<&String> = player_ids.iter().filter(|pid| totals[*pid] > 0.0).collect();

        let mut points: BTreeMap<String, u32> =
            player_ids.iter().map(|pid| (pid.clone(), 0)).collect();

        match logged.len() {
            0 => {} // Nobody logged this sport.
            1 => {
                // Solo credit.
                points.insert(logged[0].clone(), 2);
            }
            _ => {
                let max_calories = logged
                    .iter()
                    .map(|pid| totals[*pid])
                    .fold(f64::MIN, f64::max);
                let winners: Vec<&&String> = logged
                    .iter()
                    .filter(|pid| totals[**pid] == max_calories)
                    .collect();

                if winners.len() == logged.len() {
                    // Full tie across everyone who logged.
                    for pid in &logged {
                        points.insert((*pid).clone(), 1);
                    }
                } else {
                    // Leader(s) take 2; co-leaders both get 2.
                    for pid in winners {
                        points.insert((**pid).clone(), 2);
                    }
                }
            }
        }

        calories_by_sport.insert(sport, totals);
        points_by_sport.insert(sport, points);
    }

    // Clean-sweep eligibility: logged every eligible sport of this block.
    let clean_sweep_eligible: BTreeMap<String, bool> = player_ids
        .iter()
        .map(|pid| {
            let logged_all = def.sports.iter().all(|&sport| calories_of(pid, sport) > 0.0);
            (pid.clone(), logged_all)
        })
        .collect();

    let all_eligible =
        player_ids.len() >= 2 && clean_sweep_eligible.values().all(|&eligible| eligible);

    // Clean-sweep bonus: two mutually exclusive cases. At most one bonus
    // per block; the scan stops at the first qualifying player.
    let mut clean_sweep_achieved = false;
    let mut clean_sweep_winner: Option<String> = None;
    let mut bonus_points: BTreeMap<String, u32> =
        player_ids.iter().map(|pid| (pid.clone(), 0)).collect();

    if all_eligible {
        for pid in &player_ids {
            let won_all = def
                .sports
                .iter()
                .all(|sport| points_by_sport[sport][pid] == 2);
            if won_all {
                clean_sweep_achieved = true;
                clean_sweep_winner = Some(pid.clone());
                bonus_points.insert(pid.clone(), 1);
                break;
            }
        }
    } else if def.is_single_sport() {
        // Reduced block: taking the sole sport is the sweep. Data-driven
        // on the eligible-sport count, not on a particular block ID.
        let sole_sport = def.sports[0];
        for pid in &player_ids {
            if points_by_sport[&sole_sport][pid] == 2 {
                clean_sweep_achieved = true;
                clean_sweep_winner = Some(pid.clone());
                bonus_points.insert(pid.clone(), 1);
                break;
            }
        }
    }

    // Totals: sport points plus bonus.
    let total_points: BTreeMap<String, u32> = player_ids
        .iter()
        .map(|pid| {
            let sport_sum: u32 = def
                .sports
                .iter()
                .map(|sport| points_by_sport[sport][pid])
                .sum();
            (pid.clone(), sport_sum + bonus_points[pid])
        })
        .collect();

    ScoreRecord {
        block_id: def.block_id.to_string(),
        calories_by_sport,
        points_by_sport,
        clean_sweep_eligible,
        clean_sweep_achieved,
        clean_sweep_winner,
        bonus_points,
        total_points,
        details_by_player_sport: details,
        calculated_at: now,
        locked: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::find_block;
    use crate::models::CalorieSource;
    use chrono::TimeZone;

    fn make_activity(id: u32, pid: &str, sport: Sport, block_id: &str, calories: f64) -> Activity {
        Activity {
            activity_id: id.to_string(),
            player_id: pid.to_string(),
            strava_athlete_id: Some(1000 + id as u64),
            name: format!("Activity {}", id),
            sport_type: sport.as_str().to_string(),
            sport_category: sport,
            block_id: block_id.to_string(),
            start_date_utc: Utc.with_ymd_and_hms(2026, 3, 7, 10, 0, 0).unwrap(),
            calories,
            calorie_source: CalorieSource::Native,
            kilojoules: 0.0,
            distance_meters: 5000.0,
            moving_time_seconds: 1800,
        }
    }

    fn players(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 9, 12, 0, 0).unwrap()
    }

    fn run_block2(activities: Vec<Activity>) -> ScoreRecord {
        let def = find_block("block_2").unwrap();
        score_block(def, &players(&["p1", "p2"]), &activities, now())
    }

    #[test]
    fn test_higher_calories_wins() {
        let record = run_block2(vec![
            make_activity(1, "p1", Sport::Cycling, "block_2", 800.0),
            make_activity(2, "p2", Sport::Cycling, "block_2", 500.0),
            make_activity(3, "p1", Sport::Running, "block_2", 600.0),
            make_activity(4, "p2", Sport::Running, "block_2", 400.0),
        ]);

        assert_eq!(record.points_by_sport[&Sport::Cycling]["p1"], 2);
        assert_eq!(record.points_by_sport[&Sport::Cycling]["p2"], 0);
        assert_eq!(record.points_by_sport[&Sport::Running]["p1"], 2);
        assert_eq!(record.points_by_sport[&Sport::Running]["p2"], 0);
    }

    #[test]
    fn test_tie_gives_1_each() {
        let record = run_block2(vec![
            make_activity(1, "p1", Sport::Cycling, "block_2", 500.0),
            make_activity(2, "p2", Sport::Cycling, "block_2", 500.0),
        ]);

        assert_eq!(record.points_by_sport[&Sport::Cycling]["p1"], 1);
        assert_eq!(record.points_by_sport[&Sport::Cycling]["p2"], 1);
    }

    #[test]
    fn test_solo_activity_gives_2() {
        let record = run_block2(vec![make_activity(1, "p1", Sport::Running, "block_2", 500.0)]);

        assert_eq!(record.points_by_sport[&Sport::Running]["p1"], 2);
        assert_eq!(record.points_by_sport[&Sport::Running]["p2"], 0);
    }

    #[test]
    fn test_neither_logged_gives_0() {
        let record = run_block2(vec![
            make_activity(1, "p1", Sport::Cycling, "block_2", 600.0),
            make_activity(2, "p2", Sport::Cycling, "block_2", 500.0),
        ]);

        assert_eq!(record.points_by_sport[&Sport::Running]["p1"], 0);
        assert_eq!(record.points_by_sport[&Sport::Running]["p2"], 0);
        assert_eq!(record.points_by_sport[&Sport::Swimming]["p1"], 0);
        assert_eq!(record.points_by_sport[&Sport::Swimming]["p2"], 0);
    }

    #[test]
    fn test_multiple_activities_are_summed() {
        // p1 logs twice for 300 + 300 = 600, beating p2's single 500.
        let record = run_block2(vec![
            make_activity(1, "p1", Sport::Cycling, "block_2", 300.0),
            make_activity(2, "p1", Sport::Cycling, "block_2", 300.0),
            make_activity(3, "p2", Sport::Cycling, "block_2", 500.0),
        ]);

        assert_eq!(record.calories_by_sport[&Sport::Cycling]["p1"], 600.0);
        assert_eq!(record.points_by_sport[&Sport::Cycling]["p1"], 2);
        assert_eq!(record.details_by_player_sport["p1"][&Sport::Cycling].count, 2);
    }

    #[test]
    fn test_clean_sweep_achieved() {
        let record = run_block2(vec![
            make_activity(1, "p1", Sport::Cycling, "block_2", 800.0),
            make_activity(2, "p2", Sport::Cycling, "block_2", 500.0),
            make_activity(3, "p1", Sport::Running, "block_2", 600.0),
            make_activity(4, "p2", Sport::Running, "block_2", 400.0),
            make_activity(5, "p1", Sport::Swimming, "block_2", 350.0),
            make_activity(6, "p2", Sport::Swimming, "block_2", 280.0),
        ]);

        assert!(record.clean_sweep_achieved);
        assert_eq!(record.clean_sweep_winner.as_deref(), Some("p1"));
        assert_eq!(record.bonus_points["p1"], 1);
        assert_eq!(record.total_points["p1"], 7); // 2+2+2 + 1
        assert_eq!(record.total_points["p2"], 0);
    }

    #[test]
    fn test_no_sweep_when_player_misses_sport() {
        // p2 never ran, so the all-eligible gate fails for everyone.
        let record = run_block2(vec![
            make_activity(1, "p1", Sport::Cycling, "block_2", 800.0),
            make_activity(2, "p2", Sport::Cycling, "block_2", 500.0),
            make_activity(3, "p1", Sport::Running, "block_2", 600.0),
            make_activity(5, "p1", Sport::Swimming, "block_2", 350.0),
            make_activity(6, "p2", Sport::Swimming, "block_2", 280.0),
        ]);

        assert!(record.clean_sweep_eligible["p1"]);
        assert!(!record.clean_sweep_eligible["p2"]);
        assert!(!record.clean_sweep_achieved);
        assert_eq!(record.bonus_points["p1"], 0);
    }

    #[test]
    fn test_eligible_but_wins_split_means_no_sweep() {
        let record = run_block2(vec![
            make_activity(1, "p1", Sport::Cycling, "block_2", 800.0),
            make_activity(2, "p2", Sport::Cycling, "block_2", 500.0),
            make_activity(3, "p1", Sport::Running, "block_2", 400.0),
            make_activity(4, "p2", Sport::Running, "block_2", 600.0),
            make_activity(5, "p1", Sport::Swimming, "block_2", 350.0),
            make_activity(6, "p2", Sport::Swimming, "block_2", 280.0),
        ]);

        assert!(record.clean_sweep_eligible["p1"]);
        assert!(record.clean_sweep_eligible["p2"]);
        assert!(!record.clean_sweep_achieved);
    }

    #[test]
    fn test_tied_sport_blocks_clean_sweep() {
        // Swimming is tied at 1 point each, so nobody won every sport
        // even though both players logged all three.
        let record = run_block2(vec![
            make_activity(1, "p1", Sport::Cycling, "block_2", 800.0),
            make_activity(2, "p2", Sport::Cycling, "block_2", 500.0),
            make_activity(3, "p1", Sport::Running, "block_2", 600.0),
            make_activity(4, "p2", Sport::Running, "block_2", 400.0),
            make_activity(5, "p1", Sport::Swimming, "block_2", 300.0),
            make_activity(6, "p2", Sport::Swimming, "block_2", 300.0),
        ]);

        assert_eq!(record.points_by_sport[&Sport::Swimming]["p1"], 1);
        assert_eq!(record.points_by_sport[&Sport::Swimming]["p2"], 1);
        assert!(!record.clean_sweep_achieved);
        assert_eq!(record.total_points["p1"], 5); // 2+2+1, no bonus
    }

    #[test]
    fn test_single_sport_block_winner_gets_3() {
        let def = find_block("block_1").unwrap();
        let record = score_block(
            def,
            &players(&["p1", "p2"]),
            &vec![
                make_activity(1, "p1", Sport::Swimming, "block_1", 450.0),
                make_activity(2, "p2", Sport::Swimming, "block_1", 320.0),
            ],
            now(),
        );

        assert_eq!(record.points_by_sport[&Sport::Swimming]["p1"], 2);
        assert_eq!(record.points_by_sport[&Sport::Swimming]["p2"], 0);
        assert_eq!(record.bonus_points["p1"], 1);
        assert_eq!(record.total_points["p1"], 3);
        assert_eq!(record.total_points["p2"], 0);
    }

    #[test]
    fn test_single_sport_block_solo_winner_still_gets_bonus() {
        // Only p1 swam: all-eligible gate fails, reduced-block rule applies.
        let def = find_block("block_1").unwrap();
        let record = score_block(
            def,
            &players(&["p1", "p2"]),
            &vec![make_activity(1, "p1", Sport::Swimming, "block_1", 450.0)],
            now(),
        );

        assert_eq!(record.total_points["p1"], 3);
        assert_eq!(record.clean_sweep_winner.as_deref(), Some("p1"));
    }

    #[test]
    fn test_single_sport_block_scores_only_its_sport() {
        let def = find_block("block_1").unwrap();
        let record = score_block(
            def,
            &players(&["p1", "p2"]),
            &vec![
                make_activity(1, "p1", Sport::Swimming, "block_1", 450.0),
                make_activity(2, "p2", Sport::Swimming, "block_1", 320.0),
            ],
            now(),
        );

        assert!(record.points_by_sport.contains_key(&Sport::Swimming));
        assert!(!record.points_by_sport.contains_key(&Sport::Cycling));
        assert!(!record.points_by_sport.contains_key(&Sport::Running));
    }

    #[test]
    fn test_three_players_at_most_one_bonus() {
        // Three participants, all logged all sports, p1 wins everything.
        // The sorted scan must award exactly one bonus.
        let def = find_block("block_2").unwrap();
        let mut activities = Vec::new();
        let mut id = 0;
        for (pid, base) in [("p1", 900.0), ("p2", 500.0), ("p3", 400.0)] {
            for sport in [Sport::Cycling, Sport::Running, Sport::Swimming] {
                id += 1;
                activities.push(make_activity(id, pid, sport, "block_2", base));
            }
        }
        let record = score_block(def, &players(&["p3", "p1", "p2"]), &activities, now());

        assert_eq!(record.bonus_points.values().sum::<u32>(), 1);
        assert_eq!(record.clean_sweep_winner.as_deref(), Some("p1"));
        assert_eq!(record.total_points["p1"], 7);
    }

    #[test]
    fn test_co_leaders_both_get_2() {
        // Three logged; two tie at the top, one trails: leaders get 2 each.
        let def = find_block("block_2").unwrap();
        let record = score_block(
            def,
            &players(&["p1", "p2", "p3"]),
            &vec![
                make_activity(1, "p1", Sport::Cycling, "block_2", 700.0),
                make_activity(2, "p2", Sport::Cycling, "block_2", 700.0),
                make_activity(3, "p3", Sport::Cycling, "block_2", 300.0),
            ],
            now(),
        );

        assert_eq!(record.points_by_sport[&Sport::Cycling]["p1"], 2);
        assert_eq!(record.points_by_sport[&Sport::Cycling]["p2"], 2);
        assert_eq!(record.points_by_sport[&Sport::Cycling]["p3"], 0);
    }

    #[test]
    fn test_no_participants_produces_empty_record() {
        let def = find_block("block_2").unwrap();
        let record = score_block(def, &[], &[], now());

        assert!(!record.clean_sweep_achieved);
        assert!(record.total_points.is_empty());
        assert!(record.locked);
    }

    #[test]
    fn test_activities_from_nonparticipants_are_ignored() {
        // p3 is not connected; their activities must not affect points.
        let record = run_block2(vec![
            make_activity(1, "p1", Sport::Cycling, "block_2", 500.0),
            make_activity(2, "p3", Sport::Cycling, "block_2", 900.0),
        ]);

        assert_eq!(record.points_by_sport[&Sport::Cycling]["p1"], 2);
        assert!(!record.points_by_sport[&Sport::Cycling].contains_key("p3"));
    }
}
