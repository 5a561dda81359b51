// SPDX-License-Identifier: MIT

//! Activity sync service — fetches activities from Strava, classifies
//! them, assigns them to block windows, resolves calories, and stores
//! them in Firestore.
//!
//! Sync is idempotent: the Strava activity ID is the document ID, and an
//! already-stored activity is skipped. Locked blocks are never re-synced.

use chrono::{DateTime, Utc};

use crate::calendar;
use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::models::{Activity, CalorieSource, Player, Sport};
use crate::services::strava::StravaClient;

/// 1 kJ in kcal, for Strava activities that report work but not calories.
pub const KJ_TO_KCAL: f64 = 0.239;

/// Body mass assumed when the Strava profile does not share one.
pub const DEFAULT_WEIGHT_KG: f64 = 80.0;

/// Reuse an access token while it is still valid this long.
const TOKEN_REUSE_MARGIN_SECS: i64 = 300;

const ACTIVITIES_PER_PAGE: u32 = 100;

/// Counters returned from a sync run. Exclusions here are outcomes, not
/// errors.
#[derive(Debug, Default, Clone, Copy, serde::Serialize)]
pub struct SyncSummary {
    /// Activities newly stored
    pub new: u32,
    /// Already stored or outside the block window
    pub skipped: u32,
    /// Unrecognized sport label, or sport not eligible for the block
    pub ignored_sport: u32,
}

/// Calorie value with the fallback step that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedCalories {
    pub calories: f64,
    pub source: CalorieSource,
}

/// Resolve an activity's calorie value via the ordered fallback chain:
/// native calories if positive, else kilojoules-derived, else a MET
/// estimate from body mass and duration.
pub fn resolve_calories(
    native_calories: f64,
    kilojoules: f64,
    sport: Option<Sport>,
    weight_kg: f64,
    moving_time_seconds: u64,
) -> ResolvedCalories {
    if native_calories > 0.0 {
        return ResolvedCalories {
            calories: native_calories,
            source: CalorieSource::Native,
        };
    }

    if kilojoules > 0.0 {
        return ResolvedCalories {
            calories: round2(kilojoules * KJ_TO_KCAL),
            source: CalorieSource::KilojoulesDerived,
        };
    }

    let met = sport.map(Sport::met).unwrap_or(1.0);
    let duration_hours = moving_time_seconds as f64 / 3600.0;
    ResolvedCalories {
        calories: round2(met * weight_kg * duration_hours),
        source: CalorieSource::MetEstimated,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Syncs Strava activities into the record store.
#[derive(Clone)]
pub struct SyncService {
    strava: StravaClient,
    db: FirestoreDb,
}

impl SyncService {
    pub fn new(strava: StravaClient, db: FirestoreDb) -> Self {
        Self { strava, db }
    }

    /// Sync Strava activities for a player across all unlocked block
    /// windows. Returns counters for the run.
    pub async fn sync_player(&self, player_id: &str) -> Result<SyncSummary> {
        let player = self
            .db
            .get_player(player_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Player {} not found", player_id)))?;

        let access_token = self.access_token_for(&player).await?;

        // Body mass for the MET estimation fallback.
        let profile = self.strava.get_athlete(&access_token).await?;
        let weight_kg = player
            .weight_kg
            .or(profile.weight)
            .unwrap_or(DEFAULT_WEIGHT_KG);

        let mut summary = SyncSummary::default();

        for def in calendar::definitions() {
            // Locked blocks are final; never re-sync them.
            if let Some(block) = self.db.get_block(def.block_id).await? {
                if block.is_locked() {
                    continue;
                }
            }

            let after = def.window_open.timestamp();
            let before = def.window_close.timestamp();

            let mut page = 1;
            loop {
                let activities = self
                    .strava
                    .list_activities(&access_token, after, before, page, ACTIVITIES_PER_PAGE)
                    .await?;
                let page_len = activities.len();

                for summary_activity in activities {
                    self.ingest_activity(&player, &access_token, def.block_id, summary_activity, weight_kg, &mut summary)
                        .await?;
                }

                if page_len < ACTIVITIES_PER_PAGE as usize {
                    break;
                }
                page += 1;
            }
        }

        tracing::info!(
            player_id,
            new = summary.new,
            skipped = summary.skipped,
            ignored_sport = summary.ignored_sport,
            "Sync complete"
        );

        Ok(summary)
    }

    /// Classify, window-check, resolve calories, and store one activity.
    async fn ingest_activity(
        &self,
        player: &Player,
        access_token: &str,
        block_id: &str,
        summary_activity: crate::services::strava::StravaActivitySummary,
        weight_kg: f64,
        summary: &mut SyncSummary,
    ) -> Result<()> {
        let activity_id = summary_activity.id.to_string();

        // Idempotency: the Strava ID is the document ID.
        if self.db.get_activity(&activity_id).await?.is_some() {
            summary.skipped += 1;
            return Ok(());
        }

        let sport_type = summary_activity.sport_type.unwrap_or_default();
        let Some(sport_category) = Sport::classify(&sport_type) else {
            summary.ignored_sport += 1;
            return Ok(());
        };

        let def = calendar::find_block(block_id)
            .ok_or_else(|| AppError::UnknownBlock(block_id.to_string()))?;
        if !def.sports.contains(&sport_category) {
            summary.ignored_sport += 1;
            return Ok(());
        }

        let start_date_utc: DateTime<Utc> = summary_activity
            .start_date
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| {
                AppError::StravaApi(format!("Invalid start_date for activity {}", activity_id))
            })?;

        // The Strava window query is by timestamp range; verify against
        // the authoritative assignment before storing.
        if calendar::assign_block(start_date_utc) != Some(block_id) {
            summary.skipped += 1;
            return Ok(());
        }

        // Calories only appear on the detailed activity.
        let detail = self
            .strava
            .get_activity_detail(access_token, summary_activity.id)
            .await?;

        let moving_time_seconds = summary_activity.moving_time.unwrap_or(0);
        let resolved = resolve_calories(
            detail.calories.unwrap_or(0.0),
            detail.kilojoules.unwrap_or(0.0),
            Some(sport_category),
            weight_kg,
            moving_time_seconds,
        );

        let activity = Activity {
            activity_id,
            player_id: player.player_id.clone(),
            strava_athlete_id: player.strava_athlete_id,
            name: summary_activity.name.unwrap_or_default(),
            sport_type,
            sport_category,
            block_id: block_id.to_string(),
            start_date_utc,
            calories: resolved.calories,
            calorie_source: resolved.source,
            kilojoules: detail.kilojoules.unwrap_or(0.0),
            distance_meters: summary_activity.distance.unwrap_or(0.0),
            moving_time_seconds,
        };

        self.db.set_activity(&activity).await?;
        summary.new += 1;
        Ok(())
    }

    /// Return a valid access token, refreshing and persisting if expired.
    async fn access_token_for(&self, player: &Player) -> Result<String> {
        let now = Utc::now().timestamp();

        if let (Some(token), Some(expiry)) = (&player.access_token, player.token_expiry) {
            if expiry > now + TOKEN_REUSE_MARGIN_SECS {
                return Ok(token.clone());
            }
        }

        let refresh_token = player.refresh_token.as_deref().ok_or_else(|| {
            AppError::BadRequest(format!("Player {} has no Strava binding", player.player_id))
        })?;

        let refreshed = self.strava.refresh_token(refresh_token).await?;

        let mut updated = player.clone();
        updated.access_token = Some(refreshed.access_token.clone());
        updated.refresh_token = Some(refreshed.refresh_token);
        updated.token_expiry = Some(refreshed.expires_at);
        self.db.upsert_player(&updated).await?;

        Ok(refreshed.access_token)
    }
}
