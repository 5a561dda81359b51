// SPDX-License-Identifier: MIT

//! Activity model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Sport;

/// Which step of the calorie fallback chain produced the stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalorieSource {
    /// Strava reported calories directly
    Native,
    /// Derived from reported kilojoules (1 kJ ~ 0.239 kcal)
    KilojoulesDerived,
    /// Estimated from MET x body mass x duration
    MetEstimated,
}

/// Stored activity record in Firestore.
///
/// The Strava activity ID is the document ID and idempotency key: an
/// activity is ingested at most once, and its `block_id` and sport
/// category never change after storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    /// Strava activity ID (also used as document ID)
    pub activity_id: String,
    /// Owning player slot
    pub player_id: String,
    /// Strava athlete ID (owner)
    pub strava_athlete_id: Option<u64>,
    /// Activity name/title
    pub name: String,
    /// Raw Strava sport type (Ride, TrailRun, etc.)
    pub sport_type: String,
    /// Resolved sport category
    pub sport_category: Sport,
    /// Block this activity was assigned to
    pub block_id: String,
    /// Start instant, UTC
    pub start_date_utc: DateTime<Utc>,
    /// Resolved calorie value (see `calorie_source`)
    pub calories: f64,
    /// Which fallback produced `calories`
    pub calorie_source: CalorieSource,
    /// Raw kilojoules as reported by Strava
    pub kilojoules: f64,
    /// Distance in meters
    pub distance_meters: f64,
    /// Moving time in seconds
    pub moving_time_seconds: u64,
}
