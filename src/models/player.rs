// SPDX-License-Identifier: MIT

//! Player slot model for storage and API.

use serde::{Deserialize, Serialize};

/// Connection state of a player slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// Slot created but no Strava account bound yet
    Pending,
    /// Strava account bound; participates in scoring
    Connected,
    /// Binding removed; excluded from scoring
    Disconnected,
}

/// Player slot stored in Firestore.
///
/// At most one Strava account binds to a slot, and a Strava account
/// binds to at most one slot. The scoring engine only reads these
/// documents; the binding flow mutates them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Slot ID, e.g. "player_1" (also used as document ID)
    pub player_id: String,
    /// Display name
    pub display_name: String,
    /// Bound Strava athlete ID, if connected
    pub strava_athlete_id: Option<u64>,
    /// Connection state
    pub status: ConnectionStatus,
    /// Profile photo URL from Strava
    pub profile_photo: Option<String>,
    /// Strava access token (opaque to the scoring engine)
    pub access_token: Option<String>,
    /// Strava refresh token
    pub refresh_token: Option<String>,
    /// Access token expiry (Unix timestamp)
    pub token_expiry: Option<i64>,
    /// Body mass from the Strava profile, for calorie estimation
    pub weight_kg: Option<f64>,
}

impl Player {
    /// Create a fresh, unbound slot.
    pub fn new_slot(player_id: &str, display_name: &str) -> Self {
        Self {
            player_id: player_id.to_string(),
            display_name: display_name.to_string(),
            strava_athlete_id: None,
            status: ConnectionStatus::Pending,
            profile_photo: None,
            access_token: None,
            refresh_token: None,
            token_expiry: None,
            weight_kg: None,
        }
    }
}

/// Public view of a player slot (no credential material).
#[derive(Debug, Clone, Serialize)]
pub struct PlayerSummary {
    pub player_id: String,
    pub display_name: String,
    pub status: ConnectionStatus,
    pub profile_photo: Option<String>,
}

impl From<&Player> for PlayerSummary {
    fn from(player: &Player) -> Self {
        Self {
            player_id: player.player_id.clone(),
            display_name: player.display_name.clone(),
            status: player.status,
            profile_photo: player.profile_photo.clone(),
        }
    }
}
