// SPDX-License-Identifier: MIT

//! Sport categories and the raw-label classifier.
//!
//! Strava reports a fine-grained `sport_type`; the competition only
//! recognizes three categories. Anything else is excluded from scoring.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized sport category for scoring.
///
/// `Ord` matters: score maps are keyed by `Sport`, so iteration order
/// (and therefore serialized output) is stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Sport {
    Cycling,
    Running,
    Swimming,
}

impl Sport {
    /// Map a raw Strava `sport_type` label to a category.
    ///
    /// Returns `None` for unrecognized labels; those activities are
    /// excluded from scoring (counted as `ignored_sport` during sync).
    pub fn classify(raw_label: &str) -> Option<Sport> {
        match raw_label {
            "Ride" | "MountainBikeRide" | "GravelRide" => Some(Sport::Cycling),
            "Run" | "TrailRun" => Some(Sport::Running),
            "Swim" => Some(Sport::Swimming),
            _ => None,
        }
    }

    /// Metabolic equivalent used for the calorie estimation fallback.
    pub fn met(self) -> f64 {
        match self {
            Sport::Cycling => 7.5,
            Sport::Running => 9.8,
            Sport::Swimming => 8.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Sport::Cycling => "Cycling",
            Sport::Running => "Running",
            Sport::Swimming => "Swimming",
        }
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
