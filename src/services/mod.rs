// SPDX-License-Identifier: MIT

//! Services module - business logic layer.

pub mod dashboard;
pub mod scoring;
pub mod strava;
pub mod sync;

pub use dashboard::DashboardService;
pub use scoring::ScoringService;
pub use strava::StravaClient;
pub use sync::SyncService;
