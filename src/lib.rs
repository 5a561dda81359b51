// SPDX-License-Identifier: MIT

//! Triblock-Tracker: backend for a two-competitor triathlon challenge.
//!
//! The competition runs over fixed calendar blocks, each with its own set
//! of eligible sports. Activities synced from Strava are assigned to block
//! windows and scored by calorie totals; once a block is scored it is
//! locked and its score record is immutable.

pub mod calendar;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::FirestoreDb;
use services::{DashboardService, ScoringService, SyncService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub scoring: ScoringService,
    pub dashboard: DashboardService,
    pub sync: SyncService,
}
