// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod activity;
pub mod block;
pub mod player;
pub mod score;
pub mod sport;

pub use activity::{Activity, CalorieSource};
pub use block::{Block, BlockStatus};
pub use player::{ConnectionStatus, Player, PlayerSummary};
pub use score::{ScoreRecord, SportDetail};
pub use sport::Sport;
