// SPDX-License-Identifier: MIT

//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const BLOCKS: &str = "blocks";
    pub const ATHLETES: &str = "athletes";
    pub const ACTIVITIES: &str = "activities";
    pub const SCORES: &str = "scores";
}
