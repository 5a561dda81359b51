// SPDX-License-Identifier: MIT

//! Block model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::BlockDefinition;
use crate::error::AppError;
use crate::models::Sport;

/// Lifecycle state of a block.
///
/// The only legal transition is `Open -> Locked`, performed exactly once
/// by the scoring engine inside a Firestore transaction. There is no
/// reverse edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockStatus {
    Open,
    Locked,
}

/// Block document stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    /// Stable block ID (also used as document ID)
    pub block_id: String,
    /// Human-readable label
    pub label: String,
    /// Window open instant (inclusive), UTC
    pub window_open_utc: DateTime<Utc>,
    /// Window close instant (inclusive), UTC
    pub window_close_utc: DateTime<Utc>,
    /// Eligible sport categories for this block
    pub sports: Vec<Sport>,
    /// Lifecycle state; flipped to `Locked` when scores are finalized
    pub status: BlockStatus,
    /// When scores were calculated (set together with the lock)
    pub calculated_at: Option<DateTime<Utc>>,
}

impl Block {
    /// Build the initial (open) document for a calendar definition.
    pub fn from_definition(def: &BlockDefinition) -> Self {
        Self {
            block_id: def.block_id.to_string(),
            label: def.label.to_string(),
            window_open_utc: def.window_open,
            window_close_utc: def.window_close,
            sports: def.sports.to_vec(),
            status: BlockStatus::Open,
            calculated_at: None,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.status == BlockStatus::Locked
    }

    /// The scoring gate: a locked block rejects any further scoring
    /// attempt. Both the service fast path and the transactional commit
    /// go through this check.
    pub fn ensure_unlocked(&self) -> Result<(), AppError> {
        if self.is_locked() {
            return Err(AppError::AlreadyLocked(self.block_id.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar;

    #[test]
    fn test_seeded_block_starts_open() {
        let def = calendar::find_block("block_2").unwrap();
        let block = Block::from_definition(def);
        assert_eq!(block.status, BlockStatus::Open);
        assert!(block.ensure_unlocked().is_ok());
    }

    #[test]
    fn test_locked_block_rejects_rescoring() {
        // Once scored, a second calculation attempt must be refused so
        // the first record stays final.
        let def = calendar::find_block("block_2").unwrap();
        let mut block = Block::from_definition(def);
        block.status = BlockStatus::Locked;

        match block.ensure_unlocked() {
            Err(AppError::AlreadyLocked(id)) => assert_eq!(id, "block_2"),
            other => panic!("expected AlreadyLocked, got {:?}", other),
        }
    }
}
