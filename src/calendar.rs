// SPDX-License-Identifier: MIT

//! The static block calendar and window assignment.
//!
//! Block windows are defined in civil time — they open at midnight Japan
//! time and close at 23:59:59 Pacific time — but are converted to UTC
//! once, here, at construction. Everything downstream compares absolute
//! instants only, so zone offsets can never shift a boundary.

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use std::sync::OnceLock;

use crate::models::Sport;

/// A block definition: identity, window, and eligible sports.
///
/// Definitions are ordered by `window_open` and their closed intervals
/// never overlap.
#[derive(Debug, Clone)]
pub struct BlockDefinition {
    pub block_id: &'static str,
    pub label: &'static str,
    /// Window open instant (inclusive), UTC
    pub window_open: DateTime<Utc>,
    /// Window close instant (inclusive), UTC
    pub window_close: DateTime<Utc>,
    pub sports: &'static [Sport],
}

impl BlockDefinition {
    /// Whether the closed interval `[window_open, window_close]`
    /// contains the instant. Both endpoints are inclusive.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.window_open <= instant && instant <= self.window_close
    }

    /// A reduced block carries a single eligible sport; the clean-sweep
    /// bonus rule has a direct check for it.
    pub fn is_single_sport(&self) -> bool {
        self.sports.len() == 1
    }
}

const ALL_SPORTS: &[Sport] = &[Sport::Cycling, Sport::Running, Sport::Swimming];
const SWIM_ONLY: &[Sport] = &[Sport::Swimming];

/// Convert a Japan-time (UTC+9) midnight to a UTC open instant.
fn jst_open(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    let jst = FixedOffset::east_opt(9 * 3600).unwrap();
    jst.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .unwrap()
        .with_timezone(&Utc)
}

/// Convert a Pacific-time (UTC-8) end-of-day to a UTC close instant.
fn pst_close(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    let pst = FixedOffset::west_opt(8 * 3600).unwrap();
    pst.with_ymd_and_hms(year, month, day, 23, 59, 59)
        .unwrap()
        .with_timezone(&Utc)
}

/// The fixed competition calendar (March 2026).
///
/// Block 1 is the reduced swim-only block; blocks 2-5 are full Fri-Sun
/// triathlon windows.
pub fn definitions() -> &'static [BlockDefinition] {
    static DEFINITIONS: OnceLock<Vec<BlockDefinition>> = OnceLock::new();
    DEFINITIONS.get_or_init(|| {
        vec![
            BlockDefinition {
                block_id: "block_1",
                label: "Block 1 — Mar 1 (Sunday)",
                window_open: jst_open(2026, 3, 1),
                window_close: pst_close(2026, 3, 1),
                sports: SWIM_ONLY,
            },
            BlockDefinition {
                block_id: "block_2",
                label: "Block 2 — Mar 6–8",
                window_open: jst_open(2026, 3, 6),
                window_close: pst_close(2026, 3, 8),
                sports: ALL_SPORTS,
            },
            BlockDefinition {
                block_id: "block_3",
                label: "Block 3 — Mar 13–15",
                window_open: jst_open(2026, 3, 13),
                window_close: pst_close(2026, 3, 15),
                sports: ALL_SPORTS,
            },
            BlockDefinition {
                block_id: "block_4",
                label: "Block 4 — Mar 20–22",
                window_open: jst_open(2026, 3, 20),
                window_close: pst_close(2026, 3, 22),
                sports: ALL_SPORTS,
            },
            BlockDefinition {
                block_id: "block_5",
                label: "Block 5 — Mar 27–29",
                window_open: jst_open(2026, 3, 27),
                window_close: pst_close(2026, 3, 29),
                sports: ALL_SPORTS,
            },
        ]
    })
}

/// Return the block whose window contains the instant, or `None`.
///
/// Gaps between blocks are expected; an activity outside every window is
/// simply excluded from scoring, not an error.
pub fn assign_block(instant: DateTime<Utc>) -> Option<&'static str> {
    definitions()
        .iter()
        .find(|def| def.contains(instant))
        .map(|def| def.block_id)
}

/// Look up a block definition by ID.
pub fn find_block(block_id: &str) -> Option<&'static BlockDefinition> {
    definitions().iter().find(|def| def.block_id == block_id)
}

/// Definitions whose window has already closed, most recently closed
/// first. Feeds the scheduled scoring job.
pub fn closed_blocks(now: DateTime<Utc>) -> Vec<&'static BlockDefinition> {
    let mut closed: Vec<_> = definitions()
        .iter()
        .filter(|def| def.window_close < now)
        .collect();
    closed.sort_by_key(|def| std::cmp::Reverse(def.window_close));
    closed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_block1_opens_sunday_00_jst() {
        // Sun Mar 1 00:00 JST = Sat Feb 28 15:00 UTC
        let block1 = &definitions()[0];
        let expected = Utc.with_ymd_and_hms(2026, 2, 28, 15, 0, 0).unwrap();
        assert_eq!(block1.window_open, expected);
    }

    #[test]
    fn test_block1_closes_sunday_2359_pst() {
        // Sun Mar 1 23:59:59 PST = Mon Mar 2 07:59:59 UTC
        let block1 = &definitions()[0];
        let expected = Utc.with_ymd_and_hms(2026, 3, 2, 7, 59, 59).unwrap();
        assert_eq!(block1.window_close, expected);
    }

    #[test]
    fn test_block2_window_in_utc() {
        // Fri Mar 6 00:00 JST = Thu Mar 5 15:00 UTC
        // Sun Mar 8 23:59:59 PST = Mon Mar 9 07:59:59 UTC
        let block2 = &definitions()[1];
        assert_eq!(
            block2.window_open,
            Utc.with_ymd_and_hms(2026, 3, 5, 15, 0, 0).unwrap()
        );
        assert_eq!(
            block2.window_close,
            Utc.with_ymd_and_hms(2026, 3, 9, 7, 59, 59).unwrap()
        );
    }

    #[test]
    fn test_block5_window_in_utc() {
        let block5 = &definitions()[4];
        assert_eq!(
            block5.window_open,
            Utc.with_ymd_and_hms(2026, 3, 26, 15, 0, 0).unwrap()
        );
        assert_eq!(
            block5.window_close,
            Utc.with_ymd_and_hms(2026, 3, 30, 7, 59, 59).unwrap()
        );
    }

    #[test]
    fn test_windows_are_ordered_and_disjoint() {
        let defs = definitions();
        for pair in defs.windows(2) {
            assert!(pair[0].window_close < pair[1].window_open);
        }
    }

    #[test]
    fn test_instant_inside_block1() {
        let instant = Utc.with_ymd_and_hms(2026, 3, 1, 6, 0, 0).unwrap();
        assert_eq!(assign_block(instant), Some("block_1"));
    }

    #[test]
    fn test_instant_between_blocks_is_unassigned() {
        let instant = Utc.with_ymd_and_hms(2026, 3, 3, 12, 0, 0).unwrap();
        assert_eq!(assign_block(instant), None);
    }

    #[test]
    fn test_open_boundary_is_inclusive() {
        let block2 = &definitions()[1];
        assert_eq!(assign_block(block2.window_open), Some("block_2"));
    }

    #[test]
    fn test_close_boundary_is_inclusive() {
        let block2 = &definitions()[1];
        assert_eq!(assign_block(block2.window_close), Some("block_2"));
    }

    #[test]
    fn test_one_second_after_close_is_unassigned() {
        let block2 = &definitions()[1];
        assert_eq!(assign_block(block2.window_close + Duration::seconds(1)), None);
    }

    #[test]
    fn test_before_first_block_is_unassigned() {
        let instant = Utc.with_ymd_and_hms(2026, 2, 28, 14, 0, 0).unwrap();
        assert_eq!(assign_block(instant), None);
    }

    #[test]
    fn test_closed_blocks_most_recent_first() {
        // Between block 3 close and block 4 open
        let now = Utc.with_ymd_and_hms(2026, 3, 17, 12, 0, 0).unwrap();
        let closed = closed_blocks(now);
        let ids: Vec<_> = closed.iter().map(|d| d.block_id).collect();
        assert_eq!(ids, vec!["block_3", "block_2", "block_1"]);
    }

    #[test]
    fn test_single_sport_detection() {
        assert!(find_block("block_1").unwrap().is_single_sport());
        assert!(!find_block("block_2").unwrap().is_single_sport());
    }
}
