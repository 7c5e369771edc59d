//! # stoa-seed
//!
//! Synthetic timestamps for seeded transaction data.
//!
//! The first seeded transaction is anchored to the current time; every
//! following one is placed one day further in the past, starting from the
//! configured genesis timestamp. [`SeedState`] carries the cursor and is
//! mutated in place by [`SeedState::change_genesis_timestamp`].

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// One day, in seconds.
pub const ONE_DAY_SECS: i64 = 86_400;

/// Iterator value for the first block.
pub const FIRST_BLOCK: u32 = 1;

/// Iterator value for every block after the first transaction.
pub const SUBSEQUENT_BLOCKS: u32 = 2;

/// Seed configuration and cursor.
///
/// Loaded once from the `seed_data` config section; never reset during a
/// run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedState {
    /// Feature flag. When off the generator is a no-op returning 0.
    #[serde(default)]
    pub seed: bool,

    /// `1` until the first transaction has been dated, `2` afterwards.
    #[serde(default = "default_iterator")]
    pub iterator: u32,

    /// Next date handed out once `iterator` has moved past the first block,
    /// in Unix seconds.
    #[serde(default)]
    pub genesis_timestamp: i64,
}

fn default_iterator() -> u32 {
    FIRST_BLOCK
}

impl Default for SeedState {
    fn default() -> Self {
        Self { seed: false, iterator: FIRST_BLOCK, genesis_timestamp: 0 }
    }
}

impl SeedState {
    pub fn new(seed: bool, genesis_timestamp: i64) -> Self {
        Self { seed, iterator: FIRST_BLOCK, genesis_timestamp }
    }

    /// Date for the next block, using the system clock for "now".
    ///
    /// Only `tx_count == 0` versus non-zero matters.
    pub fn change_genesis_timestamp(&mut self, tx_count: u64) -> i64 {
        self.change_genesis_timestamp_at(tx_count, Utc::now().timestamp())
    }

    /// Same as [`SeedState::change_genesis_timestamp`] with an explicit
    /// current time.
    pub fn change_genesis_timestamp_at(&mut self, tx_count: u64, now: i64) -> i64 {
        if !self.seed {
            return 0;
        }

        let has_tx = tx_count != 0;
        let date = if self.iterator == FIRST_BLOCK {
            if has_tx {
                self.iterator = SUBSEQUENT_BLOCKS;
            }
            now
        } else {
            let date = self.genesis_timestamp;
            if has_tx {
                // Saturates at the far past instead of overflowing.
                self.genesis_timestamp = self.genesis_timestamp.saturating_sub(ONE_DAY_SECS);
            }
            date
        };

        trace!(tx_count, iterator = self.iterator, date, "assigned seed timestamp");
        date
    }

    /// Dates for a run of blocks given their transaction counts, in order.
    pub fn backdate(&mut self, tx_counts: impl IntoIterator<Item = u64>) -> Vec<i64> {
        tx_counts.into_iter().map(|count| self.change_genesis_timestamp(count)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: i64 = 1_700_000_000;

    fn enabled(iterator: u32) -> SeedState {
        SeedState { seed: true, iterator, genesis_timestamp: T }
    }

    #[test]
    fn disabled_is_a_noop() {
        let mut state = SeedState { seed: false, iterator: FIRST_BLOCK, genesis_timestamp: T };
        let before = state;
        for count in [0, 1, 5] {
            assert_eq!(state.change_genesis_timestamp(count), 0);
        }
        assert_eq!(state, before);

        let mut later = SeedState { seed: false, iterator: SUBSEQUENT_BLOCKS, genesis_timestamp: T };
        assert_eq!(later.change_genesis_timestamp_at(1, 42), 0);
        assert_eq!(later.genesis_timestamp, T);
    }

    #[test]
    fn first_block_without_tx_keeps_iterator() {
        let mut state = enabled(FIRST_BLOCK);
        assert_eq!(state.change_genesis_timestamp_at(0, 1_800_000_000), 1_800_000_000);
        assert_eq!(state.iterator, FIRST_BLOCK);
        assert_eq!(state.genesis_timestamp, T);
    }

    #[test]
    fn first_tx_uses_now_and_advances_iterator() {
        let mut state = enabled(FIRST_BLOCK);
        assert_eq!(state.change_genesis_timestamp_at(3, 1_800_000_000), 1_800_000_000);
        assert_eq!(state.iterator, SUBSEQUENT_BLOCKS);
        assert_eq!(state.genesis_timestamp, T);
    }

    #[test]
    fn first_calls_track_the_clock() {
        let mut state = enabled(FIRST_BLOCK);
        let before = Utc::now().timestamp();
        let a = state.change_genesis_timestamp(0);
        let b = state.change_genesis_timestamp(1);
        let after = Utc::now().timestamp();

        assert!(before <= a && a <= after);
        assert!(before <= b && b <= after);
        assert_eq!(state.iterator, SUBSEQUENT_BLOCKS);
    }

    #[test]
    fn subsequent_blocks_step_back_one_day() {
        let mut state = enabled(SUBSEQUENT_BLOCKS);
        let dates: Vec<i64> = (0..3).map(|_| state.change_genesis_timestamp(1)).collect();
        assert_eq!(dates, vec![1_700_000_000, 1_699_913_600, 1_699_827_200]);
        assert_eq!(state.genesis_timestamp, 1_699_740_800);
    }

    #[test]
    fn descending_sequence_of_n_calls() {
        let n = 30;
        let mut state = enabled(SUBSEQUENT_BLOCKS);
        let dates = state.backdate(std::iter::repeat_n(1, n));
        let expected: Vec<i64> = (0..n as i64).map(|i| T - i * ONE_DAY_SECS).collect();
        assert_eq!(dates, expected);
    }

    #[test]
    fn empty_blocks_repeat_the_last_date() {
        let mut state = enabled(SUBSEQUENT_BLOCKS);
        assert_eq!(state.backdate([0, 0, 2, 0, 1]), vec![T, T, T, T - ONE_DAY_SECS, T - ONE_DAY_SECS]);
        assert_eq!(state.genesis_timestamp, T - 2 * ONE_DAY_SECS);
    }

    #[test]
    fn iterator_never_regresses() {
        let mut state = enabled(FIRST_BLOCK);
        state.change_genesis_timestamp_at(1, 10);
        for count in [0, 1, 0, 7] {
            state.change_genesis_timestamp_at(count, 10);
            assert_eq!(state.iterator, SUBSEQUENT_BLOCKS);
        }
    }

    #[test]
    fn negative_timestamps_are_not_guarded() {
        let mut state = SeedState { seed: true, iterator: SUBSEQUENT_BLOCKS, genesis_timestamp: 0 };
        assert_eq!(state.change_genesis_timestamp(1), 0);
        assert_eq!(state.change_genesis_timestamp(1), -ONE_DAY_SECS);
    }

    #[test]
    fn stepping_back_saturates_at_minimum() {
        let floor = i64::MIN + 10;
        let mut state = SeedState { seed: true, iterator: SUBSEQUENT_BLOCKS, genesis_timestamp: floor };
        assert_eq!(state.change_genesis_timestamp_at(1, T), floor);
        assert_eq!(state.genesis_timestamp, i64::MIN);
        assert_eq!(state.change_genesis_timestamp_at(1, T), i64::MIN);
        assert_eq!(state.genesis_timestamp, i64::MIN);
    }

    #[test]
    fn deserializes_config_section() {
        let state: SeedState =
            serde_json::from_str(r#"{"seed": true, "genesis_timestamp": 1700000000}"#).unwrap();
        assert_eq!(state, SeedState::new(true, T));
        assert_eq!(serde_json::from_str::<SeedState>("{}").unwrap(), SeedState::default());
    }
}
