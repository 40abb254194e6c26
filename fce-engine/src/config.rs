//! Numeric defaults the spec hard-codes, and the knobs a caller may override.
//! Mirrors how `wallet/src/config.rs` keeps its constants as top-level
//! `pub const`s alongside a config struct.

use std::time::Duration;

pub const LOCK_FC_TIMEOUT_ROUNDS: u64 = 10;
pub const TRANSFER_FC_TIMEOUT_ROUNDS: u64 = 10;
pub const ADD_FC_TIMEOUT_ROUNDS: u64 = 10;
pub const RECLAIM_LEG_TIMEOUT_ROUNDS: u64 = 10;
pub const LATEST_ADDITION_TIME_WINDOW: u64 = 65536;
pub const DEFAULT_DC_TIMEOUT_ROUNDS: u64 = 10;
pub const DEFAULT_MAX_BILLS_PER_DC: usize = 10;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// `MinAddFeeAmount(max_fee) = 2 * max_fee + 1` (spec §4.C).
pub fn min_add_fee_amount(max_fee: u64) -> u64 {
    2 * max_fee + 1
}

/// Tunables for one engine instance. `max_fee` is the ceiling passed to every
/// order this engine builds; the timeout fields are in partition rounds, not
/// wall-clock time (spec §5: the engine schedules by round number only).
#[derive(Debug, Clone)]
pub struct FeeCreditConfig {
    pub max_fee: u64,
    pub lock_fc_timeout_rounds: u64,
    pub transfer_fc_timeout_rounds: u64,
    pub add_fc_timeout_rounds: u64,
    pub reclaim_leg_timeout_rounds: u64,
    pub latest_addition_time_window: u64,
    pub dc_timeout_rounds: u64,
    pub max_bills_per_dc: usize,
    pub poll_interval: Duration,
}

impl FeeCreditConfig {
    pub fn new(max_fee: u64) -> Self {
        Self {
            max_fee,
            lock_fc_timeout_rounds: LOCK_FC_TIMEOUT_ROUNDS,
            transfer_fc_timeout_rounds: TRANSFER_FC_TIMEOUT_ROUNDS,
            add_fc_timeout_rounds: ADD_FC_TIMEOUT_ROUNDS,
            reclaim_leg_timeout_rounds: RECLAIM_LEG_TIMEOUT_ROUNDS,
            latest_addition_time_window: LATEST_ADDITION_TIME_WINDOW,
            dc_timeout_rounds: DEFAULT_DC_TIMEOUT_ROUNDS,
            max_bills_per_dc: DEFAULT_MAX_BILLS_PER_DC,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn min_add_fee_amount(&self) -> u64 {
        min_add_fee_amount(self.max_fee)
    }
}
