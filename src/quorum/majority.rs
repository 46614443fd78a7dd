// Copyright 2020 TiKV Project Authors. Licensed under Apache-2.0.

use crate::membership::ReplSetConfig;
use crate::tracker::ProgressState;
use crate::LogPosition;

/// Returns true if `w` members, the primary included, have reached
/// `position`.
///
/// The primary always holds its own writes, so only `w - 1` replicas need
/// to be found. Any `w <= 1` is satisfied by the primary alone.
pub fn replicated_to(state: &ProgressState, position: LogPosition, w: i64) -> bool {
    if w <= 1 {
        return true;
    }
    state.count_reached(position) >= (w - 1) as usize
}

/// Returns true if a majority of the voting members has reached `position`.
pub fn replicated_to_majority(
    state: &ProgressState,
    position: LogPosition,
    config: &ReplSetConfig,
) -> bool {
    replicated_to(state, position, config.majority() as i64)
}
