// Copyright 2020 TiKV Project Authors. Licensed under Apache-2.0.

use std::fmt::{self, Debug, Display, Formatter};

use serde::{Deserialize, Serialize};

/// LogPosition is a point in the primary's replicated operation log.
///
/// Positions are totally ordered by `secs` first and `inc` second; no other
/// arithmetic is defined on them.
#[derive(
    Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct LogPosition {
    secs: u32,
    inc: u32,
}

impl LogPosition {
    /// Creates a position from its two components.
    #[inline]
    pub const fn new(secs: u32, inc: u32) -> LogPosition {
        LogPosition { secs, inc }
    }

    #[inline]
    pub fn secs(&self) -> u32 {
        self.secs
    }

    #[inline]
    pub fn inc(&self) -> u32 {
        self.inc
    }
}

impl From<u64> for LogPosition {
    /// Splits a packed position, seconds in the high half.
    fn from(packed: u64) -> LogPosition {
        LogPosition {
            secs: (packed >> 32) as u32,
            inc: packed as u32,
        }
    }
}

impl Display for LogPosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({}, {})", self.secs, self.inc)
    }
}

impl Debug for LogPosition {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}
