// Copyright 2020 TiKV Project Authors. Licensed under Apache-2.0.

use std::time::{Duration, Instant};

/// A monotonic time source for wait deadlines.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// The process monotonic clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Turns a relative timeout into an absolute deadline. A timeout too large
/// to represent has no deadline at all.
#[inline]
pub fn deadline_after(clock: &dyn Clock, timeout: Duration) -> Option<Instant> {
    clock.now().checked_add(timeout)
}
