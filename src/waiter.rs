// Copyright 2020 TiKV Project Authors. Licensed under Apache-2.0.

use std::fmt::{self, Display, Formatter};
use std::sync::PoisonError;
use std::time::{Duration, Instant};

use crate::errors::Result;
use crate::quorum::{WriteConcern, WriteConcernOptions};
use crate::tracker::ProgressTracker;
use crate::util::deadline_after;
use crate::LogPosition;

/// The outcome of waiting for a write concern. Timing out is not an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Enough replicas acknowledged the position.
    Satisfied,
    /// The deadline passed first.
    TimedOut,
}

impl Display for WaitOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl ProgressTracker {
    /// Blocks until `position` satisfies `wc` or `timeout` elapses.
    ///
    /// Fails with `NotPrimary` if the node is not a replicated primary on
    /// entry or at any wakeup, and with `UnknownWriteConcern` for an
    /// undefined tag rule.
    pub fn wait_until(
        &self,
        position: LogPosition,
        wc: &WriteConcern,
        timeout: Duration,
    ) -> Result<WaitOutcome> {
        let deadline = deadline_after(self.clock.as_ref(), timeout);
        self.wait_deadline(position, wc, deadline)
    }

    /// Blocks until `position` satisfies the request's write concern.
    ///
    /// The request's `wtimeout` is used if present, else the tracker's
    /// default. Without either the wait only ends on satisfaction or
    /// stepdown.
    pub fn wait_for_write_concern(
        &self,
        position: LogPosition,
        opts: &WriteConcernOptions,
    ) -> Result<WaitOutcome> {
        let deadline = opts
            .wtimeout
            .or(self.default_wtimeout)
            .and_then(|timeout| deadline_after(self.clock.as_ref(), timeout));
        self.wait_deadline(position, &opts.w, deadline)
    }

    fn wait_deadline(
        &self,
        position: LogPosition,
        wc: &WriteConcern,
        deadline: Option<Instant>,
    ) -> Result<WaitOutcome> {
        const OP: &str = "wait_until";
        self.check_primary(OP)?;

        let mut state = self.lock_state();
        let mut expired = false;
        loop {
            // Role first: a stepdown wins over progress reported after it.
            if let Err(e) = self.check_primary(OP) {
                info!(
                    self.logger,
                    "stopped waiting for replication, no longer primary";
                    "position" => %position,
                    "w" => %wc,
                );
                return Err(e);
            }
            let config = self.current_config();
            if self.evaluate(position, wc, &state, &config)? {
                return Ok(WaitOutcome::Satisfied);
            }
            if expired {
                debug!(
                    self.logger,
                    "timed out waiting for replication";
                    "position" => %position,
                    "w" => %wc,
                    "replicas" => state.len(),
                );
                return Ok(WaitOutcome::TimedOut);
            }

            state = match deadline {
                None => self
                    .replicated()
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner),
                Some(deadline) => {
                    let now = self.clock.now();
                    if now >= deadline {
                        expired = true;
                        continue;
                    }
                    let (guard, res) = self
                        .replicated()
                        .wait_timeout(state, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner);
                    expired = res.timed_out();
                    guard
                }
            };
        }
    }
}
