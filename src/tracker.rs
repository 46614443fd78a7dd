// Copyright 2020 TiKV Project Authors. Licensed under Apache-2.0.

mod progress;

pub use self::progress::{Progress, ProgressMap, ProgressState, ReplicaIdentity};

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use slog::Logger;

use crate::config::Config;
use crate::errors::{Error, Result};
use crate::membership::{ConfigSnapshotProvider, ReplSetConfig, RoleProvider, TagRule};
use crate::quorum::{self, tag_rule, WriteConcern};
use crate::util::{Clock, MonotonicClock};
use crate::LogPosition;

/// ProgressTracker tracks how far each replica has replicated the primary's
/// log and answers whether a position satisfies a write concern.
///
/// One tracker exists per primary term. It is created when the node becomes
/// primary, shared by handle with replication reporters and client writes,
/// and reset on stepdown or reconfiguration. All state is guarded by a
/// single lock; every advancing report wakes all waiters, which then
/// re-check their own write concern.
pub struct ProgressTracker {
    state: Mutex<ProgressState>,
    replicated: Condvar,

    config: Arc<dyn ConfigSnapshotProvider>,
    role: Arc<dyn RoleProvider>,
    pub(crate) clock: Arc<dyn Clock>,

    rule_cache: bool,
    pub(crate) default_wtimeout: Option<Duration>,

    pub(crate) logger: Logger,
}

impl ProgressTracker {
    /// Creates a tracker that reads deadlines from the monotonic clock.
    pub fn new(
        c: &Config,
        config: Arc<dyn ConfigSnapshotProvider>,
        role: Arc<dyn RoleProvider>,
        logger: &Logger,
    ) -> Result<ProgressTracker> {
        Self::with_clock(c, config, role, Arc::new(MonotonicClock), logger)
    }

    /// Creates a tracker with an explicit clock.
    pub fn with_clock(
        c: &Config,
        config: Arc<dyn ConfigSnapshotProvider>,
        role: Arc<dyn RoleProvider>,
        clock: Arc<dyn Clock>,
        logger: &Logger,
    ) -> Result<ProgressTracker> {
        c.validate()?;
        Ok(ProgressTracker {
            state: Mutex::new(ProgressState::default()),
            replicated: Condvar::new(),
            config,
            role,
            clock,
            rule_cache: c.rule_cache,
            default_wtimeout: c.default_wtimeout,
            logger: logger.new(o!("tracker" => c.id)),
        })
    }

    /// Records that `identity` has replicated up to `position`.
    ///
    /// A position at or behind the stored one is ignored. Returns false only
    /// if the node is primary and the reporting member is missing from the
    /// current configuration; the progress is stored and waiters are woken
    /// regardless, only the tag rule watermarks are left untouched.
    pub fn record(&self, identity: &ReplicaIdentity, position: LogPosition) -> bool {
        let mut state = self.lock_state();
        if !state.advance(identity, position) {
            return true;
        }
        debug!(
            self.logger,
            "replica progressed";
            "rid" => identity.rid(),
            "member" => identity.member_id(),
            "position" => %position,
        );

        let mut resolved = true;
        if self.role.is_primary() {
            let config = self.config.current();
            match config.member(identity.member_id()) {
                Some(member) => {
                    if self.rule_cache {
                        let rules = config.rules().values().filter(|r| r.concerns(member));
                        for rule in rules {
                            refresh_watermark(&mut state, rule, &config);
                        }
                    }
                }
                None => {
                    warn!(
                        self.logger,
                        "member of reporting replica is not in the configuration";
                        "rid" => identity.rid(),
                        "member" => identity.member_id(),
                        "config_version" => *config.version(),
                    );
                    resolved = false;
                }
            }
        }

        #[cfg(feature = "failpoints")]
        fail_point!("tracker_record_skip_notify", |_| resolved);

        self.replicated.notify_all();
        resolved
    }

    /// Forgets all tracked replicas and tag rule watermarks.
    ///
    /// Waiters are woken so that a reset on stepdown ends them promptly.
    pub fn reset(&self) {
        let mut state = self.lock_state();
        let dropped = state.len();
        state.clear();
        info!(self.logger, "progress reset"; "dropped" => dropped);
        self.replicated.notify_all();
    }

    /// Number of replicas being tracked.
    pub fn count(&self) -> usize {
        self.lock_state().len()
    }

    /// A point-in-time copy of the tracked progress.
    pub fn snapshot(&self) -> ProgressState {
        self.lock_state().clone()
    }

    /// Returns true if `position` is replicated as `wc` requires. Fails with
    /// `NotPrimary` unless the node is a replicated primary.
    pub fn satisfied(&self, position: LogPosition, wc: &WriteConcern) -> Result<bool> {
        self.check_primary("satisfied")?;
        let config = self.config.current();
        let state = self.lock_state();
        self.evaluate(position, wc, &state, &config)
    }

    pub(crate) fn evaluate(
        &self,
        position: LogPosition,
        wc: &WriteConcern,
        state: &ProgressState,
        config: &ReplSetConfig,
    ) -> Result<bool> {
        quorum::satisfied(position, wc, state, config, self.rule_cache)
    }

    pub(crate) fn check_primary(&self, op: &str) -> Result<()> {
        if self.role.can_accept_writes() {
            return Ok(());
        }
        Err(Error::NotPrimary(op.to_owned()))
    }

    pub(crate) fn is_primary(&self) -> bool {
        self.role.is_primary()
    }

    pub(crate) fn current_config(&self) -> Arc<ReplSetConfig> {
        self.config.current()
    }

    pub(crate) fn lock_state(&self) -> MutexGuard<'_, ProgressState> {
        // Every mutation leaves the state consistent, a panicking holder
        // cannot corrupt it.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn replicated(&self) -> &Condvar {
        &self.replicated
    }
}

fn refresh_watermark(
    state: &mut ProgressState,
    rule: &TagRule,
    config: &ReplSetConfig,
) {
    if let Some(position) = tag_rule::highest_satisfied(rule, state, config) {
        state.raise_watermark(&rule.name, position);
    }
}
