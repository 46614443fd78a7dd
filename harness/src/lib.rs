// Copyright 2020 TiKV Project Authors. Licensed under Apache-2.0.

/*!

This module contains various testing harness utilities for write concern.

> If you want to build write concern tracking without simulating a replica set, try `write-concern`.

A [`Cluster`] stands in for the replication subsystem around a primary: it
owns the replica set configuration and the role flag, registers secondaries
with a fresh rid as real reporters would, and forwards their progress to a
shared [`ProgressTracker`].

*/

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rand::seq::SliceRandom;
use slog::Logger;
use write_concern::{
    AtomicRole, Config, ConfigCell, LogPosition, MemberConfig, ProgressTracker, ReplSetConfig,
    ReplicaIdentity, TagRule,
};

/// The member id of the primary in every simulated set.
pub const PRIMARY_ID: u64 = 1;

/// Builds the host name of a simulated member.
pub fn host_of(id: u64) -> String {
    format!("n{}:27017", id)
}

/// A simulated replica set seen from its primary.
pub struct Cluster {
    pub tracker: Arc<ProgressTracker>,
    pub role: Arc<AtomicRole>,
    pub config: Arc<ConfigCell>,
    identities: Vec<ReplicaIdentity>,
}

impl Cluster {
    /// Creates a set of `size` voting members, member 1 being the primary.
    pub fn new(size: u64, logger: &Logger) -> Cluster {
        let members = (1..=size).map(|id| MemberConfig::new(id, host_of(id))).collect();
        Self::with_config(ReplSetConfig::new(1, PRIMARY_ID, members), logger)
    }

    /// Creates a set from an explicit configuration. Its `self_id` should be
    /// `PRIMARY_ID`.
    pub fn with_config(config: ReplSetConfig, logger: &Logger) -> Cluster {
        let identities = config
            .members()
            .iter()
            .filter(|m| m.id != PRIMARY_ID && !m.arbiter_only)
            .map(|m| ReplicaIdentity::new(1000 + m.id, m.id, m.host.clone()))
            .collect();
        let config = Arc::new(ConfigCell::new(config));
        let role = Arc::new(AtomicRole::new(true));
        let tracker = ProgressTracker::new(
            &Config::new(PRIMARY_ID),
            config.clone(),
            role.clone(),
            logger,
        )
        .expect("valid tracker config");
        Cluster {
            tracker: Arc::new(tracker),
            role,
            config,
            identities,
        }
    }

    /// Creates the set used by tag rule tests: a primary and four
    /// secondaries over two data centers, with rule `multiDC` requiring
    /// both data centers and rule `threeRacks` requiring three racks.
    pub fn tagged(logger: &Logger) -> Cluster {
        let tags = [("ny", "a"), ("ny", "b"), ("sf", "c"), ("sf", "d"), ("sf", "c")];
        let members = tags
            .iter()
            .enumerate()
            .map(|(i, (dc, rack))| {
                let id = i as u64 + 1;
                MemberConfig::new(id, host_of(id))
                    .with_tag("dc", *dc)
                    .with_tag("rack", *rack)
            })
            .collect();
        let config = ReplSetConfig::new(1, PRIMARY_ID, members)
            .with_rule(TagRule::new("multiDC").require("dc", 2))
            .with_rule(TagRule::new("threeRacks").require("rack", 3));
        Self::with_config(config, logger)
    }

    /// The registered identity of a secondary.
    pub fn identity(&self, member: u64) -> &ReplicaIdentity {
        self.identities
            .iter()
            .find(|id| id.member_id() == member)
            .unwrap_or_else(|| panic!("member {} is not a data bearing secondary", member))
    }

    /// Member ids of all data bearing secondaries.
    pub fn secondaries(&self) -> Vec<u64> {
        self.identities.iter().map(|id| id.member_id()).collect()
    }

    /// Reports the progress of a secondary.
    pub fn report(&self, member: u64, position: LogPosition) -> bool {
        self.tracker.record(self.identity(member), position)
    }

    /// Reports the progress of a secondary from another thread after `delay`.
    pub fn report_later(
        &self,
        member: u64,
        position: LogPosition,
        delay: Duration,
    ) -> JoinHandle<bool> {
        let tracker = self.tracker.clone();
        let identity = self.identity(member).clone();
        thread::spawn(move || {
            thread::sleep(delay);
            tracker.record(&identity, position)
        })
    }

    /// Reports `position` for every secondary, in random order, one thread
    /// per secondary.
    pub fn report_all_shuffled(&self, position: LogPosition) -> Vec<JoinHandle<bool>> {
        let mut members = self.secondaries();
        members.shuffle(&mut rand::thread_rng());
        members
            .into_iter()
            .enumerate()
            .map(|(i, m)| self.report_later(m, position, Duration::from_millis(5 * i as u64)))
            .collect()
    }

    /// Steps the primary down and drops all tracked progress.
    pub fn step_down(&self) {
        self.role.set_primary(false);
        self.tracker.reset();
    }

    /// Installs a new configuration and drops all tracked progress.
    pub fn reconfigure(&self, config: ReplSetConfig) {
        self.config.install(config);
        self.tracker.reset();
    }
}
