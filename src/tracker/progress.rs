// Copyright 2020 TiKV Project Authors. Licensed under Apache-2.0.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use getset::Getters;

use crate::{HashMap, LogPosition};

/// Identifies one replica's progress-reporting session.
///
/// `rid` is assigned when the replica registers and is the only field that
/// takes part in equality, ordering and hashing. The member id and host are
/// the member configuration that was valid at registration time.
#[derive(Clone, Debug)]
pub struct ReplicaIdentity {
    rid: u64,
    member_id: u64,
    host: String,
}

impl ReplicaIdentity {
    pub fn new(rid: u64, member_id: u64, host: impl Into<String>) -> ReplicaIdentity {
        ReplicaIdentity {
            rid,
            member_id,
            host: host.into(),
        }
    }

    #[inline]
    pub fn rid(&self) -> u64 {
        self.rid
    }

    #[inline]
    pub fn member_id(&self) -> u64 {
        self.member_id
    }

    #[inline]
    pub fn host(&self) -> &str {
        &self.host
    }
}

impl PartialEq for ReplicaIdentity {
    fn eq(&self, other: &ReplicaIdentity) -> bool {
        self.rid == other.rid
    }
}

impl Eq for ReplicaIdentity {}

impl PartialOrd for ReplicaIdentity {
    fn partial_cmp(&self, other: &ReplicaIdentity) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ReplicaIdentity {
    fn cmp(&self, other: &ReplicaIdentity) -> Ordering {
        self.rid.cmp(&other.rid)
    }
}

impl Hash for ReplicaIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rid.hash(state);
    }
}

/// The replicated position last acknowledged by one replica.
#[derive(Clone, Debug, PartialEq)]
pub struct Progress {
    pub identity: ReplicaIdentity,
    pub position: LogPosition,
}

impl Progress {
    pub fn new(identity: ReplicaIdentity, position: LogPosition) -> Progress {
        Progress { identity, position }
    }

    /// Moves the position forward. Returns false if `position` is not newer.
    pub fn maybe_update(&mut self, position: LogPosition) -> bool {
        if position <= self.position {
            return false;
        }
        self.position = position;
        true
    }

    #[inline]
    pub fn reached(&self, position: LogPosition) -> bool {
        self.position >= position
    }
}

/// `ProgressMap` is a map of replica `rid` to its progress.
pub type ProgressMap = HashMap<u64, Progress>;

/// Everything the tracker guards with its lock.
#[derive(Clone, Debug, Default, Getters)]
pub struct ProgressState {
    #[get = "pub"]
    progress: ProgressMap,
    /// Highest position each tag rule is known to hold at.
    #[get = "pub"]
    rule_watermarks: HashMap<String, LogPosition>,
}

impl ProgressState {
    /// Stores `position` for `identity` unless an equal or newer one is
    /// already stored. Returns true if the map changed.
    pub fn advance(&mut self, identity: &ReplicaIdentity, position: LogPosition) -> bool {
        match self.progress.get_mut(&identity.rid()) {
            Some(pr) => pr.maybe_update(position),
            None => {
                self.progress
                    .insert(identity.rid(), Progress::new(identity.clone(), position));
                true
            }
        }
    }

    /// Returns the stored position of a replica.
    pub fn position_of(&self, rid: u64) -> Option<LogPosition> {
        self.progress.get(&rid).map(|pr| pr.position)
    }

    /// Number of replicas at or beyond `position`.
    pub fn count_reached(&self, position: LogPosition) -> usize {
        self.progress
            .values()
            .filter(|pr| pr.reached(position))
            .count()
    }

    pub fn watermark(&self, rule: &str) -> Option<LogPosition> {
        self.rule_watermarks.get(rule).cloned()
    }

    /// Raises the watermark of `rule`. Never lowers it.
    pub fn raise_watermark(&mut self, rule: &str, position: LogPosition) -> bool {
        match self.rule_watermarks.get_mut(rule) {
            Some(mark) if *mark >= position => false,
            Some(mark) => {
                *mark = position;
                true
            }
            None => {
                self.rule_watermarks.insert(rule.to_owned(), position);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.progress.len()
    }

    pub fn is_empty(&self) -> bool {
        self.progress.is_empty()
    }

    pub fn clear(&mut self) {
        self.progress.clear();
        self.rule_watermarks.clear();
    }
}
