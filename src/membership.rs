// Copyright 2020 TiKV Project Authors. Licensed under Apache-2.0.

//! The view of the replica set that the tracker reads but never owns.
//!
//! Membership, voting and tag rules are maintained by the replication
//! subsystem. The tracker only asks for the current snapshot through
//! [`ConfigSnapshotProvider`] and for the node's role through
//! [`RoleProvider`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use getset::Getters;
use serde::{Deserialize, Serialize};

use crate::HashMap;

/// The configuration of a single replica set member.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MemberConfig {
    /// Numeric member id, unique within the set.
    pub id: u64,
    /// The `host:port` the member is reachable at.
    pub host: String,
    /// Number of votes, 0 for non-voting members.
    #[serde(default = "default_votes")]
    pub votes: u32,
    /// Arbiters vote but hold no data.
    #[serde(default)]
    pub arbiter_only: bool,
    /// Tag key/value pairs used by tag rules.
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

fn default_votes() -> u32 {
    1
}

impl MemberConfig {
    pub fn new(id: u64, host: impl Into<String>) -> MemberConfig {
        MemberConfig {
            id,
            host: host.into(),
            votes: 1,
            ..Default::default()
        }
    }

    /// Adds a tag, builder style.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> MemberConfig {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn is_voter(&self) -> bool {
        self.votes > 0
    }
}

/// One group requirement of a tag rule: acknowledgments from members
/// carrying at least `required` distinct values of `tag`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TagClause {
    pub tag: String,
    pub required: usize,
}

/// A named quorum rule over tag groups. Every clause must hold.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TagRule {
    pub name: String,
    pub clauses: Vec<TagClause>,
}

impl TagRule {
    pub fn new(name: impl Into<String>) -> TagRule {
        TagRule {
            name: name.into(),
            clauses: vec![],
        }
    }

    /// Adds a clause, builder style.
    pub fn require(mut self, tag: impl Into<String>, required: usize) -> TagRule {
        self.clauses.push(TagClause {
            tag: tag.into(),
            required,
        });
        self
    }

    /// Returns true if any clause counts the given member.
    pub fn concerns(&self, member: &MemberConfig) -> bool {
        self.clauses
            .iter()
            .any(|c| member.tags.contains_key(&c.tag))
    }
}

/// A point-in-time replica set configuration.
#[derive(Clone, Debug, Default, Getters)]
pub struct ReplSetConfig {
    /// The configuration version.
    #[get = "pub"]
    version: u64,
    /// The member id of the local node.
    #[get = "pub"]
    self_id: u64,
    #[get = "pub"]
    members: Vec<MemberConfig>,
    #[get = "pub"]
    rules: HashMap<String, TagRule>,
}

impl ReplSetConfig {
    pub fn new(version: u64, self_id: u64, members: Vec<MemberConfig>) -> ReplSetConfig {
        ReplSetConfig {
            version,
            self_id,
            members,
            rules: HashMap::default(),
        }
    }

    /// Adds a named tag rule, builder style.
    pub fn with_rule(mut self, rule: TagRule) -> ReplSetConfig {
        self.rules.insert(rule.name.clone(), rule);
        self
    }

    /// Looks up a member by id.
    pub fn member(&self, id: u64) -> Option<&MemberConfig> {
        self.members.iter().find(|m| m.id == id)
    }

    /// The configuration of the local node, if it is a member.
    pub fn self_member(&self) -> Option<&MemberConfig> {
        self.member(self.self_id)
    }

    pub fn rule(&self, name: &str) -> Option<&TagRule> {
        self.rules.get(name)
    }

    /// Number of members with at least one vote, arbiters included.
    pub fn voting_members(&self) -> usize {
        self.members.iter().filter(|m| m.is_voter()).count()
    }

    /// The acknowledgment count of a majority write.
    ///
    /// The whole set of voters is used, arbiters included, so a write is
    /// never reported durable on a majority of the set without a majority
    /// of voters.
    pub fn majority(&self) -> usize {
        self.voting_members() / 2 + 1
    }
}

/// Supplies the current replica set configuration.
pub trait ConfigSnapshotProvider: Send + Sync {
    fn current(&self) -> Arc<ReplSetConfig>;
}

/// Reports the role of the local node.
pub trait RoleProvider: Send + Sync {
    fn is_primary(&self) -> bool;

    fn is_replicated_mode(&self) -> bool;

    /// Write concern checks are only meaningful on a replicated primary.
    fn can_accept_writes(&self) -> bool {
        self.is_replicated_mode() && self.is_primary()
    }
}

/// A configuration slot replaced wholesale on reconfiguration.
#[derive(Debug, Default)]
pub struct ConfigCell {
    inner: RwLock<Arc<ReplSetConfig>>,
}

impl ConfigCell {
    pub fn new(config: ReplSetConfig) -> ConfigCell {
        ConfigCell {
            inner: RwLock::new(Arc::new(config)),
        }
    }

    /// Installs a new configuration. Callers are expected to reset the
    /// tracker afterwards.
    pub fn install(&self, config: ReplSetConfig) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(config);
    }
}

impl ConfigSnapshotProvider for ConfigCell {
    fn current(&self) -> Arc<ReplSetConfig> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// A role flag flipped by the replication subsystem on election and stepdown.
#[derive(Debug)]
pub struct AtomicRole {
    primary: AtomicBool,
    replicated: AtomicBool,
}

impl AtomicRole {
    /// Creates a role in replicated mode.
    pub fn new(primary: bool) -> AtomicRole {
        AtomicRole {
            primary: AtomicBool::new(primary),
            replicated: AtomicBool::new(true),
        }
    }

    pub fn set_primary(&self, primary: bool) {
        self.primary.store(primary, Ordering::SeqCst);
    }

    pub fn set_replicated_mode(&self, replicated: bool) {
        self.replicated.store(replicated, Ordering::SeqCst);
    }
}

impl RoleProvider for AtomicRole {
    fn is_primary(&self) -> bool {
        self.primary.load(Ordering::SeqCst)
    }

    fn is_replicated_mode(&self) -> bool {
        self.replicated.load(Ordering::SeqCst)
    }
}
