// Copyright 2020 TiKV Project Authors. Licensed under Apache-2.0.

use std::time::Duration;

use crate::errors::{Error, Result};

/// The member id that is never assigned to a replica set member.
pub const INVALID_ID: u64 = 0;

/// Config contains the parameters to start a progress tracker.
#[derive(Clone, Debug)]
pub struct Config {
    /// The identity of the local member. It cannot be 0.
    pub id: u64,

    /// Keeps a per-rule watermark of the highest position at which each
    /// tag rule was last known to hold, so repeated waits on older
    /// positions skip the full evaluation.
    pub rule_cache: bool,

    /// The deadline applied to a write concern wait that carries no
    /// `wtimeout` of its own. `None` waits until satisfied or stepdown.
    pub default_wtimeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            id: 0,
            rule_cache: true,
            default_wtimeout: None,
        }
    }
}

impl Config {
    /// Creates a new config.
    pub fn new(id: u64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Runs validations against the config.
    pub fn validate(&self) -> Result<()> {
        if self.id == INVALID_ID {
            return Err(Error::ConfigInvalid("invalid node id".to_owned()));
        }

        if let Some(timeout) = self.default_wtimeout {
            if timeout == Duration::from_millis(0) {
                return Err(Error::ConfigInvalid(
                    "default wtimeout must be greater than 0, use None to wait forever".to_owned(),
                ));
            }
        }

        Ok(())
    }
}
