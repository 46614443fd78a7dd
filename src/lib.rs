// Copyright 2020 TiKV Project Authors. Licensed under Apache-2.0.

/*!

## Write concern tracking

On a replicated primary, every replica reports how far it has applied the
primary's operation log. Client writes ask for a durability level, the
*write concern*, before they are acknowledged: a number of members, a
majority of the voting members, or a named rule over member tags.

This crate keeps the reported progress and answers, for a given log
position, whether a write concern holds, optionally blocking until it does.

## Creating a tracker

A [`ProgressTracker`] is created when the node becomes primary. It reads the
replica set configuration and the node's role through the
[`ConfigSnapshotProvider`] and [`RoleProvider`] traits.

```rust
use std::sync::Arc;
use std::time::Duration;
use write_concern::{
    default_logger, AtomicRole, Config, ConfigCell, LogPosition, MemberConfig, ProgressTracker,
    ReplSetConfig, ReplicaIdentity, WaitOutcome, WriteConcern,
};

let members = vec![
    MemberConfig::new(1, "p:27017"),
    MemberConfig::new(2, "s1:27017"),
    MemberConfig::new(3, "s2:27017"),
];
let config = Arc::new(ConfigCell::new(ReplSetConfig::new(1, 1, members)));
let role = Arc::new(AtomicRole::new(true));
let tracker = ProgressTracker::new(&Config::new(1), config, role, &default_logger()).unwrap();

let op = LogPosition::new(10, 0);
assert_eq!(tracker.satisfied(op, &WriteConcern::Majority), Ok(false));

// A replication reporter records progress.
tracker.record(&ReplicaIdentity::new(42, 2, "s1:27017"), op);

let outcome = tracker
    .wait_until(op, &WriteConcern::Majority, Duration::from_secs(1))
    .unwrap();
assert_eq!(outcome, WaitOutcome::Satisfied);
assert_eq!(tracker.hosts_at(op), vec!["p:27017", "s1:27017"]);
```

## Write concerns from requests

Requests carry the write concern loosely typed. It is parsed once:

```rust
use serde_json::json;
use write_concern::{WriteConcern, WriteConcernOptions};

let opts = WriteConcernOptions::from_json(&json!({ "w": "majority", "wtimeout": 500 })).unwrap();
assert_eq!(opts.w, WriteConcern::Majority);
assert!(WriteConcern::parse(&json!(true)).is_err());
```

*/

#![deny(clippy::all)]

#[cfg(feature = "failpoints")]
#[macro_use]
extern crate fail;
#[macro_use]
extern crate quick_error;
#[macro_use]
extern crate slog;

mod config;
mod errors;
mod hosts;
mod log_position;
pub mod membership;
pub mod quorum;
mod tracker;
pub mod util;
mod waiter;

pub use self::config::{Config, INVALID_ID};
pub use self::errors::{Error, Result};
pub use self::log_position::LogPosition;
pub use self::membership::{
    AtomicRole, ConfigCell, ConfigSnapshotProvider, MemberConfig, ReplSetConfig, RoleProvider,
    TagClause, TagRule,
};
pub use self::quorum::{WriteConcern, WriteConcernOptions};
pub use self::tracker::{Progress, ProgressMap, ProgressState, ProgressTracker, ReplicaIdentity};
pub use self::util::{Clock, MonotonicClock};
pub use self::waiter::WaitOutcome;

pub mod prelude {
    //! A "prelude" for crates using the `write-concern` crate.
    //!
    //! ```
    //! use write_concern::prelude::*;
    //! ```

    pub use crate::config::Config;
    pub use crate::log_position::LogPosition;
    pub use crate::membership::{ConfigSnapshotProvider, RoleProvider};
    pub use crate::quorum::{WriteConcern, WriteConcernOptions};
    pub use crate::tracker::{ProgressTracker, ReplicaIdentity};
    pub use crate::waiter::WaitOutcome;
}

/// A terminal logger for tests and embedders without a drain of their own.
///
/// The root is built once; `RUST_LOG` filters it. Loggers handed out on a
/// test thread carry the test case name.
#[cfg(any(test, feature = "default-logger"))]
pub fn default_logger() -> slog::Logger {
    use slog::Drain;
    use std::sync::{Mutex, OnceLock};

    static LOGGER: OnceLock<slog::Logger> = OnceLock::new();

    let logger = LOGGER.get_or_init(|| {
        let decorator = slog_term::TermDecorator::new().build();
        let drain = slog_term::CompactFormat::new(decorator).build();
        let drain = slog_envlogger::new(drain);
        slog::Logger::root(Mutex::new(drain).fuse(), o!())
    });
    if let Some(case) = std::thread::current()
        .name()
        .and_then(|v| v.split(':').last())
    {
        logger.new(o!("case" => case.to_string()))
    } else {
        logger.new(o!())
    }
}

type DefaultHashBuilder = std::hash::BuildHasherDefault<fxhash::FxHasher>;
/// The hash map used for member tags and tracked progress.
pub type HashMap<K, V> = std::collections::HashMap<K, V, DefaultHashBuilder>;
/// The hash set used when counting distinct tag values.
pub type HashSet<K> = std::collections::HashSet<K, DefaultHashBuilder>;
