// Copyright 2020 TiKV Project Authors. Licensed under Apache-2.0.

use crate::tracker::ProgressTracker;
use crate::LogPosition;

impl ProgressTracker {
    /// Returns the hosts known to hold `position`.
    ///
    /// The local host comes first when the node is primary, followed by
    /// every tracked replica at or beyond `position` in registration id
    /// order.
    pub fn hosts_at(&self, position: LogPosition) -> Vec<String> {
        let mut hosts = vec![];
        if self.is_primary() {
            if let Some(me) = self.current_config().self_member() {
                hosts.push(me.host.clone());
            }
        }

        let mut reached: Vec<(u64, String)> = self
            .lock_state()
            .progress()
            .values()
            .filter(|pr| pr.reached(position))
            .map(|pr| (pr.identity.rid(), pr.identity.host().to_owned()))
            .collect();
        reached.sort_unstable();
        hosts.extend(reached.into_iter().map(|(_, host)| host));
        hosts
    }
}
