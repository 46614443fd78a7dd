// Copyright 2020 TiKV Project Authors. Licensed under Apache-2.0.

use crate::membership::{ReplSetConfig, TagClause, TagRule};
use crate::tracker::ProgressState;
use crate::{HashSet, LogPosition};

/// Returns true if every clause of `rule` holds at `position`.
///
/// The primary is counted as having reached every position. Progress of
/// replicas that are no longer in `config` is ignored.
pub fn holds(
    rule: &TagRule,
    position: LogPosition,
    state: &ProgressState,
    config: &ReplSetConfig,
) -> bool {
    rule.clauses
        .iter()
        .all(|clause| distinct_values(clause, position, state, config) >= clause.required)
}

/// Returns the greatest tracked position at which `rule` holds.
pub fn highest_satisfied(
    rule: &TagRule,
    state: &ProgressState,
    config: &ReplSetConfig,
) -> Option<LogPosition> {
    let mut candidates: Vec<LogPosition> =
        state.progress().values().map(|pr| pr.position).collect();
    candidates.sort_unstable_by(|a, b| b.cmp(a));
    candidates.dedup();
    candidates
        .into_iter()
        .find(|p| holds(rule, *p, state, config))
}

fn distinct_values(
    clause: &TagClause,
    position: LogPosition,
    state: &ProgressState,
    config: &ReplSetConfig,
) -> usize {
    let reached = state
        .progress()
        .values()
        .filter(|pr| pr.reached(position))
        .filter_map(|pr| config.member(pr.identity.member_id()));
    let values: HashSet<&str> = config
        .self_member()
        .into_iter()
        .chain(reached)
        .filter_map(|member| member.tags.get(&clause.tag))
        .map(String::as_str)
        .collect();
    values.len()
}
