// Copyright 2020 TiKV Project Authors. Licensed under Apache-2.0.

use harness::{host_of, Cluster, PRIMARY_ID};
use write_concern::{
    default_logger, LogPosition, MemberConfig, ReplSetConfig, WriteConcern,
};

fn pos(secs: u32) -> LogPosition {
    LogPosition::new(secs, 0)
}

#[test]
fn test_numeric_threshold() {
    let mut test_cases = vec![
        // (set size, secondary positions, target, w, expected)

        // [1] w of 0 or 1 is the primary alone.
        (3, vec![], 10, 0, true),
        (3, vec![], 10, 1, true),
        // [2] One secondary behind.
        (3, vec![9], 10, 2, false),
        // [3] One secondary at the target.
        (3, vec![10], 10, 2, true),
        (3, vec![10], 10, 3, false),
        // [4] Both secondaries beyond the target.
        (3, vec![11, 12], 10, 3, true),
        // [5] Asking for more members than the set has never holds.
        (3, vec![20, 20], 10, 4, false),
        //
        // test_cases: 8
        // [6] Five members, mixed progress.
        (5, vec![10, 9, 10, 1], 10, 3, true),
        (5, vec![10, 9, 10, 1], 10, 4, false),
        (5, vec![10, 10, 10, 10], 10, 5, true),
    ];

    for (i, (size, positions, target, w, expected)) in test_cases.drain(..).enumerate() {
        let cluster = Cluster::new(size, &default_logger());
        for (member, p) in cluster.secondaries().into_iter().zip(positions.iter()) {
            cluster.report(member, pos(*p));
        }
        assert_eq!(
            cluster.tracker.satisfied(pos(target), &WriteConcern::Threshold(w)),
            Ok(expected),
            "[test_cases #{}] size {}, positions {:?}, w {}",
            i + 1,
            size,
            positions,
            w
        );
    }
}

#[test]
fn test_majority() {
    let mut test_cases = vec![
        // (set size, secondary positions, expected at 10)

        // [1] Single member set: the primary is a majority.
        (1, vec![], true),
        // [2] Three members need one secondary.
        (3, vec![], false),
        (3, vec![9, 9], false),
        (3, vec![10], true),
        (3, vec![0, 10], true),
        // [3] Four members need two secondaries.
        (4, vec![10], false),
        (4, vec![10, 10], true),
        // [4] Five members need two secondaries.
        (5, vec![10, 9, 9, 9], false),
        (5, vec![10, 9, 10, 9], true),
    ];

    for (i, (size, positions, expected)) in test_cases.drain(..).enumerate() {
        let cluster = Cluster::new(size, &default_logger());
        for (member, p) in cluster.secondaries().into_iter().zip(positions.iter()) {
            cluster.report(member, pos(*p));
        }
        assert_eq!(
            cluster.tracker.satisfied(pos(10), &WriteConcern::Majority),
            Ok(expected),
            "[test_cases #{}] size {}, positions {:?}",
            i + 1,
            size,
            positions
        );
    }
}

#[test]
fn test_majority_counts_every_voter() {
    // A primary, one secondary, one non-voting secondary and two arbiters.
    // Voters are the primary, the secondary and both arbiters: a majority
    // is three, so two data bearing members are not enough.
    let mut hidden = MemberConfig::new(3, host_of(3));
    hidden.votes = 0;
    let mut a1 = MemberConfig::new(4, host_of(4));
    a1.arbiter_only = true;
    let mut a2 = MemberConfig::new(5, host_of(5));
    a2.arbiter_only = true;
    let config = ReplSetConfig::new(
        1,
        PRIMARY_ID,
        vec![
            MemberConfig::new(PRIMARY_ID, host_of(PRIMARY_ID)),
            MemberConfig::new(2, host_of(2)),
            hidden,
            a1,
            a2,
        ],
    );
    assert_eq!(config.majority(), 3);

    let cluster = Cluster::with_config(config, &default_logger());
    cluster.report(2, pos(10));
    assert_eq!(
        cluster.tracker.satisfied(pos(10), &WriteConcern::Majority),
        Ok(false)
    );

    // The non-voting member's acknowledgment still counts toward the number.
    cluster.report(3, pos(10));
    assert_eq!(
        cluster.tracker.satisfied(pos(10), &WriteConcern::Majority),
        Ok(true)
    );
}

#[test]
fn test_monotonic_progress() {
    let cluster = Cluster::new(3, &default_logger());
    cluster.report(2, pos(10));
    cluster.report(2, pos(4));
    assert_eq!(
        cluster.tracker.snapshot().position_of(cluster.identity(2).rid()),
        Some(pos(10))
    );
    assert_eq!(
        cluster.tracker.satisfied(pos(10), &WriteConcern::Majority),
        Ok(true)
    );
}

#[test]
fn test_hosts_at() {
    let cluster = Cluster::new(3, &default_logger());
    cluster.report(2, pos(5));
    cluster.report(3, pos(3));
    assert_eq!(cluster.tracker.hosts_at(pos(4)), vec![host_of(1), host_of(2)]);
    assert_eq!(
        cluster.tracker.hosts_at(pos(3)),
        vec![host_of(1), host_of(2), host_of(3)]
    );
}

#[test]
fn test_reset_on_step_down() {
    let cluster = Cluster::new(3, &default_logger());
    cluster.report(2, pos(5));
    cluster.report(3, pos(5));
    assert_eq!(cluster.tracker.count(), 2);

    cluster.step_down();
    assert_eq!(cluster.tracker.count(), 0);
    assert!(cluster.tracker.hosts_at(pos(0)).is_empty());
    assert!(cluster
        .tracker
        .satisfied(pos(5), &WriteConcern::Majority)
        .is_err());

    // Elected again: progress is rebuilt from fresh reports.
    cluster.role.set_primary(true);
    assert_eq!(
        cluster.tracker.satisfied(pos(5), &WriteConcern::Majority),
        Ok(false)
    );
    cluster.report(3, pos(5));
    assert_eq!(
        cluster.tracker.satisfied(pos(5), &WriteConcern::Majority),
        Ok(true)
    );
}
