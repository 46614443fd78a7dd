// Copyright 2020 TiKV Project Authors. Licensed under Apache-2.0.

use std::time::Duration;

use harness::{host_of, Cluster, PRIMARY_ID};
use write_concern::{
    default_logger, ConfigSnapshotProvider, Error, LogPosition, MemberConfig, ReplSetConfig,
    TagRule, WaitOutcome, WriteConcern,
};

fn pos(secs: u32) -> LogPosition {
    LogPosition::new(secs, 0)
}

fn rule(name: &str) -> WriteConcern {
    WriteConcern::Tagged(name.to_owned())
}

#[test]
fn test_tag_rules() {
    // Members: 1 (ny, a) primary, 2 (ny, b), 3 (sf, c), 4 (sf, d), 5 (sf, c).
    let mut test_cases = vec![
        // (reports, rule, expected at 10)
        (vec![], "multiDC", false),
        (vec![(2, 10)], "multiDC", false),
        (vec![(3, 9)], "multiDC", false),
        (vec![(3, 10)], "multiDC", true),
        (vec![(5, 11)], "multiDC", true),
        (vec![(3, 10)], "threeRacks", false),
        // Same rack twice is one rack.
        (vec![(3, 10), (5, 10)], "threeRacks", false),
        (vec![(3, 10), (4, 10)], "threeRacks", true),
        (vec![(2, 10), (5, 10)], "threeRacks", true),
    ];

    for (i, (reports, name, expected)) in test_cases.drain(..).enumerate() {
        let cluster = Cluster::tagged(&default_logger());
        for (member, p) in &reports {
            assert!(cluster.report(*member, pos(*p)));
        }
        assert_eq!(
            cluster.tracker.satisfied(pos(10), &rule(name)),
            Ok(expected),
            "[test_cases #{}] {} with {:?}",
            i + 1,
            name,
            reports
        );
    }
}

#[test]
fn test_unknown_rule() {
    let cluster = Cluster::tagged(&default_logger());
    assert_eq!(
        cluster.tracker.satisfied(pos(1), &rule("dc1")),
        Err(Error::UnknownWriteConcern("dc1".to_owned()))
    );
    assert_eq!(
        cluster
            .tracker
            .wait_until(pos(1), &rule("dc1"), Duration::from_millis(10)),
        Err(Error::UnknownWriteConcern("dc1".to_owned()))
    );
}

#[test]
fn test_rule_watermark_follows_reports() {
    let cluster = Cluster::tagged(&default_logger());
    cluster.report(3, pos(7));
    cluster.report(2, pos(12));
    let snap = cluster.tracker.snapshot();
    assert_eq!(snap.watermark("multiDC"), Some(pos(7)));
    assert_eq!(snap.watermark("threeRacks"), Some(pos(7)));

    cluster.report(4, pos(12));
    let snap = cluster.tracker.snapshot();
    assert_eq!(snap.watermark("multiDC"), Some(pos(12)));
    assert_eq!(snap.watermark("threeRacks"), Some(pos(12)));

    assert_eq!(cluster.tracker.satisfied(pos(12), &rule("multiDC")), Ok(true));
    assert_eq!(cluster.tracker.satisfied(pos(13), &rule("multiDC")), Ok(false));
}

#[test]
fn test_removed_member_reports() {
    let cluster = Cluster::tagged(&default_logger());

    // Member 3 is dropped from the configuration while its reporter is
    // still connected.
    let members = cluster
        .config
        .current()
        .members()
        .iter()
        .filter(|m| m.id != 3)
        .cloned()
        .collect();
    cluster.reconfigure(
        ReplSetConfig::new(2, PRIMARY_ID, members)
            .with_rule(TagRule::new("multiDC").require("dc", 2)),
    );

    // Progress is kept but reported as unresolved, and tags of a removed
    // member do not count.
    assert!(!cluster.report(3, pos(10)));
    assert_eq!(cluster.tracker.count(), 1);
    assert_eq!(
        cluster.tracker.satisfied(pos(10), &WriteConcern::Threshold(2)),
        Ok(true)
    );
    assert_eq!(cluster.tracker.satisfied(pos(10), &rule("multiDC")), Ok(false));
    assert_eq!(cluster.tracker.hosts_at(pos(10)), vec![host_of(1), host_of(3)]);

    // A rule that is gone from the configuration is unknown.
    assert!(cluster.tracker.satisfied(pos(10), &rule("threeRacks")).is_err());
}

#[test]
fn test_wait_for_rule() {
    let cluster = Cluster::tagged(&default_logger());
    let h1 = cluster.report_later(2, pos(10), Duration::from_millis(10));
    let h2 = cluster.report_later(4, pos(10), Duration::from_millis(30));
    assert_eq!(
        cluster
            .tracker
            .wait_until(pos(10), &rule("multiDC"), Duration::from_secs(10)),
        Ok(WaitOutcome::Satisfied)
    );
    assert!(h1.join().unwrap());
    assert!(h2.join().unwrap());
}

#[test]
fn test_untagged_set_never_satisfies_rule() {
    let config = ReplSetConfig::new(
        1,
        PRIMARY_ID,
        vec![
            MemberConfig::new(PRIMARY_ID, host_of(PRIMARY_ID)),
            MemberConfig::new(2, host_of(2)),
        ],
    )
    .with_rule(TagRule::new("multiDC").require("dc", 2));
    let cluster = Cluster::with_config(config, &default_logger());
    cluster.report(2, pos(10));
    assert_eq!(
        cluster
            .tracker
            .wait_until(pos(10), &rule("multiDC"), Duration::from_millis(20)),
        Ok(WaitOutcome::TimedOut)
    );
}
