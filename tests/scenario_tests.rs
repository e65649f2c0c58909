//! Partition Verifier Scenarios
//!
//! End-to-end verdicts for small ACLs, including rule order sensitivity

use aclverify::acl::{AclRule, Action, Request, Scalar, Scalars};
use aclverify::ranges::{Range, RangeSet};
use aclverify::verifier::{verify, verify_batch, Governor, PartitionVerifier, TraceKind, Verdict};

fn set(ranges: &[(u32, u32)]) -> RangeSet {
    RangeSet::from_ranges(ranges.iter().map(|&(a, b)| Range::new(a, b).unwrap()))
}

fn any() -> RangeSet {
    RangeSet::full()
}

fn rule(name: &str, src: RangeSet, dst: RangeSet, action: Action) -> AclRule {
    AclRule::new(name, src, dst, action)
}

/// Scenario 1: a single rule covers the region with the expected action
#[test]
fn scenario_single_rule_consistent_passes() {
    let acl = vec![rule("L1", set(&[(10, 20)]), any(), Action::Permit)];
    let request = Request::new("R1", set(&[(10, 20)]), any(), Action::Permit);
    assert_eq!(verify(&acl, &request), Verdict::Pass);
}

/// Scenario 2: same ACL, opposite expectation
#[test]
fn scenario_single_rule_conflict_fails_at_rule() {
    let acl = vec![rule("L1", set(&[(10, 20)]), any(), Action::Permit)];
    let request = Request::new("R1", set(&[(10, 20)]), any(), Action::Deny);

    let verdict = verify(&acl, &request);
    let conflict = verdict.conflict().expect("expected a conflict");
    assert_eq!(conflict.governor, Governor::Rule { index: 0, name: "L1".into() });
    assert_eq!(conflict.piece.src, set(&[(10, 20)]));
    assert_eq!(conflict.expected, Action::Deny);
    assert_eq!(conflict.actual, Action::Permit);
}

/// Scenario 3: the offending region is the overlap, not the whole request
#[test]
fn scenario_earlier_deny_reports_overlap_only() {
    let acl = vec![
        rule("L1", set(&[(10, 20)]), any(), Action::Deny),
        rule("L2", any(), any(), Action::Permit),
    ];
    let request = Request::new("R1", set(&[(5, 25)]), any(), Action::Permit);

    let verdict = verify(&acl, &request);
    let conflict = verdict.conflict().expect("expected a conflict");
    assert_eq!(conflict.governor, Governor::Rule { index: 0, name: "L1".into() });
    assert_eq!(conflict.piece.src, set(&[(10, 20)]));
    assert!(conflict.piece.dst.is_full());
    assert_eq!(conflict.tag, "R1/hit");
}

/// Scenario 4: no rule matches, the default deny is what the caller expects
#[test]
fn scenario_default_deny_pass() {
    let acl = vec![rule("L1", set(&[(10, 20)]), any(), Action::Permit)];
    let request = Request::new("R1", set(&[(30, 40)]), any(), Action::Deny);
    assert_eq!(verify(&acl, &request), Verdict::Pass);
}

/// Scenario 5: empty ACL
#[test]
fn scenario_empty_acl() {
    let acl: Vec<AclRule> = Vec::new();

    let deny = Request::new("R1", set(&[(0, 1000)]), any(), Action::Deny);
    assert_eq!(verify(&acl, &deny), Verdict::Pass);

    let permit = Request::new("R2", set(&[(0, 1000)]), any(), Action::Permit);
    let verdict = verify(&acl, &permit);
    let conflict = verdict.conflict().expect("expected default-deny conflict");
    assert_eq!(conflict.governor, Governor::DefaultDeny);
    assert_eq!(conflict.actual, Action::Deny);
    assert_eq!(conflict.piece.src, set(&[(0, 1000)]));
}

#[test]
fn partially_covered_permit_fails_on_default_deny_remainder() {
    let acl = vec![rule("L1", set(&[(10, 20)]), any(), Action::Permit)];
    let request = Request::new("R1", set(&[(5, 25)]), any(), Action::Permit);

    let verdict = verify(&acl, &request);
    let conflict = verdict.conflict().expect("expected a conflict");
    assert_eq!(conflict.governor, Governor::DefaultDeny);
    // First surviving remainder is the low side
    assert_eq!(conflict.piece.src, set(&[(5, 9)]));
    assert_eq!(conflict.tag, "R1/rs");
}

#[test]
fn region_split_across_rules_passes() {
    let acl = vec![
        rule("L1", set(&[(0, 49)]), any(), Action::Permit),
        rule("L2", set(&[(50, 99)]), set(&[(0, 10)]), Action::Permit),
        rule("L3", set(&[(50, 99)]), any(), Action::Permit),
    ];
    let request = Request::new("R1", set(&[(0, 99)]), any(), Action::Permit);
    assert!(verify(&acl, &request).is_pass());
}

#[test]
fn later_rules_are_ignored_once_region_is_resolved() {
    // L2 would conflict, but L1 already consumed the whole region
    let acl = vec![
        rule("L1", any(), any(), Action::Deny),
        rule("L2", set(&[(10, 20)]), any(), Action::Permit),
    ];
    let request = Request::new("R1", set(&[(10, 20)]), any(), Action::Deny);

    let verification = PartitionVerifier::new(&acl).verify(&request);
    assert!(verification.verdict.is_pass());
    assert!(verification.trace.iter().all(|e| e.rule == 0));
}

#[test]
fn swapping_non_overlapping_rules_keeps_verdict() {
    let a = rule("A", set(&[(0, 9)]), any(), Action::Permit);
    let b = rule("B", set(&[(20, 29)]), any(), Action::Deny);
    let requests = [
        Request::new("R1", set(&[(0, 9)]), any(), Action::Permit),
        Request::new("R2", set(&[(0, 29)]), any(), Action::Permit),
        Request::new("R3", set(&[(20, 29)]), any(), Action::Deny),
        Request::new("R4", set(&[(10, 29)]), any(), Action::Deny),
    ];

    for request in &requests {
        let forward = verify(&[a.clone(), b.clone()], request).is_pass();
        let backward = verify(&[b.clone(), a.clone()], request).is_pass();
        assert_eq!(forward, backward, "verdict changed for {}", request.name);
    }
}

#[test]
fn swapping_overlapping_conflicting_rules_changes_verdict() {
    let permit = rule("P", set(&[(0, 20)]), any(), Action::Permit);
    let deny = rule("D", set(&[(10, 30)]), any(), Action::Deny);
    let request = Request::new("R1", set(&[(10, 20)]), any(), Action::Permit);

    assert!(verify(&[permit.clone(), deny.clone()], &request).is_pass());
    assert!(!verify(&[deny, permit], &request).is_pass());
}

#[test]
fn two_dimensional_conflict_is_located_precisely() {
    let acl = vec![
        rule("L1", set(&[(0, 100)]), set(&[(443, 443)]), Action::Deny),
        rule("L2", any(), any(), Action::Permit),
    ];
    let request = Request::new("R1", set(&[(50, 60)]), set(&[(400, 500)]), Action::Permit);

    let verdict = verify(&acl, &request);
    let conflict = verdict.conflict().expect("expected a conflict");
    assert_eq!(conflict.piece.src, set(&[(50, 60)]));
    assert_eq!(conflict.piece.dst, set(&[(443, 443)]));
}

/// Port fields never shield a piece: the rule's address rectangle decides
#[test]
fn partition_matches_on_addresses_only() {
    let ssh_only = AclRule::new("L1", any(), any(), Action::Permit).with_scalars(Scalars {
        dst_port: Scalar::int(22),
        ..Scalars::default()
    });
    let request = Request::new("R1", set(&[(0, 10)]), any(), Action::Deny).with_scalars(Scalars {
        dst_port: Scalar::int(80),
        ..Scalars::default()
    });

    let verdict = verify(&[ssh_only.clone()], &request);
    let conflict = verdict.conflict().expect("L1 covers the addresses");
    assert_eq!(conflict.governor, Governor::Rule { index: 0, name: "L1".into() });
    assert_eq!(conflict.piece.src, set(&[(0, 10)]));
    assert_eq!(conflict.actual, Action::Permit);
    // Inherited unchanged from the request
    assert_eq!(conflict.piece.scalars.dst_port, Scalar::int(80));

    let permit = Request::new("R2", set(&[(0, 10)]), any(), Action::Permit).with_scalars(Scalars {
        dst_port: Scalar::int(80),
        ..Scalars::default()
    });
    assert!(verify(&[ssh_only], &permit).is_pass());
}

#[test]
fn empty_request_region_passes_trivially() {
    let acl = vec![rule("L1", any(), any(), Action::Deny)];
    let request = Request::new("R1", RangeSet::empty(), any(), Action::Permit);
    assert!(verify(&acl, &request).is_pass());
}

#[test]
fn trace_lists_intersections_and_subrules_in_order() {
    let acl = vec![rule("L1", set(&[(10, 20)]), any(), Action::Deny)];
    let request = Request::new("R1", set(&[(5, 25)]), any(), Action::Deny);

    let verification = PartitionVerifier::new(&acl).verify(&request);
    assert!(verification.verdict.is_pass());

    let kinds: Vec<TraceKind> = verification.trace.iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![TraceKind::Intersect, TraceKind::SubRule, TraceKind::SubRule]);

    let tags: Vec<String> = verification
        .trace
        .iter()
        .map(|e| verification.lineage.tag(e.piece))
        .collect();
    assert_eq!(tags, vec!["R1/hit", "R1/rs", "R1/rs"]);
}

#[test]
fn batch_failures_are_scoped_to_one_request() {
    let acl = vec![rule("L1", set(&[(10, 20)]), any(), Action::Permit)];
    let requests = vec![
        Request::new("R1", set(&[(10, 20)]), any(), Action::Deny),
        Request::new("R2", set(&[(10, 20)]), any(), Action::Permit),
        Request::new("R3", set(&[(30, 40)]), any(), Action::Deny),
    ];

    let results = verify_batch(&acl, &requests);
    let names: Vec<&str> = results.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["R1", "R2", "R3"]);
    assert!(!results[0].1.verdict.is_pass());
    assert!(results[1].1.verdict.is_pass());
    assert!(results[2].1.verdict.is_pass());
}

#[test]
fn verdict_display() {
    let acl = vec![rule("L1", set(&[(10, 20)]), any(), Action::Permit)];
    let request = Request::new("R1", set(&[(10, 20)]), any(), Action::Deny);
    assert_eq!(
        verify(&acl, &request).to_string(),
        "FAIL conflict at L1: R1/hit src=10-20 dst=any expect deny but ACL=permit"
    );
    assert_eq!(Verdict::Pass.to_string(), "PASS");
}
