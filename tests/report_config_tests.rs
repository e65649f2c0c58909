//! Report and Configuration Tests
//!
//! Sub-rule table rendering, verdict lines, and TOML configuration

use aclverify::acl::{AclRule, Action, Request};
use aclverify::config::{ConfigError, Mode, VerifierConfig};
use aclverify::ranges::{Range, RangeSet};
use aclverify::report::{TraceTable, VerdictLine};
use aclverify::verifier::{PartitionVerifier, Verdict};

fn set(ranges: &[(u32, u32)]) -> RangeSet {
    RangeSet::from_ranges(ranges.iter().map(|&(a, b)| Range::new(a, b).unwrap()))
}

#[test]
fn trace_table_lists_every_piece() {
    let acl = vec![AclRule::new("L1", set(&[(10, 20)]), RangeSet::full(), Action::Deny)];
    let request = Request::new("R1", set(&[(5, 25)]), RangeSet::full(), Action::Deny);
    let verification = PartitionVerifier::new(&acl).verify(&request);

    let table = TraceTable::from_verification(&verification, &acl).to_string();
    let lines: Vec<&str> = table.lines().collect();

    for column in ["Tag", "Rule", "Src Range", "Dst Range", "Type"] {
        assert!(lines[0].contains(column), "missing column {}", column);
    }
    assert!(lines[1].chars().all(|c| c == '-'));
    // header + separator + hit + two src remainders
    assert_eq!(lines.len(), 5);

    assert!(lines[2].starts_with("R1/hit"));
    assert!(lines[2].contains("10-20"));
    assert!(lines[2].contains("INTERSECT"));
    assert!(lines[3].starts_with("R1/rs"));
    assert!(lines[3].contains("5-9"));
    assert!(lines[3].contains("SUBRULE"));
    assert!(lines[4].contains("21-25"));
    assert!(lines.iter().skip(2).all(|l| l.contains("L1")));
}

#[test]
fn trace_table_clips_long_ranges() {
    let many: Vec<(u32, u32)> = (0..20).map(|i| (i * 10, i * 10 + 1)).collect();
    let acl = vec![AclRule::new("L1", set(&many), RangeSet::full(), Action::Permit)];
    let request = Request::new("R1", set(&many), RangeSet::full(), Action::Permit);
    let verification = PartitionVerifier::new(&acl).verify(&request);

    let table = TraceTable::from_verification(&verification, &acl).to_string();
    let row = table.lines().nth(2).unwrap();
    assert!(row.contains("..."));
    assert!(!row.contains(&set(&many).to_string()));
}

#[test]
fn verdict_line_format() {
    let line = VerdictLine {
        name: "R3",
        verdict: &Verdict::Pass,
    };
    assert_eq!(line.to_string(), "[R3] => PASS");
}

#[test]
fn config_defaults() {
    let config = VerifierConfig::default();
    assert_eq!(config.mode, Mode::Partition);
    assert!(!config.trace);
    assert_eq!(config.fail_exit_code, 1);
    assert_eq!(VerifierConfig::from_toml("").unwrap(), config);
}

#[test]
fn config_from_toml() {
    let config = VerifierConfig::from_toml(
        r#"
mode = "first-match"
trace = true
fail_exit_code = 3
"#,
    )
    .unwrap();
    assert_eq!(config.mode, Mode::FirstMatch);
    assert!(config.trace);
    assert_eq!(config.fail_exit_code, 3);
}

#[test]
fn config_partial_toml_keeps_defaults() {
    let config = VerifierConfig::from_toml("trace = true").unwrap();
    assert_eq!(config.mode, Mode::Partition);
    assert!(config.trace);
}

#[test]
fn config_rejects_unknown_keys_and_modes() {
    assert!(matches!(
        VerifierConfig::from_toml("colour = true"),
        Err(ConfigError::Toml(_))
    ));
    assert!(matches!(
        VerifierConfig::from_toml("mode = \"fastest\""),
        Err(ConfigError::Toml(_))
    ));
    assert!(matches!("fastest".parse::<Mode>(), Err(ConfigError::UnknownMode(_))));
    assert_eq!("first-match".parse::<Mode>().unwrap(), Mode::FirstMatch);
}

#[test]
fn config_load_missing_file() {
    let err = VerifierConfig::load(std::path::Path::new("/nonexistent/aclverify.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}
