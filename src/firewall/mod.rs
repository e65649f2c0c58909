//! First-match evaluation of single packets.
//!
//! This is the classic linear ACL lookup: rules are tried in order, the first
//! one matching the packet decides, and an unmatched packet is denied. It
//! answers a narrower question than the partition verifier (one packet, not
//! a region) and is kept as a separate mode.

use alloc::vec::Vec;
use thiserror::Error;

use crate::acl::{AclRule, Action, Lineage, Piece, Request, Scalar, ScalarValue};
use crate::ranges::{Range, RangeSet};
use crate::verifier::{Conflict, Governor, Verdict};

/// A single concrete packet. Scalars that are not known are `None` and only
/// match wildcard rule fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub src: u32,
    pub dst: u32,
    pub src_port: Option<ScalarValue>,
    pub dst_port: Option<ScalarValue>,
    pub protocol: Option<ScalarValue>,
}

impl Packet {
    pub fn new(src: u32, dst: u32) -> Self {
        Self {
            src,
            dst,
            src_port: None,
            dst_port: None,
            protocol: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    /// Index of the deciding rule.
    Permit(usize),
    Deny(usize),
    /// No rule matched.
    DefaultDeny,
}

impl MatchResult {
    pub fn action(&self) -> Action {
        match self {
            MatchResult::Permit(_) => Action::Permit,
            MatchResult::Deny(_) | MatchResult::DefaultDeny => Action::Deny,
        }
    }

    pub fn rule(&self) -> Option<usize> {
        match self {
            MatchResult::Permit(i) | MatchResult::Deny(i) => Some(*i),
            MatchResult::DefaultDeny => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FirewallError {
    #[error("rule table is full ({capacity} rules)")]
    TooManyRules { capacity: usize },
}

/// Fixed-capacity ordered rule table evaluated first-match.
pub struct Firewall<const N: usize = 256> {
    rules: heapless::Vec<AclRule, N>,
}

impl<const N: usize> Firewall<N> {
    pub fn new() -> Self {
        Self {
            rules: heapless::Vec::new(),
        }
    }

    pub fn from_rules(rules: &[AclRule]) -> Result<Self, FirewallError> {
        let mut firewall = Self::new();
        for rule in rules {
            firewall.add_rule(rule.clone())?;
        }
        Ok(firewall)
    }

    pub fn add_rule(&mut self, rule: AclRule) -> Result<(), FirewallError> {
        self.rules
            .push(rule)
            .map_err(|_| FirewallError::TooManyRules { capacity: N })
    }

    pub fn clear_rules(&mut self) {
        self.rules.clear();
    }

    pub fn rules(&self) -> &[AclRule] {
        &self.rules
    }

    pub fn match_packet(&self, packet: &Packet) -> MatchResult {
        for (index, rule) in self.rules.iter().enumerate() {
            if Self::matches_rule(rule, packet) {
                return match rule.action {
                    Action::Permit => MatchResult::Permit(index),
                    Action::Deny => MatchResult::Deny(index),
                };
            }
        }
        // DEFAULT DENY ALL
        MatchResult::DefaultDeny
    }

    fn matches_rule(rule: &AclRule, packet: &Packet) -> bool {
        if !rule.src.contains(packet.src) || !rule.dst.contains(packet.dst) {
            return false;
        }
        let field = |rule_field: &Scalar, value: &Option<ScalarValue>| match value {
            Some(v) => rule_field.matches(v),
            None => rule_field.is_any(),
        };
        field(&rule.scalars.src_port, &packet.src_port)
            && field(&rule.scalars.dst_port, &packet.dst_port)
            && field(&rule.scalars.protocol, &packet.protocol)
    }

    /// Checks a request by evaluating its corner packets: the first and last
    /// address of every src range against those of every dst range.
    ///
    /// Only corner addresses are looked at, so a rule covering just the
    /// middle of a range goes unseen. Unlike [`crate::verifier::verify`] it
    /// does match port and protocol fields, so the two can disagree in
    /// either direction.
    pub fn probe(&self, request: &Request) -> Verdict {
        let as_value = |s: &Scalar| match s {
            Scalar::Any => None,
            Scalar::Exact(v) => Some(v.clone()),
        };

        for src in corners(&request.src) {
            for dst in corners(&request.dst) {
                let packet = Packet {
                    src,
                    dst,
                    src_port: as_value(&request.scalars.src_port),
                    dst_port: as_value(&request.scalars.dst_port),
                    protocol: as_value(&request.scalars.protocol),
                };
                let result = self.match_packet(&packet);
                if result.action() != request.expect {
                    log::debug!("{}: packet {}->{} got {:?}", request.name, src, dst, result);
                    return Verdict::Fail(self.point_conflict(request, &packet, result));
                }
            }
        }
        Verdict::Pass
    }

    fn point_conflict(&self, request: &Request, packet: &Packet, result: MatchResult) -> Conflict {
        let governor = match result.rule() {
            Some(index) => Governor::Rule {
                index,
                name: self.rules[index].name.clone(),
            },
            None => Governor::DefaultDeny,
        };
        let mut lineage = Lineage::new(request.name.clone());
        let mut piece = Piece::root(request, &mut lineage);
        piece.src = RangeSet::single(Range::single(packet.src));
        piece.dst = RangeSet::single(Range::single(packet.dst));
        Conflict {
            governor,
            tag: lineage.tag(piece.id),
            piece,
            expected: request.expect,
            actual: result.action(),
        }
    }
}

impl<const N: usize> Default for Firewall<N> {
    fn default() -> Self {
        Self::new()
    }
}

fn corners(set: &RangeSet) -> Vec<u32> {
    let mut points = Vec::with_capacity(set.ranges().len() * 2);
    for r in set {
        points.push(r.start());
        if r.end() != r.start() {
            points.push(r.end());
        }
    }
    points
}
