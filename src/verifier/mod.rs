//! Partition verifier.
//!
//! A request region is pushed through the ACL rule by rule. Each rule carves
//! the part of every active piece it governs; that part must carry the rule's
//! action. Whatever survives all rules falls to the implicit default deny.
//!
//! States: `Active(pieces)` → `Pass` | `Fail(conflict)`. The walk is strictly
//! sequential and never backtracks.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::acl::{AclRule, Action, Lineage, Piece, PieceId, Request};
use crate::cutting::cut;
use crate::ranges::RangeSet;

/// What decided the action for an offending piece.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Governor {
    Rule { index: usize, name: String },
    DefaultDeny,
}

impl fmt::Display for Governor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Governor::Rule { name, .. } => f.write_str(name),
            Governor::DefaultDeny => f.write_str("default"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub governor: Governor,
    /// The offending sub-region, not the whole request.
    pub piece: Piece,
    pub tag: String,
    pub expected: Action,
    pub actual: Action,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.governor {
            Governor::Rule { .. } => write!(f, "conflict at {}", self.governor)?,
            Governor::DefaultDeny => write!(f, "conflict with default deny")?,
        }
        write!(
            f,
            ": {} src={} dst={} expect {} but ACL={}",
            self.tag, self.piece.src, self.piece.dst, self.expected, self.actual
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail(Conflict),
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }

    pub fn conflict(&self) -> Option<&Conflict> {
        match self {
            Verdict::Pass => None,
            Verdict::Fail(c) => Some(c),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Pass => f.write_str("PASS"),
            Verdict::Fail(c) => write!(f, "FAIL {}", c),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceKind {
    /// A piece carved out by a rule.
    Intersect,
    /// A remainder piece left for later rules.
    SubRule,
}

impl TraceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TraceKind::Intersect => "INTERSECT",
            TraceKind::SubRule => "SUBRULE",
        }
    }
}

/// One piece creation, in the order the verifier produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEvent {
    pub piece: PieceId,
    pub rule: usize,
    pub src: RangeSet,
    pub dst: RangeSet,
    pub kind: TraceKind,
}

/// Receives trace events. Observational only.
pub trait TraceSink {
    fn record(&mut self, event: TraceEvent);
}

impl TraceSink for Vec<TraceEvent> {
    fn record(&mut self, event: TraceEvent) {
        self.push(event);
    }
}

/// Discards every event.
pub struct NoTrace;

impl TraceSink for NoTrace {
    fn record(&mut self, _event: TraceEvent) {}
}

/// Full outcome of one request: verdict plus the diagnostics gathered.
#[derive(Debug, Clone)]
pub struct Verification {
    pub verdict: Verdict,
    pub trace: Vec<TraceEvent>,
    pub lineage: Lineage,
}

enum State {
    Active(Vec<Piece>),
    Pass,
    Fail(Conflict),
}

pub struct PartitionVerifier<'a> {
    rules: &'a [AclRule],
}

impl<'a> PartitionVerifier<'a> {
    pub fn new(rules: &'a [AclRule]) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &'a [AclRule] {
        self.rules
    }

    pub fn verify(&self, request: &Request) -> Verification {
        let mut trace = Vec::new();
        let (verdict, lineage) = self.verify_with(request, &mut trace);
        Verification { verdict, trace, lineage }
    }

    pub fn verify_with<S: TraceSink>(&self, request: &Request, sink: &mut S) -> (Verdict, Lineage) {
        let mut lineage = Lineage::new(request.name.clone());
        let root = Piece::root(request, &mut lineage);
        let mut state = State::Active(alloc::vec![root]);

        for (index, rule) in self.rules.iter().enumerate() {
            let pieces = match state {
                State::Active(pieces) => pieces,
                _ => break,
            };
            log::debug!(
                "{}: rule {} ({}) action={} over {} piece(s)",
                request.name,
                index + 1,
                rule.name,
                rule.action,
                pieces.len()
            );
            state = self.step(index, rule, pieces, &mut lineage, sink);
        }

        let verdict = match state {
            State::Pass => Verdict::Pass,
            State::Fail(conflict) => Verdict::Fail(conflict),
            State::Active(pieces) => resolve_default(pieces, &lineage),
        };
        log::debug!("{}: {}", request.name, verdict);
        (verdict, lineage)
    }

    fn step<S: TraceSink>(
        &self,
        index: usize,
        rule: &AclRule,
        pieces: Vec<Piece>,
        lineage: &mut Lineage,
        sink: &mut S,
    ) -> State {
        let mut next = Vec::with_capacity(pieces.len());

        for piece in pieces {
            if piece.is_empty() {
                continue;
            }
            if !piece.intersects_rule(rule) {
                log::trace!("  KEEP {}: no intersection with {}", lineage.tag(piece.id), rule.name);
                next.push(piece);
                continue;
            }

            let split = cut(&piece, rule, lineage);

            for hit in split.matched {
                log::trace!(
                    "  HIT  {} src={} dst={} expect={} ACL={}",
                    lineage.tag(hit.id),
                    hit.src,
                    hit.dst,
                    hit.expect,
                    rule.action
                );
                sink.record(TraceEvent {
                    piece: hit.id,
                    rule: index,
                    src: hit.src.clone(),
                    dst: hit.dst.clone(),
                    kind: TraceKind::Intersect,
                });
                if hit.expect != rule.action {
                    let expected = hit.expect;
                    return State::Fail(Conflict {
                        governor: Governor::Rule { index, name: rule.name.clone() },
                        tag: lineage.tag(hit.id),
                        piece: hit,
                        expected,
                        actual: rule.action,
                    });
                }
            }

            for rest in split.remainder {
                log::trace!("  SUBRULE {} src={} dst={}", lineage.tag(rest.id), rest.src, rest.dst);
                sink.record(TraceEvent {
                    piece: rest.id,
                    rule: index,
                    src: rest.src.clone(),
                    dst: rest.dst.clone(),
                    kind: TraceKind::SubRule,
                });
                if !rest.is_empty() {
                    next.push(rest);
                }
            }
        }

        if next.is_empty() {
            log::debug!("  region fully accounted for after {}", rule.name);
            State::Pass
        } else {
            State::Active(next)
        }
    }
}

/// Pieces that survive every rule get the implicit deny.
fn resolve_default(pieces: Vec<Piece>, lineage: &Lineage) -> Verdict {
    for piece in pieces {
        if piece.is_empty() {
            continue;
        }
        if piece.expect != Action::Deny {
            let expected = piece.expect;
            return Verdict::Fail(Conflict {
                governor: Governor::DefaultDeny,
                tag: lineage.tag(piece.id),
                piece,
                expected,
                actual: Action::Deny,
            });
        }
    }
    Verdict::Pass
}

/// Verifies one request, discarding diagnostics.
pub fn verify(rules: &[AclRule], request: &Request) -> Verdict {
    PartitionVerifier::new(rules).verify_with(request, &mut NoTrace).0
}

/// Verifies every request independently against the same rules.
///
/// A failing request never affects the others; results keep request order.
pub fn verify_batch(rules: &[AclRule], requests: &[Request]) -> Vec<(String, Verification)> {
    let verifier = PartitionVerifier::new(rules);
    requests
        .iter()
        .map(|request| (request.name.clone(), verifier.verify(request)))
        .collect()
}
