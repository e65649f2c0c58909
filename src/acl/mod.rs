//! ACL rules, verification requests and the pieces tracked while partitioning.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::ranges::RangeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Permit,
    Deny,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Permit => "permit",
            Action::Deny => "deny",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScalarValue {
    Int(u32),
    Name(String),
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Int(v) => write!(f, "{}", v),
            ScalarValue::Name(s) => f.write_str(s),
        }
    }
}

/// Port/protocol field: an exact value or the wildcard. Equality semantics only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Scalar {
    #[default]
    Any,
    Exact(ScalarValue),
}

impl Scalar {
    pub fn int(value: u32) -> Self {
        Scalar::Exact(ScalarValue::Int(value))
    }

    pub fn name(value: impl Into<String>) -> Self {
        Scalar::Exact(ScalarValue::Name(value.into()))
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Scalar::Any)
    }

    /// A rule field matches a concrete value when it is the wildcard or equal.
    pub fn matches(&self, value: &ScalarValue) -> bool {
        match self {
            Scalar::Any => true,
            Scalar::Exact(v) => v == value,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Any => f.write_str("any"),
            Scalar::Exact(v) => write!(f, "{}", v),
        }
    }
}

/// The scalar part of a rule or piece.
///
/// Only the first-match evaluator reads these. Partition verification
/// splits and matches on addresses alone; pieces carry their request's
/// scalars along unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Scalars {
    pub src_port: Scalar,
    pub dst_port: Scalar,
    pub protocol: Scalar,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclRule {
    pub name: String,
    pub src: RangeSet,
    pub dst: RangeSet,
    pub scalars: Scalars,
    pub action: Action,
}

impl AclRule {
    /// Rule over the given address sets with wildcard scalars.
    pub fn new(name: impl Into<String>, src: RangeSet, dst: RangeSet, action: Action) -> Self {
        Self {
            name: name.into(),
            src,
            dst,
            scalars: Scalars::default(),
            action,
        }
    }

    pub fn with_scalars(mut self, scalars: Scalars) -> Self {
        self.scalars = scalars;
        self
    }
}

/// A verification request: a traffic region and the action the ACL is
/// expected to apply to all of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub name: String,
    pub src: RangeSet,
    pub dst: RangeSet,
    pub scalars: Scalars,
    pub expect: Action,
}

impl Request {
    pub fn new(name: impl Into<String>, src: RangeSet, dst: RangeSet, expect: Action) -> Self {
        Self {
            name: name.into(),
            src,
            dst,
            scalars: Scalars::default(),
            expect,
        }
    }

    pub fn with_scalars(mut self, scalars: Scalars) -> Self {
        self.scalars = scalars;
        self
    }
}

/// Index into a [`Lineage`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PieceId(pub usize);

/// How a piece was produced from its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Root,
    Matched,
    SrcRemainder,
    DstRemainder,
}

impl Operation {
    pub fn tag(&self) -> &'static str {
        match self {
            Operation::Root => "root",
            Operation::Matched => "hit",
            Operation::SrcRemainder => "rs",
            Operation::DstRemainder => "rd",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineageNode {
    pub id: PieceId,
    pub parent: Option<PieceId>,
    pub operation: Operation,
}

/// Append-only record of how every piece of one verification was split.
///
/// Diagnostics only; the verifier never reads it back.
#[derive(Debug, Clone, Default)]
pub struct Lineage {
    root_name: String,
    nodes: Vec<LineageNode>,
}

impl Lineage {
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            root_name: root_name.into(),
            nodes: Vec::new(),
        }
    }

    pub fn root_name(&self) -> &str {
        &self.root_name
    }

    pub fn record(&mut self, parent: Option<PieceId>, operation: Operation) -> PieceId {
        let id = PieceId(self.nodes.len());
        self.nodes.push(LineageNode { id, parent, operation });
        id
    }

    pub fn get(&self, id: PieceId) -> Option<&LineageNode> {
        self.nodes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[LineageNode] {
        &self.nodes
    }

    /// Operations from the root down to `id`, root excluded.
    pub fn path(&self, id: PieceId) -> Vec<Operation> {
        let mut ops = Vec::new();
        let mut cursor = self.get(id);
        while let Some(node) = cursor {
            if node.operation != Operation::Root {
                ops.push(node.operation);
            }
            cursor = node.parent.and_then(|p| self.get(p));
        }
        ops.reverse();
        ops
    }

    /// `R1/hit`, `R1/rs/rd`, ...
    pub fn tag(&self, id: PieceId) -> String {
        let mut tag = self.root_name.clone();
        for op in self.path(id) {
            tag.push('/');
            tag.push_str(op.tag());
        }
        tag
    }
}

/// A sub-region of a request tracked during partitioning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    pub id: PieceId,
    pub src: RangeSet,
    pub dst: RangeSet,
    pub scalars: Scalars,
    pub expect: Action,
}

impl Piece {
    /// Seeds the root piece of a request.
    pub fn root(request: &Request, lineage: &mut Lineage) -> Self {
        Self {
            id: lineage.record(None, Operation::Root),
            src: request.src.clone(),
            dst: request.dst.clone(),
            scalars: request.scalars.clone(),
            expect: request.expect,
        }
    }

    /// A narrower piece inheriting this one's scalars and expectation.
    pub fn derive(&self, src: RangeSet, dst: RangeSet, operation: Operation, lineage: &mut Lineage) -> Self {
        Self {
            id: lineage.record(Some(self.id), operation),
            src,
            dst,
            scalars: self.scalars.clone(),
            expect: self.expect,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.src.is_empty() || self.dst.is_empty()
    }

    /// Number of (src, dst) address pairs covered.
    pub fn area(&self) -> u128 {
        u128::from(self.src.len_points()) * u128::from(self.dst.len_points())
    }

    /// True when the rule's src × dst rectangle overlaps this piece.
    /// Port and protocol fields play no part.
    pub fn intersects_rule(&self, rule: &AclRule) -> bool {
        !self.src.intersect(&rule.src).is_empty() && !self.dst.intersect(&rule.dst).is_empty()
    }
}
