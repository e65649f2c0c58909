#![no_std]

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

pub mod acl;
pub mod cutting;
pub mod firewall;
pub mod parser;
pub mod proofs;
pub mod ranges;
pub mod report;
pub mod verifier;
#[cfg(feature = "std")]
pub mod config;

pub use acl::{AclRule, Action, Lineage, Operation, Piece, PieceId, Request, Scalar, ScalarValue, Scalars};
pub use cutting::{cut, Cut};
pub use firewall::{Firewall, FirewallError, MatchResult, Packet};
pub use parser::{parse_acl, parse_action, parse_range_list, parse_scalar, AclDocument, ParseError};
pub use ranges::{intersect, normalize, subtract, subtract_one, Range, RangeSet};
pub use verifier::{
    verify, verify_batch, Conflict, Governor, PartitionVerifier, TraceEvent, TraceKind, TraceSink, Verdict,
    Verification,
};
