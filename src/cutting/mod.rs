//! Splitting a piece against one rule's src × dst rectangle.

use alloc::vec::Vec;

use crate::acl::{AclRule, Lineage, Operation, Piece};
use crate::ranges::{intersect, subtract};

/// Result of cutting a piece: the part inside the rule and the parts outside.
///
/// `matched` holds at most one piece; it is a `Vec` so callers can treat
/// both halves uniformly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cut {
    pub matched: Vec<Piece>,
    pub remainder: Vec<Piece>,
}

impl Cut {
    fn untouched(piece: &Piece) -> Self {
        Self {
            matched: Vec::new(),
            remainder: alloc::vec![piece.clone()],
        }
    }
}

/// Cuts `piece` by `rule` over whole range sets (no per-segment cross product).
///
/// Matched and remainder pieces are disjoint and together cover `piece`
/// exactly. Remainder pieces are emitted one per range of the src (resp. dst)
/// difference.
pub fn cut(piece: &Piece, rule: &AclRule, lineage: &mut Lineage) -> Cut {
    let inter_src = intersect(&piece.src, &rule.src);
    if inter_src.is_empty() {
        return Cut::untouched(piece);
    }

    let mut remainder = Vec::new();

    // Outside the rule on the src axis, whatever the dst.
    for rs in subtract(&piece.src, &inter_src).segments() {
        remainder.push(piece.derive(rs, piece.dst.clone(), Operation::SrcRemainder, lineage));
    }

    let inter_dst = intersect(&piece.dst, &rule.dst);
    if inter_dst.is_empty() {
        remainder.push(piece.derive(inter_src, piece.dst.clone(), Operation::DstRemainder, lineage));
        return Cut {
            matched: Vec::new(),
            remainder,
        };
    }

    // Inside on src, outside on dst.
    for rd in subtract(&piece.dst, &inter_dst).segments() {
        remainder.push(piece.derive(inter_src.clone(), rd, Operation::DstRemainder, lineage));
    }

    let matched = piece.derive(inter_src, inter_dst, Operation::Matched, lineage);
    Cut {
        matched: alloc::vec![matched],
        remainder,
    }
}
