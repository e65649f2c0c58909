//! Text rendering of verification diagnostics.

use alloc::string::{String, ToString};
use core::fmt;

use crate::acl::{AclRule, Lineage};
use crate::verifier::{TraceEvent, Verdict, Verification};

const TAG_WIDTH: usize = 16;
const RANGE_WIDTH: usize = 25;
const KIND_WIDTH: usize = 10;

/// Sub-rule table: one row per piece the verifier created.
pub struct TraceTable<'a> {
    trace: &'a [TraceEvent],
    lineage: &'a Lineage,
    rules: &'a [AclRule],
}

impl<'a> TraceTable<'a> {
    pub fn new(trace: &'a [TraceEvent], lineage: &'a Lineage, rules: &'a [AclRule]) -> Self {
        Self { trace, lineage, rules }
    }

    pub fn from_verification(verification: &'a Verification, rules: &'a [AclRule]) -> Self {
        Self::new(&verification.trace, &verification.lineage, rules)
    }
}

impl fmt::Display for TraceTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<tw$} {:<6} {:<rw$} {:<rw$} {:<kw$}",
            "Tag",
            "Rule",
            "Src Range",
            "Dst Range",
            "Type",
            tw = TAG_WIDTH,
            rw = RANGE_WIDTH,
            kw = KIND_WIDTH
        )?;
        writeln!(f, "{}", "-".repeat(TAG_WIDTH + 6 + 2 * RANGE_WIDTH + KIND_WIDTH + 4))?;
        for event in self.trace {
            let rule = self
                .rules
                .get(event.rule)
                .map(|r| r.name.as_str())
                .unwrap_or("?");
            writeln!(
                f,
                "{:<tw$} {:<6} {:<rw$} {:<rw$} {:<kw$}",
                self.lineage.tag(event.piece),
                rule,
                clip(event.src.to_string(), RANGE_WIDTH),
                clip(event.dst.to_string(), RANGE_WIDTH),
                event.kind.as_str(),
                tw = TAG_WIDTH,
                rw = RANGE_WIDTH,
                kw = KIND_WIDTH
            )?;
        }
        Ok(())
    }
}

/// `[R1] => PASS` / `[R1] => FAIL conflict at L1: ...`
pub struct VerdictLine<'a> {
    pub name: &'a str,
    pub verdict: &'a Verdict,
}

impl fmt::Display for VerdictLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] => {}", self.name, self.verdict)
    }
}

fn clip(mut text: String, width: usize) -> String {
    if text.len() > width {
        text.truncate(width.saturating_sub(3));
        text.push_str("...");
    }
    text
}
