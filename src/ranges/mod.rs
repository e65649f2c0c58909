//! Closed integer intervals and normalized interval sets.
//!
//! Every `RangeSet` produced by this module is normalized: sorted by start,
//! pairwise disjoint and non-adjacent (a gap of at least one value between
//! consecutive ranges). The operations never enumerate individual points.

use alloc::vec::Vec;
use core::fmt;

/// Upper bound of the address/port domain, what the `any` token expands to.
pub const DOMAIN_MAX: u32 = u32::MAX;

/// Closed interval `[start, end]` with `start <= end`.
///
/// Fields are private so every value goes through [`Range::new`] or a
/// constructor that cannot produce reversed bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Range {
    start: u32,
    end: u32,
}

impl Range {
    /// Returns `None` when `start > end`.
    pub fn new(start: u32, end: u32) -> Option<Self> {
        if start <= end {
            Some(Self { start, end })
        } else {
            None
        }
    }

    pub fn single(value: u32) -> Self {
        Self { start: value, end: value }
    }

    pub fn full() -> Self {
        Self { start: 0, end: DOMAIN_MAX }
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn contains(&self, value: u32) -> bool {
        self.start <= value && value <= self.end
    }

    /// Number of points covered. `u64` because the full domain has 2^32 points.
    pub fn len_points(&self) -> u64 {
        u64::from(self.end - self.start) + 1
    }

    pub fn intersect(&self, other: &Range) -> Option<Range> {
        Range::new(self.start.max(other.start), self.end.min(other.end))
    }

    fn touches(&self, other: &Range) -> bool {
        self.start <= other.end.saturating_add(1) && other.start <= self.end.saturating_add(1)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// Normalized, sorted, pairwise non-adjacent set of ranges.
///
/// The only way to build one is through [`normalize`] (or the constructors
/// that call it), so the invariant holds for every value of this type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RangeSet {
    ranges: Vec<Range>,
}

impl RangeSet {
    pub fn empty() -> Self {
        Self { ranges: Vec::new() }
    }

    /// The whole domain `[0, 2^32 - 1]`.
    pub fn full() -> Self {
        Self { ranges: alloc::vec![Range::full()] }
    }

    pub fn from_ranges<I: IntoIterator<Item = Range>>(ranges: I) -> Self {
        normalize(ranges.into_iter().collect())
    }

    pub fn single(range: Range) -> Self {
        Self { ranges: alloc::vec![range] }
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.ranges.as_slice() == [Range::full()]
    }

    pub fn ranges(&self) -> &[Range] {
        &self.ranges
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Range> {
        self.ranges.iter()
    }

    pub fn contains(&self, value: u32) -> bool {
        // Sorted and disjoint, so the candidate is the last range starting at or before `value`.
        let idx = self.ranges.partition_point(|r| r.start <= value);
        idx > 0 && self.ranges[idx - 1].contains(value)
    }

    pub fn len_points(&self) -> u64 {
        self.ranges.iter().map(Range::len_points).sum()
    }

    pub fn intersect(&self, other: &RangeSet) -> RangeSet {
        intersect(self, other)
    }

    pub fn subtract(&self, other: &RangeSet) -> RangeSet {
        subtract(self, other)
    }

    pub fn union(&self, other: &RangeSet) -> RangeSet {
        let mut all = self.ranges.clone();
        all.extend_from_slice(&other.ranges);
        normalize(all)
    }

    /// Splits the set into one single-range set per element.
    pub fn segments(&self) -> impl Iterator<Item = RangeSet> + '_ {
        self.ranges.iter().map(|r| RangeSet::single(*r))
    }
}

impl<'a> IntoIterator for &'a RangeSet {
    type Item = &'a Range;
    type IntoIter = core::slice::Iter<'a, Range>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges.iter()
    }
}

impl fmt::Display for RangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ranges.is_empty() {
            return write!(f, "[]");
        }
        if self.is_full() {
            return write!(f, "any");
        }
        for (i, r) in self.ranges.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", r)?;
        }
        Ok(())
    }
}

/// Sorts by start and merges every pair that overlaps or touches.
pub fn normalize(mut ranges: Vec<Range>) -> RangeSet {
    if ranges.len() <= 1 {
        return RangeSet { ranges };
    }
    ranges.sort_unstable();

    let mut out: Vec<Range> = Vec::with_capacity(ranges.len());
    for r in ranges {
        match out.last_mut() {
            Some(last) if r.start <= last.end.saturating_add(1) => {
                last.end = last.end.max(r.end);
            }
            _ => out.push(r),
        }
    }
    RangeSet { ranges: out }
}

/// Pairwise intersection of both sets, normalized.
pub fn intersect(a: &RangeSet, b: &RangeSet) -> RangeSet {
    let mut out = Vec::new();
    for x in &a.ranges {
        for y in &b.ranges {
            if let Some(r) = x.intersect(y) {
                out.push(r);
            }
        }
    }
    normalize(out)
}

/// The parts of `a` lying outside `b`: `a` itself when disjoint, otherwise
/// at most two pieces.
pub fn subtract_one(a: Range, b: Range) -> RangeSet {
    if b.end < a.start || b.start > a.end {
        return RangeSet::single(a);
    }
    let mut out = Vec::with_capacity(2);
    if b.start > a.start {
        out.push(Range { start: a.start, end: b.start - 1 });
    }
    if b.end < a.end {
        out.push(Range { start: b.end + 1, end: a.end });
    }
    RangeSet { ranges: out }
}

/// `a \ b`, narrowing `a` by each element of `b` in turn.
pub fn subtract(a: &RangeSet, b: &RangeSet) -> RangeSet {
    let mut current = a.ranges.clone();
    for y in &b.ranges {
        if current.is_empty() {
            break;
        }
        let mut next = Vec::with_capacity(current.len() + 1);
        for x in current {
            next.extend(subtract_one(x, *y).ranges);
        }
        current = next;
    }
    normalize(current)
}

/// True when every consecutive pair is separated by at least one value.
pub fn is_normalized(ranges: &[Range]) -> bool {
    ranges.iter().all(|r| r.start <= r.end)
        && ranges.windows(2).all(|w| !w[0].touches(&w[1]) && w[0].end < w[1].start)
}
