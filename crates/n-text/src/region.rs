// SPDX-License-Identifier: MIT
//
// Char-indexed regions.
//
// Every offset in this workspace counts Unicode scalar values (chars), not
// bytes. That is the rope's native index and the only coordinate the edit
// engine ever sees. Line/column conversion belongs to richer document
// services layered on top; it never leaks in here.

use std::fmt;

// ---------------------------------------------------------------------------
// Region
// ---------------------------------------------------------------------------

/// A half-open char range `[offset, offset + length)`.
///
/// A region with `length == 0` is an *insertion point*: it covers no text
/// but still has a well-defined position.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Region {
    pub offset: usize,
    pub length: usize,
}

impl Region {
    /// The empty region at offset 0.
    pub const ZERO: Self = Self {
        offset: 0,
        length: 0,
    };

    /// Create a region.
    #[inline]
    #[must_use]
    pub const fn new(offset: usize, length: usize) -> Self {
        Self { offset, length }
    }

    /// A zero-length region (insertion point) at `offset`.
    #[inline]
    #[must_use]
    pub const fn point(offset: usize) -> Self {
        Self { offset, length: 0 }
    }

    /// Exclusive end: the first offset past the region. Saturates at
    /// `usize::MAX`.
    #[inline]
    #[must_use]
    pub const fn end(self) -> usize {
        self.offset.saturating_add(self.length)
    }

    /// True when the region spans zero chars.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.length == 0
    }

    /// True when `offset` lies inside the region. The end is exclusive, so an
    /// empty region contains nothing.
    #[inline]
    #[must_use]
    pub const fn contains(self, offset: usize) -> bool {
        offset >= self.offset && offset < self.end()
    }

    /// True when `other` lies entirely within `self` (inclusive of both
    /// boundaries). An empty `other` sitting exactly at `self.end()` is
    /// covered.
    #[inline]
    #[must_use]
    pub const fn covers(self, other: Self) -> bool {
        self.offset <= other.offset && other.end() <= self.end()
    }

    /// True when the two regions share at least one char. Touching regions
    /// (`a.end() == b.offset`) do not overlap, and empty regions overlap
    /// nothing.
    #[inline]
    #[must_use]
    pub const fn overlaps(self, other: Self) -> bool {
        self.offset < other.end() && other.offset < self.end()
    }

    /// The smallest region covering both `self` and `other`.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        let offset = self.offset.min(other.offset);
        let end = self.end().max(other.end());
        Self::new(offset, end - offset)
    }

    /// Shift the region by a signed delta. Returns `None` if the result would
    /// start before offset 0.
    #[must_use]
    pub const fn shifted(self, delta: isize) -> Option<Self> {
        match self.offset.checked_add_signed(delta) {
            Some(offset) => Some(Self::new(offset, self.length)),
            None => None,
        }
    }
}

impl fmt::Debug for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Region[{},{}]", self.offset, self.length)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.offset, self.length)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
