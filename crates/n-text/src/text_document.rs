// SPDX-License-Identifier: MIT
//
// Rope-backed document with change metadata.
//
// `TextDocument` is the document callers hand to the edit engine. It wraps a
// `ropey::Rope` (O(log n) replace anywhere, char-native indexing) and tracks
// two pieces of metadata the engine itself never looks at:
//
// - a `modified` flag, cleared by `mark_saved`;
// - a `revision` counter, bumped on every successful replace, so callers can
//   tell whether a document changed between two points without diffing.

use std::fmt;

use ropey::{Rope, RopeSlice};

use crate::document::{Document, OutOfRange};
use crate::region::Region;

/// A text document backed by a rope.
pub struct TextDocument {
    rope: Rope,
    modified: bool,
    revision: u64,
}

impl TextDocument {
    // -- Construction -------------------------------------------------------

    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rope: Rope::new(),
            modified: false,
            revision: 0,
        }
    }

    /// Create a document holding `text`. The document starts unmodified.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            modified: false,
            revision: 0,
        }
    }

    // -- Text access --------------------------------------------------------

    /// The underlying rope.
    #[inline]
    #[must_use]
    pub const fn rope(&self) -> &Rope {
        &self.rope
    }

    /// Zero-copy view of a region. Returns `None` if the region does not fit.
    #[must_use]
    pub fn slice(&self, region: Region) -> Option<RopeSlice<'_>> {
        OutOfRange::check(region.offset, region.length, self.rope.len_chars()).ok()?;
        Some(self.rope.slice(region.offset..region.end()))
    }

    /// Total byte count. Offsets never use bytes; this is for sizing only.
    #[inline]
    #[must_use]
    pub fn len_bytes(&self) -> usize {
        self.rope.len_bytes()
    }

    // -- Metadata -----------------------------------------------------------

    /// True if the document changed since creation or the last
    /// [`mark_saved`](Self::mark_saved).
    #[inline]
    #[must_use]
    pub const fn is_modified(&self) -> bool {
        self.modified
    }

    /// Clear the modified flag.
    #[inline]
    pub const fn mark_saved(&mut self) {
        self.modified = false;
    }

    /// Number of successful replaces applied so far.
    #[inline]
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }
}

impl Document for TextDocument {
    #[inline]
    fn len(&self) -> usize {
        self.rope.len_chars()
    }

    fn get(&self, offset: usize, length: usize) -> Result<String, OutOfRange> {
        self.rope.get(offset, length)
    }

    fn replace(&mut self, offset: usize, length: usize, text: &str) -> Result<(), OutOfRange> {
        Document::replace(&mut self.rope, offset, length, text)?;
        self.modified = true;
        self.revision += 1;
        Ok(())
    }

    fn text(&self) -> String {
        self.rope.to_string()
    }
}

impl Default for TextDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for TextDocument {
    fn from(text: &str) -> Self {
        Self::from_text(text)
    }
}

impl fmt::Debug for TextDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextDocument")
            .field("chars", &self.rope.len_chars())
            .field("modified", &self.modified)
            .field("revision", &self.revision)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
