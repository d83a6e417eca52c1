// SPDX-License-Identifier: MIT
//
// The document contract.
//
// The edit engine needs exactly three things from a document: its length,
// a way to read a range, and a way to replace a range. Anything richer
// (line tables, partitioning, change notification fan-out) is layered on
// top by whoever owns the document; none of it belongs here.

use ropey::Rope;
use thiserror::Error;

use crate::region::Region;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A read or replace addressed chars outside the document.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("range [{offset},{length}] lies outside document of length {doc_len}")]
pub struct OutOfRange {
    pub offset: usize,
    pub length: usize,
    pub doc_len: usize,
}

impl OutOfRange {
    /// Check that `[offset, offset + length)` fits inside a document of
    /// `doc_len` chars.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` when the range ends past `doc_len` (or its end
    /// overflows).
    pub const fn check(offset: usize, length: usize, doc_len: usize) -> Result<(), Self> {
        match offset.checked_add(length) {
            Some(end) if end <= doc_len => Ok(()),
            _ => Err(Self {
                offset,
                length,
                doc_len,
            }),
        }
    }

    /// The offending range as a [`Region`].
    #[must_use]
    pub const fn region(&self) -> Region {
        Region::new(self.offset, self.length)
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// A mutable, char-indexed text buffer.
///
/// The trait is object safe: the edit engine drives documents through
/// `&mut dyn Document` so that it can stack decorators (the undo journal)
/// over whatever the caller passed in.
pub trait Document {
    /// Total length in chars.
    fn len(&self) -> usize;

    /// True when the document holds no text.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy out `length` chars starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRange`] when the range does not fit in the document.
    fn get(&self, offset: usize, length: usize) -> Result<String, OutOfRange>;

    /// Replace `length` chars at `offset` with `text`.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRange`] when the range does not fit in the document.
    /// The document is unchanged in that case.
    fn replace(&mut self, offset: usize, length: usize, text: &str) -> Result<(), OutOfRange>;

    /// The whole document as a `String`.
    fn text(&self) -> String {
        self.get(0, self.len()).unwrap_or_default()
    }
}

impl Document for Rope {
    #[inline]
    fn len(&self) -> usize {
        self.len_chars()
    }

    fn get(&self, offset: usize, length: usize) -> Result<String, OutOfRange> {
        OutOfRange::check(offset, length, self.len_chars())?;
        Ok(self.slice(offset..offset + length).to_string())
    }

    fn replace(&mut self, offset: usize, length: usize, text: &str) -> Result<(), OutOfRange> {
        OutOfRange::check(offset, length, self.len_chars())?;
        if length > 0 {
            self.remove(offset..offset + length);
        }
        if !text.is_empty() {
            self.insert(offset, text);
        }
        Ok(())
    }

    fn text(&self) -> String {
        self.to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
