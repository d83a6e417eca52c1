//! Undo recording.
//!
//! While document updating runs with `CREATE_UNDO`, the document is wrapped
//! in a [`JournaledDocument`] that captures the text each replacement
//! overwrites. Every replacement yields its inverse, newest first; replaying
//! the inverses in that order restores the original text.

use n_text::{Document, OutOfRange, Region};

use crate::edit::{EditId, EditKind, EditTree};

/// One inverse replacement: put `text` back over `length` chars at `offset`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Inverse {
    offset: usize,
    length: usize,
    text: String,
}

/// Inverses recorded during one `apply`, in execution order.
#[derive(Debug, Default)]
pub(crate) struct UndoJournal {
    inverses: Vec<Inverse>,
}

impl UndoJournal {
    /// Materialize the journal as an `Undo` root covering `region`, with
    /// one `Replace` child per recorded replacement, newest first.
    pub(crate) fn into_undo(self, tree: &mut EditTree, region: Region) -> EditId {
        let undo = tree.alloc(EditKind::Undo, region.offset, region.length);
        let mut children = Vec::with_capacity(self.inverses.len());
        for inverse in self.inverses.into_iter().rev() {
            let child = tree.replace(inverse.offset, inverse.length, inverse.text);
            tree.node_mut(child).parent = Some(undo);
            children.push(child);
        }
        tree.node_mut(undo).children = children;
        undo
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.inverses.len()
    }
}

/// A document decorator that journals every replacement.
pub(crate) struct JournaledDocument<'d> {
    inner: &'d mut dyn Document,
    journal: UndoJournal,
}

impl<'d> JournaledDocument<'d> {
    pub(crate) fn new(inner: &'d mut dyn Document) -> Self {
        Self {
            inner,
            journal: UndoJournal::default(),
        }
    }

    pub(crate) fn into_journal(self) -> UndoJournal {
        self.journal
    }
}

impl Document for JournaledDocument<'_> {
    fn len(&self) -> usize {
        self.inner.len()
    }

    fn get(&self, offset: usize, length: usize) -> Result<String, OutOfRange> {
        self.inner.get(offset, length)
    }

    fn replace(&mut self, offset: usize, length: usize, text: &str) -> Result<(), OutOfRange> {
        let previous = self.inner.get(offset, length)?;
        self.inner.replace(offset, length, text)?;
        self.journal.inverses.push(Inverse {
            offset,
            length: text.chars().count(),
            text: previous,
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
