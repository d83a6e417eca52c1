//! Engine errors.
//!
//! Two kinds reach callers of a well-formed `apply`: `MalformedTree` (raised
//! before the document is touched, safe to retry after fixing the tree) and
//! `BadLocation` (the document may already be partially mutated). The third,
//! `SourceState`, only fires when the engine's own move/copy bookkeeping is
//! driven out of order and indicates an engine bug, not a caller mistake.

use n_text::OutOfRange;
use thiserror::Error;

use crate::edit::EditId;
use crate::source::SourceState;

pub type Result<T> = std::result::Result<T, EditError>;

/// Why an edit tree is malformed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Malformed {
    #[error("cannot add a deleted edit")]
    DeletedChild,
    #[error("cannot add to a deleted edit")]
    DeletedParent,
    #[error("range of child edit lies outside of parent edit")]
    OutsideParent,
    #[error("overlapping text edits")]
    Overlap,
    #[error("edit already has a parent")]
    AlreadyParented,
    #[error("edit cannot become a descendant of itself")]
    SelfNesting,
    #[error("an undo edit cannot be added to another edit")]
    UndoAsChild,
    #[error("an undo edit only holds recorded replacements")]
    UndoAsParent,
    #[error("source edit has no target edit")]
    MissingTarget,
    #[error("target edit has no source edit")]
    MissingSource,
    #[error("source and target edit do not point at each other")]
    InconsistentPair,
    #[error("source edit is an ancestor of its own target edit")]
    Cycle,
    #[error("move/copy sources contain each other's targets")]
    CircularSources,
    #[error("partner edit is not part of the tree being applied")]
    PartnerOutsideTree,
    #[error("edit has already been applied")]
    AlreadyApplied,
    #[error("edit is not a move/copy source or target")]
    NotPairable,
    #[error("only an unparented edit can be moved")]
    MoveParented,
    #[error("tree would start before offset 0")]
    NegativeOffset,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    /// A structural invariant does not hold. `parent`/`child` name the edits
    /// involved, where they are known.
    #[error("malformed edit tree: {reason} (parent {parent:?}, child {child:?})")]
    MalformedTree {
        parent: Option<EditId>,
        child: Option<EditId>,
        reason: Malformed,
    },

    /// A range fell outside the document.
    #[error("bad location [{offset},{length}] in document of length {doc_len}")]
    BadLocation {
        offset: usize,
        length: usize,
        doc_len: usize,
    },

    /// Cached move/copy content was read in the wrong state.
    #[error("source content of edit {edit:?} is {state}")]
    SourceState { edit: EditId, state: SourceState },
}

impl EditError {
    #[must_use]
    pub const fn malformed(parent: Option<EditId>, child: Option<EditId>, reason: Malformed) -> Self {
        Self::MalformedTree {
            parent,
            child,
            reason,
        }
    }

    /// The malformed-tree reason, if this is a `MalformedTree` error.
    #[must_use]
    pub const fn malformed_reason(&self) -> Option<Malformed> {
        match self {
            Self::MalformedTree { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    /// True for errors raised after the document may have been touched.
    #[must_use]
    pub const fn is_bad_location(&self) -> bool {
        matches!(self, Self::BadLocation { .. })
    }
}

impl From<OutOfRange> for EditError {
    fn from(e: OutOfRange) -> Self {
        Self::BadLocation {
            offset: e.offset,
            length: e.length,
            doc_len: e.doc_len,
        }
    }
}
