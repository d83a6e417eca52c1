// SPDX-License-Identifier: MIT
//
// n-edit: transactional, tree-structured text edits.
//
// This facade ties the workspace together:
//
//   n-text     → Region, the Document contract, rope-backed documents
//   n-textedit → edit trees, move/copy pairs, modifiers, apply, undo
//
// A caller builds an `EditTree`, adds edits under a root, pairs move/copy
// sources with their targets, and applies the root to any `Document`:
//
//   build tree → apply(root, doc, style) → check → compute sources
//              → update document (+ undo journal) → update regions

pub use n_text::{Document, OutOfRange, Region, TextDocument};
pub use n_textedit::{
    ApplyStyle, CachedSource, EditError, EditGroup, EditId, EditKind, EditTree, EditVisitor,
    Malformed, ParseStyleError, PatternModifier, Reindent, Replacement, Result, SourceModifier,
    SourceState,
};

/// The workspace crates, for paths the re-exports above do not cover.
pub mod crates {
    pub use n_text as text;
    pub use n_textedit as textedit;
}
