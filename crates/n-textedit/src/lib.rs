//! # n-textedit: tree-structured, transactional text edits
//!
//! A caller builds a tree of edits over a document, then applies it in one
//! pass. The engine validates the tree, computes move/copy content, mutates
//! the document, and optionally produces an undo edit and post-mutation
//! regions for every edit.
//!
//! - **[`edit`]**: `EditTree` arena, `EditId`, `EditKind`, and the tree builder
//! - **[`modifier`]**: rewriting moved/copied text (`Reindent`, `PatternModifier`)
//! - **[`source`]**: cached move/copy content and its state machine
//! - **[`visitor`]**: traversal and tree printing
//! - **[`group`]**: named sets of edits
//! - **[`style`]**: `ApplyStyle` flags
//!
//! Pairing (`set_target_edit`), copying (`copy`, `copy_to`) and execution
//! (`apply`, `check`) are methods on [`EditTree`].
//!
//! ```
//! use n_textedit::{ApplyStyle, EditTree};
//! use ropey::Rope;
//!
//! let mut doc = Rope::from_str("hello world");
//! let mut tree = EditTree::new();
//! let root = tree.multi(0, 11);
//! let greeting = tree.replace(0, 5, "goodbye");
//! let marker = tree.range_marker(6, 5);
//! tree.add_children(root, &[greeting, marker]).unwrap();
//!
//! let undo = tree.apply(root, &mut doc, ApplyStyle::default()).unwrap().unwrap();
//! assert_eq!(doc.to_string(), "goodbye world");
//! assert_eq!(tree.offset(marker), 8);
//!
//! tree.apply(undo, &mut doc, ApplyStyle::NONE).unwrap();
//! assert_eq!(doc.to_string(), "hello world");
//! ```

mod copier;
pub mod edit;
pub mod error;
pub mod group;
pub mod modifier;
mod pairing;
mod processor;
pub mod source;
pub mod style;
mod undo;
pub mod visitor;

pub use edit::{Descendants, EditId, EditKind, EditTree};
pub use error::{EditError, Malformed, Result};
pub use group::EditGroup;
pub use modifier::{PatternModifier, Reindent, Replacement, SourceModifier};
pub use source::{CachedSource, SourceLink, SourceState};
pub use style::{ApplyStyle, ParseStyleError};
pub use visitor::{EditVisitor, TreeDisplay};
