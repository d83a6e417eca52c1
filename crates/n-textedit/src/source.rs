//! Move/copy source payload and its cached-content state machine.
//!
//! A source edit's text is read from the document exactly once per `apply`
//! (phase 2), cached here, and handed to the paired target exactly once
//! (phase 3):
//!
//! ```text
//! Empty ──compute──▶ Computed ──take──▶ Consumed
//!                       │
//!                       └──peek (read without consuming)
//! ```
//!
//! Any other transition is an engine bug and surfaces as
//! [`EditError::SourceState`](crate::EditError::SourceState).

use std::fmt;

use crate::edit::EditId;
use crate::error::{EditError, Result};
use crate::modifier::SourceModifier;

// ---------------------------------------------------------------------------
// SourceState
// ---------------------------------------------------------------------------

/// Where a [`CachedSource`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceState {
    Empty,
    Computed,
    Consumed,
}

impl fmt::Display for SourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Empty => "not computed",
            Self::Computed => "already computed",
            Self::Consumed => "already consumed",
        })
    }
}

// ---------------------------------------------------------------------------
// CachedSource
// ---------------------------------------------------------------------------

/// The content a source edit contributes to its target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CachedSource {
    #[default]
    Empty,
    Computed(String),
    Consumed,
}

impl CachedSource {
    #[must_use]
    pub const fn state(&self) -> SourceState {
        match self {
            Self::Empty => SourceState::Empty,
            Self::Computed(_) => SourceState::Computed,
            Self::Consumed => SourceState::Consumed,
        }
    }

    /// Store freshly computed content. Only legal from `Empty`.
    ///
    /// # Errors
    ///
    /// `SourceState` if content was already computed or consumed.
    pub fn compute(&mut self, edit: EditId, content: String) -> Result<()> {
        match self {
            Self::Empty => {
                *self = Self::Computed(content);
                Ok(())
            }
            _ => Err(self.misuse(edit)),
        }
    }

    /// Read the content without consuming it.
    ///
    /// # Errors
    ///
    /// `SourceState` unless the content is `Computed`.
    pub fn peek(&self, edit: EditId) -> Result<&str> {
        match self {
            Self::Computed(content) => Ok(content),
            _ => Err(self.misuse(edit)),
        }
    }

    /// Hand the content over to the target. Only legal from `Computed`.
    ///
    /// # Errors
    ///
    /// `SourceState` unless the content is `Computed`.
    pub fn take(&mut self, edit: EditId) -> Result<String> {
        match std::mem::replace(self, Self::Consumed) {
            Self::Computed(content) => Ok(content),
            other => {
                *self = other;
                Err(self.misuse(edit))
            }
        }
    }

    fn misuse(&self, edit: EditId) -> EditError {
        EditError::SourceState {
            edit,
            state: self.state(),
        }
    }
}

// ---------------------------------------------------------------------------
// SourceLink
// ---------------------------------------------------------------------------

/// Payload shared by `CopySource` and `MoveSource` edits.
#[derive(Debug, Default)]
pub struct SourceLink {
    /// The paired target, once linked.
    pub(crate) target: Option<EditId>,
    /// Optional rewrite applied to the content before it reaches the target.
    pub(crate) modifier: Option<Box<dyn SourceModifier>>,
    pub(crate) content: CachedSource,
    /// Children detached from a move source in phase 2, normalized to start
    /// at offset 0, waiting to be re-parented under the move target.
    pub(crate) moved_children: Vec<EditId>,
}

impl SourceLink {
    #[must_use]
    pub const fn target(&self) -> Option<EditId> {
        self.target
    }

    #[must_use]
    pub fn modifier(&self) -> Option<&dyn SourceModifier> {
        self.modifier.as_deref()
    }

    #[must_use]
    pub const fn content(&self) -> &CachedSource {
        &self.content
    }

    /// A fresh link with the same modifier (cloned) and no partner, cache,
    /// or moved children.
    #[must_use]
    pub fn fresh_copy(&self) -> Self {
        Self {
            target: None,
            modifier: self.modifier.as_ref().map(|m| m.clone_box()),
            content: CachedSource::Empty,
            moved_children: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
