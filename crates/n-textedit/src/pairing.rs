//! Linking move/copy sources with their targets.
//!
//! A `CopySource` pairs with a `CopyTarget`, a `MoveSource` with a
//! `MoveTarget`. Links are stored on both sides and always kept symmetric:
//! rebinding one side detaches the stale partner.

use crate::edit::{EditId, EditKind, EditTree};
use crate::error::{EditError, Malformed, Result};
use crate::modifier::SourceModifier;

impl EditTree {
    /// Pair `source` with `target`.
    ///
    /// # Errors
    ///
    /// `MalformedTree` with
    /// - `NotPairable` if the kinds do not form a copy or move pair;
    /// - `Cycle` if `source` is an ancestor of `target`.
    ///
    /// Neither edit's links change on error.
    pub fn set_target_edit(&mut self, source: EditId, target: EditId) -> Result<()> {
        self.link(source, target)
    }

    /// Pair `target` with `source`. Same as
    /// [`set_target_edit`](Self::set_target_edit) seen from the other side.
    ///
    /// # Errors
    ///
    /// As for [`set_target_edit`](Self::set_target_edit).
    pub fn set_source_edit(&mut self, target: EditId, source: EditId) -> Result<()> {
        self.link(source, target)
    }

    /// The target paired with a source edit.
    #[must_use]
    pub fn target_of(&self, source: EditId) -> Option<EditId> {
        self.kind(source).source_link().and_then(|link| link.target)
    }

    /// The source paired with a target edit.
    #[must_use]
    pub fn source_of(&self, target: EditId) -> Option<EditId> {
        self.kind(target).target_source()
    }

    /// Attach a modifier that rewrites the source's text before it reaches
    /// the target. Replaces any previous modifier.
    ///
    /// # Errors
    ///
    /// `MalformedTree` with `NotPairable` if `source` is not a source edit.
    pub fn set_modifier(&mut self, source: EditId, modifier: Box<dyn SourceModifier>) -> Result<()> {
        let link = self
            .source_link_mut(source)
            .ok_or_else(|| EditError::malformed(None, Some(source), Malformed::NotPairable))?;
        link.modifier = Some(modifier);
        Ok(())
    }

    fn link(&mut self, source: EditId, target: EditId) -> Result<()> {
        let pairable = matches!(
            (self.kind(source), self.kind(target)),
            (EditKind::CopySource(_), EditKind::CopyTarget { .. })
                | (EditKind::MoveSource(_), EditKind::MoveTarget { .. })
        );
        if !pairable {
            return Err(EditError::malformed(Some(source), Some(target), Malformed::NotPairable));
        }
        if self.is_ancestor(source, target) {
            return Err(EditError::malformed(Some(source), Some(target), Malformed::Cycle));
        }

        if let Some(stale) = self.target_of(source).filter(|&t| t != target) {
            self.set_target_slot(stale, None);
        }
        if let Some(stale) = self.source_of(target).filter(|&s| s != source) {
            if let Some(link) = self.source_link_mut(stale) {
                link.target = None;
            }
        }

        if let Some(link) = self.source_link_mut(source) {
            link.target = Some(target);
        }
        self.set_target_slot(target, Some(source));
        Ok(())
    }

    fn set_target_slot(&mut self, target: EditId, value: Option<EditId>) {
        if let EditKind::CopyTarget { source } | EditKind::MoveTarget { source } =
            &mut self.node_mut(target).kind
        {
            *source = value;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
