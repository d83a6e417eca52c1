//! Executing an edit tree against a document.
//!
//! `apply` runs four phases over the tree below one root:
//!
//! 1. **Check.** Post-order walk that validates move/copy pairs and sorts
//!    every source whose content is not yet known into levels. A source
//!    sits one level above the sources feeding the targets inside it, so it
//!    is computed only after them. Within a level, nested sources come
//!    before their ancestors and later siblings before earlier ones. A final
//!    check rejects roots that reach past the document.
//! 2. **Compute sources.** Level by level, read each source's text. Nested
//!    edits inside a source are executed on a scratch copy of that text
//!    first, then the source's modifier runs. Once every source is known,
//!    move sources hand their children over to the target.
//! 3. **Update document.** Post-order walk, children last-to-first, so that
//!    earlier offsets stay valid while later ones change. Each edit records
//!    its own length delta.
//! 4. **Update regions.** Pre-order walk, children first-to-last, shifting
//!    every edit by the accumulated deltas before it and marking edits that
//!    ended up inside removed text as deleted.
//!
//! Phases 1 and 2 fail before the document or the tree's shape is touched,
//! so a tree rejected there can be fixed and applied again. Nested runs
//! (phase 2) skip pair validation: their trees are either checked already
//! or built by the engine itself.

use std::collections::HashMap;

use ropey::Rope;
use tracing::{debug, instrument, trace};

use n_text::{Document, OutOfRange, Region};

use crate::copier::{self, PairPolicy};
use crate::edit::{signed, EditId, EditKind, EditTree};
use crate::error::{EditError, Malformed, Result};
use crate::modifier::Replacement;
use crate::source::{CachedSource, SourceState};
use crate::style::ApplyStyle;
use crate::undo::{JournaledDocument, UndoJournal};

impl EditTree {
    /// Execute the tree below `root` against `document`.
    ///
    /// Returns the undo edit when `style` asks for one. Applying that undo
    /// edit restores the document's previous text. After the call `root` is
    /// detached from its parent, whether or not execution succeeded.
    ///
    /// # Errors
    ///
    /// - `MalformedTree` for invalid move/copy pairs, for a source enclosing
    ///   its own target, for sources that contain each other's targets, for
    ///   overlapping modifier output, or when part of the tree was applied
    ///   already. Neither the document nor the tree's shape has changed.
    /// - `BadLocation` when an edit reaches past the document. A root that
    ///   does so is caught before any mutation.
    #[instrument(skip_all, fields(root = %root, style = %style))]
    pub fn apply(
        &mut self,
        root: EditId,
        document: &mut dyn Document,
        style: ApplyStyle,
    ) -> Result<Option<EditId>> {
        debug!(
            edits = self.descendants(root).count(),
            doc_len = document.len(),
            "applying edit tree"
        );
        let result = Processor::new(self, style, Mode::Primary).execute(document, &[root]);
        self.detach(root);
        let journal = result?;

        let region = Region::new(self.offset(root), self.length(root));
        debug!(%region, doc_len = document.len(), "edit tree applied");
        Ok(journal.map(|journal| journal.into_undo(self, region)))
    }

    /// Run the validation `apply` starts with, without touching `document`.
    ///
    /// # Errors
    ///
    /// The `MalformedTree` and `BadLocation` errors `apply` would report
    /// before mutating.
    pub fn check(&mut self, root: EditId, document: &dyn Document) -> Result<()> {
        Processor::new(self, ApplyStyle::NONE, Mode::Primary).check(document, &[root])
    }
}

/// Whether pairs are validated. Nested runs skip it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Primary,
    Nested,
}

struct Processor<'t> {
    tree: &'t mut EditTree,
    style: ApplyStyle,
    mode: Mode,
    /// Sources to compute, by level; discovery order within a level.
    levels: Vec<Vec<EditId>>,
}

/// What document updating does for one edit.
enum Mutation {
    Nothing,
    Replace(String),
    Remove,
    Receive { source: EditId, moving: bool },
}

impl<'t> Processor<'t> {
    fn new(tree: &'t mut EditTree, style: ApplyStyle, mode: Mode) -> Self {
        Self {
            tree,
            style,
            mode,
            levels: Vec::new(),
        }
    }

    /// Run all phases over a forest of sibling roots. Returns the undo
    /// journal when `CREATE_UNDO` is set.
    fn execute(&mut self, doc: &mut dyn Document, roots: &[EditId]) -> Result<Option<UndoJournal>> {
        self.check(&*doc, roots)?;
        self.compute_sources(&*doc)?;

        let journal = if self.style.creates_undo() {
            let mut journaled = JournaledDocument::new(doc);
            self.update_document_forest(&mut journaled, roots)?;
            Some(journaled.into_journal())
        } else {
            self.update_document_forest(doc, roots)?;
            None
        };

        if self.style.updates_regions() {
            let mut acc = 0;
            for &root in roots {
                acc = self.update_regions(root, acc, false);
            }
        }
        Ok(journal)
    }

    // -- Phase 1 ------------------------------------------------------------

    fn check(&mut self, doc: &dyn Document, roots: &[EditId]) -> Result<()> {
        let mut pending = Vec::new();
        for &root in roots.iter().rev() {
            self.check_integrity(root, root, &mut pending)?;
        }
        self.levels = self.classify(&pending)?;
        trace!(sources = pending.len(), levels = self.levels.len(), "integrity checked");

        for &root in roots {
            let node = self.tree.node(root);
            if !node.deleted {
                OutOfRange::check(node.offset, node.length, doc.len())?;
            }
        }
        Ok(())
    }

    /// Validate `id`'s subtree and collect its uncomputed sources into
    /// `pending`, post-order with later siblings first.
    fn check_integrity(&self, id: EditId, root: EditId, pending: &mut Vec<EditId>) -> Result<()> {
        let node = self.tree.node(id);
        if self.mode == Mode::Primary && node.spent {
            return Err(EditError::malformed(node.parent, Some(id), Malformed::AlreadyApplied));
        }
        for &child in node.children.iter().rev() {
            self.check_integrity(child, root, pending)?;
        }

        let kind = self.tree.kind(id);
        if let Some(link) = kind.source_link() {
            if self.mode == Mode::Primary {
                let target = link
                    .target
                    .ok_or_else(|| EditError::malformed(None, Some(id), Malformed::MissingTarget))?;
                self.check_pair(id, target, root)?;
            }
            if link.content.state() == SourceState::Empty {
                pending.push(id);
            }
        } else if kind.is_target() && self.mode == Mode::Primary {
            let source = kind
                .target_source()
                .ok_or_else(|| EditError::malformed(None, Some(id), Malformed::MissingSource))?;
            self.check_pair(source, id, root)?;
        }
        Ok(())
    }

    fn check_pair(&self, source: EditId, target: EditId, root: EditId) -> Result<()> {
        let fail = |reason| EditError::malformed(Some(source), Some(target), reason);
        if self.tree.target_of(source) != Some(target) || self.tree.source_of(target) != Some(source) {
            return Err(fail(Malformed::InconsistentPair));
        }
        if self.tree.is_ancestor(source, target) {
            return Err(fail(Malformed::Cycle));
        }
        let within = |id: EditId| id == root || self.tree.is_ancestor(root, id);
        if !within(source) || !within(target) {
            return Err(fail(Malformed::PartnerOutsideTree));
        }
        Ok(())
    }

    /// Sort `pending` sources into levels, keeping their order within a level.
    fn classify(&self, pending: &[EditId]) -> Result<Vec<Vec<EditId>>> {
        let mut memo = HashMap::new();
        let mut levels: Vec<Vec<EditId>> = Vec::new();
        for &source in pending {
            let level = self.source_level(source, &mut memo)?;
            if levels.len() <= level {
                levels.resize_with(level + 1, Vec::new);
            }
            levels[level].push(source);
        }
        Ok(levels)
    }

    /// A source sits one level above every uncomputed source whose target
    /// lies inside it, so whatever it receives is known before its own text
    /// is read. `memo` holds `None` while a level is being computed.
    fn source_level(
        &self,
        source: EditId,
        memo: &mut HashMap<EditId, Option<usize>>,
    ) -> Result<usize> {
        match memo.get(&source) {
            Some(Some(level)) => return Ok(*level),
            Some(None) => {
                let target = self.tree.target_of(source);
                return Err(EditError::malformed(Some(source), target, Malformed::CircularSources));
            }
            None => {}
        }
        memo.insert(source, None);

        let mut level = 0;
        for id in self.tree.descendants(source) {
            let Some(feeder) = self.tree.kind(id).target_source() else {
                continue;
            };
            let uncomputed = self
                .tree
                .kind(feeder)
                .source_link()
                .is_some_and(|link| link.content.state() == SourceState::Empty);
            if uncomputed {
                level = level.max(self.source_level(feeder, memo)? + 1);
            }
        }
        memo.insert(source, Some(level));
        Ok(level)
    }

    // -- Phase 2 ------------------------------------------------------------

    /// Compute every scheduled source, then detach the children of move
    /// sources. Nothing in the tree changes until all content is known; on
    /// failure the computed content is dropped again.
    fn compute_sources(&mut self, doc: &dyn Document) -> Result<()> {
        let levels = std::mem::take(&mut self.levels);
        let scheduled: Vec<EditId> = levels.into_iter().flatten().collect();
        for (done, &source) in scheduled.iter().enumerate() {
            if let Err(error) = self.compute_source(doc, source) {
                self.forget(&scheduled[..done]);
                return Err(error);
            }
        }

        for &source in &scheduled {
            let moving = matches!(self.tree.kind(source), EditKind::MoveSource(_));
            if moving && self.tree.has_children(source) {
                self.detach_moved(doc, source)?;
            }
        }
        Ok(())
    }

    fn compute_source(&mut self, doc: &dyn Document, source: EditId) -> Result<()> {
        let node = self.tree.node(source);
        let (offset, length) = (node.offset, node.length);
        let has_children = !node.children.is_empty();

        let mut content = doc.get(offset, length)?;
        if has_children {
            content = self.run_on_copy(source, offset, length, content)?;
        }

        let replacements = self
            .tree
            .kind(source)
            .source_link()
            .and_then(|link| link.modifier.as_ref())
            .map(|modifier| modifier.modifications(&content));
        if let Some(replacements) = replacements {
            content = modify(source, content, replacements)?;
        }

        trace!(%source, offset, length, computed = content.chars().count(), "source computed");
        match self.tree.source_link_mut(source) {
            Some(link) => link.content.compute(source, content),
            None => Err(EditError::malformed(None, Some(source), Malformed::NotPairable)),
        }
    }

    /// Run a copy of a source's children against its text. The real
    /// children are left alone: a copy source keeps them in place, a move
    /// source hands them over in [`Self::detach_moved`].
    fn run_on_copy(
        &self,
        source: EditId,
        offset: usize,
        length: usize,
        content: String,
    ) -> Result<String> {
        let mut scratch_tree = EditTree::new();
        let root = scratch_tree.multi(0, length);
        let children = self.tree.children(source);
        for copy in copier::copy_forest(&*self.tree, children, &mut scratch_tree, PairPolicy::Lower)? {
            scratch_tree.shift_tree(copy, -signed(offset));
            scratch_tree
                .add_child(root, copy)
                .map_err(|e| reattribute(e, source))?;
        }

        let mut scratch = Rope::from_str(&content);
        Processor::new(&mut scratch_tree, ApplyStyle::NONE, Mode::Nested)
            .execute(&mut scratch, &[root])?;
        Ok(scratch.to_string())
    }

    /// Detach a move source's children, run them against its text, and park
    /// them (relative to offset 0) until the target adopts them.
    fn detach_moved(&mut self, doc: &dyn Document, source: EditId) -> Result<()> {
        let (offset, length) = (self.tree.offset(source), self.tree.length(source));
        let mut scratch = Rope::from_str(&doc.get(offset, length)?);

        let children = self.tree.remove_children(source);
        for &child in &children {
            self.tree.shift_tree(child, -signed(offset));
        }
        let style = self.style & ApplyStyle::UPDATE_REGIONS;
        Processor::new(&mut *self.tree, style, Mode::Nested).execute(&mut scratch, &children)?;

        if let Some(link) = self.tree.source_link_mut(source) {
            link.moved_children = children;
        }
        Ok(())
    }

    /// Drop content computed by a phase 2 that failed.
    fn forget(&mut self, sources: &[EditId]) {
        for &source in sources {
            if let Some(link) = self.tree.source_link_mut(source) {
                link.content = CachedSource::Empty;
            }
        }
    }

    // -- Phase 3 ------------------------------------------------------------

    fn update_document_forest(&mut self, doc: &mut dyn Document, roots: &[EditId]) -> Result<()> {
        for &root in roots.iter().rev() {
            self.update_document(doc, root)?;
        }
        Ok(())
    }

    /// Mutate the document for `id`'s subtree. Returns the total length
    /// change.
    fn update_document(&mut self, doc: &mut dyn Document, id: EditId) -> Result<isize> {
        let node = self.tree.node(id);
        let children = node.children.clone();
        let replay_in_order = matches!(node.kind, EditKind::Undo);

        let mut delta = 0;
        if replay_in_order {
            for &child in &children {
                delta += self.update_document(doc, child)?;
            }
        } else {
            for &child in children.iter().rev() {
                delta += self.update_document(doc, child)?;
            }
        }

        self.tree.node_mut(id).spent = true;
        self.tree.adjust_length(id, delta);

        let own = self.perform(doc, id)?;
        self.tree.adjust_length(id, own);
        self.tree.node_mut(id).delta = own;
        Ok(delta + own)
    }

    /// The edit's own mutation. Returns its length delta.
    fn perform(&mut self, doc: &mut dyn Document, id: EditId) -> Result<isize> {
        let node = self.tree.node(id);
        if node.deleted {
            return Ok(0);
        }
        let (offset, length) = (node.offset, node.length);
        let mutation = match &node.kind {
            EditKind::Insert { text } | EditKind::Replace { text } => Mutation::Replace(text.clone()),
            EditKind::Delete | EditKind::MoveSource(_) => Mutation::Remove,
            EditKind::CopyTarget { source } | EditKind::MoveTarget { source } => Mutation::Receive {
                source: source
                    .ok_or_else(|| EditError::malformed(None, Some(id), Malformed::MissingSource))?,
                moving: matches!(node.kind, EditKind::MoveTarget { .. }),
            },
            EditKind::Multi | EditKind::RangeMarker | EditKind::CopySource(_) | EditKind::Undo => {
                Mutation::Nothing
            }
        };

        match mutation {
            Mutation::Nothing => Ok(0),
            Mutation::Replace(text) => replace(doc, offset, length, &text),
            Mutation::Remove => replace(doc, offset, length, ""),
            Mutation::Receive { source, moving } => {
                let link = self.tree.source_link_mut(source).ok_or_else(|| {
                    EditError::malformed(Some(source), Some(id), Malformed::InconsistentPair)
                })?;
                let content = link.content.take(source)?;
                let moved = std::mem::take(&mut link.moved_children);
                let delta = replace(doc, offset, length, &content)?;
                if moving {
                    self.adopt(id, moved, offset);
                }
                Ok(delta)
            }
        }
    }

    /// Re-parent a move source's parked children under its target.
    fn adopt(&mut self, target: EditId, moved: Vec<EditId>, offset: usize) {
        for &child in &moved {
            self.tree.shift_tree(child, signed(offset));
            self.tree.node_mut(child).parent = Some(target);
        }
        self.tree.node_mut(target).children.extend(moved);
    }

    // -- Phase 4 ------------------------------------------------------------

    /// Shift `id`'s subtree by `acc` (or mark it deleted) and return the
    /// accumulated delta after it, including everything nested inside.
    fn update_regions(&mut self, id: EditId, acc: isize, delete: bool) -> isize {
        let node = self.tree.node(id);
        let own = node.delta;
        let is_move_target = matches!(node.kind, EditKind::MoveTarget { .. });
        let is_undo = matches!(node.kind, EditKind::Undo);
        let child_delete = delete || node.kind.deletes_children();
        let children = node.children.clone();

        if is_move_target {
            // Adopted children were placed by the nested run already.
            if delete {
                self.tree.delete_tree(id);
            } else {
                self.tree.shift_tree(id, acc);
            }
            return acc + own;
        }

        self.shift_or_delete(id, acc, delete);
        let mut acc = acc;
        // Recorded replacements are consumed, not tracked.
        if !is_undo {
            for child in children {
                acc = self.update_regions(child, acc, child_delete);
            }
        }
        acc + own
    }

    fn shift_or_delete(&mut self, id: EditId, acc: isize, delete: bool) {
        if delete {
            self.tree.mark_deleted(id);
        } else {
            self.tree.adjust_offset(id, acc);
        }
    }
}

/// Replace and log one range. Returns the length delta.
fn replace(doc: &mut dyn Document, offset: usize, length: usize, text: &str) -> Result<isize> {
    trace!(offset, length, inserted = text.chars().count(), "replace");
    doc.replace(offset, length, text)?;
    Ok(signed(text.chars().count()) - signed(length))
}

/// Apply a modifier's replacements to `content` through a nested tree, so
/// overlapping replacements fail like any other malformed tree.
fn modify(source: EditId, content: String, replacements: Vec<Replacement>) -> Result<String> {
    if replacements.is_empty() {
        return Ok(content);
    }
    let mut scratch_tree = EditTree::new();
    let root = scratch_tree.multi(0, content.chars().count());
    for Replacement { offset, length, text } in replacements {
        let edit = scratch_tree.replace(offset, length, text);
        scratch_tree
            .add_child(root, edit)
            .map_err(|e| reattribute(e, source))?;
    }

    let mut scratch = Rope::from_str(&content);
    Processor::new(&mut scratch_tree, ApplyStyle::NONE, Mode::Nested).execute(&mut scratch, &[root])?;
    Ok(scratch.to_string())
}

/// Errors from a scratch tree name scratch ids; point them at the source.
fn reattribute(error: EditError, source: EditId) -> EditError {
    match error.malformed_reason() {
        Some(reason) => EditError::malformed(Some(source), None, reason),
        None => error,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
