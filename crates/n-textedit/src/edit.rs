//! Edits and the arena that owns them.
//!
//! An edit describes one operation on a char range of a document. Edits form
//! a tree: a parent covers all its children, and children never overlap.
//! Every edit lives in an [`EditTree`] arena and is addressed by an
//! [`EditId`]; parent and child links are ids, never references, so a tree
//! can be restructured freely without fighting ownership.
//!
//! # Well-formedness
//!
//! [`EditTree::add_child`] enforces, eagerly:
//!
//! - the child's range lies inside the parent's range;
//! - siblings do not overlap, except that any number of zero-length
//!   (insertion point) edits may share an offset, and execute in the order
//!   they were added;
//! - zero-length edits cannot have children (a zero-length [`EditKind::Multi`]
//!   is the exception: it may hold insertions at its own offset);
//! - deleted edits neither gain nor become children;
//! - undo edits are roots only.
//!
//! Violations fail with [`Malformed`] before anything touches a document.

use std::cmp::Ordering;
use std::fmt;

use n_text::Region;

use crate::error::{EditError, Malformed, Result};
use crate::source::SourceLink;

// ---------------------------------------------------------------------------
// EditId
// ---------------------------------------------------------------------------

/// Handle to an edit inside the [`EditTree`] that created it.
///
/// Ids are plain indices. Using an id with a tree other than the one that
/// issued it addresses an unrelated edit (or panics if out of bounds).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EditId(u32);

impl EditId {
    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) const fn from_raw(index: usize) -> Self {
        Self(index as u32)
    }

    /// Position of the edit in its arena.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for EditId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for EditId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// EditKind
// ---------------------------------------------------------------------------

/// What an edit does, with its per-kind payload.
#[derive(Debug)]
pub enum EditKind {
    /// Pure container. Changes nothing itself.
    Multi,
    /// Insert `text` at the edit's (zero-length) offset.
    Insert { text: String },
    /// Remove the edit's range.
    Delete,
    /// Replace the edit's range with `text`.
    Replace { text: String },
    /// Track a range through the mutation without changing it.
    RangeMarker,
    /// Provide the range's (processed) text to a `CopyTarget`.
    CopySource(SourceLink),
    /// Receive a `CopySource`'s text at this offset.
    CopyTarget { source: Option<EditId> },
    /// Remove the range's text and its nested edits, reappearing at a
    /// `MoveTarget`.
    MoveSource(SourceLink),
    /// Receive a `MoveSource`'s text and nested edits at this offset.
    MoveTarget { source: Option<EditId> },
    /// Inverse of an executed change: a root holding recorded `Replace`
    /// edits, replayed in stored order.
    Undo,
}

impl EditKind {
    /// Short display name, used by tree printing and logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Multi => "Multi",
            Self::Insert { .. } => "Insert",
            Self::Delete => "Delete",
            Self::Replace { .. } => "Replace",
            Self::RangeMarker => "RangeMarker",
            Self::CopySource(_) => "CopySource",
            Self::CopyTarget { .. } => "CopyTarget",
            Self::MoveSource(_) => "MoveSource",
            Self::MoveTarget { .. } => "MoveTarget",
            Self::Undo => "Undo",
        }
    }

    /// True for kinds whose children end up inside removed text, so that
    /// region updating marks them deleted.
    #[must_use]
    pub const fn deletes_children(&self) -> bool {
        matches!(self, Self::Delete | Self::Replace { .. })
    }

    /// True for kinds that may hold children even with zero length.
    #[must_use]
    pub const fn can_zero_length_cover(&self) -> bool {
        matches!(self, Self::Multi | Self::Undo)
    }

    #[must_use]
    pub const fn is_source(&self) -> bool {
        matches!(self, Self::CopySource(_) | Self::MoveSource(_))
    }

    #[must_use]
    pub const fn is_target(&self) -> bool {
        matches!(self, Self::CopyTarget { .. } | Self::MoveTarget { .. })
    }

    /// Replacement text of an `Insert` or `Replace`.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Insert { text } | Self::Replace { text } => Some(text),
            _ => None,
        }
    }

    /// Source payload of a `CopySource` or `MoveSource`.
    #[must_use]
    pub const fn source_link(&self) -> Option<&SourceLink> {
        match self {
            Self::CopySource(link) | Self::MoveSource(link) => Some(link),
            _ => None,
        }
    }

    pub(crate) const fn source_link_mut(&mut self) -> Option<&mut SourceLink> {
        match self {
            Self::CopySource(link) | Self::MoveSource(link) => Some(link),
            _ => None,
        }
    }

    /// The source a `CopyTarget` or `MoveTarget` is paired with.
    #[must_use]
    pub const fn target_source(&self) -> Option<EditId> {
        match self {
            Self::CopyTarget { source } | Self::MoveTarget { source } => *source,
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// One arena slot.
#[derive(Debug)]
pub(crate) struct Node {
    pub(crate) kind: EditKind,
    pub(crate) offset: usize,
    pub(crate) length: usize,
    pub(crate) deleted: bool,
    pub(crate) parent: Option<EditId>,
    /// Offset-sorted; zero-length ties in insertion order.
    pub(crate) children: Vec<EditId>,
    /// This edit's own length change, recorded by document updating and
    /// replayed by region updating.
    pub(crate) delta: isize,
    /// Set once the edit has been executed.
    pub(crate) spent: bool,
}

impl Node {
    const fn new(kind: EditKind, offset: usize, length: usize) -> Self {
        Self {
            kind,
            offset,
            length,
            deleted: false,
            parent: None,
            children: Vec::new(),
            delta: 0,
            spent: false,
        }
    }

    #[inline]
    const fn end(&self) -> usize {
        self.offset.saturating_add(self.length)
    }
}

/// Ordering of two siblings, or `None` when they overlap.
///
/// Two insertion points at the same offset compare equal; the caller places
/// the new one after the whole run of equals.
fn compare_siblings(a: &Node, b: &Node) -> Option<Ordering> {
    if a.offset == b.offset && a.length == 0 && b.length == 0 {
        Some(Ordering::Equal)
    } else if a.end() <= b.offset {
        Some(Ordering::Less)
    } else if b.end() <= a.offset {
        Some(Ordering::Greater)
    } else {
        None
    }
}

/// Signed view of a char count. Documents never approach `isize::MAX` chars.
#[inline]
pub(crate) fn signed(n: usize) -> isize {
    isize::try_from(n).unwrap_or(isize::MAX)
}

// ---------------------------------------------------------------------------
// EditTree
// ---------------------------------------------------------------------------

/// Arena owning a set of edits and the trees they form.
///
/// A single arena can hold many independent trees (and loose, un-parented
/// edits); an `apply` call executes the tree below one root.
#[derive(Debug, Default)]
pub struct EditTree {
    nodes: Vec<Node>,
}

impl EditTree {
    /// Create an empty arena.
    #[must_use]
    pub const fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Number of edits ever allocated in this arena.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn alloc(&mut self, kind: EditKind, offset: usize, length: usize) -> EditId {
        let id = EditId::from_raw(self.nodes.len());
        self.nodes.push(Node::new(kind, offset, length));
        id
    }

    #[inline]
    pub(crate) fn node(&self, id: EditId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, id: EditId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub(crate) fn source_link_mut(&mut self, id: EditId) -> Option<&mut SourceLink> {
        self.node_mut(id).kind.source_link_mut()
    }

    // -- Construction -------------------------------------------------------

    /// A container covering `[offset, offset + length)`.
    pub fn multi(&mut self, offset: usize, length: usize) -> EditId {
        self.alloc(EditKind::Multi, offset, length)
    }

    /// Insert `text` at `offset`.
    pub fn insert(&mut self, offset: usize, text: impl Into<String>) -> EditId {
        self.alloc(EditKind::Insert { text: text.into() }, offset, 0)
    }

    /// Delete `length` chars at `offset`.
    pub fn delete(&mut self, offset: usize, length: usize) -> EditId {
        self.alloc(EditKind::Delete, offset, length)
    }

    /// Replace `length` chars at `offset` with `text`.
    pub fn replace(&mut self, offset: usize, length: usize, text: impl Into<String>) -> EditId {
        self.alloc(EditKind::Replace { text: text.into() }, offset, length)
    }

    /// Track `[offset, offset + length)` without changing it.
    pub fn range_marker(&mut self, offset: usize, length: usize) -> EditId {
        self.alloc(EditKind::RangeMarker, offset, length)
    }

    /// Copy `[offset, offset + length)` to a target set with
    /// [`set_target_edit`](Self::set_target_edit).
    pub fn copy_source(&mut self, offset: usize, length: usize) -> EditId {
        self.alloc(EditKind::CopySource(SourceLink::default()), offset, length)
    }

    /// Receive copied text at `offset`.
    pub fn copy_target(&mut self, offset: usize) -> EditId {
        self.alloc(EditKind::CopyTarget { source: None }, offset, 0)
    }

    /// Move `[offset, offset + length)` to a target set with
    /// [`set_target_edit`](Self::set_target_edit).
    pub fn move_source(&mut self, offset: usize, length: usize) -> EditId {
        self.alloc(EditKind::MoveSource(SourceLink::default()), offset, length)
    }

    /// Receive moved text at `offset`.
    pub fn move_target(&mut self, offset: usize) -> EditId {
        self.alloc(EditKind::MoveTarget { source: None }, offset, 0)
    }

    // -- Accessors ----------------------------------------------------------

    #[must_use]
    pub fn kind(&self, id: EditId) -> &EditKind {
        &self.node(id).kind
    }

    /// Current offset. Meaningless once [`is_deleted`](Self::is_deleted).
    #[must_use]
    pub fn offset(&self, id: EditId) -> usize {
        self.node(id).offset
    }

    /// Current length. Meaningless once [`is_deleted`](Self::is_deleted).
    #[must_use]
    pub fn length(&self, id: EditId) -> usize {
        self.node(id).length
    }

    /// Current region, or `None` for a deleted edit.
    #[must_use]
    pub fn region(&self, id: EditId) -> Option<Region> {
        let node = self.node(id);
        (!node.deleted).then(|| Region::new(node.offset, node.length))
    }

    /// True when region updating found the edit inside removed text.
    #[must_use]
    pub fn is_deleted(&self, id: EditId) -> bool {
        self.node(id).deleted
    }

    /// True once the edit has been executed by `apply`.
    #[must_use]
    pub fn is_applied(&self, id: EditId) -> bool {
        self.node(id).spent
    }

    #[must_use]
    pub fn parent(&self, id: EditId) -> Option<EditId> {
        self.node(id).parent
    }

    /// Children in execution (offset) order.
    #[must_use]
    pub fn children(&self, id: EditId) -> &[EditId] {
        &self.node(id).children
    }

    #[must_use]
    pub fn has_children(&self, id: EditId) -> bool {
        !self.node(id).children.is_empty()
    }

    /// Text of an `Insert` or `Replace`.
    #[must_use]
    pub fn text(&self, id: EditId) -> Option<&str> {
        self.node(id).kind.text()
    }

    /// The topmost ancestor of `id` (itself when un-parented).
    #[must_use]
    pub fn root_of(&self, id: EditId) -> EditId {
        let mut current = id;
        while let Some(parent) = self.node(current).parent {
            current = parent;
        }
        current
    }

    /// True when `ancestor` is a strict ancestor of `id`.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: EditId, id: EditId) -> bool {
        let mut current = self.node(id).parent;
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.node(parent).parent;
        }
        false
    }

    /// Pre-order walk of `root` and everything below it.
    #[must_use]
    pub fn descendants(&self, root: EditId) -> Descendants<'_> {
        Descendants {
            tree: self,
            stack: vec![root],
        }
    }

    // -- Tree building ------------------------------------------------------

    /// True when `parent`'s range can hold `child`'s range.
    #[must_use]
    pub fn covers(&self, parent: EditId, child: EditId) -> bool {
        let p = self.node(parent);
        let c = self.node(child);
        if p.length == 0 && !p.kind.can_zero_length_cover() {
            return false;
        }
        p.offset <= c.offset && c.end() <= p.end()
    }

    /// Add `child` under `parent` at its offset-ordered position.
    ///
    /// # Errors
    ///
    /// `MalformedTree` when the child is deleted, already parented, an undo
    /// edit, not covered by the parent, or overlaps a sibling; or when the
    /// parent is deleted or an undo edit, or would become its own descendant.
    pub fn add_child(&mut self, parent: EditId, child: EditId) -> Result<()> {
        let fail = |reason| EditError::malformed(Some(parent), Some(child), reason);

        if matches!(self.node(child).kind, EditKind::Undo) {
            return Err(fail(Malformed::UndoAsChild));
        }
        if matches!(self.node(parent).kind, EditKind::Undo) {
            return Err(fail(Malformed::UndoAsParent));
        }
        if self.node(child).parent.is_some() {
            return Err(fail(Malformed::AlreadyParented));
        }
        if child == parent || self.is_ancestor(child, parent) {
            return Err(fail(Malformed::SelfNesting));
        }
        if self.node(child).deleted {
            return Err(fail(Malformed::DeletedChild));
        }
        if self.node(parent).deleted {
            return Err(fail(Malformed::DeletedParent));
        }
        if !self.covers(parent, child) {
            return Err(fail(Malformed::OutsideParent));
        }

        let index = self.insertion_index(parent, child).ok_or_else(|| fail(Malformed::Overlap))?;
        self.node_mut(parent).children.insert(index, child);
        self.node_mut(child).parent = Some(parent);
        Ok(())
    }

    /// Add several children, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// See [`add_child`](Self::add_child). Children added before the failing
    /// one stay attached.
    pub fn add_children(&mut self, parent: EditId, children: &[EditId]) -> Result<()> {
        children
            .iter()
            .try_for_each(|&child| self.add_child(parent, child))
    }

    /// Where `child` goes among `parent`'s children, or `None` on overlap.
    fn insertion_index(&self, parent: EditId, child: EditId) -> Option<usize> {
        let siblings = &self.node(parent).children;
        let new = self.node(child);

        let Some(&last) = siblings.last() else {
            return Some(0);
        };
        if self.node(last).end() <= new.offset {
            return Some(siblings.len());
        }

        let mut overlap = false;
        let found = siblings.binary_search_by(|&probe| {
            compare_siblings(self.node(probe), new).unwrap_or_else(|| {
                overlap = true;
                Ordering::Equal
            })
        });
        if overlap {
            return None;
        }

        match found {
            Ok(mut index) => {
                // Multiple insertion points at one offset: go after the run.
                while index + 1 < siblings.len()
                    && compare_siblings(self.node(siblings[index]), self.node(siblings[index + 1]))
                        == Some(Ordering::Equal)
                {
                    index += 1;
                }
                Some(index + 1)
            }
            Err(index) => Some(index),
        }
    }

    /// Detach `child` from `parent`. Returns `false` if it was not a child.
    pub fn remove_child(&mut self, parent: EditId, child: EditId) -> bool {
        let children = &mut self.node_mut(parent).children;
        let Some(index) = children.iter().position(|&c| c == child) else {
            return false;
        };
        children.remove(index);
        self.node_mut(child).parent = None;
        true
    }

    /// Detach and return the child at `index`, or `None` if out of bounds.
    pub fn remove_child_at(&mut self, parent: EditId, index: usize) -> Option<EditId> {
        let children = &mut self.node_mut(parent).children;
        if index >= children.len() {
            return None;
        }
        let child = children.remove(index);
        self.node_mut(child).parent = None;
        Some(child)
    }

    /// Detach and return all children, in order.
    pub fn remove_children(&mut self, parent: EditId) -> Vec<EditId> {
        let children = std::mem::take(&mut self.node_mut(parent).children);
        for &child in &children {
            self.node_mut(child).parent = None;
        }
        children
    }

    /// Detach `id` from its parent, if it has one.
    pub(crate) fn detach(&mut self, id: EditId) {
        if let Some(parent) = self.node(id).parent {
            self.remove_child(parent, id);
        }
    }

    /// Smallest region covering every non-deleted edit in `edits`, or `None`
    /// when all of them are deleted (or `edits` is empty).
    #[must_use]
    pub fn coverage(&self, edits: &[EditId]) -> Option<Region> {
        edits
            .iter()
            .filter_map(|&id| self.region(id))
            .reduce(Region::union)
    }

    /// Shift an un-parented edit and its whole subtree by `delta` chars.
    ///
    /// # Errors
    ///
    /// `MalformedTree` if `root` has a parent (it would leave its parent's
    /// range) or if any edit would start before offset 0. Nothing moves on
    /// error.
    pub fn move_tree(&mut self, root: EditId, delta: isize) -> Result<()> {
        if self.node(root).parent.is_some() {
            return Err(EditError::malformed(None, Some(root), Malformed::MoveParented));
        }
        if delta < 0 {
            let lowest = self
                .descendants(root)
                .filter(|&id| !self.node(id).deleted)
                .map(|id| self.node(id).offset)
                .min();
            if lowest.is_some_and(|offset| offset.checked_add_signed(delta).is_none()) {
                return Err(EditError::malformed(None, Some(root), Malformed::NegativeOffset));
            }
        }
        self.shift_tree(root, delta);
        Ok(())
    }

    // -- Offset & length bookkeeping (engine internal) ----------------------

    pub(crate) fn adjust_offset(&mut self, id: EditId, delta: isize) {
        let node = self.node_mut(id);
        if !node.deleted {
            debug_assert!(node.offset.checked_add_signed(delta).is_some());
            node.offset = node.offset.saturating_add_signed(delta);
        }
    }

    pub(crate) fn adjust_length(&mut self, id: EditId, delta: isize) {
        let node = self.node_mut(id);
        if !node.deleted {
            debug_assert!(node.length.checked_add_signed(delta).is_some());
            node.length = node.length.saturating_add_signed(delta);
        }
    }

    pub(crate) fn mark_deleted(&mut self, id: EditId) {
        self.node_mut(id).deleted = true;
    }

    /// Shift a subtree without checks. Deleted edits stay put.
    pub(crate) fn shift_tree(&mut self, root: EditId, delta: isize) {
        let ids: Vec<EditId> = self.descendants(root).collect();
        for id in ids {
            self.adjust_offset(id, delta);
        }
    }

    /// Mark a whole subtree deleted.
    pub(crate) fn delete_tree(&mut self, root: EditId) {
        let ids: Vec<EditId> = self.descendants(root).collect();
        for id in ids {
            self.mark_deleted(id);
        }
    }
}

// ---------------------------------------------------------------------------
// Descendants
// ---------------------------------------------------------------------------

/// Pre-order iterator over a subtree. See [`EditTree::descendants`].
#[derive(Debug)]
pub struct Descendants<'a> {
    tree: &'a EditTree,
    stack: Vec<EditId>,
}

impl Iterator for Descendants<'_> {
    type Item = EditId;

    fn next(&mut self) -> Option<EditId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.node(id).children.iter().rev().copied());
        Some(id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn reason(result: Result<()>) -> Malformed {
        result
            .unwrap_err()
            .malformed_reason()
            .expect("expected a malformed-tree error")
    }

    // -- Construction & accessors -------------------------------------------

    #[test]
    fn constructors_set_ranges() {
        let mut tree = EditTree::new();
        let ins = tree.insert(4, "ab");
        let rep = tree.replace(1, 3, "xyz");
        let tgt = tree.move_target(9);
        assert_eq!(tree.region(ins), Some(Region::point(4)));
        assert_eq!(tree.region(rep), Some(Region::new(1, 3)));
        assert_eq!(tree.text(rep), Some("xyz"));
        assert_eq!(tree.length(tgt), 0);
        assert_eq!(tree.kind(tgt).name(), "MoveTarget");
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn new_edits_are_unparented() {
        let mut tree = EditTree::new();
        let e = tree.delete(0, 1);
        assert_eq!(tree.parent(e), None);
        assert!(!tree.has_children(e));
        assert!(!tree.is_deleted(e));
        assert!(!tree.is_applied(e));
        assert_eq!(tree.root_of(e), e);
    }

    #[test]
    fn edit_id_formats_as_hash_index() {
        assert_eq!(format!("{}", EditId::from_raw(7)), "#7");
        assert_eq!(format!("{:?}", Some(EditId::from_raw(7))), "Some(#7)");
    }

    // -- add_child ----------------------------------------------------------

    #[test]
    fn children_are_sorted_by_offset() {
        let mut tree = EditTree::new();
        let root = tree.multi(0, 20);
        let c = tree.delete(10, 2);
        let a = tree.delete(0, 2);
        let b = tree.replace(5, 1, "x");
        tree.add_children(root, &[c, a, b]).unwrap();
        assert_eq!(tree.children(root), &[a, b, c]);
        assert_eq!(tree.parent(b), Some(root));
        assert_eq!(tree.root_of(b), root);
    }

    #[test]
    fn insertion_points_keep_insertion_order() {
        let mut tree = EditTree::new();
        let root = tree.multi(0, 10);
        let before = tree.delete(0, 3);
        let first = tree.insert(3, "A");
        let after = tree.delete(3, 2);
        let second = tree.insert(3, "B");
        let third = tree.insert(3, "C");
        tree.add_children(root, &[after, first, before, second, third])
            .unwrap();
        assert_eq!(tree.children(root), &[before, first, second, third, after]);
    }

    #[test]
    fn overlap_is_rejected_eagerly() {
        let mut tree = EditTree::new();
        let root = tree.multi(0, 10);
        let a = tree.delete(2, 4);
        let b = tree.delete(5, 3);
        tree.add_child(root, a).unwrap();
        assert_eq!(reason(tree.add_child(root, b)), Malformed::Overlap);
        assert_eq!(tree.children(root), &[a]);
        assert_eq!(tree.parent(b), None);
    }

    #[test]
    fn insertion_point_inside_sibling_overlaps() {
        let mut tree = EditTree::new();
        let root = tree.multi(0, 10);
        let a = tree.delete(2, 4);
        let ins = tree.insert(3, "x");
        tree.add_child(root, a).unwrap();
        assert_eq!(reason(tree.add_child(root, ins)), Malformed::Overlap);
    }

    #[test]
    fn overlap_detected_among_many_siblings() {
        let mut tree = EditTree::new();
        let root = tree.multi(0, 100);
        for i in 0..10 {
            let e = tree.delete(i * 10, 5);
            tree.add_child(root, e).unwrap();
        }
        let bad = tree.delete(33, 10);
        assert_eq!(reason(tree.add_child(root, bad)), Malformed::Overlap);
        let good = tree.delete(35, 5);
        tree.add_child(root, good).unwrap();
        assert_eq!(tree.children(root)[4], good);
    }

    #[test]
    fn child_outside_parent_is_rejected() {
        let mut tree = EditTree::new();
        let root = tree.multi(2, 5);
        let early = tree.delete(1, 2);
        let late = tree.insert(8, "x");
        assert_eq!(reason(tree.add_child(root, early)), Malformed::OutsideParent);
        assert_eq!(reason(tree.add_child(root, late)), Malformed::OutsideParent);
        let at_end = tree.insert(7, "x");
        tree.add_child(root, at_end).unwrap();
    }

    #[test]
    fn zero_length_edits_cannot_cover() {
        let mut tree = EditTree::new();
        let target = tree.copy_target(3);
        let ins = tree.insert(3, "x");
        assert_eq!(reason(tree.add_child(target, ins)), Malformed::OutsideParent);

        let multi = tree.multi(3, 0);
        tree.add_child(multi, ins).unwrap();
    }

    #[test]
    fn deleted_edits_are_rejected() {
        let mut tree = EditTree::new();
        let root = tree.multi(0, 10);
        let child = tree.delete(1, 1);
        tree.mark_deleted(child);
        assert_eq!(reason(tree.add_child(root, child)), Malformed::DeletedChild);

        let dead_parent = tree.multi(0, 10);
        tree.mark_deleted(dead_parent);
        let live = tree.delete(1, 1);
        assert_eq!(reason(tree.add_child(dead_parent, live)), Malformed::DeletedParent);
    }

    #[test]
    fn reparenting_requires_removal_first() {
        let mut tree = EditTree::new();
        let a = tree.multi(0, 10);
        let b = tree.multi(0, 10);
        let child = tree.delete(1, 1);
        tree.add_child(a, child).unwrap();
        assert_eq!(reason(tree.add_child(b, child)), Malformed::AlreadyParented);
        assert!(tree.remove_child(a, child));
        tree.add_child(b, child).unwrap();
    }

    #[test]
    fn cannot_nest_into_own_subtree() {
        let mut tree = EditTree::new();
        let outer = tree.multi(0, 10);
        let inner = tree.multi(0, 10);
        tree.add_child(outer, inner).unwrap();
        assert_eq!(reason(tree.add_child(inner, outer)), Malformed::SelfNesting);
        assert_eq!(reason(tree.add_child(inner, inner)), Malformed::SelfNesting);
    }

    #[test]
    fn undo_edits_are_roots_only() {
        let mut tree = EditTree::new();
        let root = tree.multi(0, 10);
        let undo = tree.alloc(EditKind::Undo, 0, 10);
        let rep = tree.replace(0, 1, "x");
        assert_eq!(reason(tree.add_child(root, undo)), Malformed::UndoAsChild);
        assert_eq!(reason(tree.add_child(undo, rep)), Malformed::UndoAsParent);
    }

    // -- Removal ------------------------------------------------------------

    #[test]
    fn remove_children_clears_parents() {
        let mut tree = EditTree::new();
        let root = tree.multi(0, 10);
        let a = tree.delete(0, 1);
        let b = tree.delete(5, 1);
        tree.add_children(root, &[a, b]).unwrap();
        assert_eq!(tree.remove_children(root), vec![a, b]);
        assert!(!tree.has_children(root));
        assert_eq!(tree.parent(a), None);
        assert_eq!(tree.parent(b), None);
    }

    #[test]
    fn remove_child_at_index() {
        let mut tree = EditTree::new();
        let root = tree.multi(0, 10);
        let a = tree.delete(0, 1);
        let b = tree.delete(5, 1);
        tree.add_children(root, &[a, b]).unwrap();
        assert_eq!(tree.remove_child_at(root, 1), Some(b));
        assert_eq!(tree.remove_child_at(root, 1), None);
        assert!(!tree.remove_child(root, b));
        assert_eq!(tree.children(root), &[a]);
    }

    // -- Coverage -----------------------------------------------------------

    #[test]
    fn coverage_spans_live_edits() {
        let mut tree = EditTree::new();
        let a = tree.delete(4, 2);
        let b = tree.insert(12, "x");
        let gone = tree.delete(0, 1);
        tree.mark_deleted(gone);
        assert_eq!(tree.coverage(&[a, gone, b]), Some(Region::new(4, 8)));
    }

    #[test]
    fn coverage_of_only_deleted_is_none() {
        let mut tree = EditTree::new();
        let gone = tree.delete(0, 1);
        tree.mark_deleted(gone);
        assert_eq!(tree.coverage(&[gone]), None);
        assert_eq!(tree.coverage(&[]), None);
    }

    // -- move_tree & descendants --------------------------------------------

    #[test]
    fn move_tree_shifts_subtree() {
        let mut tree = EditTree::new();
        let root = tree.multi(5, 10);
        let child = tree.delete(7, 2);
        tree.add_child(root, child).unwrap();
        tree.move_tree(root, -5).unwrap();
        assert_eq!(tree.region(root), Some(Region::new(0, 10)));
        assert_eq!(tree.region(child), Some(Region::new(2, 2)));
    }

    #[test]
    fn move_tree_rejects_parented_and_negative() {
        let mut tree = EditTree::new();
        let root = tree.multi(5, 10);
        let child = tree.delete(7, 2);
        tree.add_child(root, child).unwrap();
        assert_eq!(reason(tree.move_tree(child, 1)), Malformed::MoveParented);
        assert_eq!(reason(tree.move_tree(root, -6)), Malformed::NegativeOffset);
        assert_eq!(tree.offset(root), 5);
    }

    #[test]
    fn descendants_are_pre_order() {
        let mut tree = EditTree::new();
        let root = tree.multi(0, 20);
        let left = tree.multi(0, 10);
        let leaf = tree.delete(2, 1);
        let right = tree.delete(15, 1);
        tree.add_child(left, leaf).unwrap();
        tree.add_children(root, &[right, left]).unwrap();
        let order: Vec<_> = tree.descendants(root).collect();
        assert_eq!(order, vec![root, left, leaf, right]);
    }

    #[test]
    fn delete_policy_per_kind() {
        let mut tree = EditTree::new();
        let del = tree.delete(0, 1);
        let rep = tree.replace(0, 1, "");
        let marker = tree.range_marker(0, 1);
        let src = tree.move_source(0, 1);
        assert!(tree.kind(del).deletes_children());
        assert!(tree.kind(rep).deletes_children());
        assert!(!tree.kind(marker).deletes_children());
        assert!(!tree.kind(src).deletes_children());
    }
}
