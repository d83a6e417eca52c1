//! Deep copies of edit subtrees.
//!
//! A copy reproduces every edit below the given root with its kind, range,
//! text, deleted flag and modifier. Source/target pairs whose both ends lie
//! inside the copied subtree are re-wired to the new edits. Pairs with only
//! one end inside are left unpaired in the copy, so the copy can be linked
//! up anew (or fails validation if applied as is).
//!
//! The engine itself copies with [`PairPolicy::Lower`] when it computes a
//! source with nested edits: half-pairs then turn into plain edits with the
//! same effect on the source text, so the nested run neither waits for nor
//! consumes content that belongs to the outer run.

use std::collections::{HashMap, HashSet};

use crate::edit::{EditId, EditKind, EditTree};
use crate::error::{EditError, Malformed, Result};
use crate::source::{CachedSource, SourceLink};

/// What to do with a pair that crosses the boundary of the copied subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PairPolicy {
    /// Keep the edit's kind, drop the link.
    Unlink,
    /// Replace the edit by its effect on the copied text: a move source
    /// becomes a delete, a copy source a range marker, and a target an
    /// insert of its source's already computed content.
    Lower,
}

/// Follow-up work for one planned edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Link {
    None,
    /// Internal pair: re-wire to the copy of this original partner.
    Partner(EditId),
    /// Lowered target: becomes an insert of this source's content.
    Lowered(Option<EditId>),
}

/// One edit to materialize, in pre-order.
struct Planned {
    original: EditId,
    kind: EditKind,
    offset: usize,
    length: usize,
    deleted: bool,
    /// Index of the parent's entry, `None` for copied roots.
    parent: Option<usize>,
    link: Link,
}

impl EditTree {
    /// Deep-copy `root`'s subtree within this arena and return the new root.
    /// The copy is un-parented.
    pub fn copy(&mut self, root: EditId) -> EditId {
        let plan = plan(self, root);
        build(self, plan)[&root]
    }

    /// Deep-copy `root`'s subtree into another arena and return the new root
    /// there.
    #[must_use]
    pub fn copy_to(&self, root: EditId, other: &mut Self) -> EditId {
        let plan = plan(self, root);
        build(other, plan)[&root]
    }
}

/// Copy a forest from `from` into `to` and return the new roots, in order.
///
/// Lowering a target reads its source's content, which must already be
/// computed; that is the only way this fails.
pub(crate) fn copy_forest(
    from: &EditTree,
    roots: &[EditId],
    to: &mut EditTree,
    policy: PairPolicy,
) -> Result<Vec<EditId>> {
    let inside = subtree_set(from, roots);
    let mut plan = Vec::new();
    for &root in roots {
        plan_within(from, root, &inside, policy, &mut plan);
    }
    lower_targets(from, &mut plan)?;
    let copies = build(to, plan);
    Ok(roots.iter().map(|root| copies[root]).collect())
}

fn subtree_set(from: &EditTree, roots: &[EditId]) -> HashSet<EditId> {
    roots.iter().flat_map(|&r| from.descendants(r)).collect()
}

fn plan(from: &EditTree, root: EditId) -> Vec<Planned> {
    let inside = subtree_set(from, &[root]);
    let mut plan = Vec::new();
    plan_within(from, root, &inside, PairPolicy::Unlink, &mut plan);
    plan
}

/// Append a snapshot of `root`'s subtree to `plan`. `inside` decides which
/// pairs are internal.
fn plan_within(
    from: &EditTree,
    root: EditId,
    inside: &HashSet<EditId>,
    policy: PairPolicy,
    plan: &mut Vec<Planned>,
) {
    let mut slots: HashMap<EditId, usize> = HashMap::new();

    for id in from.descendants(root) {
        let node = from.node(id);
        let parent = if id == root {
            None
        } else {
            node.parent.and_then(|p| slots.get(&p).copied())
        };
        let (kind, link) = copy_kind(from, id, inside, policy);
        slots.insert(id, plan.len());
        plan.push(Planned {
            original: id,
            kind,
            offset: node.offset,
            length: node.length,
            deleted: node.deleted,
            parent,
            link,
        });
    }
}

/// The copied kind of `id` and what still has to happen to it.
fn copy_kind(
    from: &EditTree,
    id: EditId,
    inside: &HashSet<EditId>,
    policy: PairPolicy,
) -> (EditKind, Link) {
    let internal = |partner: Option<EditId>| partner.filter(|p| inside.contains(p));

    match from.kind(id) {
        EditKind::Multi => (EditKind::Multi, Link::None),
        EditKind::Delete => (EditKind::Delete, Link::None),
        EditKind::RangeMarker => (EditKind::RangeMarker, Link::None),
        EditKind::Undo => (EditKind::Undo, Link::None),
        EditKind::Insert { text } => (EditKind::Insert { text: text.clone() }, Link::None),
        EditKind::Replace { text } => (EditKind::Replace { text: text.clone() }, Link::None),

        EditKind::CopySource(link) | EditKind::MoveSource(link) => {
            let is_move = matches!(from.kind(id), EditKind::MoveSource(_));
            match (internal(link.target), policy) {
                (Some(partner), _) => (
                    source_kind(is_move, copied_link(link, policy)),
                    Link::Partner(partner),
                ),
                (None, PairPolicy::Unlink) => (source_kind(is_move, link.fresh_copy()), Link::None),
                (None, PairPolicy::Lower) if is_move => (EditKind::Delete, Link::None),
                (None, PairPolicy::Lower) => (EditKind::RangeMarker, Link::None),
            }
        }

        EditKind::CopyTarget { source } | EditKind::MoveTarget { source } => {
            let is_move = matches!(from.kind(id), EditKind::MoveTarget { .. });
            match (internal(*source), policy) {
                (Some(partner), _) => (target_kind(is_move), Link::Partner(partner)),
                (None, PairPolicy::Unlink) => (target_kind(is_move), Link::None),
                (None, PairPolicy::Lower) => (target_kind(is_move), Link::Lowered(*source)),
            }
        }
    }
}

/// Turn every lowered target into an insert of its source's content.
fn lower_targets(from: &EditTree, plan: &mut [Planned]) -> Result<()> {
    for planned in plan {
        let Link::Lowered(source) = planned.link else {
            continue;
        };
        let id = planned.original;
        let source =
            source.ok_or_else(|| EditError::malformed(None, Some(id), Malformed::MissingSource))?;
        let link = from.kind(source).source_link().ok_or_else(|| {
            EditError::malformed(Some(source), Some(id), Malformed::InconsistentPair)
        })?;
        let text = link.content.peek(source)?.to_owned();
        planned.kind = EditKind::Insert { text };
        planned.link = Link::None;
    }
    Ok(())
}

/// A fresh link for an internal pair. Lowered copies keep computed content:
/// the nested run must not read the source range a second time.
fn copied_link(link: &SourceLink, policy: PairPolicy) -> SourceLink {
    let mut copy = link.fresh_copy();
    if policy == PairPolicy::Lower {
        if let CachedSource::Computed(content) = &link.content {
            copy.content = CachedSource::Computed(content.clone());
        }
    }
    copy
}

fn source_kind(is_move: bool, link: SourceLink) -> EditKind {
    if is_move {
        EditKind::MoveSource(link)
    } else {
        EditKind::CopySource(link)
    }
}

const fn target_kind(is_move: bool) -> EditKind {
    if is_move {
        EditKind::MoveTarget { source: None }
    } else {
        EditKind::CopyTarget { source: None }
    }
}

/// Allocate the planned edits in `to`, wire parents and internal pairs, and
/// return the mapping from original to copied edits.
fn build(to: &mut EditTree, plan: Vec<Planned>) -> HashMap<EditId, EditId> {
    let mut new_ids = Vec::with_capacity(plan.len());
    let mut by_original: HashMap<EditId, EditId> = HashMap::with_capacity(plan.len());
    let mut pairs = Vec::new();

    for planned in plan {
        let id = to.alloc(planned.kind, planned.offset, planned.length);
        to.node_mut(id).deleted = planned.deleted;
        if let Some(slot) = planned.parent {
            // Pre-order: children arrive in offset order.
            let parent = new_ids[slot];
            to.node_mut(parent).children.push(id);
            to.node_mut(id).parent = Some(parent);
        }
        if let Link::Partner(partner) = planned.link {
            if to.kind(id).is_source() {
                pairs.push((id, partner));
            }
        }
        by_original.insert(planned.original, id);
        new_ids.push(id);
    }

    for (source, original_target) in pairs {
        if let Some(&target) = by_original.get(&original_target) {
            if let Some(link) = to.source_link_mut(source) {
                link.target = Some(target);
            }
            if let EditKind::CopyTarget { source: slot } | EditKind::MoveTarget { source: slot } =
                &mut to.node_mut(target).kind
            {
                *slot = Some(source);
            }
        }
    }
    by_original
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
