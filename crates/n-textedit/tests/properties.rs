//! Property tests for `apply` over random edit trees: flat edit lists,
//! nested trees with move/copy pairs, and chains of dependent sources.

use n_text::Region;
use n_textedit::{ApplyStyle, EditId, EditKind, EditTree, Malformed, PatternModifier};
use proptest::collection::vec;
use proptest::prelude::*;
use ropey::Rope;

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Op {
    Insert(String),
    Delete(usize),
    Replace(usize, String),
    Marker(usize),
}

impl Op {
    /// Chars covered in the original document.
    fn span(&self) -> usize {
        match self {
            Self::Insert(_) => 0,
            Self::Delete(n) | Self::Replace(n, _) | Self::Marker(n) => *n,
        }
    }

    /// Chars covered after the mutation.
    fn new_span(&self) -> usize {
        match self {
            Self::Insert(text) | Self::Replace(_, text) => text.chars().count(),
            Self::Delete(_) => 0,
            Self::Marker(n) => *n,
        }
    }

    fn delta(&self) -> isize {
        self.new_span() as isize - self.span() as isize
    }
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        "[a-z]{0,4}".prop_map(Op::Insert),
        (1usize..4).prop_map(Op::Delete),
        (0usize..4, "[a-zé]{0,4}").prop_map(|(n, text)| Op::Replace(n, text)),
        (0usize..4).prop_map(Op::Marker),
    ]
}

prop_compose! {
    /// A document plus offset-ordered, non-overlapping edits over it.
    fn scenario()(
        text in "[a-zé ]{0,30}",
        ops in vec((0usize..4, op()), 0..10),
    ) -> (String, Vec<(usize, Op)>) {
        let len = text.chars().count();
        let mut laid = Vec::new();
        let mut cursor = 0;
        for (gap, op) in ops {
            let offset = cursor + gap;
            if offset + op.span() > len {
                break;
            }
            cursor = offset + op.span();
            laid.push((offset, op));
        }
        (text, laid)
    }
}

fn build(tree: &mut EditTree, len: usize, ops: &[(usize, Op)]) -> (EditId, Vec<EditId>) {
    let root = tree.multi(0, len);
    let edits: Vec<EditId> = ops
        .iter()
        .map(|(offset, op)| match op {
            Op::Insert(text) => tree.insert(*offset, text.as_str()),
            Op::Delete(n) => tree.delete(*offset, *n),
            Op::Replace(n, text) => tree.replace(*offset, *n, text.as_str()),
            Op::Marker(n) => tree.range_marker(*offset, *n),
        })
        .collect();
    tree.add_children(root, &edits).unwrap();
    (root, edits)
}

/// Apply the edits back to front on a char vector.
fn reference(text: &str, ops: &[(usize, Op)]) -> String {
    let mut chars: Vec<char> = text.chars().collect();
    for (offset, op) in ops.iter().rev() {
        let range = *offset..*offset + op.span();
        match op {
            Op::Insert(new) | Op::Replace(_, new) => {
                chars.splice(range, new.chars());
            }
            Op::Delete(_) => {
                chars.drain(range);
            }
            Op::Marker(_) => {}
        }
    }
    chars.into_iter().collect()
}

// ---------------------------------------------------------------------------
// Nested trees with move/copy pairs
// ---------------------------------------------------------------------------

const WORDS: [&str; 4] = ["", "x", "yz", "é!"];

/// Reads choices from a byte string. Once exhausted it always answers 0.
struct Script<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Script<'_> {
    fn pick(&mut self, n: usize) -> usize {
        let byte = self.bytes.get(self.pos).copied().unwrap_or(0);
        self.pos += 1;
        usize::from(byte) % n
    }
}

#[derive(Default)]
struct Grown {
    sources: Vec<EditId>,
    /// Insertion points a target may be placed at: `(parent, offset)`.
    slots: Vec<(EditId, usize)>,
}

/// Fill `parent`'s range `[start, end]` with edits picked by `script`.
fn grow(
    tree: &mut EditTree,
    script: &mut Script<'_>,
    parent: EditId,
    (start, end): (usize, usize),
    depth: usize,
    grown: &mut Grown,
) {
    let mut cursor = start;
    loop {
        cursor += script.pick(3);
        if cursor > end {
            break;
        }
        match script.pick(8) {
            0 => break,
            1 => {
                let edit = tree.insert(cursor, WORDS[script.pick(4)]);
                tree.add_child(parent, edit).unwrap();
            }
            op @ (2 | 3) => {
                let length = 1 + script.pick(3);
                if cursor + length > end {
                    break;
                }
                let edit = if op == 2 {
                    tree.delete(cursor, length)
                } else {
                    tree.replace(cursor, length, WORDS[script.pick(4)])
                };
                tree.add_child(parent, edit).unwrap();
                cursor += length;
            }
            4 => grown.slots.push((parent, cursor)),
            op => {
                let length = 1 + script.pick(4);
                if cursor + length > end {
                    break;
                }
                let edit = match op {
                    5 => tree.range_marker(cursor, length),
                    6 => tree.copy_source(cursor, length),
                    _ => tree.move_source(cursor, length),
                };
                if op != 5 {
                    grown.sources.push(edit);
                    if script.pick(4) == 0 {
                        let vowels = PatternModifier::new("[aeiou]", "*").unwrap();
                        tree.set_modifier(edit, Box::new(vowels)).unwrap();
                    }
                }
                if depth < 3 {
                    grow(tree, script, edit, (cursor, cursor + length), depth + 1, grown);
                }
                tree.add_child(parent, edit).unwrap();
                cursor += length;
            }
        }
    }
}

/// A nested tree over `len` chars. Every source gets a target, at a slot
/// the script picks when that slot lies outside the source, else at the
/// document end.
fn grow_tree(tree: &mut EditTree, len: usize, bytes: &[u8]) -> EditId {
    let mut script = Script { bytes, pos: 0 };
    let mut grown = Grown::default();
    let root = tree.multi(0, len);
    grow(tree, &mut script, root, (0, len), 0, &mut grown);

    for &source in &grown.sources {
        let (parent, offset) = grown
            .slots
            .get(script.pick(grown.slots.len() + 1))
            .copied()
            .filter(|&(parent, _)| parent != source && !tree.is_ancestor(source, parent))
            .unwrap_or((root, len));
        let target = if matches!(tree.kind(source), EditKind::MoveSource(_)) {
            tree.move_target(offset)
        } else {
            tree.copy_target(offset)
        };
        tree.add_child(parent, target).unwrap();
        tree.set_target_edit(source, target).unwrap();
    }
    root
}

/// Sources at `[3k, 3k+2)`, each feeding a target inside the next source
/// (the previous one when `backward`). The last one feeds the document end.
fn chain(tree: &mut EditTree, len: usize, moves: &[bool], backward: bool) -> EditId {
    let root = tree.multi(0, len);
    let sources: Vec<EditId> = moves
        .iter()
        .enumerate()
        .map(|(k, &moving)| {
            if moving {
                tree.move_source(3 * k, 2)
            } else {
                tree.copy_source(3 * k, 2)
            }
        })
        .collect();

    for (k, &moving) in moves.iter().enumerate() {
        let host = if backward {
            k.checked_sub(1)
        } else {
            Some(k + 1).filter(|&h| h < moves.len())
        };
        let (parent, offset) = match host {
            Some(h) => (sources[h], 3 * h + 1),
            None => (root, len),
        };
        let target = if moving {
            tree.move_target(offset)
        } else {
            tree.copy_target(offset)
        };
        tree.add_child(parent, target).unwrap();
        tree.set_target_edit(sources[k], target).unwrap();
    }
    tree.add_children(root, &sources).unwrap();
    root
}

/// The root spans the document and every live edit lies inside it.
fn check_containment(tree: &EditTree, root: EditId, doc_len: usize) -> Result<(), TestCaseError> {
    let outer = tree.region(root).unwrap();
    prop_assert_eq!(outer, Region::new(0, doc_len));
    for edit in tree.descendants(root) {
        if let Some(region) = tree.region(edit) {
            prop_assert!(outer.covers(region), "{} at {} escapes {}", edit, region, outer);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn matches_reference_model((text, ops) in scenario()) {
        let mut doc = Rope::from_str(&text);
        let mut tree = EditTree::new();
        let (root, _) = build(&mut tree, text.chars().count(), &ops);

        tree.apply(root, &mut doc, ApplyStyle::NONE).unwrap();
        prop_assert_eq!(doc.to_string(), reference(&text, &ops));
    }

    #[test]
    fn undo_round_trip((text, ops) in scenario()) {
        let mut doc = Rope::from_str(&text);
        let mut tree = EditTree::new();
        let (root, _) = build(&mut tree, text.chars().count(), &ops);

        let undo = tree.apply(root, &mut doc, ApplyStyle::CREATE_UNDO).unwrap();
        let undo = undo.expect("undo requested");
        tree.apply(undo, &mut doc, ApplyStyle::NONE).unwrap();
        prop_assert_eq!(doc.to_string(), text);
    }

    #[test]
    fn regions_track_deltas((text, ops) in scenario()) {
        let mut doc = Rope::from_str(&text);
        let mut tree = EditTree::new();
        let (root, edits) = build(&mut tree, text.chars().count(), &ops);

        tree.apply(root, &mut doc, ApplyStyle::UPDATE_REGIONS).unwrap();

        let mut shift: isize = 0;
        for ((offset, op), &edit) in ops.iter().zip(&edits) {
            let expected = Region::new(offset.wrapping_add_signed(shift), op.new_span());
            prop_assert_eq!(tree.region(edit), Some(expected));
            shift += op.delta();
        }
        prop_assert_eq!(tree.length(root), doc.len_chars());
    }

    #[test]
    fn children_stay_inside_root((text, ops) in scenario()) {
        let mut doc = Rope::from_str(&text);
        let mut tree = EditTree::new();
        let (root, edits) = build(&mut tree, text.chars().count(), &ops);

        tree.apply(root, &mut doc, ApplyStyle::UPDATE_REGIONS).unwrap();

        let outer = tree.region(root).unwrap();
        for edit in edits {
            if let Some(region) = tree.region(edit) {
                prop_assert!(outer.covers(region), "{region} escapes {outer}");
            }
        }
    }

    #[test]
    fn move_relocates_text_and_undoes(
        text in "[a-z]{1,30}",
        a in 0usize..30,
        b in 0usize..30,
        t in 0usize..31,
    ) {
        let len = text.len();
        let (start, end) = (a.min(b) % len, (a.max(b) % len).max(a.min(b) % len));
        let target = t % (len + 1);
        prop_assume!(target <= start || target >= end);

        let mut doc = Rope::from_str(&text);
        let mut tree = EditTree::new();
        let root = tree.multi(0, len);
        let src = tree.move_source(start, end - start);
        let tgt = tree.move_target(target);
        tree.add_children(root, &[src, tgt]).unwrap();
        tree.set_target_edit(src, tgt).unwrap();

        let undo = tree.apply(root, &mut doc, ApplyStyle::default()).unwrap().unwrap();

        let moved = &text[start..end];
        let expected = if target >= end {
            format!("{}{}{}{}", &text[..start], &text[end..target], moved, &text[target..])
        } else {
            format!("{}{}{}{}", &text[..target], moved, &text[target..start], &text[end..])
        };
        prop_assert_eq!(doc.to_string(), expected);
        prop_assert_eq!(
            tree.region(tgt).map(|r| r.length),
            Some(end - start)
        );

        tree.apply(undo, &mut doc, ApplyStyle::NONE).unwrap();
        prop_assert_eq!(doc.to_string(), text);
    }

    #[test]
    fn nested_pairs_apply_and_undo(
        text in "[a-zé ]{0,24}",
        script in vec(any::<u8>(), 0..96),
    ) {
        let len = text.chars().count();
        let mut doc = Rope::from_str(&text);
        let mut tree = EditTree::new();
        let root = grow_tree(&mut tree, len, &script);

        let undo = match tree.apply(root, &mut doc, ApplyStyle::default()) {
            Ok(undo) => undo.expect("undo requested"),
            Err(err) => {
                // Random pairing can make two sources hold each other's targets.
                prop_assert_eq!(err.malformed_reason(), Some(Malformed::CircularSources));
                prop_assert_eq!(doc.to_string(), text);
                return Ok(());
            }
        };
        check_containment(&tree, root, doc.len_chars())?;

        tree.apply(undo, &mut doc, ApplyStyle::NONE).unwrap();
        prop_assert_eq!(doc.to_string(), text);
    }

    #[test]
    fn chained_sources_apply_and_undo(
        text in "[a-z]{18,24}",
        moves in vec(any::<bool>(), 2..7),
        backward in any::<bool>(),
    ) {
        let len = text.len();
        let mut doc = Rope::from_str(&text);
        let mut tree = EditTree::new();
        let root = chain(&mut tree, len, &moves, backward);

        let undo = tree.apply(root, &mut doc, ApplyStyle::default()).unwrap().unwrap();
        check_containment(&tree, root, doc.len_chars())?;
        if moves.iter().all(|&moving| moving) {
            prop_assert_eq!(doc.len_chars(), len);
        }

        tree.apply(undo, &mut doc, ApplyStyle::NONE).unwrap();
        prop_assert_eq!(doc.to_string(), text);
    }
}
