//! Depth-first traversal of an edit tree, and a debug printer built on it.

use std::fmt;

use crate::edit::{EditId, EditTree};

/// Callbacks for [`EditTree::accept`].
///
/// `visit` runs before an edit's children; returning `false` skips them.
/// `end_visit` runs after the children (or right after `visit` when they are
/// skipped).
pub trait EditVisitor {
    fn visit(&mut self, tree: &EditTree, edit: EditId) -> bool {
        let _ = (tree, edit);
        true
    }

    fn end_visit(&mut self, tree: &EditTree, edit: EditId) {
        let _ = (tree, edit);
    }
}

impl EditTree {
    /// Walk `root` and its subtree depth-first, children in offset order.
    pub fn accept<V: EditVisitor + ?Sized>(&self, root: EditId, visitor: &mut V) {
        if visitor.visit(self, root) {
            for &child in self.children(root) {
                self.accept(child, visitor);
            }
        }
        visitor.end_visit(self, root);
    }

    /// Indented one-line-per-edit rendering of a subtree, for logs and test
    /// failure messages.
    ///
    /// ```
    /// use n_textedit::EditTree;
    ///
    /// let mut tree = EditTree::new();
    /// let root = tree.multi(0, 10);
    /// let rep = tree.replace(2, 3, "xy");
    /// tree.add_child(root, rep).unwrap();
    /// assert_eq!(tree.display(root).to_string(), "{Multi} [0,10]\n  {Replace} [2,3]");
    /// ```
    #[must_use]
    pub const fn display(&self, root: EditId) -> TreeDisplay<'_> {
        TreeDisplay { tree: self, root }
    }
}

/// See [`EditTree::display`].
#[derive(Debug, Clone, Copy)]
pub struct TreeDisplay<'a> {
    tree: &'a EditTree,
    root: EditId,
}

impl fmt::Display for TreeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut printer = Printer::default();
        self.tree.accept(self.root, &mut printer);
        f.write_str(&printer.lines.join("\n"))
    }
}

#[derive(Default)]
struct Printer {
    depth: usize,
    lines: Vec<String>,
}

impl EditVisitor for Printer {
    fn visit(&mut self, tree: &EditTree, edit: EditId) -> bool {
        let indent = "  ".repeat(self.depth);
        let name = tree.kind(edit).name();
        let line = match tree.region(edit) {
            Some(region) => format!("{indent}{{{name}}} {region}"),
            None => format!("{indent}{{{name}}} [deleted]"),
        };
        self.lines.push(line);
        self.depth += 1;
        true
    }

    fn end_visit(&mut self, _tree: &EditTree, _edit: EditId) {
        self.depth -= 1;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
