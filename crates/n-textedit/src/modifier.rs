//! Source modifiers rewrite moved/copied text before it is re-inserted.
//!
//! A modifier sees the fully materialized source text (every edit nested in
//! the source region already applied) and answers with a set of disjoint
//! [`Replacement`]s over that text. The engine applies them through a nested
//! edit tree, so overlapping replacements are rejected as a malformed tree
//! instead of silently producing garbage.
//!
//! Two modifiers ship with the engine:
//!
//! - [`Reindent`]: re-indents every line after the first, the usual fix-up
//!   when a block of code moves to a different nesting depth.
//! - [`PatternModifier`]: regex substitution over the copied text.

use std::fmt;

use regex::Regex;

// ---------------------------------------------------------------------------
// Replacement
// ---------------------------------------------------------------------------

/// Replace `length` chars at `offset` (char offsets into the source text)
/// with `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub offset: usize,
    pub length: usize,
    pub text: String,
}

impl Replacement {
    #[must_use]
    pub fn new(offset: usize, length: usize, text: impl Into<String>) -> Self {
        Self {
            offset,
            length,
            text: text.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// SourceModifier
// ---------------------------------------------------------------------------

/// Capability attached to a `CopySource`/`MoveSource` edit.
pub trait SourceModifier: fmt::Debug {
    /// The replacements to perform on `source`. They must be pairwise
    /// disjoint; zero-length insertions at the same offset are applied in
    /// the order returned.
    fn modifications(&self, source: &str) -> Vec<Replacement>;

    /// An independent copy, used when an edit tree is copied.
    fn clone_box(&self) -> Box<dyn SourceModifier>;
}

impl Clone for Box<dyn SourceModifier> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

// ---------------------------------------------------------------------------
// Reindent
// ---------------------------------------------------------------------------

/// On every line after the first, strip up to `strip` leading blanks
/// (spaces or tabs) and prepend `indent`.
///
/// The first line is left alone: it starts wherever the target offset sits,
/// which already carries the destination's indentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reindent {
    pub strip: usize,
    pub indent: String,
}

impl Reindent {
    #[must_use]
    pub fn new(strip: usize, indent: impl Into<String>) -> Self {
        Self {
            strip,
            indent: indent.into(),
        }
    }
}

impl SourceModifier for Reindent {
    fn modifications(&self, source: &str) -> Vec<Replacement> {
        let mut result = Vec::new();
        let mut chars = source.chars().enumerate().peekable();

        while let Some((_, ch)) = chars.next() {
            if ch != '\n' {
                continue;
            }
            // `\r\n` needs no special casing: the `\r` sits before the `\n`.
            let Some(&(line_start, _)) = chars.peek() else {
                break;
            };
            let mut stripped = 0;
            while stripped < self.strip {
                match chars.peek() {
                    Some(&(_, ' ' | '\t')) => {
                        chars.next();
                        stripped += 1;
                    }
                    _ => break,
                }
            }
            if stripped > 0 || !self.indent.is_empty() {
                result.push(Replacement::new(line_start, stripped, self.indent.clone()));
            }
        }
        result
    }

    fn clone_box(&self) -> Box<dyn SourceModifier> {
        Box::new(self.clone())
    }
}

// ---------------------------------------------------------------------------
// PatternModifier
// ---------------------------------------------------------------------------

/// Replace every match of `pattern` with `replacement` (which may use `$1`
/// style capture references, as in [`Regex::replace_all`]).
#[derive(Debug, Clone)]
pub struct PatternModifier {
    pub pattern: Regex,
    pub replacement: String,
}

impl PatternModifier {
    /// Compile `pattern`.
    ///
    /// # Errors
    ///
    /// Returns the regex compile error for an invalid pattern.
    pub fn new(pattern: &str, replacement: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            replacement: replacement.into(),
        })
    }
}

impl SourceModifier for PatternModifier {
    fn modifications(&self, source: &str) -> Vec<Replacement> {
        let mut result = Vec::new();
        // Regex matches are byte ranges; edits are char ranges. Walk forward
        // once, counting chars between consecutive matches.
        let mut byte_pos = 0;
        let mut char_pos = 0;
        for caps in self.pattern.captures_iter(source) {
            let Some(m) = caps.get(0) else { continue };
            if m.start() == m.end() {
                // Empty matches would stack insertions at every position.
                continue;
            }
            char_pos += source[byte_pos..m.start()].chars().count();
            let length = m.as_str().chars().count();
            let mut text = String::new();
            caps.expand(&self.replacement, &mut text);
            result.push(Replacement::new(char_pos, length, text));
            char_pos += length;
            byte_pos = m.end();
        }
        result
    }

    fn clone_box(&self) -> Box<dyn SourceModifier> {
        Box::new(self.clone())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
