//! Apply styles: what `apply` produces besides the mutated document.
//!
//! A style is a [`bitflags`] set. Like the editor's `:set` layer, a style can
//! be written as text, which is how configuration files and test fixtures
//! spell it:
//!
//! | Text             | Abbrev    | Flag             |
//! |------------------|-----------|------------------|
//! | `create_undo`    | `undo`    | `CREATE_UNDO`    |
//! | `update_regions` | `regions` | `UPDATE_REGIONS` |
//! | `none`           |           | (empty)          |
//! | `all`            |           | both             |
//!
//! Flags are separated by `,` or `|`, with optional whitespace.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

bitflags::bitflags! {
    /// Flags controlling an `apply` call.
    ///
    /// ```
    /// use n_textedit::ApplyStyle;
    ///
    /// let style: ApplyStyle = "undo, regions".parse().unwrap();
    /// assert_eq!(style, ApplyStyle::CREATE_UNDO | ApplyStyle::UPDATE_REGIONS);
    /// assert_eq!(style, ApplyStyle::default());
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ApplyStyle: u8 {
        /// Record an inverse `Undo` edit while mutating the document.
        const CREATE_UNDO    = 1 << 0;
        /// Rewrite every edit's offset/length to its post-mutation region.
        const UPDATE_REGIONS = 1 << 1;
    }
}

impl ApplyStyle {
    /// Neither undo nor region updating.
    pub const NONE: Self = Self::empty();

    /// True when an undo edit should be produced.
    #[inline]
    #[must_use]
    pub const fn creates_undo(self) -> bool {
        self.contains(Self::CREATE_UNDO)
    }

    /// True when regions should be updated after mutation.
    #[inline]
    #[must_use]
    pub const fn updates_regions(self) -> bool {
        self.contains(Self::UPDATE_REGIONS)
    }
}

/// Both flags, the style of a plain `apply`.
impl Default for ApplyStyle {
    fn default() -> Self {
        Self::CREATE_UNDO | Self::UPDATE_REGIONS
    }
}

/// An unknown flag name in a style string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown apply style flag: {0:?}")]
pub struct ParseStyleError(pub String);

/// Map one flag name (full or abbreviated) to its flags.
fn parse_flag(name: &str) -> Option<ApplyStyle> {
    match name {
        "create_undo" | "undo" => Some(ApplyStyle::CREATE_UNDO),
        "update_regions" | "regions" => Some(ApplyStyle::UPDATE_REGIONS),
        "none" => Some(ApplyStyle::NONE),
        "all" => Some(ApplyStyle::all()),
        _ => None,
    }
}

impl FromStr for ApplyStyle {
    type Err = ParseStyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut style = Self::NONE;
        for name in s.split([',', '|']).map(str::trim) {
            if name.is_empty() {
                continue;
            }
            let lower = name.to_ascii_lowercase();
            style |= parse_flag(&lower).ok_or_else(|| ParseStyleError(name.to_string()))?;
        }
        Ok(style)
    }
}

impl fmt::Display for ApplyStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.creates_undo(), self.updates_regions()) {
            (false, false) => f.write_str("none"),
            (true, false) => f.write_str("create_undo"),
            (false, true) => f.write_str("update_regions"),
            (true, true) => f.write_str("create_undo|update_regions"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
