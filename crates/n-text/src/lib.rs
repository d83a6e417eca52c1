// SPDX-License-Identifier: MIT
//
// n-text: the document layer under n-nvim's edit engine.
//
// Three small pieces: `Region`, the char-indexed half-open range every edit
// is expressed in; `Document`, the minimal read/replace contract the engine
// drives; and `TextDocument`, a rope-backed implementation with change
// metadata. `ropey::Rope` itself also implements `Document`, which is what
// the engine uses for its private scratch documents.

pub mod document;
pub mod region;
pub mod text_document;

pub use document::{Document, OutOfRange};
pub use region::Region;
pub use text_document::TextDocument;
