// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, scope-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

//! Textual edits and their application.
//!
//! Refactorings produce lists of [`Edit`s][`Edit`]; the front end decides whether to ship them
//! over a protocol or apply them directly with [`apply_edits`][].  An empty edit list means the
//! refactoring was not applicable at the given selection — front ends treat that as "unavailable",
//! not as an error.
//!
//! [`Edit`]: struct.Edit.html
//! [`apply_edits`]: fn.apply_edits.html

use crate::source::Position;
use crate::source::Source;
use crate::source::TextRange;

/// A replacement of one text range.  An empty range makes the edit an insertion.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Edit {
    pub range: TextRange,
    pub text: String,
}

impl Edit {
    pub fn new(range: TextRange, text: impl Into<String>) -> Edit {
        Edit {
            range,
            text: text.into(),
        }
    }

    /// An insertion at a single position.
    pub fn insert(at: Position, text: impl Into<String>) -> Edit {
        Edit::new(TextRange::empty(at), text)
    }

    /// A deletion of a range.
    pub fn delete(range: TextRange) -> Edit {
        Edit::new(range, "")
    }

    pub fn start(&self) -> Position {
        self.range.start
    }
}

impl Ord for Edit {
    fn cmp(&self, other: &Edit) -> std::cmp::Ordering {
        self.range
            .start
            .cmp(&other.range.start)
            .then_with(|| self.range.end.cmp(&other.range.end))
    }
}

impl PartialOrd for Edit {
    fn partial_cmp(&self, other: &Edit) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Applies a refactoring's edits to a source, producing the revised file contents.  Line endings
/// are always `\n`.  Edits are sorted by start position before application; overlapping edits are
/// a caller bug.
pub fn apply_edits(source: &Source, edits: &[Edit]) -> String {
    let lines = source
        .full_range()
        .text_with_substitutions(source, edits);
    lines.join("\n")
}
