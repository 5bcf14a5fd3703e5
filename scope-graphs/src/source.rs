// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, scope-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

//! The source model: immutable line buffers, positions, and text ranges.
//!
//! A [`Source`][] owns the line-split text of one file together with its parsed AST (parsing is
//! the front end's job; the analysis only ever reads the tree).  Positions count rows from 0 and
//! columns in _Unicode scalar values_, not bytes — the AST contract reports byte columns, and
//! [`Source::node_position`][] is where the translation happens.
//!
//! [`Source`]: struct.Source.html
//! [`Source::node_position`]: struct.Source.html#method.node_position

use std::fmt::Display;
use std::path::Path;

use regex::Regex;

use crate::ast;
use crate::ast::walk::NodeRef;
use crate::edit::Edit;
use crate::NotFound;

//-------------------------------------------------------------------------------------------------
// Positions

/// Identifies a source within the set of sources under analysis.  Identity is the ordinal the
/// front end assigned when it loaded the file, which is what makes position ordering stable for
/// the lifetime of the process.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SourceId(pub u32);

/// A character position in a source: 0-based row, 0-based column in Unicode scalar values.
///
/// Positions are totally ordered by source identity, then row, then column.  Adding or
/// subtracting shifts the column only; subtracting below column 0 is a programmer error and
/// panics.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Position {
    pub source: SourceId,
    pub row: u32,
    pub column: u32,
}

impl Position {
    pub fn new(source: SourceId, row: u32, column: u32) -> Position {
        Position {
            source,
            row,
            column,
        }
    }

    /// The position at column 0 of this position's row.
    pub fn start_of_line(self) -> Position {
        Position {
            column: 0,
            ..self
        }
    }

    /// The position at column 0 of the following row.
    pub fn next_line(self) -> Position {
        Position {
            row: self.row + 1,
            column: 0,
            ..self
        }
    }

    /// A range from this position through `end`.
    pub fn through(self, end: Position) -> TextRange {
        TextRange::new(self, end)
    }
}

impl std::ops::Add<u32> for Position {
    type Output = Position;

    fn add(self, columns: u32) -> Position {
        Position {
            column: self.column + columns,
            ..self
        }
    }
}

impl std::ops::Sub<u32> for Position {
    type Output = Position;

    fn sub(self, columns: u32) -> Position {
        if columns > self.column {
            panic!(
                "illegal position: column {} - {} underflows",
                self.column, columns
            );
        }
        Position {
            column: self.column - columns,
            ..self
        }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.source.0, self.row, self.column)
    }
}

/// A half-open range of text within a single source: `start` is included, `end` is not.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TextRange {
    pub start: Position,
    pub end: Position,
}

impl TextRange {
    /// Creates a new range.  Panics if `end` precedes `start` or lives in a different source —
    /// both are caller bugs.
    pub fn new(start: Position, end: Position) -> TextRange {
        assert!(start.source == end.source, "range spans sources");
        assert!(start <= end, "range ends before it starts");
        TextRange { start, end }
    }

    /// An empty range, used for insertions.
    pub fn empty(at: Position) -> TextRange {
        TextRange {
            start: at,
            end: at,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, position: Position) -> bool {
        self.start <= position && position < self.end
    }

    pub fn contains_range(&self, other: TextRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Whether the two ranges overlap in at least one character.  Empty ranges overlap nothing.
    pub fn overlaps(&self, other: TextRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

//-------------------------------------------------------------------------------------------------
// Sources

/// The line-split text of one file, together with its parsed AST and derived module name.
pub struct Source {
    id: SourceId,
    path: String,
    module_name: String,
    lines: Vec<String>,
    module: ast::Module,
}

impl Source {
    /// Creates a source from its text and parsed AST.  The module name is derived from `path`
    /// relative to `project_root`: separators become dots, the extension is dropped, and an
    /// `__init__` file collapses into its directory's module.
    pub fn new(
        id: SourceId,
        path: &str,
        project_root: &str,
        text: &str,
        module: ast::Module,
    ) -> Source {
        Source {
            id,
            path: path.to_owned(),
            module_name: module_name_from_path(path, project_root),
            lines: text.split('\n').map(str::to_owned).collect(),
            module,
        }
    }

    pub fn id(&self) -> SourceId {
        self.id
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn ast(&self) -> &ast::Module {
        &self.module
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line(&self, row: u32) -> &str {
        &self.lines[row as usize]
    }

    pub fn line_count(&self) -> u32 {
        self.lines.len() as u32
    }

    pub fn position(&self, row: u32, column: u32) -> Position {
        Position::new(self.id, row, column)
    }

    /// The position just past the last line, used to form whole-file ranges.
    pub fn end_position(&self) -> Position {
        match self.lines.last() {
            Some(last) => self.position(self.line_count() - 1, last.chars().count() as u32),
            None => self.position(0, 0),
        }
    }

    pub fn full_range(&self) -> TextRange {
        TextRange::new(self.position(0, 0), self.end_position())
    }

    /// The identifier starting at a position, if the position sits on one.
    pub fn get_name_at(&self, position: Position) -> Result<&str, NotFound> {
        let line = self.line(position.row);
        let rest = char_slice(line, position.column, None);
        let word = Regex::new(r"^\w+").unwrap();
        match word.find(rest) {
            Some(found) => Ok(&rest[found.range()]),
            None => Err(NotFound),
        }
    }

    /// Locates the next whole-word occurrence of `name` at or after `start`, advancing line by
    /// line.
    pub fn find_after(&self, name: &str, start: Position) -> Result<Position, NotFound> {
        let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(name))).unwrap();
        let mut current = start;
        while current.row < self.line_count() {
            let line = self.line(current.row);
            let rest = char_slice(line, current.column, None);
            if let Some(found) = pattern.find(rest) {
                let offset = rest[..found.start()].chars().count() as u32;
                return Ok(current + offset);
            }
            current = current.next_line();
        }
        Err(NotFound)
    }

    /// The start position of an AST node, with the byte column translated into scalars.
    pub fn node_position(&self, loc: ast::Loc) -> Position {
        let row = loc.row - 1;
        let line = self.line(row);
        let column = source_positions::char_offset(line, loc.column as usize) as u32;
        self.position(row, column)
    }

    /// The (exclusive) end position of an AST node.
    pub fn node_end_position(&self, loc: ast::Loc) -> Position {
        let row = loc.end_row - 1;
        let line = self.line(row);
        let column = source_positions::char_offset(line, loc.end_column as usize) as u32;
        self.position(row, column)
    }

    /// The full extent of an AST node.
    pub fn node_range(&self, loc: ast::Loc) -> TextRange {
        TextRange::new(self.node_position(loc), self.node_end_position(loc))
    }

    /// The leading whitespace of a row.
    pub fn indentation(&self, row: u32) -> &str {
        let line = self.line(row);
        let end = line
            .find(|ch: char| !ch.is_whitespace())
            .unwrap_or_else(|| line.len());
        &line[..end]
    }

    /// The extent of the innermost function definition enclosing a position.
    pub fn get_enclosing_function_range(&self, position: Position) -> Option<TextRange> {
        let mut found = None;
        self.each_function_def(&mut |node| {
            let range = self.node_range(node.loc);
            if range.contains(position) {
                // Later hits are deeper in the tree.
                found = Some(range);
            }
        });
        found
    }

    /// The extent of the top-level definition (function or class) enclosing a position.
    pub fn get_largest_enclosing_scope_range(&self, position: Position) -> Option<TextRange> {
        for stmt in &self.module.body {
            match stmt {
                ast::Stmt::FunctionDef(_)
                | ast::Stmt::AsyncFunctionDef(_)
                | ast::Stmt::ClassDef(_) => {
                    let range = self.node_range(stmt.loc());
                    if range.contains(position) {
                        return Some(range);
                    }
                }
                _ => {}
            }
        }
        None
    }

    fn each_function_def(&self, f: &mut dyn FnMut(&ast::FunctionDef)) {
        fn recurse<'a>(node: NodeRef<'a>, f: &mut dyn FnMut(&'a ast::FunctionDef)) {
            if let NodeRef::Stmt(ast::Stmt::FunctionDef(def))
            | NodeRef::Stmt(ast::Stmt::AsyncFunctionDef(def)) = node
            {
                f(def);
            }
            ast::walk::each_child(node, &mut |child| recurse(child, f));
        }
        for stmt in &self.module.body {
            recurse(NodeRef::Stmt(stmt), f);
        }
    }
}

impl TextRange {
    /// The text covered by this range, with covered line slices joined by newlines.
    pub fn text(&self, source: &Source) -> String {
        self.lines_in(source).join("\n")
    }

    /// The text covered by this range as individual lines.
    pub fn lines_in(&self, source: &Source) -> Vec<String> {
        debug_assert!(self.start.source == source.id());
        if self.start.row == self.end.row {
            let line = source.line(self.start.row);
            return vec![
                char_slice_bounded(line, self.start.column, self.end.column).to_owned(),
            ];
        }
        let mut lines = Vec::with_capacity((self.end.row - self.start.row + 1) as usize);
        lines.push(char_slice(source.line(self.start.row), self.start.column, None).to_owned());
        for row in (self.start.row + 1)..self.end.row {
            lines.push(source.line(row).to_owned());
        }
        lines.push(
            char_slice_bounded(source.line(self.end.row), 0, self.end.column).to_owned(),
        );
        lines
    }

    /// Materializes the text of this range with the given edits applied.  Edits whose ranges fall
    /// outside this range are ignored; overlapping edits are a caller bug.
    pub fn text_with_substitutions(&self, source: &Source, edits: &[Edit]) -> Vec<String> {
        let mut lines = self.lines_in(source);
        let mut applicable: Vec<&Edit> = edits
            .iter()
            .filter(|edit| {
                if edit.range.is_empty() {
                    self.start <= edit.range.start && edit.range.start <= self.end
                } else {
                    self.contains_range(edit.range)
                }
            })
            .collect();
        applicable.sort_by_key(|edit| edit.range.start);
        for window in applicable.windows(2) {
            assert!(
                !window[0].range.overlaps(window[1].range),
                "overlapping edits"
            );
        }
        // Applying back to front keeps the positions of earlier edits valid.
        for edit in applicable.iter().rev() {
            splice(&mut lines, self.start, edit);
        }
        lines
    }
}

/// Replaces one edit's range within `lines` (which start at `origin`) with the edit's text.
fn splice(lines: &mut Vec<String>, origin: Position, edit: &Edit) {
    let relative_row = |row: u32| (row - origin.row) as usize;
    let relative_column = |position: Position| {
        if position.row == origin.row {
            position.column - origin.column
        } else {
            position.column
        }
    };
    let start_row = relative_row(edit.range.start.row);
    let end_row = relative_row(edit.range.end.row);
    let prefix =
        char_slice_bounded(&lines[start_row], 0, relative_column(edit.range.start)).to_owned();
    let suffix = char_slice(&lines[end_row], relative_column(edit.range.end), None).to_owned();

    let mut replacement: Vec<String> = Vec::new();
    let mut new_lines = edit.text.split('\n');
    let first = new_lines.next().unwrap_or("");
    replacement.push(format!("{}{}", prefix, first));
    for line in new_lines {
        replacement.push(line.to_owned());
    }
    let last = replacement.last_mut().unwrap();
    last.push_str(&suffix);

    lines.splice(start_row..=end_row, replacement);
}

/// Slices a line by scalar columns; `end` of `None` means through end of line.
pub(crate) fn char_slice(line: &str, start: u32, end: Option<u32>) -> &str {
    let start_byte = byte_offset(line, start);
    match end {
        Some(end) => &line[start_byte..byte_offset(line, end)],
        None => &line[start_byte..],
    }
}

pub(crate) fn char_slice_bounded(line: &str, start: u32, end: u32) -> &str {
    char_slice(line, start, Some(end))
}

fn byte_offset(line: &str, column: u32) -> usize {
    if line.is_ascii() {
        return (column as usize).min(line.len());
    }
    line.char_indices()
        .map(|(offset, _)| offset)
        .chain(std::iter::once(line.len()))
        .nth(column as usize)
        .unwrap_or_else(|| line.len())
}

fn module_name_from_path(path: &str, project_root: &str) -> String {
    let path = Path::new(path);
    let root = Path::new(project_root);
    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut parts: Vec<&str> = Vec::new();
    for component in relative.components() {
        if let std::path::Component::Normal(part) = component {
            if let Some(part) = part.to_str() {
                parts.push(part);
            }
        }
    }
    let last = match parts.pop() {
        Some(last) => last,
        None => return "module".to_owned(),
    };
    let stem = last.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(last);
    if stem != "__init__" {
        parts.push(stem);
    }
    if parts.is_empty() {
        "module".to_owned()
    } else {
        parts.join(".")
    }
}
