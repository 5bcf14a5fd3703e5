// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, scope-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

//! The refactoring planner: from a selection to an ordered list of edits.
//!
//! A [`CodeSelection`][] owns the scope graph built over the sources under analysis; each
//! refactoring is a method on it returning edits sorted by start position.  An empty list means
//! "not applicable here" — the selection doesn't span a whole expression, the slide has nowhere
//! to go — and front ends present that as the refactoring being unavailable.
//!
//! The analyses underneath combine the scope graph (which occurrences belong to which binding)
//! with plain AST search (where names sit relative to the selection): free variables become
//! parameters, names assigned inside and read after become return values, structurally identical
//! expressions become shared extractions.
//!
//! [`CodeSelection`]: struct.CodeSelection.html

use itertools::Itertools;
use regex::Regex;

use crate::ast;
use crate::builder::build_graph;
use crate::edit::Edit;
use crate::graph::ScopeGraph;
use crate::occurrences::all_occurrence_positions_in;
use crate::search;
use crate::search::NameOccurrence;
use crate::source::Position;
use crate::source::Source;
use crate::source::SourceId;
use crate::source::TextRange;

const FOUR_SPACES: &str = "    ";

/// A selection within a set of sources, with the scope graph built once over all of them.
pub struct CodeSelection<'a> {
    sources: &'a [Source],
    range: TextRange,
    graph: ScopeGraph,
}

impl<'a> CodeSelection<'a> {
    /// Creates a selection.  `sources[i]` must carry `SourceId(i)`; the range must lie within one
    /// of the sources.
    pub fn new(sources: &'a [Source], range: TextRange) -> CodeSelection<'a> {
        let graph = build_graph(sources);
        CodeSelection {
            sources,
            range,
            graph,
        }
    }

    pub fn range(&self) -> TextRange {
        self.range
    }

    fn source(&self) -> &'a Source {
        self.source_of(self.range.start.source)
    }

    fn source_of(&self, id: SourceId) -> &'a Source {
        &self.sources[id.0 as usize]
    }

    //---------------------------------------------------------------------------------------------
    // Extract variable

    /// Extracts the selected expression into a variable, replacing every structurally identical
    /// expression in the same enclosing scope.  Applicable only when the selection spans exactly
    /// one complete expression.
    pub fn extract_variable(&self, name: &str) -> Vec<Edit> {
        let source = self.source();
        let expression = match expression_at(source, self.range) {
            Some(expression) => expression,
            None => return Vec::new(),
        };
        let extracted = self.range.text(source);

        let other_occurrences =
            search::find_other_occurrences(source, expression, self.range.start);
        let mut edits = vec![Edit::new(self.range, name)];
        for occurrence in other_occurrences {
            edits.push(Edit::new(source.node_range(occurrence.loc()), name));
        }
        edits.sort();
        let first_edit_position = edits[0].start();

        // Anchor the definition at the start of the statement preceding the earliest occurrence.
        let mut statement_start = None;
        for statement in search::find_statements(source.ast()) {
            let statement_position = source.node_position(statement.loc());
            if statement_position < first_edit_position {
                statement_start = Some(statement_position);
            }
        }
        let insert_point = statement_start.unwrap_or_else(|| first_edit_position.start_of_line());
        let indentation = " ".repeat(insert_point.column as usize);
        let definition = format!("{} = {}\n{}", name, extracted, indentation);
        let mut result = vec![Edit::insert(insert_point, definition)];
        result.extend(edits);
        result
    }

    //---------------------------------------------------------------------------------------------
    // Extract function / method

    pub fn extract_function(&self, name: &str) -> Vec<Edit> {
        self.extract_callable(name, false)
    }

    pub fn extract_method(&self, name: &str) -> Vec<Edit> {
        self.extract_callable(name, true)
    }

    fn extract_callable(&self, name: &str, is_method: bool) -> Vec<Edit> {
        let source = self.source();
        let (start, end) = (self.range.start, self.range.end);
        let original_indentation = source.indentation(start.row).to_owned();
        let new_indentation = if is_method {
            original_indentation.clone()
        } else {
            FOUR_SPACES.to_owned()
        };

        let extended = self.extended_range();
        let names_in_range = search::find_names_in_range(source, extended);
        let extracting_partial_line = start.row == end.row && start.column != 0;

        let (extracted, assignment) = if extracting_partial_line {
            let text = self.range.text(source);
            (
                format!("{}return {}", new_indentation, text.trim()),
                String::new(),
            )
        } else {
            self.extract_statements(extended, &names_in_range, &new_indentation)
        };

        let start_of_current_scope = source
            .get_largest_enclosing_scope_range(start)
            .map(|scope| scope.start)
            .unwrap_or_else(|| source.position(0, 0));
        let parameter_names: Vec<String> = self
            .names_defined_before_range(&names_in_range, extended)
            .into_iter()
            .filter(|(position, name)| {
                *position >= start_of_current_scope
                    || self.passed_as_argument_within(name, extended)
            })
            .map(|(_, name)| name)
            .collect();

        let self_name = if is_method { Some("self") } else { None };
        let arguments = parameter_names
            .iter()
            .filter(|parameter| Some(parameter.as_str()) != self_name)
            .map(|parameter| format!("{}={}", parameter, parameter))
            .join(", ");
        let self_prefix = match self_name {
            Some(receiver) if parameter_names.iter().any(|p| p == receiver) => {
                format!("{}.", receiver)
            }
            _ => String::new(),
        };
        let call = format!("{}{}({})", self_prefix, name, arguments);
        let replace_text = if extracting_partial_line {
            call
        } else {
            format!("{}{}{}\n", original_indentation, assignment, call)
        };

        let definition_indentation = if is_method {
            original_indentation[..original_indentation.len().saturating_sub(4)].to_owned()
        } else {
            String::new()
        };
        let uses_receiver = self_name
            .map(|receiver| parameter_names.iter().any(|p| p == receiver))
            .unwrap_or(false);
        let (static_method, parameters) = if is_method {
            if uses_receiver {
                let with_self = std::iter::once("self".to_owned())
                    .chain(
                        parameter_names
                            .iter()
                            .filter(|p| p.as_str() != "self")
                            .cloned(),
                    )
                    .join(", ");
                (String::new(), with_self)
            } else {
                (
                    format!("{}@staticmethod\n", definition_indentation),
                    parameter_names.iter().join(", "),
                )
            }
        } else {
            (String::new(), parameter_names.iter().join(", "))
        };

        let insert_position = self.find_callable_insert_point(start, !is_method);
        let definition = format!(
            "\n{}{}def {}({}):\n{}\n",
            static_method, definition_indentation, name, parameters, extracted
        );
        let insert = if insert_position.row >= source.line_count() {
            Edit::insert(source.end_position(), format!("\n{}", definition))
        } else {
            Edit::insert(insert_position, definition)
        };

        let replace = Edit::new(TextRange::new(start, end), replace_text);
        let mut edits = vec![insert, replace];
        edits.sort();
        edits
    }

    fn extract_statements(
        &self,
        range: TextRange,
        names_in_range: &[NameOccurrence],
        new_indentation: &str,
    ) -> (String, String) {
        let source = self.source();
        let return_values = self.return_values(names_in_range, range.end);
        let mut extracted = dedent(&range.lines_in(source))
            .into_iter()
            .map(|line| format!("{}{}", new_indentation, line).trim_end().to_owned())
            .join("\n");
        let assignment = if return_values.is_empty() {
            String::new()
        } else {
            let as_string = return_values.iter().join(", ");
            extracted.push_str(&format!("\n{}return {}", new_indentation, as_string));
            format!("{} = ", as_string)
        };
        (extracted, assignment)
    }

    /// Names assigned inside the range and read after it, in source order, without duplicates —
    /// the extracted callable's return values.
    fn return_values(&self, names_in_range: &[NameOccurrence], end: Position) -> Vec<String> {
        let modified: Vec<&NameOccurrence> = names_in_range
            .iter()
            .filter(|occurrence| occurrence.is_store())
            .collect();
        let pairs: Vec<(String, Position)> = names_in_range
            .iter()
            .map(|occurrence| (occurrence.name.clone(), occurrence.position))
            .collect();
        let used_after: Vec<String> = self
            .names_used_after_position(&pairs, end)
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        modified
            .into_iter()
            .map(|occurrence| occurrence.name.clone())
            .filter(|name| used_after.contains(name))
            .unique()
            .collect()
    }

    /// The selection widened to whole lines when it spans more than one.
    fn extended_range(&self) -> TextRange {
        let mut start = self.range.start;
        let mut end = self.range.end;
        if start.row < end.row {
            start = start.start_of_line();
            if end.row + 1 < self.source().line_count() {
                end = end.next_line();
            }
        }
        TextRange::new(start, end)
    }

    fn find_callable_insert_point(&self, start: Position, is_global: bool) -> Position {
        let source = self.source();
        let enclosing = if is_global {
            source.get_largest_enclosing_scope_range(start)
        } else {
            source.get_enclosing_function_range(start)
        };
        match enclosing {
            Some(enclosing) => source.position(enclosing.end.row + 1, 0),
            None => source.position(start.row, 0),
        }
    }

    fn passed_as_argument_within(&self, name: &str, range: TextRange) -> bool {
        search::find_arguments_passed_in_range(self.source(), range)
            .iter()
            .any(|argument| argument == name)
    }

    //---------------------------------------------------------------------------------------------
    // Inline call / inline variable

    /// Inlines the body of the function called at the selection, binding its return value to
    /// `name`.  Parameters are substituted with the call's actual arguments, positionally and by
    /// keyword.
    pub fn inline_call(&self, name: &str) -> Vec<Edit> {
        let source = self.source();
        let call = match call_at(source, self.range.start) {
            Some(call) => call,
            None => return Vec::new(),
        };

        let occurrence = match self
            .graph
            .nodes_at(self.range.start)
            .iter()
            .copied()
            .find(|node| self.graph[*node].name.into_option().is_some())
        {
            Some(occurrence) => occurrence,
            None => return Vec::new(),
        };
        let definition = match crate::resolve::find_definition(&self.graph, occurrence) {
            Ok(definition) => definition,
            Err(_) => return Vec::new(),
        };
        let definition_position = match self.graph[definition].position {
            Some(position) => position,
            None => return Vec::new(),
        };
        let definition_source = self.source_of(definition_position.source);
        let function = match search::find_functions(definition_source, definition_position)
            .into_iter()
            .find(|function| {
                definition_source.node_position(function.loc) + 4 == definition_position
                    || definition_source.node_position(function.loc) + 10 == definition_position
            }) {
            Some(function) => function,
            None => return Vec::new(),
        };

        // A return anywhere but the tail has no textual equivalent at the call site.
        let returns = search::find_returns(&function.body);
        let ends_in_return = matches!(function.body.last(), Some(ast::Stmt::Return(_)));
        if returns.len() > 1 || (returns.len() == 1 && !ends_in_return) {
            return Vec::new();
        }

        let substitutions = parameter_substitutions(source, definition_source, call, function);
        let body_range = body_lines_range(definition_source, &function.body);
        let mut body_lines = dedent(&body_range.lines_in(definition_source));
        for line in body_lines.iter_mut() {
            *line = substitute_names(line, &substitutions);
        }

        let indentation = source.indentation(self.range.start.row).to_owned();
        let return_value = body_lines
            .last()
            .and_then(|line| line.trim().strip_prefix("return ").map(str::to_owned));
        if let Some(value) = &return_value {
            let last = body_lines.last_mut().unwrap();
            *last = format!("{} = {}", name, value);
        }

        let body = body_lines
            .iter()
            .map(|line| format!("{}{}", indentation, line).trim_end().to_owned())
            .join("\n");
        let insert_at = source.position(self.range.start.row, 0);
        let replacement = if return_value.is_some() { name } else { "None" };
        vec![
            Edit::insert(insert_at, format!("{}\n", body)),
            Edit::new(source.node_range(call.loc), replacement),
        ]
    }

    /// Replaces every use of the variable at the selection with its single assigned expression
    /// and deletes the assignment.
    pub fn inline_variable(&self) -> Vec<Edit> {
        let source = self.source();
        let occurrences = match all_occurrence_positions_in(&self.graph, self.range.start) {
            Ok(occurrences) => occurrences,
            Err(_) => return Vec::new(),
        };

        // The definition must be a single-target, single-assignment binding.
        let mut assignments = Vec::new();
        for statement in search::find_statements(source.ast()) {
            if let ast::Stmt::Assign(assign) = statement {
                if let [ast::Expr::Name(target)] = assign.targets.as_slice() {
                    if occurrences.contains(&source.node_position(target.loc)) {
                        assignments.push((assign, source.node_position(target.loc)));
                    }
                }
            }
        }
        let (assign, target_position) = match assignments.as_slice() {
            [single] => single.clone(),
            _ => return Vec::new(),
        };

        let value_text = source.node_range(assign.value.loc()).text(source);
        let name_length = match source.get_name_at(target_position) {
            Ok(found) => found.chars().count() as u32,
            Err(_) => return Vec::new(),
        };

        let mut edits = Vec::new();
        let statement_row = source.node_position(assign.loc).row;
        let delete_end = if source.node_end_position(assign.loc).row + 1 < source.line_count() {
            source.position(source.node_end_position(assign.loc).row + 1, 0)
        } else {
            source.node_end_position(assign.loc)
        };
        edits.push(Edit::delete(TextRange::new(
            source.position(statement_row, 0),
            delete_end,
        )));
        for occurrence in occurrences {
            if occurrence == target_position {
                continue;
            }
            edits.push(Edit::new(
                TextRange::new(occurrence, occurrence + name_length),
                value_text.clone(),
            ));
        }
        edits.sort();
        edits
    }

    //---------------------------------------------------------------------------------------------
    // Slide statements

    /// Moves the selected lines down to just above the first statement that reads a name they
    /// define.  A no-op unless that lands at least one line past the selection.
    pub fn slide_statements_down(&self) -> Vec<Edit> {
        let first_row = self.range.start.row;
        let last_row = self.range.end.row;
        let target = match self.find_slide_target_after(first_row, last_row) {
            Some(target) => target,
            None => return Vec::new(),
        };
        self.slide_edits(first_row, last_row, target)
    }

    /// Moves the selected lines up to just below the last statement that defines a name they
    /// read.
    pub fn slide_statements_up(&self) -> Vec<Edit> {
        let first_row = self.range.start.row;
        let last_row = self.range.end.row;
        let target = match self.find_slide_target_before(first_row, last_row) {
            Some(target) => target,
            None => return Vec::new(),
        };
        self.slide_edits(first_row, last_row, target)
    }

    fn slide_edits(&self, first_row: u32, last_row: u32, target: Position) -> Vec<Edit> {
        let source = self.source();
        let moved = TextRange::new(
            source.position(first_row, 0),
            line_end(source, last_row),
        );
        let insert = Edit::insert(target, format!("{}\n", moved.text(source)));
        let delete_end = if last_row + 1 < source.line_count() {
            source.position(last_row + 1, 0)
        } else {
            line_end(source, last_row)
        };
        let delete = Edit::delete(TextRange::new(source.position(first_row, 0), delete_end));
        let mut edits = vec![insert, delete];
        edits.sort();
        edits
    }

    fn find_slide_target_after(&self, first_row: u32, last_row: u32) -> Option<Position> {
        let source = self.source();
        let range = TextRange::new(source.position(first_row, 0), line_end(source, last_row));
        let defined: Vec<(String, Position)> = search::find_names_in_range(source, range)
            .into_iter()
            .filter(NameOccurrence::is_store)
            .map(|occurrence| (occurrence.name, occurrence.position))
            .collect();
        let first_usage = self
            .names_used_after_position(&defined, range.end)
            .into_iter()
            .map(|(_, position)| position)
            .next()?;

        let original_indentation = source.indentation(first_row).len();
        let mut target = first_usage;
        while target.row > last_row + 1
            && source.indentation(target.row).len() != original_indentation
        {
            if target.row == 0 {
                break;
            }
            target = source.position(target.row - 1, 0);
        }
        if target.row > last_row + 1 {
            Some(target.start_of_line())
        } else {
            None
        }
    }

    fn find_slide_target_before(&self, first_row: u32, last_row: u32) -> Option<Position> {
        let source = self.source();
        let original_indentation = source.indentation(first_row).len();
        let mut row = first_row;
        while row > 0 && source.indentation(row - 1).len() >= original_indentation {
            row -= 1;
        }
        if row == first_row {
            return None;
        }

        let scope_before = TextRange::new(
            source.position(row, 0),
            source.position(first_row, 0),
        );
        let selection = TextRange::new(
            source.position(first_row, 0),
            line_end(source, last_row),
        );
        let names_in_selection: Vec<String> = search::find_names_in_range(source, selection)
            .into_iter()
            .map(|occurrence| occurrence.name)
            .collect();

        let mut target = source.position(row, 0);
        for occurrence in search::find_names_in_range(source, scope_before) {
            if names_in_selection.contains(&occurrence.name) {
                let after = source.position(occurrence.position.row + 1, 0);
                if after > target {
                    target = after;
                }
            }
        }
        if target.row < first_row {
            Some(target)
        } else {
            None
        }
    }

    //---------------------------------------------------------------------------------------------
    // Scope-graph backed analyses

    /// The free variables of a range: names used inside whose earliest occurrence precedes the
    /// range, paired with that occurrence.  Deduplicated by name, in order of first appearance
    /// within the range.
    fn names_defined_before_range(
        &self,
        names: &[NameOccurrence],
        range: TextRange,
    ) -> Vec<(Position, String)> {
        let mut found: Vec<(Position, String)> = Vec::new();
        for occurrence in names {
            if found.iter().any(|(_, name)| *name == occurrence.name) {
                continue;
            }
            let positions = match all_occurrence_positions_in(&self.graph, occurrence.position) {
                Ok(positions) => positions,
                Err(_) => continue,
            };
            if let Some(first) = positions.first() {
                if *first < range.start {
                    found.push((*first, occurrence.name.clone()));
                }
            }
        }
        found
    }

    /// The subset of `names` with an occurrence beyond `cutoff`, paired with that occurrence.
    fn names_used_after_position(
        &self,
        names: &[(String, Position)],
        cutoff: Position,
    ) -> Vec<(String, Position)> {
        let mut results = Vec::new();
        for (name, position) in names {
            let positions = match all_occurrence_positions_in(&self.graph, *position) {
                Ok(positions) => positions,
                Err(_) => continue,
            };
            if let Some(after) = positions.into_iter().find(|occurrence| *occurrence > cutoff) {
                results.push((name.clone(), after));
            }
        }
        results
    }
}

//-------------------------------------------------------------------------------------------------
// Local helpers

/// The expression whose extent is exactly `range`, if any — the "selection spans a complete
/// expression" test.
fn expression_at<'a>(source: &'a Source, range: TextRange) -> Option<&'a ast::Expr> {
    let mut found = None;
    for stmt in &source.ast().body {
        find_expression(
            crate::ast::walk::NodeRef::Stmt(stmt),
            source,
            range,
            &mut found,
        );
    }
    found
}

fn find_expression<'a>(
    node: crate::ast::walk::NodeRef<'a>,
    source: &Source,
    range: TextRange,
    found: &mut Option<&'a ast::Expr>,
) {
    if found.is_some() {
        return;
    }
    if let crate::ast::walk::NodeRef::Expr(expr) = node {
        if source.node_range(expr.loc()) == range {
            *found = Some(expr);
            return;
        }
    }
    crate::ast::walk::each_child(node, &mut |child| {
        find_expression(child, source, range, found)
    });
}

/// The innermost call whose callee starts at `position` (or that starts there itself).
fn call_at<'a>(source: &'a Source, position: Position) -> Option<&'a ast::Call> {
    let mut found: Option<&ast::Call> = None;
    for stmt in &source.ast().body {
        find_call(crate::ast::walk::NodeRef::Stmt(stmt), source, position, &mut found);
    }
    found
}

fn find_call<'a>(
    node: crate::ast::walk::NodeRef<'a>,
    source: &Source,
    position: Position,
    found: &mut Option<&'a ast::Call>,
) {
    if let crate::ast::walk::NodeRef::Expr(ast::Expr::Call(call)) = node {
        if source.node_position(call.func.loc()) == position
            || source.node_position(call.loc) == position
        {
            *found = Some(call);
        }
    }
    crate::ast::walk::each_child(node, &mut |child| {
        find_call(child, source, position, found)
    });
}

/// Maps parameter names to the argument texts supplied at a call site: positional by index,
/// keyword by name, defaults for the rest.
fn parameter_substitutions(
    call_source: &Source,
    definition_source: &Source,
    call: &ast::Call,
    function: &ast::FunctionDef,
) -> Vec<(String, String)> {
    let mut substitutions = Vec::new();
    let positional: Vec<&ast::Arg> = function.args.positional().collect();
    for (parameter, argument) in positional.iter().zip(&call.args) {
        substitutions.push((
            parameter.arg.clone(),
            call_source.node_range(argument.loc()).text(call_source),
        ));
    }
    for keyword in &call.keywords {
        if let Some(arg) = &keyword.arg {
            substitutions.push((
                arg.clone(),
                call_source
                    .node_range(keyword.value.loc())
                    .text(call_source),
            ));
        }
    }
    // Unsupplied parameters fall back to their default expressions.
    let defaults_offset = positional.len().saturating_sub(function.args.defaults.len());
    for (index, parameter) in positional.iter().enumerate() {
        let already = substitutions
            .iter()
            .any(|(name, _)| name == &parameter.arg);
        if already {
            continue;
        }
        if index >= defaults_offset {
            let default = &function.args.defaults[index - defaults_offset];
            substitutions.push((
                parameter.arg.clone(),
                definition_source
                    .node_range(default.loc())
                    .text(definition_source),
            ));
        }
    }
    substitutions
}

/// Whole-word textual substitution of parameter names by argument texts.
fn substitute_names(line: &str, substitutions: &[(String, String)]) -> String {
    let mut result = line.to_owned();
    for (name, replacement) in substitutions {
        let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(name))).unwrap();
        result = pattern
            .replace_all(&result, |_: &regex::Captures| replacement.clone())
            .into_owned();
    }
    result
}

/// The full-line extent of a statement list.
fn body_lines_range(source: &Source, body: &[ast::Stmt]) -> TextRange {
    let first = source.node_position(body[0].loc()).row;
    let last = body
        .iter()
        .map(|stmt| source.node_end_position(stmt.loc()).row)
        .max()
        .unwrap_or(first);
    TextRange::new(source.position(first, 0), line_end(source, last))
}

fn line_end(source: &Source, row: u32) -> Position {
    source.position(row, source.line(row).chars().count() as u32)
}

/// Strips the longest common leading whitespace from a group of lines.
fn dedent(lines: &[String]) -> Vec<String> {
    let common = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|line| {
            if line.len() >= common {
                line[common..].to_owned()
            } else {
                line.trim_start().to_owned()
            }
        })
        .collect()
}
