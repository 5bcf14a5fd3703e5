// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, scope-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

use pretty_assertions::assert_eq;
use scope_graphs::ast::Loc;
use scope_graphs::source::TextRange;

use crate::util::*;

#[test]
fn derives_module_names_from_paths() {
    assert_eq!(text_src(0, "chef.py", "").module_name(), "chef");
    assert_eq!(
        text_src(0, "cooking/stove.py", "").module_name(),
        "cooking.stove"
    );
    assert_eq!(text_src(0, "a/b/__init__.py", "").module_name(), "a.b");
    assert_eq!(text_src(0, "", "").module_name(), "module");
}

#[test]
fn finds_whole_word_matches_line_by_line() -> anyhow::Result<()> {
    let source = text_src(0, "module.py", "xx = x\nfoo = 1\nx = 2");
    let start = source.position(0, 0);

    // `xx` is not a whole-word match for `x`.
    let first = source.find_after("x", start)?;
    assert_eq!((first.row, first.column), (0, 5));

    // Searching from past the first hit rolls over to the next line that matches.
    let second = source.find_after("x", source.position(0, 6))?;
    assert_eq!((second.row, second.column), (2, 0));

    assert!(source.find_after("missing", start).is_err());
    Ok(())
}

#[test]
fn reads_the_identifier_at_a_position() {
    let source = text_src(0, "module.py", "result = value + 3");
    assert_eq!(source.get_name_at(source.position(0, 0)).unwrap(), "result");
    assert_eq!(source.get_name_at(source.position(0, 9)).unwrap(), "value");
    assert!(source.get_name_at(source.position(0, 6)).is_err());
}

#[test]
fn translates_byte_columns_to_scalar_columns() {
    let source = text_src(0, "module.py", "x = 1\nnaïve = x");
    // The parser reports the byte column of `x` on the non-ASCII line.
    let byte_column = "naïve = ".len() as u32;
    let position = source.node_position(Loc::line_span(2, byte_column, byte_column + 1));
    assert_eq!((position.row, position.column), (1, 8));
    // Translating back to bytes recovers the reported column.
    let line = source.line(position.row);
    let roundtrip: usize = line
        .chars()
        .take(position.column as usize)
        .map(char::len_utf8)
        .sum();
    assert_eq!(roundtrip as u32, byte_column);
}

#[test]
fn ranges_join_covered_line_slices() {
    let source = text_src(0, "module.py", "first line\nsecond line\nthird line");
    let range = TextRange::new(source.position(0, 6), source.position(2, 5));
    assert_eq!(range.text(&source), "line\nsecond line\nthird");
}

#[test]
fn positions_are_ordered_by_source_then_location() {
    let first = text_src(0, "a.py", "x = 1");
    let second = text_src(1, "b.py", "x = 1");
    assert!(first.position(5, 0) < second.position(0, 0));
    assert!(first.position(1, 3) < first.position(2, 0));
    assert!(first.position(1, 3) < first.position(1, 4));
}

#[test]
fn position_arithmetic_shifts_the_column() {
    let source = text_src(0, "a.py", "x = 1");
    let position = source.position(0, 4);
    assert_eq!((position + 2).column, 6);
    assert_eq!((position - 4).column, 0);
}

#[test]
#[should_panic(expected = "illegal position")]
fn position_subtraction_cannot_underflow() {
    let source = text_src(0, "a.py", "x = 1");
    let _ = source.position(0, 2) - 3;
}

#[test]
fn finds_the_enclosing_function_extent() {
    let text = "\ndef outer():\n    def inner():\n        pass\n    return inner\n\nx = 1";
    let body = vec![
        func_def(
            "outer",
            params(vec![]),
            vec![
                func_def(
                    "inner",
                    params(vec![]),
                    vec![pass(tok(text, 3, "pass"))],
                    rows(text, 2, 3),
                ),
                ret(
                    name_load("inner", tok_nth(text, 4, "inner", 1)),
                    tok(text, 4, "return inner"),
                ),
            ],
            rows(text, 1, 4),
        ),
        assign(name_store("x", tok_nth(text, 6, "x", 1)), int(1, tok(text, 6, "1"))),
    ];
    let source = src(0, "module.py", text, body);

    // Inside `inner`, the innermost extent wins.
    let inner = source
        .get_enclosing_function_range(source.position(3, 8))
        .unwrap();
    assert_eq!(inner.start.row, 2);
    assert_eq!(inner.end.row, 3);

    let outer = source
        .get_enclosing_function_range(source.position(4, 4))
        .unwrap();
    assert_eq!(outer.start.row, 1);

    assert!(source.get_enclosing_function_range(source.position(6, 0)).is_none());

    // The largest enclosing scope is the top-level definition.
    let largest = source
        .get_largest_enclosing_scope_range(source.position(3, 8))
        .unwrap();
    assert_eq!(largest.start.row, 1);
    assert_eq!(largest.end.row, 4);
}
