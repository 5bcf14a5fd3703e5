// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, scope-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

use pretty_assertions::assert_eq;
use scope_graphs::occurrences::all_occurrence_positions;
use scope_graphs::source::Source;

use crate::util::*;

fn occurrences(source: &Source, row: u32, column: u32) -> Vec<(u32, u32)> {
    all_occurrence_positions(source.position(row, column), std::slice::from_ref(source))
        .expect("query should resolve")
        .into_iter()
        .map(|position| (position.row, position.column))
        .collect()
}

fn global_source() -> (&'static str, Source) {
    let text = "\nvar = 12\n\ndef fun():\n    global var\n    foo = var";
    let body = vec![
        assign(name_store("var", tok(text, 1, "var")), int(12, tok(text, 1, "12"))),
        func_def(
            "fun",
            params(vec![]),
            vec![
                global_stmt(vec!["var"], tok(text, 4, "global var")),
                assign(
                    name_store("foo", tok(text, 5, "foo")),
                    name_load("var", tok_nth(text, 5, "var", 1)),
                ),
            ],
            rows(text, 3, 5),
        ),
    ];
    (text, src(0, "module.py", text, body))
}

#[test]
fn finds_global_variable_usage_from_definition() {
    let (_, source) = global_source();
    assert_eq!(occurrences(&source, 1, 0), vec![(1, 0), (4, 11), (5, 10)]);
}

#[test]
fn finds_global_variable_from_local_usage() {
    let (_, source) = global_source();
    assert_eq!(occurrences(&source, 5, 10), vec![(1, 0), (4, 11), (5, 10)]);
}

#[test]
fn routes_nonlocal_to_the_enclosing_function() {
    let text = "\ndef outer():\n    var = 1\n    def inner():\n        nonlocal var\n        var = 2\n    return inner";
    let body = vec![func_def(
        "outer",
        params(vec![]),
        vec![
            assign(name_store("var", tok(text, 2, "var")), int(1, tok(text, 2, "1"))),
            func_def(
                "inner",
                params(vec![]),
                vec![
                    nonlocal_stmt(vec!["var"], tok(text, 4, "nonlocal var")),
                    assign(name_store("var", tok(text, 5, "var")), int(2, tok(text, 5, "2"))),
                ],
                rows(text, 3, 5),
            ),
            ret(
                name_load("inner", tok_nth(text, 6, "inner", 1)),
                tok(text, 6, "return inner"),
            ),
        ],
        rows(text, 1, 6),
    )];
    let source = src(0, "module.py", text, body);

    // The nonlocal write and the outer binding are one group.
    assert_eq!(occurrences(&source, 2, 4), vec![(2, 4), (4, 17), (5, 8)]);
}
