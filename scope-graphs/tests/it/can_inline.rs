// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, scope-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

use pretty_assertions::assert_eq;
use scope_graphs::edit::apply_edits;
use scope_graphs::refactor::CodeSelection;
use scope_graphs::source::TextRange;

use crate::util::*;

#[test]
fn inlines_a_call_with_positional_arguments() {
    let text = "\ndef add(a, b):\n    return a + b\n\nresult = add(1, 2)";
    let mut arguments = params(vec![
        arg("a", tok_nth(text, 1, "a", 2)),
        arg("b", tok_nth(text, 1, "b", 1)),
    ]);
    arguments.defaults = vec![];
    let body = vec![
        func_def(
            "add",
            arguments,
            vec![ret(
                add(
                    name_load("a", tok_nth(text, 2, "a", 1)),
                    name_load("b", tok_nth(text, 2, "b", 1)),
                ),
                tok(text, 2, "return a + b"),
            )],
            rows(text, 1, 2),
        ),
        assign(
            name_store("result", tok(text, 4, "result")),
            call(
                name_load("add", tok_nth(text, 4, "add", 1)),
                vec![int(1, tok(text, 4, "1")), int(2, tok(text, 4, "2"))],
                tok(text, 4, "add(1, 2)"),
            ),
        ),
    ];
    let source = src(0, "module.py", text, body);
    let sources = std::slice::from_ref(&source);
    let range = TextRange::new(source.position(4, 9), source.position(4, 12));
    let selection = CodeSelection::new(sources, range);

    let edits = selection.inline_call("value");

    assert_eq!(edits.len(), 2);
    assert_eq!(edits[0].text, "value = 1 + 2\n");
    assert_eq!(edits[1].text, "value");
    assert_eq!(
        apply_edits(&source, &edits),
        "\ndef add(a, b):\n    return a + b\n\nvalue = 1 + 2\nresult = value"
    );
}

#[test]
fn inlines_a_call_with_keyword_arguments() {
    let text = "\ndef scale(value, factor):\n    return value * factor\n\nout = scale(value=3, factor=10)";
    let body = vec![
        func_def(
            "scale",
            params(vec![
                arg("value", tok_nth(text, 1, "value", 1)),
                arg("factor", tok_nth(text, 1, "factor", 1)),
            ]),
            vec![ret(
                binop(
                    name_load("value", tok_nth(text, 2, "value", 1)),
                    scope_graphs::ast::BinaryOperator::Mult,
                    name_load("factor", tok_nth(text, 2, "factor", 1)),
                ),
                tok(text, 2, "return value * factor"),
            )],
            rows(text, 1, 2),
        ),
        assign(
            name_store("out", tok(text, 4, "out")),
            call_with_keywords(
                name_load("scale", tok_nth(text, 4, "scale", 1)),
                vec![],
                vec![
                    keyword("value", int(3, tok(text, 4, "3")), tok_nth(text, 4, "value", 1)),
                    keyword(
                        "factor",
                        int(10, tok(text, 4, "10")),
                        tok_nth(text, 4, "factor", 1),
                    ),
                ],
                tok(text, 4, "scale(value=3, factor=10)"),
            ),
        ),
    ];
    let source = src(0, "module.py", text, body);
    let sources = std::slice::from_ref(&source);
    let range = TextRange::new(source.position(4, 6), source.position(4, 11));
    let selection = CodeSelection::new(sources, range);

    let edits = selection.inline_call("scaled");

    assert_eq!(edits.len(), 2);
    assert_eq!(edits[0].text, "scaled = 3 * 10\n");
    assert_eq!(edits[1].text, "scaled");
}

#[test]
fn inline_call_is_unavailable_off_a_call() {
    let text = "\nvalue = 3";
    let body = vec![assign(
        name_store("value", tok(text, 1, "value")),
        int(3, tok(text, 1, "3")),
    )];
    let source = src(0, "module.py", text, body);
    let sources = std::slice::from_ref(&source);
    let range = TextRange::new(source.position(1, 0), source.position(1, 5));
    let selection = CodeSelection::new(sources, range);

    assert_eq!(selection.inline_call("value"), vec![]);
}

#[test]
fn inlines_a_single_assignment_variable() {
    let text = "\nb = some_calculation()\nprint(b)\nc = b + 1";
    let body = vec![
        assign(
            name_store("b", tok_nth(text, 1, "b", 1)),
            call(
                name_load("some_calculation", tok(text, 1, "some_calculation")),
                vec![],
                tok(text, 1, "some_calculation()"),
            ),
        ),
        expr_stmt(call(
            name_load("print", tok(text, 2, "print")),
            vec![name_load("b", tok_nth(text, 2, "b", 1))],
            tok(text, 2, "print(b)"),
        )),
        assign(
            name_store("c", tok_nth(text, 3, "c", 1)),
            add(
                name_load("b", tok_nth(text, 3, "b", 1)),
                int(1, tok_nth(text, 3, "1", 1)),
            ),
        ),
    ];
    let source = src(0, "module.py", text, body);
    let sources = std::slice::from_ref(&source);
    let range = TextRange::new(source.position(1, 0), source.position(1, 1));
    let selection = CodeSelection::new(sources, range);

    let edits = selection.inline_variable();

    assert_eq!(edits.len(), 3);
    assert_eq!(
        apply_edits(&source, &edits),
        "\nprint(some_calculation())\nc = some_calculation() + 1"
    );
}

#[test]
fn inline_variable_requires_a_single_assignment() {
    let text = "\nb = 1\nb = 2\nprint(b)";
    let body = vec![
        assign(name_store("b", tok_nth(text, 1, "b", 1)), int(1, tok(text, 1, "1"))),
        assign(name_store("b", tok_nth(text, 2, "b", 1)), int(2, tok(text, 2, "2"))),
        expr_stmt(call(
            name_load("print", tok(text, 3, "print")),
            vec![name_load("b", tok_nth(text, 3, "b", 1))],
            tok(text, 3, "print(b)"),
        )),
    ];
    let source = src(0, "module.py", text, body);
    let sources = std::slice::from_ref(&source);
    let range = TextRange::new(source.position(1, 0), source.position(1, 1));
    let selection = CodeSelection::new(sources, range);

    assert_eq!(selection.inline_variable(), vec![]);
}
