// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, scope-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

use pretty_assertions::assert_eq;
use scope_graphs::ast::ExprContext;
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

#[test]
fn unifies_instance_properties_across_methods() {
    let text = "\nclass C:\n    def __init__(self):\n        self.x = 1\n\n    def get(self):\n        return self.x";
    let body = vec![class_def(
        "C",
        vec![],
        vec![
            func_def(
                "__init__",
                params(vec![arg("self", tok_nth(text, 2, "self", 1))]),
                vec![assign(
                    attribute(
                        name_load("self", tok_nth(text, 3, "self", 1)),
                        "x",
                        ExprContext::Store,
                        tok(text, 3, "self.x"),
                    ),
                    int(1, tok(text, 3, "1")),
                )],
                rows(text, 2, 3),
            ),
            func_def(
                "get",
                params(vec![arg("self", tok_nth(text, 5, "self", 1))]),
                vec![ret(
                    attribute(
                        name_load("self", tok_nth(text, 6, "self", 1)),
                        "x",
                        ExprContext::Load,
                        tok(text, 6, "self.x"),
                    ),
                    tok(text, 6, "return self.x"),
                )],
                rows(text, 5, 6),
            ),
        ],
        rows(text, 1, 6),
    )];
    let source = src(0, "module.py", text, body);

    // The property assigned in one method and read in another is a single binding.
    assert_eq!(occurrences(&source, 3, 13), vec![(3, 13), (6, 20)]);
    // Each method's receiver stays its own.
    assert_eq!(occurrences(&source, 2, 17), vec![(2, 17), (3, 8)]);
}

#[test]
fn resolves_class_level_attribute_access() {
    let text = "\nclass C:\n    name = 'x'\n\nprint(C.name)";
    let body = vec![
        class_def(
            "C",
            vec![],
            vec![assign(
                name_store("name", tok(text, 2, "name")),
                string("x", tok(text, 2, "'x'")),
            )],
            rows(text, 1, 2),
        ),
        expr_stmt(call(
            name_load("print", tok(text, 4, "print")),
            vec![attribute(
                name_load("C", tok(text, 4, "C")),
                "name",
                ExprContext::Load,
                tok(text, 4, "C.name"),
            )],
            tok(text, 4, "print(C.name)"),
        )),
    ];
    let source = src(0, "module.py", text, body);

    assert_eq!(occurrences(&source, 2, 4), vec![(2, 4), (4, 8)]);
}

#[test]
fn resolves_super_calls_to_the_base_class() {
    let text = "\nclass A:\n    def greet(self):\n        pass\n\nclass B(A):\n    def greet(self):\n        return super().greet()";
    let body = vec![
        class_def(
            "A",
            vec![],
            vec![func_def(
                "greet",
                params(vec![arg("self", tok_nth(text, 2, "self", 1))]),
                vec![pass(tok(text, 3, "pass"))],
                rows(text, 2, 3),
            )],
            rows(text, 1, 3),
        ),
        class_def(
            "B",
            vec![name_load("A", tok_nth(text, 5, "A", 1))],
            vec![func_def(
                "greet",
                params(vec![arg("self", tok_nth(text, 6, "self", 1))]),
                vec![ret(
                    call(
                        attribute(
                            call(
                                name_load("super", tok(text, 7, "super")),
                                vec![],
                                tok(text, 7, "super()"),
                            ),
                            "greet",
                            ExprContext::Load,
                            tok(text, 7, "super().greet"),
                        ),
                        vec![],
                        tok(text, 7, "super().greet()"),
                    ),
                    tok(text, 7, "return super().greet()"),
                )],
                rows(text, 6, 7),
            )],
            rows(text, 5, 7),
        ),
    ];
    let source = src(0, "module.py", text, body);

    // The lookup starts from the inheritance chain of B, not from the name `super`.
    assert_eq!(occurrences(&source, 7, 23), vec![(2, 8), (7, 23)]);
}
