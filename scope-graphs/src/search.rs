// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, scope-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

//! AST-level search used by the refactoring planner.
//!
//! Everything here is a plain collecting walk over [`ast::walk`][]: name occurrences with their
//! store/load context, the statement list in document order, structurally identical subtrees, and
//! the small special-purpose queries the planner composes its analyses from.
//!
//! [`ast::walk`]: ../ast/walk/index.html

use crate::ast;
use crate::ast::walk::each_child;
use crate::ast::walk::NodeRef;
use crate::source::Position;
use crate::source::Source;
use crate::source::TextRange;

/// A name occurrence as the planner sees it: text, position, and whether it writes its binding.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NameOccurrence {
    pub name: String,
    pub position: Position,
    pub context: ast::ExprContext,
}

impl NameOccurrence {
    pub fn is_store(&self) -> bool {
        self.context == ast::ExprContext::Store
    }
}

/// Every name occurrence in the source, in tree order: `Name` nodes with their context, function
/// names and parameters as stores, attribute accesses only on their value side (an attribute name
/// is not a local variable).
pub fn find_names(source: &Source) -> Vec<NameOccurrence> {
    let mut names = Vec::new();
    for stmt in &source.ast().body {
        collect_names(NodeRef::Stmt(stmt), source, &mut names);
    }
    names
}

fn collect_names<'a>(node: NodeRef<'a>, source: &Source, names: &mut Vec<NameOccurrence>) {
    match node {
        NodeRef::Expr(ast::Expr::Name(name)) => {
            names.push(NameOccurrence {
                name: name.id.clone(),
                position: source.node_position(name.loc),
                context: name.ctx,
            });
        }
        NodeRef::Expr(ast::Expr::Attribute(attribute)) => {
            collect_names(NodeRef::Expr(&attribute.value), source, names);
        }
        NodeRef::Arg(arg) => {
            names.push(NameOccurrence {
                name: arg.arg.clone(),
                position: source.node_position(arg.loc),
                context: ast::ExprContext::Store,
            });
        }
        NodeRef::Stmt(stmt @ ast::Stmt::FunctionDef(def))
        | NodeRef::Stmt(stmt @ ast::Stmt::AsyncFunctionDef(def)) => {
            let keyword_width = match stmt {
                ast::Stmt::AsyncFunctionDef(_) => 10,
                _ => 4,
            };
            names.push(NameOccurrence {
                name: def.name.clone(),
                position: source.node_position(def.loc) + keyword_width,
                context: ast::ExprContext::Store,
            });
            each_child(node, &mut |child| collect_names(child, source, names));
        }
        _ => {
            each_child(node, &mut |child| collect_names(child, source, names));
        }
    }
}

/// The subset of [`find_names`][] falling inside a range.
///
/// [`find_names`]: fn.find_names.html
pub fn find_names_in_range(source: &Source, range: TextRange) -> Vec<NameOccurrence> {
    find_names(source)
        .into_iter()
        .filter(|occurrence| range.contains(occurrence.position))
        .collect()
}

/// Every statement in the module, recursively, in document order.  Expression statements do not
/// contribute their subexpressions.
pub fn find_statements(module: &ast::Module) -> Vec<&ast::Stmt> {
    let mut statements = Vec::new();
    collect_statements(&module.body, true, &mut statements);
    statements
}

fn collect_statements<'a>(
    body: &'a [ast::Stmt],
    recursive: bool,
    statements: &mut Vec<&'a ast::Stmt>,
) {
    for stmt in body {
        statements.push(stmt);
        if !recursive {
            continue;
        }
        match stmt {
            ast::Stmt::FunctionDef(def) | ast::Stmt::AsyncFunctionDef(def) => {
                collect_statements(&def.body, recursive, statements);
            }
            ast::Stmt::ClassDef(def) => collect_statements(&def.body, recursive, statements),
            ast::Stmt::With(node) | ast::Stmt::AsyncWith(node) => {
                collect_statements(&node.body, recursive, statements);
            }
            ast::Stmt::For(node) | ast::Stmt::AsyncFor(node) => {
                collect_statements(&node.body, recursive, statements);
                collect_statements(&node.orelse, recursive, statements);
            }
            ast::Stmt::While(node) => {
                collect_statements(&node.body, recursive, statements);
                collect_statements(&node.orelse, recursive, statements);
            }
            ast::Stmt::If(node) => {
                collect_statements(&node.body, recursive, statements);
                collect_statements(&node.orelse, recursive, statements);
            }
            ast::Stmt::Try(node) => {
                collect_statements(&node.body, recursive, statements);
                for handler in &node.handlers {
                    collect_statements(&handler.body, recursive, statements);
                }
                collect_statements(&node.orelse, recursive, statements);
                collect_statements(&node.finalbody, recursive, statements);
            }
            ast::Stmt::Match(node) => {
                for case in &node.cases {
                    collect_statements(&case.body, recursive, statements);
                }
            }
            _ => {}
        }
    }
}

/// Every function definition in the module whose start lies at or before `up_to`.
pub fn find_functions<'a>(source: &'a Source, up_to: Position) -> Vec<&'a ast::FunctionDef> {
    let mut functions = Vec::new();
    for stmt in find_statements(source.ast()) {
        if let ast::Stmt::FunctionDef(def) | ast::Stmt::AsyncFunctionDef(def) = stmt {
            if source.node_position(def.loc) <= up_to {
                functions.push(def);
            }
        }
    }
    functions
}

/// The `return` statements belonging to a statement list itself — nested function and class
/// definitions keep their returns to themselves.
pub fn find_returns(body: &[ast::Stmt]) -> Vec<&ast::Return> {
    let mut returns = Vec::new();
    collect_returns(body, &mut returns);
    returns
}

fn collect_returns<'a>(body: &'a [ast::Stmt], returns: &mut Vec<&'a ast::Return>) {
    for stmt in body {
        match stmt {
            ast::Stmt::Return(node) => returns.push(node),
            ast::Stmt::FunctionDef(_) | ast::Stmt::AsyncFunctionDef(_) | ast::Stmt::ClassDef(_) => {
            }
            ast::Stmt::For(node) | ast::Stmt::AsyncFor(node) => {
                collect_returns(&node.body, returns);
                collect_returns(&node.orelse, returns);
            }
            ast::Stmt::While(node) => {
                collect_returns(&node.body, returns);
                collect_returns(&node.orelse, returns);
            }
            ast::Stmt::If(node) => {
                collect_returns(&node.body, returns);
                collect_returns(&node.orelse, returns);
            }
            ast::Stmt::With(node) | ast::Stmt::AsyncWith(node) => {
                collect_returns(&node.body, returns);
            }
            ast::Stmt::Try(node) => {
                collect_returns(&node.body, returns);
                for handler in &node.handlers {
                    collect_returns(&handler.body, returns);
                }
                collect_returns(&node.orelse, returns);
                collect_returns(&node.finalbody, returns);
            }
            ast::Stmt::Match(node) => {
                for case in &node.cases {
                    collect_returns(&case.body, returns);
                }
            }
            _ => {}
        }
    }
}

/// Names passed as plain positional or keyword arguments inside a range.  Used to decide whether
/// a name the selection reads was only ever handed onward.
pub fn find_arguments_passed_in_range(source: &Source, range: TextRange) -> Vec<String> {
    let mut arguments = Vec::new();
    for stmt in &source.ast().body {
        collect_arguments(NodeRef::Stmt(stmt), source, range, &mut arguments);
    }
    arguments
}

fn collect_arguments(node: NodeRef, source: &Source, range: TextRange, out: &mut Vec<String>) {
    if let NodeRef::Expr(ast::Expr::Call(call)) = node {
        for arg in call
            .args
            .iter()
            .chain(call.keywords.iter().map(|keyword| &keyword.value))
        {
            if let ast::Expr::Name(name) = arg {
                let position = source.node_position(name.loc);
                if range.contains(position) {
                    out.push(name.id.clone());
                }
            }
        }
    }
    each_child(node, &mut |child| collect_arguments(child, source, range, out));
}

//-------------------------------------------------------------------------------------------------
// Structural equality

/// Finds the expressions structurally identical to `target`, paired with the dotted path of
/// enclosing definition names they live under.
pub fn find_similar_expressions<'a>(
    module: &'a ast::Module,
    target: &ast::Expr,
) -> Vec<(Vec<String>, &'a ast::Expr)> {
    let mut results = Vec::new();
    let mut scope = Vec::new();
    for stmt in &module.body {
        collect_similar(NodeRef::Stmt(stmt), target, &mut scope, &mut results);
    }
    results
}

fn collect_similar<'a>(
    node: NodeRef<'a>,
    target: &ast::Expr,
    scope: &mut Vec<String>,
    results: &mut Vec<(Vec<String>, &'a ast::Expr)>,
) {
    match node {
        NodeRef::Expr(expr) if is_structurally_identical(expr, target) => {
            results.push((scope.clone(), expr));
        }
        NodeRef::Stmt(ast::Stmt::FunctionDef(def)) | NodeRef::Stmt(ast::Stmt::AsyncFunctionDef(def)) => {
            scope.push(def.name.clone());
            each_child(node, &mut |child| collect_similar(child, target, scope, results));
            scope.pop();
        }
        NodeRef::Stmt(ast::Stmt::ClassDef(def)) => {
            scope.push(def.name.clone());
            each_child(node, &mut |child| collect_similar(child, target, scope, results));
            scope.pop();
        }
        _ => {
            each_child(node, &mut |child| collect_similar(child, target, scope, results));
        }
    }
}

/// Finds the expressions structurally identical to the one at `position`, excluding that
/// occurrence itself, restricted to scopes at or below the original's.
pub fn find_other_occurrences<'a>(
    source: &'a Source,
    target: &ast::Expr,
    position: Position,
) -> Vec<&'a ast::Expr> {
    let mut original_scope: Option<Vec<String>> = None;
    let mut candidates = Vec::new();
    for (scope, similar) in find_similar_expressions(source.ast(), target) {
        if source.node_position(similar.loc()) == position {
            original_scope = Some(scope);
        } else {
            candidates.push((scope, similar));
        }
    }
    let original_scope = original_scope.unwrap_or_default();
    candidates
        .into_iter()
        .filter(|(scope, _)| scope.starts_with(&original_scope))
        .map(|(_, similar)| similar)
        .collect()
}

/// Structural equality over expressions: same shape, same identifiers, same constants —
/// locations and nothing else ignored.
pub fn is_structurally_identical(left: &ast::Expr, right: &ast::Expr) -> bool {
    use ast::Expr::*;
    match (left, right) {
        (Name(a), Name(b)) => a.id == b.id && a.ctx == b.ctx,
        (Constant(a), Constant(b)) => a.value == b.value,
        (Attribute(a), Attribute(b)) => {
            a.attr == b.attr && a.ctx == b.ctx && is_structurally_identical(&a.value, &b.value)
        }
        (Subscript(a), Subscript(b)) => {
            a.ctx == b.ctx
                && is_structurally_identical(&a.value, &b.value)
                && is_structurally_identical(&a.slice, &b.slice)
        }
        (Starred(a), Starred(b)) => {
            a.ctx == b.ctx && is_structurally_identical(&a.value, &b.value)
        }
        (Call(a), Call(b)) => {
            is_structurally_identical(&a.func, &b.func)
                && all_identical(&a.args, &b.args)
                && a.keywords.len() == b.keywords.len()
                && a.keywords.iter().zip(&b.keywords).all(|(ka, kb)| {
                    ka.arg == kb.arg && is_structurally_identical(&ka.value, &kb.value)
                })
        }
        (BinOp(a), BinOp(b)) => {
            a.op == b.op
                && is_structurally_identical(&a.left, &b.left)
                && is_structurally_identical(&a.right, &b.right)
        }
        (UnaryOp(a), UnaryOp(b)) => {
            a.op == b.op && is_structurally_identical(&a.operand, &b.operand)
        }
        (BoolOp(a), BoolOp(b)) => a.op == b.op && all_identical(&a.values, &b.values),
        (Compare(a), Compare(b)) => {
            a.ops == b.ops
                && is_structurally_identical(&a.left, &b.left)
                && all_identical(&a.comparators, &b.comparators)
        }
        (IfExp(a), IfExp(b)) => {
            is_structurally_identical(&a.test, &b.test)
                && is_structurally_identical(&a.body, &b.body)
                && is_structurally_identical(&a.orelse, &b.orelse)
        }
        (NamedExpr(a), NamedExpr(b)) => {
            is_structurally_identical(&a.target, &b.target)
                && is_structurally_identical(&a.value, &b.value)
        }
        (Tuple(a), Tuple(b)) | (List(a), List(b)) => {
            a.ctx == b.ctx && all_identical(&a.elts, &b.elts)
        }
        (Set(a), Set(b)) => all_identical(&a.elts, &b.elts),
        (Dict(a), Dict(b)) => {
            a.keys.len() == b.keys.len()
                && a.keys.iter().zip(&b.keys).all(|(ka, kb)| match (ka, kb) {
                    (Some(ka), Some(kb)) => is_structurally_identical(ka, kb),
                    (None, None) => true,
                    _ => false,
                })
                && all_identical(&a.values, &b.values)
        }
        (Slice(a), Slice(b)) => {
            identical_options(&a.lower, &b.lower)
                && identical_options(&a.upper, &b.upper)
                && identical_options(&a.step, &b.step)
        }
        (Await(a), Await(b)) => is_structurally_identical(&a.value, &b.value),
        (YieldFrom(a), YieldFrom(b)) => is_structurally_identical(&a.value, &b.value),
        (Yield(a), Yield(b)) => identical_options(&a.value, &b.value),
        (JoinedStr(a), JoinedStr(b)) => all_identical(&a.values, &b.values),
        (FormattedValue(a), FormattedValue(b)) => {
            is_structurally_identical(&a.value, &b.value)
                && identical_options(&a.format_spec, &b.format_spec)
        }
        // Lambdas and comprehensions introduce bindings of their own; extracting "identical"
        // copies of those is never safe, so they are never identical.
        _ => false,
    }
}

fn all_identical(left: &[ast::Expr], right: &[ast::Expr]) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .zip(right)
            .all(|(a, b)| is_structurally_identical(a, b))
}

fn identical_options(left: &Option<Box<ast::Expr>>, right: &Option<Box<ast::Expr>>) -> bool {
    match (left, right) {
        (Some(a), Some(b)) => is_structurally_identical(a, b),
        (None, None) => true,
        _ => false,
    }
}
