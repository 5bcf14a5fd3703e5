// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, scope-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

//! Helpers for constructing test sources.
//!
//! The surface parser is an external collaborator, so tests build the AST by hand next to the
//! source text it describes.  Locations are recovered from the text itself with [`tok`][]:
//! naming a token and its row is less error-prone than spelling out byte columns, and keeps the
//! tree honest when a snippet changes.
//!
//! [`tok`]: fn.tok.html

#![allow(dead_code)]

use scope_graphs::ast;
use scope_graphs::ast::Loc;
use scope_graphs::source::Source;
use scope_graphs::source::SourceId;

/// Creates a source whose AST is the given statement list.  Sources must be created in
/// [`SourceId`][] order when several participate in one query.
///
/// [`SourceId`]: ../../source/struct.SourceId.html
pub fn src(id: u32, path: &str, text: &str, body: Vec<ast::Stmt>) -> Source {
    Source::new(SourceId(id), path, ".", text, ast::Module { body })
}

/// A source with no statements, for tests that only exercise the text model.
pub fn text_src(id: u32, path: &str, text: &str) -> Source {
    src(id, path, text, Vec::new())
}

/// The location of the `nth` occurrence (1-based) of `needle` in `row` (0-based) of `text`.
/// Columns are UTF-8 byte offsets, as a parser would report them.
pub fn tok_nth(text: &str, row: u32, needle: &str, nth: usize) -> Loc {
    let line = text
        .split('\n')
        .nth(row as usize)
        .unwrap_or_else(|| panic!("row {} out of range", row));
    let mut from = 0;
    let mut remaining = nth;
    loop {
        let found = line[from..]
            .find(needle)
            .unwrap_or_else(|| panic!("{:?} not found in row {}", needle, row));
        let start = from + found;
        remaining -= 1;
        if remaining == 0 {
            return Loc::new(
                row + 1,
                start as u32,
                row + 1,
                (start + needle.len()) as u32,
            );
        }
        from = start + needle.len();
    }
}

/// The location of the first occurrence of `needle` in `row`.
pub fn tok(text: &str, row: u32, needle: &str) -> Loc {
    tok_nth(text, row, needle, 1)
}

/// A location spanning from the start of one token location to the end of another.
pub fn span(start: Loc, end: Loc) -> Loc {
    Loc::new(start.row, start.column, end.end_row, end.end_column)
}

/// A location covering rows `first` through `last` (0-based), column 0 to end of line.
pub fn rows(text: &str, first: u32, last: u32) -> Loc {
    let lines: Vec<&str> = text.split('\n').collect();
    Loc::new(first + 1, 0, last + 1, lines[last as usize].len() as u32)
}

//-------------------------------------------------------------------------------------------------
// Expressions

pub fn name_load(id: &str, loc: Loc) -> ast::Expr {
    name(id, ast::ExprContext::Load, loc)
}

pub fn name_store(id: &str, loc: Loc) -> ast::Expr {
    name(id, ast::ExprContext::Store, loc)
}

pub fn name_del(id: &str, loc: Loc) -> ast::Expr {
    name(id, ast::ExprContext::Del, loc)
}

pub fn name(id: &str, ctx: ast::ExprContext, loc: Loc) -> ast::Expr {
    ast::Expr::Name(ast::Name {
        id: id.to_owned(),
        ctx,
        loc,
    })
}

pub fn int(value: i64, loc: Loc) -> ast::Expr {
    ast::Expr::Constant(ast::Constant {
        value: ast::ConstantValue::Int(value.to_string()),
        loc,
    })
}

pub fn string(value: &str, loc: Loc) -> ast::Expr {
    ast::Expr::Constant(ast::Constant {
        value: ast::ConstantValue::Str(value.to_owned()),
        loc,
    })
}

pub fn none(loc: Loc) -> ast::Expr {
    ast::Expr::Constant(ast::Constant {
        value: ast::ConstantValue::None,
        loc,
    })
}

pub fn ellipsis(loc: Loc) -> ast::Expr {
    ast::Expr::Constant(ast::Constant {
        value: ast::ConstantValue::Ellipsis,
        loc,
    })
}

pub fn binop(left: ast::Expr, op: ast::BinaryOperator, right: ast::Expr) -> ast::Expr {
    let loc = span(left.loc(), right.loc());
    ast::Expr::BinOp(ast::BinOp {
        left: Box::new(left),
        op,
        right: Box::new(right),
        loc,
    })
}

pub fn add(left: ast::Expr, right: ast::Expr) -> ast::Expr {
    binop(left, ast::BinaryOperator::Add, right)
}

pub fn modulo(left: ast::Expr, right: ast::Expr) -> ast::Expr {
    binop(left, ast::BinaryOperator::Mod, right)
}

pub fn call(func: ast::Expr, args: Vec<ast::Expr>, loc: Loc) -> ast::Expr {
    ast::Expr::Call(ast::Call {
        func: Box::new(func),
        args,
        keywords: Vec::new(),
        loc,
    })
}

pub fn call_with_keywords(
    func: ast::Expr,
    args: Vec<ast::Expr>,
    keywords: Vec<ast::Keyword>,
    loc: Loc,
) -> ast::Expr {
    ast::Expr::Call(ast::Call {
        func: Box::new(func),
        args,
        keywords,
        loc,
    })
}

pub fn keyword(arg: &str, value: ast::Expr, loc: Loc) -> ast::Keyword {
    ast::Keyword {
        arg: Some(arg.to_owned()),
        value,
        loc,
    }
}

pub fn attribute(value: ast::Expr, attr: &str, ctx: ast::ExprContext, loc: Loc) -> ast::Expr {
    ast::Expr::Attribute(ast::Attribute {
        value: Box::new(value),
        attr: attr.to_owned(),
        ctx,
        loc,
    })
}

pub fn list_comp(elt: ast::Expr, generators: Vec<ast::Comprehension>, loc: Loc) -> ast::Expr {
    ast::Expr::ListComp(ast::Comp {
        elt: Box::new(elt),
        generators,
        loc,
    })
}

pub fn comprehension(target: ast::Expr, iter: ast::Expr, ifs: Vec<ast::Expr>) -> ast::Comprehension {
    ast::Comprehension {
        target,
        iter,
        ifs,
        is_async: false,
    }
}

//-------------------------------------------------------------------------------------------------
// Statements

pub fn assign(target: ast::Expr, value: ast::Expr) -> ast::Stmt {
    let loc = span(target.loc(), value.loc());
    ast::Stmt::Assign(ast::Assign {
        targets: vec![target],
        value: Box::new(value),
        loc,
    })
}

pub fn expr_stmt(value: ast::Expr) -> ast::Stmt {
    let loc = value.loc();
    ast::Stmt::Expr(ast::ExprStmt {
        value: Box::new(value),
        loc,
    })
}

pub fn ret(value: ast::Expr, loc: Loc) -> ast::Stmt {
    ast::Stmt::Return(ast::Return {
        value: Some(Box::new(value)),
        loc,
    })
}

pub fn del(targets: Vec<ast::Expr>, loc: Loc) -> ast::Stmt {
    ast::Stmt::Delete(ast::Delete { targets, loc })
}

pub fn pass(loc: Loc) -> ast::Stmt {
    ast::Stmt::Pass(loc)
}

pub fn arg(name: &str, loc: Loc) -> ast::Arg {
    ast::Arg {
        arg: name.to_owned(),
        loc,
    }
}

pub fn params(args: Vec<ast::Arg>) -> ast::Arguments {
    ast::Arguments {
        args,
        ..ast::Arguments::default()
    }
}

pub fn func_def(name: &str, args: ast::Arguments, body: Vec<ast::Stmt>, loc: Loc) -> ast::Stmt {
    ast::Stmt::FunctionDef(ast::FunctionDef {
        name: name.to_owned(),
        args,
        body,
        decorator_list: Vec::new(),
        returns: None,
        type_params: Vec::new(),
        loc,
    })
}

pub fn class_def(name: &str, bases: Vec<ast::Expr>, body: Vec<ast::Stmt>, loc: Loc) -> ast::Stmt {
    ast::Stmt::ClassDef(ast::ClassDef {
        name: name.to_owned(),
        bases,
        keywords: Vec::new(),
        body,
        decorator_list: Vec::new(),
        type_params: Vec::new(),
        loc,
    })
}

pub fn import_from(
    module: Option<&str>,
    names: Vec<(&str, Option<&str>, Loc)>,
    level: u32,
    loc: Loc,
) -> ast::Stmt {
    ast::Stmt::ImportFrom(ast::ImportFrom {
        module: module.map(str::to_owned),
        names: names
            .into_iter()
            .map(|(name, asname, loc)| ast::Alias {
                name: name.to_owned(),
                asname: asname.map(str::to_owned),
                loc,
            })
            .collect(),
        level,
        loc,
    })
}

pub fn import(names: Vec<(&str, Option<&str>, Loc)>, loc: Loc) -> ast::Stmt {
    ast::Stmt::Import(ast::Import {
        names: names
            .into_iter()
            .map(|(name, asname, loc)| ast::Alias {
                name: name.to_owned(),
                asname: asname.map(str::to_owned),
                loc,
            })
            .collect(),
        loc,
    })
}

pub fn global_stmt(names: Vec<&str>, loc: Loc) -> ast::Stmt {
    ast::Stmt::Global(ast::NameList {
        names: names.into_iter().map(str::to_owned).collect(),
        loc,
    })
}

pub fn nonlocal_stmt(names: Vec<&str>, loc: Loc) -> ast::Stmt {
    ast::Stmt::Nonlocal(ast::NameList {
        names: names.into_iter().map(str::to_owned).collect(),
        loc,
    })
}

pub fn for_stmt(target: ast::Expr, iter: ast::Expr, body: Vec<ast::Stmt>, loc: Loc) -> ast::Stmt {
    ast::Stmt::For(ast::For {
        target: Box::new(target),
        iter: Box::new(iter),
        body,
        orelse: Vec::new(),
        loc,
    })
}
