// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, scope-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

//! Scope graphs resolve identifier occurrences across a multi-file source tree and drive
//! structural refactorings off those resolutions.  The basic idea is to represent the
//! _definitions_ and _references_ in a program as a graph whose nodes manipulate a stack of
//! symbols; a reference binds to a definition when some path through the graph empties the stack.
//!
//! ## Why a stack?
//!
//! Lexical lookup alone doesn't need one: a reference could simply search enclosing scopes.  But
//! resolving `stove.broil()` requires "pausing" the search for `broil` while `stove` is resolved
//! — only once we know which class `stove` is an instance of do we know where to look for
//! `broil`.  Pushing `broil`, then `.`, then resolving `stove` through its definition and back
//! into the class's instance scope expresses exactly that, and the same mechanism carries
//! lookups through imports into other modules, through base classes, and through keyword
//! arguments into the called function's parameter list.  The approach follows the [scope
//! graphs][] formalism from Eelco Visser's group at TU Delft.
//!
//! [scope graphs]: https://pl.ewi.tudelft.nl/research/projects/scope-graphs/
//!
//! ## Pipeline
//!
//! Front ends parse source files into the [`ast`][] contract and wrap them in [`Source`][]
//! values.  The [`builder`][] walks every AST and emits one graph; the [`resolve`][] module
//! answers single-reference queries against it; [`occurrences`][] consolidates whole rename
//! groups; and [`refactor`][] layers the structural refactorings — extract variable, extract
//! function and method, inline call, inline variable, slide statements — on top, emitting
//! [`edit`][] lists that the front end applies or forwards.
//!
//! The graph is built once per refactoring session and read-only afterward; when source text
//! changes, the caller discards it and builds a new one.
//!
//! [`Source`]: source/struct.Source.html
//! [`ast`]: ast/index.html
//! [`builder`]: builder/index.html
//! [`edit`]: edit/index.html
//! [`occurrences`]: occurrences/index.html
//! [`refactor`]: refactor/index.html
//! [`resolve`]: resolve/index.html

use thiserror::Error;

#[macro_use]
mod debugging;

pub mod arena;
pub mod ast;
pub mod builder;
pub mod edit;
pub mod graph;
pub mod occurrences;
pub mod refactor;
pub mod resolve;
pub mod search;
pub mod source;

/// A queried position does not correspond to any identifier the resolver can locate, or a
/// reference does not resolve.  Callers surface this as an empty result, not a failure.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
#[error("no matching occurrence or definition was found")]
pub struct NotFound;
