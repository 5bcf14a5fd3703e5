// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, scope-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

//! Resolves a reference node to the definition it binds to.
//!
//! Resolution is a breadth-first search over the graph's edges that maintains a _symbol stack_.
//! Entering a node fires its action: a push prepends a symbol to the stack, a pop removes the
//! matching top (and a node whose pop does not match the top cannot be entered at all).  The
//! search accepts when it enters a [`Definition`][] node with an empty stack.
//!
//! Two FIFO queues, one per edge priority, keep the search deterministic: all priority-0 work is
//! drained before any priority-1 edge is considered, and within a priority, first enqueued wins.
//! The rules of the start node apply to every edge for the whole resolution.
//!
//! [`Definition`]: ../graph/enum.NodeKind.html

use std::collections::VecDeque;

use fxhash::FxHashSet;
use smallvec::SmallVec;

use crate::arena::Handle;
use crate::graph::Action;
use crate::graph::Node;
use crate::graph::ScopeGraph;
use crate::graph::Symbol;
use crate::NotFound;

/// The symbol stack built up during one resolution.  The top of the stack is the last element.
pub type SymbolStack = SmallVec<[Handle<Symbol>; 4]>;

fn apply(action: Option<Action>, stack: &mut SymbolStack) {
    match action {
        Some(Action::Push(symbol)) => stack.push(symbol),
        Some(Action::Pop(_)) => {
            stack.pop();
        }
        None => {}
    }
}

/// Finds the definition node that a reference resolves to, or [`NotFound`][] when the search
/// space is exhausted without an accepting state.
///
/// The graph may be cyclic (mutually importing modules, inheritance loops); re-reaching a node
/// with a stack it has already been visited with is never enqueued again, so the search always
/// terminates.  Since the first arrival is the one whose result would be returned anyway, this
/// does not change which definition wins.
///
/// [`NotFound`]: ../struct.NotFound.html
pub fn find_definition(
    graph: &ScopeGraph,
    start: Handle<Node>,
) -> Result<Handle<Node>, NotFound> {
    let rules = graph[start].rules;
    let mut stack = SymbolStack::new();
    apply(graph[start].action, &mut stack);
    copious_debugging!("resolving from {}", start.display(graph));

    let mut queues: [VecDeque<(Handle<Node>, SymbolStack)>; 2] =
        [VecDeque::new(), VecDeque::new()];
    let mut visited: FxHashSet<(Handle<Node>, SymbolStack)> = FxHashSet::default();
    extend_queues(graph, start, &stack, &mut queues, &mut visited, rules);

    while let Some((node, mut stack)) = dequeue(&mut queues) {
        apply(graph[node].action, &mut stack);
        copious_debugging!(" -> entering {} with {} symbols", node.display(graph), stack.len());
        if graph[node].is_definition() && stack.is_empty() {
            copious_debugging!(" -> accepted at {}", node.display(graph));
            return Ok(node);
        }
        extend_queues(graph, node, &stack, &mut queues, &mut visited, rules);
    }
    Err(NotFound)
}

fn dequeue(
    queues: &mut [VecDeque<(Handle<Node>, SymbolStack)>; 2],
) -> Option<(Handle<Node>, SymbolStack)> {
    for queue in queues.iter_mut() {
        if let Some(next) = queue.pop_front() {
            return Some(next);
        }
    }
    None
}

fn extend_queues(
    graph: &ScopeGraph,
    node: Handle<Node>,
    stack: &SymbolStack,
    queues: &mut [VecDeque<(Handle<Node>, SymbolStack)>; 2],
    visited: &mut FxHashSet<(Handle<Node>, SymbolStack)>,
    rules: enumset::EnumSet<crate::graph::Rule>,
) {
    for (edge, sink) in graph.outgoing_edges(node) {
        if !edge.permitted_by(rules) {
            continue;
        }
        if !graph[sink].accepts(stack) {
            continue;
        }
        if !visited.insert((sink, stack.clone())) {
            continue;
        }
        queues[edge.priority.min(1) as usize].push_back((sink, stack.clone()));
    }
}
