// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, scope-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

use maplit::hashset;
use pretty_assertions::assert_eq;
use scope_graphs::graph::Action;
use scope_graphs::graph::Edge;
use scope_graphs::graph::Fragment;
use scope_graphs::graph::NodeKind;
use scope_graphs::graph::Rule;
use scope_graphs::graph::ScopeGraph;
use scope_graphs::resolve::find_definition;
use scope_graphs::NotFound;

#[test]
fn interns_symbols() {
    let mut graph = ScopeGraph::new();
    let first = graph.add_symbol("x");
    let second = graph.add_symbol("x");
    let other = graph.add_symbol("y");
    assert_eq!(first, second);
    assert!(first != other);
    assert_eq!(&graph[first], "x");
    assert_eq!(&graph[other], "y");
}

#[test]
fn can_resolve_through_pushes_and_pops() {
    let mut graph = ScopeGraph::new();
    let x = graph.add_symbol("x");
    let reference = graph.node().name(x).push(x).add();
    let scope = graph.add_scope_node();
    let definition = graph.node().name(x).pop(x).definition().add();
    graph.add_edge(reference, scope, Edge::new());
    graph.add_edge(scope, definition, Edge::same_rank());

    assert_eq!(find_definition(&graph, reference), Ok(definition));
}

#[test]
fn a_pop_of_the_wrong_symbol_blocks_the_path() {
    let mut graph = ScopeGraph::new();
    let x = graph.add_symbol("x");
    let y = graph.add_symbol("y");
    let reference = graph.node().name(x).push(x).add();
    let scope = graph.add_scope_node();
    let definition = graph.node().name(y).pop(y).definition().add();
    graph.add_edge(reference, scope, Edge::new());
    graph.add_edge(scope, definition, Edge::new());

    assert_eq!(find_definition(&graph, reference), Err(NotFound));
}

#[test]
fn a_definition_only_accepts_an_empty_stack() {
    let mut graph = ScopeGraph::new();
    let x = graph.add_symbol("x");
    let attr = graph.add_symbol("attr");
    // Push `attr` then `x`: the definition of `x` pops its symbol but the leftover `attr` keeps
    // the walk going, and there is nowhere left to go.
    let reference = graph.node().name(attr).push(attr).add();
    let x_push = graph.node().push(x).add();
    let definition = graph.node().name(x).pop(x).definition().add();
    graph.add_edge(reference, x_push, Edge::new());
    graph.add_edge(x_push, definition, Edge::new());

    assert_eq!(find_definition(&graph, reference), Err(NotFound));
}

#[test]
fn lower_priority_edges_are_drained_first() {
    let mut graph = ScopeGraph::new();
    let x = graph.add_symbol("x");
    let reference = graph.node().name(x).push(x).add();
    let scope = graph.add_scope_node();
    let fallback = graph.node().name(x).pop(x).definition().add();
    let preferred = graph.node().name(x).pop(x).definition().add();
    graph.add_edge(reference, scope, Edge::new());
    // The fallback is wired first but at priority 1; the priority 0 edge must win.
    graph.add_edge(scope, fallback, Edge::new().with_priority(1));
    graph.add_edge(scope, preferred, Edge::new());

    assert_eq!(find_definition(&graph, reference), Ok(preferred));
}

#[test]
fn rules_cut_off_enclosing_scope_edges() {
    let mut graph = ScopeGraph::new();
    let x = graph.add_symbol("x");
    let scope = graph.add_scope_node();
    let outer = graph.add_scope_node();
    let definition = graph.node().name(x).pop(x).definition().add();
    graph.add_edge(scope, outer, Edge::to_enclosing_scope());
    graph.add_edge(outer, definition, Edge::new());

    let unrestricted = graph.node().name(x).push(x).add();
    graph.add_edge(unrestricted, scope, Edge::new());
    assert_eq!(find_definition(&graph, unrestricted), Ok(definition));

    let restricted = graph
        .node()
        .name(x)
        .push(x)
        .rule(Rule::SkipEnclosingScopeEdges)
        .add();
    graph.add_edge(restricted, scope, Edge::new());
    assert_eq!(find_definition(&graph, restricted), Err(NotFound));
}

#[test]
fn resolution_terminates_on_cyclic_graphs() {
    let mut graph = ScopeGraph::new();
    let x = graph.add_symbol("x");
    let reference = graph.node().name(x).push(x).add();
    let first = graph.add_scope_node();
    let second = graph.add_scope_node();
    graph.add_edge(reference, first, Edge::new());
    graph.add_edge(first, second, Edge::new());
    graph.add_edge(second, first, Edge::new());

    assert_eq!(find_definition(&graph, reference), Err(NotFound));
}

#[test]
fn outgoing_edges_deduplicate() {
    let mut graph = ScopeGraph::new();
    let a = graph.add_scope_node();
    let b = graph.add_scope_node();
    let c = graph.add_scope_node();
    graph.add_edge(a, b, Edge::new());
    graph.add_edge(a, b, Edge::new());
    graph.add_edge(a, c, Edge::same_rank());

    let sinks = graph
        .outgoing_edges(a)
        .map(|(_, sink)| sink)
        .collect::<std::collections::HashSet<_>>();
    assert_eq!(sinks, hashset! {b, c});
    assert_eq!(graph.outgoing_edges(a).count(), 2);
}

#[test]
fn copied_fragments_share_structure_but_not_occurrences() {
    let mut graph = ScopeGraph::new();
    let x = graph.add_symbol("x");
    let push = graph.node().name(x).push(x).add();
    let pop = graph.node().pop(x).add();
    let fragment = graph.connect(
        &Fragment::point(push),
        &Fragment::point(pop),
        Edge::same_rank(),
    );

    let copy = graph.copy_fragment(&fragment);

    assert!(copy.entry != fragment.entry);
    assert!(copy.exit != fragment.exit);
    assert_eq!(graph[copy.entry].action, Some(Action::Push(x)));
    assert_eq!(graph[copy.exit].action, Some(Action::Pop(x)));
    // Copies are structural only: no name, no position, plain scope kind.
    assert_eq!(graph[copy.entry].kind, NodeKind::Scope);
    assert!(graph[copy.entry].name.into_option().is_none());
    assert!(graph[copy.entry].position.is_none());
    // The internal edge came along.
    assert!(graph
        .outgoing_edges(copy.entry)
        .any(|(_, sink)| sink == copy.exit));
}
