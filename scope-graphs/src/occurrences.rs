// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, scope-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

//! Consolidates the occurrences of one name into rename groups.
//!
//! Renaming needs every position where *the same binding* is spelled, and nothing else.  Given a
//! queried position, we find every reference carrying the same bare name, resolve each to its
//! definition, group positions by definition, and merge groups that share a position — a store
//! site registers both a reference and a definition at one spot, and `global`/`nonlocal` sites
//! tie a local occurrence to an outer binding the same way.  The group containing the query is
//! the answer.
//!
//! A reference that fails to resolve (an import of something unknown, say) is skipped rather
//! than failing the whole rename; only a query that itself cannot be located reports
//! [`NotFound`][].
//!
//! [`NotFound`]: ../struct.NotFound.html

use std::collections::BTreeSet;

use fxhash::FxHashMap;

use crate::arena::Handle;
use crate::arena::HandleSet;
use crate::builder::build_graph;
use crate::graph::Node;
use crate::graph::ScopeGraph;
use crate::resolve::find_definition;
use crate::source::Position;
use crate::source::Source;
use crate::NotFound;

/// All positions that rename at `position` must touch, sorted by source and location.
///
/// Builds a graph over `sources` and consolidates within it; use
/// [`all_occurrence_positions_in`][] to reuse a graph across queries.
///
/// [`all_occurrence_positions_in`]: fn.all_occurrence_positions_in.html
pub fn all_occurrence_positions(
    position: Position,
    sources: &[Source],
) -> Result<Vec<Position>, NotFound> {
    let graph = build_graph(sources);
    all_occurrence_positions_in(&graph, position)
}

/// As [`all_occurrence_positions`][], against an already-built graph.
///
/// [`all_occurrence_positions`]: fn.all_occurrence_positions.html
pub fn all_occurrence_positions_in(
    graph: &ScopeGraph,
    position: Position,
) -> Result<Vec<Position>, NotFound> {
    let scopes = graph.nodes_at(position);
    if scopes.is_empty() {
        return Err(NotFound);
    }
    let name = scopes
        .iter()
        .find_map(|scope| graph[*scope].name.into_option())
        .ok_or(NotFound)?;

    let possible_occurrences = graph.references_named(name).to_vec();
    let (found_definition, definitions) =
        resolve_occurrences(graph, position, &possible_occurrences)?;

    let found_position = graph[found_definition]
        .position
        .expect("queried occurrence resolved, so its definition has a position");

    let groups = consolidate_definitions(graph, definitions);
    let group = groups
        .into_iter()
        .find(|group| group.contains(&found_position))
        .ok_or(NotFound)?;
    Ok(group.into_iter().collect())
}

/// Resolves every candidate occurrence, grouping them by the definition they reach.  Returns the
/// definition the queried position belongs to, plus the groups.
fn resolve_occurrences(
    graph: &ScopeGraph,
    position: Position,
    possible_occurrences: &[Handle<Node>],
) -> Result<(Handle<Node>, FxHashMap<Handle<Node>, HandleSet<Node>>), NotFound> {
    let mut definitions: FxHashMap<Handle<Node>, HandleSet<Node>> = FxHashMap::default();
    let mut found_definition = None;

    for &occurrence in possible_occurrences {
        if graph[occurrence].is_definition() {
            definitions.entry(occurrence).or_default().add(occurrence);
            if graph[occurrence].position == Some(position) {
                found_definition = Some(occurrence);
            }
            continue;
        }

        let definition = match find_definition(graph, occurrence) {
            Ok(definition) => definition,
            // One unresolvable reference must not poison the rename.
            Err(NotFound) => continue,
        };
        definitions.entry(definition).or_default().add(occurrence);
        if graph[definition].position == Some(position)
            || graph[occurrence].position == Some(position)
        {
            found_definition = Some(definition);
        }
    }

    match found_definition {
        Some(found) if graph[found].position.is_some() => Ok((found, definitions)),
        _ => Err(NotFound),
    }
}

/// Folds definition positions into their occurrence groups and merges groups transitively
/// whenever they share a position.
fn consolidate_definitions(
    graph: &ScopeGraph,
    definitions: FxHashMap<Handle<Node>, HandleSet<Node>>,
) -> Vec<BTreeSet<Position>> {
    let mut groups: Vec<BTreeSet<Position>> = Vec::new();
    for (definition, occurrences) in definitions {
        let mut positions: BTreeSet<Position> = occurrences
            .iter()
            .filter_map(|occurrence| graph[occurrence].position)
            .collect();
        if let Some(position) = graph[definition].position {
            positions.insert(position);
        }
        groups.push(positions);
    }

    // Merge to a fixpoint; groups are few and small.
    loop {
        let mut merged = false;
        'outer: for first in 0..groups.len() {
            for second in (first + 1)..groups.len() {
                if !groups[first].is_disjoint(&groups[second]) {
                    let absorbed = groups.swap_remove(second);
                    groups[first].extend(absorbed);
                    merged = true;
                    break 'outer;
                }
            }
        }
        if !merged {
            return groups;
        }
    }
}
