// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, scope-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

//! Defines the structure of a scope graph.
//!
//! A scope graph models the name binding structure of a program: paths through the graph stand
//! for resolutions of references to definitions.  Every node carries at most one _stack action_ —
//! a [`Push`][`Action`] or [`Pop`][`Action`] of a symbol — and resolution (see the
//! [`resolve`][] module) walks edges while firing those actions against a symbol stack.  A
//! [`Definition`][`NodeKind`] node reached with an empty stack is the answer.
//!
//! Following the [scope graphs][] formalism, member access and calling are modeled with the fake
//! symbols `.` and `()`, so that `stove.broil()` becomes a stack of things left to look for while
//! the walk makes its way to the right scope.
//!
//! The graph as a whole lives in an instance of [`ScopeGraph`][], which owns every node in an
//! arena and interns every symbol; edges refer to nodes by handle, so the graph can be cyclic
//! while ownership stays flat.
//!
//! [scope graphs]: https://pl.ewi.tudelft.nl/research/projects/scope-graphs/
//! [`Action`]: enum.Action.html
//! [`NodeKind`]: enum.NodeKind.html
//! [`ScopeGraph`]: struct.ScopeGraph.html
//! [`resolve`]: ../resolve/index.html

use std::fmt::Display;
use std::ops::Index;

use controlled_option::ControlledOption;
use either::Either;
use enumset::EnumSet;
use enumset::EnumSetType;
use fxhash::FxHashMap;
use smallvec::smallvec;
use smallvec::SmallVec;

use crate::arena::Arena;
use crate::arena::Handle;
use crate::arena::SupplementalArena;
use crate::source::Position;

//-------------------------------------------------------------------------------------------------
// Symbols

/// A name that resolution manipulates on the symbol stack.
///
/// This is typically an identifier as it appears in the source language, but also one of the
/// "fake" symbols that model operations: `.` for member access and `()` for calling.
///
/// We deduplicate `Symbol` instances in a `ScopeGraph` — there are never multiple `Symbol`
/// instances with the same content — so handles can be compared for equality without
/// dereferencing into the arena.
pub struct Symbol {
    content: String,
}

impl Symbol {
    pub fn as_str(&self) -> &str {
        &self.content
    }
}

impl PartialEq<&str> for Symbol {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl ScopeGraph {
    /// Adds a symbol to the graph, ensuring that there's only ever one copy of a particular
    /// symbol stored.
    pub fn add_symbol<S: AsRef<str> + ?Sized>(&mut self, symbol: &S) -> Handle<Symbol> {
        let symbol = symbol.as_ref();
        if let Some(handle) = self.symbol_handles.get(symbol) {
            return *handle;
        }
        let handle = self.symbols.add(Symbol {
            content: symbol.to_owned(),
        });
        self.symbol_handles.insert(symbol.to_owned(), handle);
        handle
    }

    /// The `.` member access symbol.
    pub fn dot_symbol(&mut self) -> Handle<Symbol> {
        self.add_symbol(".")
    }

    /// The `()` call symbol.
    pub fn call_symbol(&mut self) -> Handle<Symbol> {
        self.add_symbol("()")
    }
}

impl Index<Handle<Symbol>> for ScopeGraph {
    type Output = str;
    #[inline(always)]
    fn index(&self, handle: Handle<Symbol>) -> &str {
        self.symbols.get(handle).as_str()
    }
}

//-------------------------------------------------------------------------------------------------
// Nodes

/// A stack action fired when resolution enters a node.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Action {
    /// Prepends a symbol to the stack.  Always permitted.
    Push(Handle<Symbol>),
    /// Removes the top of the stack.  Permitted only when the stack's top is this symbol.
    Pop(Handle<Symbol>),
}

/// What a node stands for in the source language.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NodeKind {
    /// Structural node with no source counterpart.
    Scope,
    /// The root scope of one module.
    ModuleScope,
    /// A binding occurrence; resolution accepts here when the stack is empty.
    Definition,
    /// A use occurrence; resolution starts here.
    Reference,
    /// The scope owning a class's instance properties.
    Instance,
    /// The scope reached through a class name (class-level attribute access).
    Class,
}

/// A restriction on which outgoing edges resolution may follow.  Rules attached to the node a
/// resolution _starts from_ apply to every edge along that resolution.
#[derive(EnumSetType, Debug)]
pub enum Rule {
    /// Do not follow edges flagged [`EdgeFlag::ToEnclosingScope`][].  Attached to the push half
    /// of assignment targets so that a store site does not leak its bare name into enclosing
    /// scopes.
    ///
    /// [`EdgeFlag::ToEnclosingScope`]: enum.EdgeFlag.html
    SkipEnclosingScopeEdges,
}

/// A node in a scope graph.
pub struct Node {
    /// The source identifier this node is an occurrence of, for `Definition` and `Reference`
    /// nodes.
    pub name: ControlledOption<Handle<Symbol>>,
    /// Where the occurrence sits in its source.
    pub position: Option<Position>,
    /// The stack action fired when resolution enters this node.
    pub action: Option<Action>,
    pub kind: NodeKind,
    /// Edge restrictions applied while resolving _from_ this node.
    pub rules: EnumSet<Rule>,
}

impl Node {
    #[inline(always)]
    pub fn is_definition(&self) -> bool {
        self.kind == NodeKind::Definition
    }

    #[inline(always)]
    pub fn is_reference(&self) -> bool {
        self.kind == NodeKind::Reference
    }

    /// Whether resolution may enter this node with the given stack.  The top of the stack is its
    /// last element.
    pub fn accepts(&self, stack: &[Handle<Symbol>]) -> bool {
        match self.action {
            Some(Action::Pop(symbol)) => stack.last() == Some(&symbol),
            Some(Action::Push(_)) | None => true,
        }
    }

    pub fn display<'a>(&'a self, graph: &'a ScopeGraph) -> impl Display + 'a {
        DisplayNode {
            wrapped: self,
            graph,
        }
    }
}

#[doc(hidden)]
pub struct DisplayNode<'a> {
    wrapped: &'a Node,
    graph: &'a ScopeGraph,
}

impl<'a> Display for DisplayNode<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let kind = match self.wrapped.kind {
            NodeKind::Scope => "scope",
            NodeKind::ModuleScope => "module scope",
            NodeKind::Definition => "definition",
            NodeKind::Reference => "reference",
            NodeKind::Instance => "instance",
            NodeKind::Class => "class",
        };
        write!(f, "[{}", kind)?;
        if let Some(name) = self.wrapped.name.into_option() {
            write!(f, " {}", &self.graph[name])?;
        }
        match self.wrapped.action {
            Some(Action::Push(symbol)) => write!(f, " push {}", &self.graph[symbol])?,
            Some(Action::Pop(symbol)) => write!(f, " pop {}", &self.graph[symbol])?,
            None => {}
        }
        if let Some(position) = self.wrapped.position {
            write!(f, " at {}", position)?;
        }
        write!(f, "]")
    }
}

impl Handle<Node> {
    pub fn display(self, graph: &ScopeGraph) -> impl Display + '_ {
        DisplayNode {
            wrapped: &graph[self],
            graph,
        }
    }
}

impl Index<Handle<Node>> for ScopeGraph {
    type Output = Node;
    #[inline(always)]
    fn index(&self, handle: Handle<Node>) -> &Node {
        self.nodes.get(handle)
    }
}

/// Assembles one node, wiring its indexes as it is added to the graph.
pub struct NodeBuilder<'a> {
    graph: &'a mut ScopeGraph,
    name: Option<Handle<Symbol>>,
    position: Option<Position>,
    action: Option<Action>,
    kind: Option<NodeKind>,
    is_definition: bool,
    rules: EnumSet<Rule>,
}

impl<'a> NodeBuilder<'a> {
    pub fn name(mut self, name: Handle<Symbol>) -> Self {
        self.name = Some(name);
        self
    }

    pub fn position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn push(mut self, symbol: Handle<Symbol>) -> Self {
        self.action = Some(Action::Push(symbol));
        self
    }

    pub fn pop(mut self, symbol: Handle<Symbol>) -> Self {
        self.action = Some(Action::Pop(symbol));
        self
    }

    pub fn definition(mut self) -> Self {
        self.is_definition = true;
        self
    }

    pub fn kind(mut self, kind: NodeKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules |= rule;
        self
    }

    /// Adds the node.  The kind, unless overridden, is derived the same way for every node: a
    /// definition if marked as one, a reference if named, a plain scope otherwise.
    pub fn add(self) -> Handle<Node> {
        let kind = self.kind.unwrap_or(if self.is_definition {
            NodeKind::Definition
        } else if self.name.is_some() {
            NodeKind::Reference
        } else {
            NodeKind::Scope
        });
        let node = Node {
            name: self.name.into(),
            position: self.position,
            action: self.action,
            kind,
            rules: self.rules,
        };
        let handle = self.graph.nodes.add(node);
        if let Some(name) = self.name {
            self.graph.references.entry(name).or_default().push(handle);
        }
        if let Some(position) = self.position {
            self.graph
                .positions
                .entry(position)
                .or_default()
                .push(handle);
        }
        handle
    }
}

//-------------------------------------------------------------------------------------------------
// Edges

/// Flags attached to an edge.
#[derive(EnumSetType, Debug)]
pub enum EdgeFlag {
    /// Layout hint only; never affects resolution.
    SameRank,
    /// Marks an edge that performs lookup in an enclosing scope, so that rules can cut it off.
    ToEnclosingScope,
}

/// Connects two nodes in a scope graph.
///
/// Edges provide the connectivity that resolution searches over.  The priority is a tiebreaker
/// when several paths leave a node: priority 0 edges are explored to exhaustion before priority 1
/// edges are considered.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Edge {
    pub flags: EnumSet<EdgeFlag>,
    pub priority: u8,
}

impl Edge {
    pub fn new() -> Edge {
        Edge::default()
    }

    pub fn same_rank() -> Edge {
        Edge {
            flags: EdgeFlag::SameRank.into(),
            priority: 0,
        }
    }

    pub fn to_enclosing_scope() -> Edge {
        Edge {
            flags: EdgeFlag::ToEnclosingScope.into(),
            priority: 0,
        }
    }

    pub fn with_priority(mut self, priority: u8) -> Edge {
        self.priority = priority;
        self
    }

    /// Whether a resolution started under `rules` may follow this edge.
    pub fn permitted_by(&self, rules: EnumSet<Rule>) -> bool {
        if rules.contains(Rule::SkipEnclosingScopeEdges)
            && self.flags.contains(EdgeFlag::ToEnclosingScope)
        {
            return false;
        }
        true
    }
}

impl Default for Edge {
    fn default() -> Edge {
        Edge {
            flags: EnumSet::empty(),
            priority: 0,
        }
    }
}

pub(crate) struct OutgoingEdge {
    pub(crate) edge: Edge,
    pub(crate) sink: Handle<Node>,
}

//-------------------------------------------------------------------------------------------------
// Fragments

/// A subgraph with a designated entry and exit node, the compositional result of visiting one AST
/// node.
///
/// Fragments remember the member nodes they were composed from, so that a fragment can be copied
/// wholesale — the `super()` lookup synthesis needs a private copy of each base-class lookup
/// chain.
#[derive(Clone, Debug)]
pub struct Fragment {
    pub entry: Handle<Node>,
    pub exit: Handle<Node>,
    pub is_statement: bool,
    nodes: SmallVec<[Handle<Node>; 4]>,
}

impl Fragment {
    /// A fragment consisting of a single node.
    pub fn point(node: Handle<Node>) -> Fragment {
        Fragment {
            entry: node,
            exit: node,
            is_statement: true,
            nodes: smallvec![node],
        }
    }

    /// A single-node fragment produced while visiting an expression.
    pub fn expression(node: Handle<Node>) -> Fragment {
        Fragment {
            entry: node,
            exit: node,
            is_statement: false,
            nodes: smallvec![node],
        }
    }

    /// A fragment spanning two nodes that the caller has wired (or will wire) itself.
    pub fn span(entry: Handle<Node>, exit: Handle<Node>) -> Fragment {
        Fragment {
            entry,
            exit,
            is_statement: true,
            nodes: smallvec![entry, exit],
        }
    }

    /// Composes two fragments without adding an edge; the caller wires them.
    pub fn join(first: &Fragment, second: &Fragment) -> Fragment {
        let mut nodes = first.nodes.clone();
        nodes.extend_from_slice(&second.nodes);
        Fragment {
            entry: first.entry,
            exit: second.exit,
            is_statement: true,
            nodes,
        }
    }

    pub(crate) fn nodes(&self) -> &[Handle<Node>] {
        &self.nodes
    }
}

//-------------------------------------------------------------------------------------------------
// Scope graphs

/// Contains all of the nodes and edges that make up a scope graph, plus the indexes consulted
/// when consolidating occurrences: all references per name, all nodes per source position, and
/// the root node of each module.
pub struct ScopeGraph {
    symbols: Arena<Symbol>,
    symbol_handles: FxHashMap<String, Handle<Symbol>>,
    pub(crate) nodes: Arena<Node>,
    outgoing_edges: SupplementalArena<Node, SmallVec<[OutgoingEdge; 4]>>,
    references: FxHashMap<Handle<Symbol>, Vec<Handle<Node>>>,
    positions: FxHashMap<Position, SmallVec<[Handle<Node>; 2]>>,
    module_roots: FxHashMap<String, Handle<Node>>,
    root: Handle<Node>,
}

impl ScopeGraph {
    /// Creates a new graph containing only the global root node.
    pub fn new() -> ScopeGraph {
        let mut nodes = Arena::new();
        let root = nodes.add(Node {
            name: ControlledOption::none(),
            position: None,
            action: None,
            kind: NodeKind::Scope,
            rules: EnumSet::empty(),
        });
        ScopeGraph {
            symbols: Arena::new(),
            symbol_handles: FxHashMap::default(),
            nodes,
            outgoing_edges: SupplementalArena::new(),
            references: FxHashMap::default(),
            positions: FxHashMap::default(),
            module_roots: FxHashMap::default(),
            root,
        }
    }

    /// The global root, from which every module root is reachable.
    #[inline(always)]
    pub fn root(&self) -> Handle<Node> {
        self.root
    }

    /// Starts assembling a new node.
    pub fn node(&mut self) -> NodeBuilder<'_> {
        NodeBuilder {
            graph: self,
            name: None,
            position: None,
            action: None,
            kind: None,
            is_definition: false,
            rules: EnumSet::empty(),
        }
    }

    /// Adds a plain scope node.
    pub fn add_scope_node(&mut self) -> Handle<Node> {
        self.node().add()
    }

    /// Returns an iterator of all of the nodes in the graph.  (Note that because we're only
    /// returning _handles_, this iterator does not retain a reference to the graph.)
    pub fn iter_nodes(&self) -> impl Iterator<Item = Handle<Node>> {
        self.nodes.iter_handles()
    }

    /// Adds a new edge to the graph.
    pub fn add_edge(&mut self, source: Handle<Node>, sink: Handle<Node>, edge: Edge) {
        let edges = self.outgoing_edges.get_mut_or_default(source);
        if !edges.iter().any(|existing| existing.sink == sink && existing.edge == edge) {
            edges.push(OutgoingEdge { edge, sink });
        }
    }

    /// Returns an iterator of all of the edges that begin at a particular source node.
    pub fn outgoing_edges(
        &self,
        source: Handle<Node>,
    ) -> impl Iterator<Item = (Edge, Handle<Node>)> + '_ {
        match self.outgoing_edges.get(source) {
            Some(edges) => Either::Right(edges.iter().map(|outgoing| (outgoing.edge, outgoing.sink))),
            None => Either::Left(std::iter::empty()),
        }
    }

    /// Wires `first`'s exit to `second`'s entry and returns the composed fragment.
    pub fn connect(&mut self, first: &Fragment, second: &Fragment, edge: Edge) -> Fragment {
        self.add_edge(first.exit, second.entry, edge);
        let mut nodes = first.nodes.clone();
        nodes.extend_from_slice(&second.nodes);
        Fragment {
            entry: first.entry,
            exit: second.exit,
            is_statement: true,
            nodes,
        }
    }

    /// Clones a fragment's member nodes and the edges among them.  Edges that leave the fragment
    /// are not copied; names and positions are not carried over, so the copy introduces no new
    /// occurrences.
    pub fn copy_fragment(&mut self, fragment: &Fragment) -> Fragment {
        let originals = fragment.nodes().to_vec();
        let mut copies: FxHashMap<Handle<Node>, Handle<Node>> = FxHashMap::default();
        let mut nodes: SmallVec<[Handle<Node>; 4]> = SmallVec::new();
        for original in &originals {
            let node = &self[*original];
            let action = node.action;
            let rules = node.rules;
            let copied = {
                let mut builder = self.node();
                builder.action = action;
                builder.rules = rules;
                builder.add()
            };
            copies.insert(*original, copied);
            nodes.push(copied);
        }
        let mut edges_to_copy = Vec::new();
        for original in &originals {
            for (edge, sink) in self.outgoing_edges(*original) {
                if copies.contains_key(&sink) {
                    edges_to_copy.push((copies[original], copies[&sink], edge));
                }
            }
        }
        for (source, sink, edge) in edges_to_copy {
            self.add_edge(source, sink, edge);
        }
        Fragment {
            entry: copies[&fragment.entry],
            exit: copies[&fragment.exit],
            is_statement: fragment.is_statement,
            nodes,
        }
    }

    /// Every reference or definition node carrying the given name.
    pub fn references_named(&self, name: Handle<Symbol>) -> &[Handle<Node>] {
        self.references
            .get(&name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every node registered at a source position.  A store site has two: the push half and the
    /// pop (definition) half.
    pub fn nodes_at(&self, position: Position) -> &[Handle<Node>] {
        self.positions
            .get(&position)
            .map(SmallVec::as_slice)
            .unwrap_or(&[])
    }

    pub fn symbol(&self, content: &str) -> Option<Handle<Symbol>> {
        self.symbol_handles.get(content).copied()
    }

    pub fn module_root(&self, module_name: &str) -> Option<Handle<Node>> {
        self.module_roots.get(module_name).copied()
    }

    pub(crate) fn set_module_root(&mut self, module_name: &str, root: Handle<Node>) {
        self.module_roots.insert(module_name.to_owned(), root);
    }
}

impl Default for ScopeGraph {
    fn default() -> ScopeGraph {
        ScopeGraph::new()
    }
}
