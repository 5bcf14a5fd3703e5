// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, scope-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

//! Builds the scope graph for a set of sources.
//!
//! The builder walks each source's AST and emits [`Fragment`s][`Fragment`] — subgraphs with a
//! designated entry and exit — which compose upward through the tree.  Node kinds it does not
//! handle explicitly fall through to a generic walk over child slots, so unknown or uninteresting
//! constructs still contribute the name references appearing inside them.
//!
//! Statements chain so that resolution from a use site walks through lexically earlier
//! statements: each statement fragment's exit is wired to the previous chain head and its entry
//! becomes the new head, and the module root links to the final head.  An import entering at the
//! module root can therefore reach every top-level definition, and a reference sees the nearest
//! preceding definition first.
//!
//! [`Fragment`]: ../graph/struct.Fragment.html

use crate::arena::Handle;
use crate::ast;
use crate::ast::walk::each_child;
use crate::ast::walk::NodeRef;
use crate::graph::Edge;
use crate::graph::Fragment;
use crate::graph::Node;
use crate::graph::NodeKind;
use crate::graph::Rule;
use crate::graph::ScopeGraph;
use crate::graph::Symbol;
use crate::source::Position;
use crate::source::Source;

/// Builds a scope graph covering all of the given sources.  Sources are processed in order, so
/// the [`SourceId`][] ordinals baked into positions must match the slice.
///
/// [`SourceId`]: ../source/struct.SourceId.html
pub fn build_graph(sources: &[Source]) -> ScopeGraph {
    let mut graph = ScopeGraph::new();
    for source in sources {
        GraphBuilder::new(&mut graph, source).visit_module();
    }
    graph
}

struct GraphBuilder<'a> {
    graph: &'a mut ScopeGraph,
    source: &'a Source,
    /// Innermost lookup scope last: the module root, then each enclosing function bottom.
    scope_hierarchy: Vec<Handle<Node>>,
    /// Base-class lookup fragments of the class whose body we are inside.
    inheritance_hierarchy: Vec<Fragment>,
    class_name: Option<String>,
    instance_scope: Option<Handle<Node>>,
    self_name: Option<String>,
}

impl<'a> GraphBuilder<'a> {
    fn new(graph: &'a mut ScopeGraph, source: &'a Source) -> GraphBuilder<'a> {
        GraphBuilder {
            graph,
            source,
            scope_hierarchy: Vec::new(),
            inheritance_hierarchy: Vec::new(),
            class_name: None,
            instance_scope: None,
            self_name: None,
        }
    }

    //---------------------------------------------------------------------------------------------
    // Module scaffolding

    fn visit_module(&mut self) {
        copious_debugging!("building module {}", self.source.module_name());
        let first = self.graph.add_scope_node();
        let module_root = self.graph.node().kind(NodeKind::ModuleScope).add();
        self.graph
            .set_module_root(self.source.module_name(), module_root);

        self.scope_hierarchy.push(module_root);
        let module = self.source.ast();
        let current = self.process_body(&module.body, first);
        self.scope_hierarchy.pop();

        self.graph.add_edge(module_root, current, Edge::new());

        // The module is named from the outside through a pop of each dotted component, so that
        // both `import pkg` and `from pkg.mod import name` find their way in.
        let mut current = module_root;
        let components: Vec<String> = self
            .source
            .module_name()
            .split('.')
            .map(str::to_owned)
            .collect();
        for component in components.iter().rev() {
            let dot = self.dot_symbol();
            let dot_pop = self.graph.node().pop(dot).add();
            self.graph.add_edge(dot_pop, current, Edge::new());
            let symbol = self.graph.add_symbol(component);
            let name_pop = self.graph.node().pop(symbol).definition().add();
            self.graph.add_edge(name_pop, dot_pop, Edge::new());
            current = name_pop;
        }
        let root = self.graph.root();
        self.graph.add_edge(root, current, Edge::same_rank());
    }

    /// Chains the fragments of a statement list, returning the new head of the chain.
    fn process_body(&mut self, body: &[ast::Stmt], mut current: Handle<Node>) -> Handle<Node> {
        for stmt in body {
            for fragment in self.visit_stmt(stmt) {
                if fragment.is_statement {
                    self.graph.add_edge(fragment.exit, current, Edge::new());
                    current = fragment.entry;
                } else {
                    // Park expression-level references on a fresh scope in the chain.
                    let scope = self.graph.add_scope_node();
                    self.graph.add_edge(scope, current, Edge::new());
                    self.graph.add_edge(fragment.exit, scope, Edge::same_rank());
                    current = scope;
                }
            }
        }
        current
    }

    //---------------------------------------------------------------------------------------------
    // Dispatch

    fn visit_stmt(&mut self, stmt: &ast::Stmt) -> Vec<Fragment> {
        match stmt {
            ast::Stmt::FunctionDef(node) => self.visit_function_def(node, false),
            ast::Stmt::AsyncFunctionDef(node) => self.visit_function_def(node, true),
            ast::Stmt::ClassDef(node) => self.visit_class_def(node),
            ast::Stmt::Assign(node) => self.visit_assign(node),
            ast::Stmt::For(node) | ast::Stmt::AsyncFor(node) => self.visit_for(node),
            ast::Stmt::Import(node) => self.visit_import(node),
            ast::Stmt::ImportFrom(node) => self.visit_import_from(node),
            ast::Stmt::Global(node) => self.visit_global(node),
            ast::Stmt::Nonlocal(node) => self.visit_nonlocal(node),
            ast::Stmt::Match(node) => self.visit_match(node),
            _ => self.generic_visit(NodeRef::Stmt(stmt)),
        }
    }

    fn visit_expr(&mut self, expr: &ast::Expr) -> Vec<Fragment> {
        match expr {
            ast::Expr::Name(node) => self.visit_name(node),
            ast::Expr::Attribute(node) => self.visit_attribute(node),
            ast::Expr::Call(node) => self.visit_call(node),
            ast::Expr::ListComp(node) | ast::Expr::SetComp(node) | ast::Expr::GeneratorExp(node) => {
                self.visit_comprehension(&node.generators, &[node.elt.as_ref()])
            }
            ast::Expr::DictComp(node) => {
                self.visit_comprehension(&node.generators, &[node.key.as_ref(), node.value.as_ref()])
            }
            _ => self.generic_visit(NodeRef::Expr(expr)),
        }
    }

    fn visit_node(&mut self, node: NodeRef) -> Vec<Fragment> {
        match node {
            NodeRef::Stmt(stmt) => self.visit_stmt(stmt),
            NodeRef::Expr(expr) => self.visit_expr(expr),
            NodeRef::Keyword(keyword) => self.visit_expr(&keyword.value),
            NodeRef::Arg(_) | NodeRef::Pattern(_) => Vec::new(),
        }
    }

    /// Called for every node kind without an explicit visitor: recurse into child slots.
    fn generic_visit(&mut self, node: NodeRef) -> Vec<Fragment> {
        let mut children = Vec::new();
        each_child(node, &mut |child| children.push(child));
        let mut fragments = Vec::new();
        for child in children {
            fragments.extend(self.visit_node(child));
        }
        fragments
    }

    //---------------------------------------------------------------------------------------------
    // Names and assignment

    fn visit_name(&mut self, node: &ast::Name) -> Vec<Fragment> {
        let symbol = self.graph.add_symbol(&node.id);
        let position = self.source.node_position(node.loc);
        match node.ctx {
            ast::ExprContext::Store => {
                // A store site is both halves of an alias: a reference that must not leak the
                // bare name into enclosing scopes, and the definition itself.
                let push = self
                    .graph
                    .node()
                    .name(symbol)
                    .position(position)
                    .push(symbol)
                    .rule(Rule::SkipEnclosingScopeEdges)
                    .add();
                let pop = self
                    .graph
                    .node()
                    .name(symbol)
                    .position(position)
                    .pop(symbol)
                    .definition()
                    .add();
                vec![Fragment::expression(push), Fragment::expression(pop)]
            }
            ast::ExprContext::Load | ast::ExprContext::Del => {
                let push = self
                    .graph
                    .node()
                    .name(symbol)
                    .position(position)
                    .push(symbol)
                    .add();
                vec![Fragment::expression(push)]
            }
        }
    }

    fn visit_assign(&mut self, node: &ast::Assign) -> Vec<Fragment> {
        let exit_scope = self.graph.add_scope_node();
        let current_parent = exit_scope;
        let current_scope = self.graph.add_scope_node();
        self.graph.add_edge(current_scope, current_parent, Edge::new());

        let mut target_fragments = Vec::new();
        for target in &node.targets {
            for fragment in self.visit_expr(target) {
                if self.entry_is_pop(&fragment) {
                    self.graph
                        .add_edge(current_scope, fragment.entry, Edge::same_rank());
                    target_fragments.push(fragment);
                } else if self.exit_is_push(&fragment) {
                    self.graph
                        .add_edge(fragment.exit, current_parent, Edge::same_rank());
                }
            }
        }

        let value_fragments = self.visit_expr(&node.value);
        if value_fragments.len() == target_fragments.len() {
            for (target, value) in target_fragments.iter().zip(&value_fragments) {
                self.graph.add_edge(target.exit, value.entry, Edge::same_rank());
                self.graph.add_edge(value.exit, current_parent, Edge::new());
            }
        } else if let Some(first_target) = target_fragments.first() {
            // Counts disagree (tuple unpacking against a single expression, say); wiring every
            // value to the first target under-approximates but keeps all values resolvable.
            for value in &value_fragments {
                self.graph
                    .add_edge(first_target.exit, value.entry, Edge::same_rank());
                self.graph.add_edge(value.exit, current_parent, Edge::new());
            }
        } else {
            for value in &value_fragments {
                self.graph.add_edge(value.exit, current_parent, Edge::new());
            }
        }

        vec![Fragment::span(current_scope, exit_scope)]
    }

    fn entry_is_pop(&self, fragment: &Fragment) -> bool {
        matches!(
            self.graph[fragment.entry].action,
            Some(crate::graph::Action::Pop(_))
        )
    }

    fn exit_is_push(&self, fragment: &Fragment) -> bool {
        matches!(
            self.graph[fragment.exit].action,
            Some(crate::graph::Action::Push(_))
        )
    }

    //---------------------------------------------------------------------------------------------
    // Attributes and calls

    fn visit_attribute(&mut self, node: &ast::Attribute) -> Vec<Fragment> {
        let mut results = Vec::new();
        let mut expressions = Vec::new();
        for fragment in self.visit_expr(&node.value) {
            if fragment.is_statement {
                results.push(fragment);
            } else {
                expressions.push(fragment);
            }
        }

        // Token-accurate positions for each dotted component, recovered from the text: the AST
        // only gives us the start of the whole attribute expression.
        let base_names = identifier_components(&node.value);
        let mut position = self.source.node_position(node.loc);
        let mut positions = Vec::new();
        for name in base_names
            .iter()
            .copied()
            .chain(std::iter::once(node.attr.as_str()))
        {
            position = self.find_after_or(name, position);
            positions.push(position);
        }
        let attr_position = *positions.last().unwrap();

        let attr_symbol = self.graph.add_symbol(&node.attr);
        let dot = self.dot_symbol();
        let in_scope = self
            .graph
            .node()
            .name(attr_symbol)
            .position(attr_position)
            .push(attr_symbol)
            .add();
        let dot_scope = self.graph.node().push(dot).add();
        self.graph.add_edge(in_scope, dot_scope, Edge::same_rank());

        let mut pipeline = Fragment::span(in_scope, dot_scope);
        for fragment in &expressions {
            self.graph
                .add_edge(dot_scope, fragment.entry, Edge::same_rank());
            pipeline = Fragment::join(&pipeline, fragment);
        }
        let mut load = pipeline.clone();
        load.entry = in_scope;
        load.is_statement = false;
        results.push(load);

        if node.ctx != ast::ExprContext::Store {
            return results;
        }

        // The store side: a chain of pops walking the dotted path down to the attribute.
        let mut previous: Option<Fragment> = None;
        for (name, name_position) in base_names.iter().zip(&positions) {
            let symbol = self.graph.add_symbol(name);
            let name_pop = self
                .graph
                .node()
                .name(symbol)
                .position(*name_position)
                .pop(symbol)
                .add();
            let dot_pop = self.graph.node().pop(dot).add();
            let fragment = self.graph.connect(
                &Fragment::point(name_pop),
                &Fragment::point(dot_pop),
                Edge::same_rank(),
            );
            previous = Some(match previous {
                Some(chain) => self.graph.connect(&chain, &fragment, Edge::same_rank()),
                None => fragment,
            });
        }
        let attr_pop = self
            .graph
            .node()
            .position(attr_position)
            .pop(attr_symbol)
            .add();
        if let Some(chain) = previous {
            results.push(
                self.graph
                    .connect(&chain, &Fragment::point(attr_pop), Edge::new()),
            );
        } else {
            results.push(Fragment::point(attr_pop));
        }

        if base_names.len() == 1
            && self.instance_scope.is_some()
            && self.self_name.as_deref() == Some(base_names[0])
        {
            let instance_scope = self.instance_scope.unwrap();
            self.add_instance_property(&node.attr, attr_position, instance_scope);
        }

        results
    }

    /// Registers `self.attr` as a property on the class's instance scope, so that every method of
    /// the class (and code holding an instance) converges on one definition.
    fn add_instance_property(
        &mut self,
        attribute: &str,
        attribute_position: Position,
        instance_scope: Handle<Node>,
    ) {
        let dot = self.dot_symbol();
        let dot_scope = match self.find_pop_edge(instance_scope, dot) {
            Some(found) => found,
            None => {
                let created = self.graph.node().pop(dot).add();
                self.graph
                    .add_edge(instance_scope, created, Edge::same_rank());
                created
            }
        };

        let attr_symbol = self.graph.add_symbol(attribute);
        if self.find_pop_edge(dot_scope, attr_symbol).is_none() {
            let property = self
                .graph
                .node()
                .name(attr_symbol)
                .position(attribute_position)
                .pop(attr_symbol)
                .definition()
                .add();
            self.graph.add_edge(dot_scope, property, Edge::same_rank());
        }
    }

    fn find_pop_edge(
        &self,
        from: Handle<Node>,
        symbol: Handle<Symbol>,
    ) -> Option<Handle<Node>> {
        self.graph
            .outgoing_edges(from)
            .map(|(_, sink)| sink)
            .find(|sink| {
                matches!(self.graph[*sink].action, Some(crate::graph::Action::Pop(popped)) if popped == symbol)
            })
    }

    fn visit_call(&mut self, node: &ast::Call) -> Vec<Fragment> {
        let mut results = Vec::new();

        // `super().m()` resolves `m` against the base classes of the current class, so the base
        // lookup fragments are copied into a private subgraph behind a pop of `super`.  (This
        // breaks down if `super` is ever rebound, which nobody does.)
        if let ast::Expr::Name(func) = node.func.as_ref() {
            if func.id == "super" && self.class_name.is_some() {
                let top = self.graph.add_scope_node();
                let bottom = self.graph.add_scope_node();
                let super_symbol = self.graph.add_symbol("super");
                let pop = self.graph.node().pop(super_symbol).add();
                self.graph.add_edge(bottom, pop, Edge::same_rank());
                let inherited = self.inheritance_hierarchy.clone();
                for base_fragment in &inherited {
                    let copied = self.graph.copy_fragment(base_fragment);
                    self.graph
                        .connect(&Fragment::point(pop), &copied, Edge::same_rank());
                    self.graph.connect(&copied, &Fragment::point(top), Edge::new());
                }
                self.graph.add_edge(bottom, top, Edge::new());
                results.push(Fragment::span(bottom, top));
            }
        }

        for arg in &node.args {
            results.extend(self.visit_expr(arg));
        }

        let call = self.call_symbol();
        let in_scope = self.graph.node().push(call).add();

        // Keyword argument names are occurrences of the callee's parameters; pushing them into
        // the call scope is what lets a parameter rename reach call sites.
        for keyword in &node.keywords {
            results.extend(self.visit_expr(&keyword.value));
            if let Some(arg) = &keyword.arg {
                let symbol = self.graph.add_symbol(arg);
                let keyword_position = self.source.node_position(keyword.loc);
                let keyword_node = self
                    .graph
                    .node()
                    .name(symbol)
                    .position(keyword_position)
                    .push(symbol)
                    .add();
                self.graph.add_edge(keyword_node, in_scope, Edge::same_rank());
            }
        }

        let mut expressions = Vec::new();
        for fragment in self.visit_expr(&node.func) {
            if fragment.is_statement {
                results.push(fragment);
            } else {
                expressions.push(fragment);
            }
        }
        for fragment in &expressions {
            self.graph
                .add_edge(in_scope, fragment.entry, Edge::same_rank());
            let mut pipeline = Fragment::join(&Fragment::point(in_scope), fragment);
            pipeline.entry = in_scope;
            pipeline.exit = fragment.exit;
            pipeline.is_statement = false;
            results.push(pipeline);
        }

        results
    }

    //---------------------------------------------------------------------------------------------
    // Loops, comprehensions, and match

    fn visit_for(&mut self, node: &ast::For) -> Vec<Fragment> {
        let exit_scope = self.graph.add_scope_node();
        let current_parent = exit_scope;
        let current_scope = self.graph.add_scope_node();
        self.graph.add_edge(current_scope, current_parent, Edge::new());

        for fragment in self.visit_expr(&node.target) {
            if self.entry_is_pop(&fragment) {
                self.graph
                    .add_edge(current_scope, fragment.entry, Edge::same_rank());
            } else if self.exit_is_push(&fragment) {
                self.graph
                    .add_edge(fragment.exit, current_parent, Edge::same_rank());
            }
        }

        let mut results = vec![Fragment::span(current_scope, exit_scope)];
        results.extend(self.visit_expr(&node.iter));
        for stmt in &node.body {
            results.extend(self.visit_stmt(stmt));
        }
        for stmt in &node.orelse {
            results.extend(self.visit_stmt(stmt));
        }
        results
    }

    fn visit_comprehension(
        &mut self,
        generators: &[ast::Comprehension],
        elements: &[&ast::Expr],
    ) -> Vec<Fragment> {
        // Comprehensions get a scope of their own: targets bind inside it, iterators and
        // conditions resolve outward through it.
        let top_scope = self.graph.add_scope_node();
        let mut current_scope = top_scope;
        for generator in generators {
            let target_scope = self.graph.add_scope_node();
            self.graph.add_edge(target_scope, current_scope, Edge::new());
            current_scope = target_scope;
            for fragment in self.visit_expr(&generator.target) {
                self.graph.add_edge(current_scope, fragment.entry, Edge::new());
            }

            let iter_scope = self.graph.add_scope_node();
            self.graph.add_edge(iter_scope, current_scope, Edge::new());
            current_scope = iter_scope;
            for fragment in self.visit_expr(&generator.iter) {
                self.graph.add_edge(fragment.exit, current_scope, Edge::new());
            }

            let ifs_scope = self.graph.add_scope_node();
            self.graph.add_edge(ifs_scope, current_scope, Edge::new());
            current_scope = ifs_scope;
            for if_node in &generator.ifs {
                for fragment in self.visit_expr(if_node) {
                    self.graph.add_edge(fragment.exit, current_scope, Edge::new());
                }
            }
        }

        for element in elements {
            let element_scope = self.graph.add_scope_node();
            self.graph.add_edge(element_scope, current_scope, Edge::new());
            current_scope = element_scope;
            for fragment in self.visit_expr(element) {
                self.graph.add_edge(fragment.exit, current_scope, Edge::new());
            }
        }

        let mut fragment = Fragment::span(current_scope, top_scope);
        fragment.is_statement = true;
        vec![fragment]
    }

    fn visit_match(&mut self, node: &ast::Match) -> Vec<Fragment> {
        let mut results = self.visit_expr(&node.subject);
        for case in &node.cases {
            let exit_scope = self.graph.add_scope_node();
            let current_scope = self.graph.add_scope_node();
            self.graph.add_edge(current_scope, exit_scope, Edge::new());

            let mut captures = Vec::new();
            let mut loads = Vec::new();
            collect_pattern_parts(&case.pattern, &mut captures, &mut loads);
            for capture in captures {
                let position = self.source.node_position(capture.loc);
                let symbol = self.graph.add_symbol(&capture.name);
                let push = self
                    .graph
                    .node()
                    .name(symbol)
                    .position(position)
                    .push(symbol)
                    .rule(Rule::SkipEnclosingScopeEdges)
                    .add();
                let pop = self
                    .graph
                    .node()
                    .name(symbol)
                    .position(position)
                    .pop(symbol)
                    .definition()
                    .add();
                self.graph.add_edge(current_scope, pop, Edge::same_rank());
                self.graph.add_edge(push, exit_scope, Edge::same_rank());
            }
            for load in loads {
                results.extend(self.visit_expr(load));
            }
            results.push(Fragment::span(current_scope, exit_scope));

            if let Some(guard) = &case.guard {
                results.extend(self.visit_expr(guard));
            }
            for stmt in &case.body {
                results.extend(self.visit_stmt(stmt));
            }
        }
        results
    }

    //---------------------------------------------------------------------------------------------
    // Functions and classes

    fn visit_function_def(&mut self, node: &ast::FunctionDef, is_async: bool) -> Vec<Fragment> {
        let mut results = Vec::new();
        for decorator in &node.decorator_list {
            results.extend(self.visit_expr(decorator));
        }

        let name_symbol = self.graph.add_symbol(&node.name);
        let keyword_width = if is_async { 10 } else { 4 };
        let position = self.source.node_position(node.loc) + keyword_width;

        let in_scope = self.graph.add_scope_node();
        let out_scope = in_scope;
        let call_scope = self
            .graph
            .node()
            .name(name_symbol)
            .position(position)
            .pop(name_symbol)
            .definition()
            .add();
        self.graph.add_edge(in_scope, call_scope, Edge::same_rank());
        // Calling the name applies the parentheses.
        let call = self.call_symbol();
        let function_definition = self.graph.node().pop(call).add();
        self.graph
            .add_edge(call_scope, function_definition, Edge::same_rank());

        let module_root = self
            .graph
            .module_root(self.source.module_name())
            .expect("module root exists while visiting its body");
        let lookup_parent = self.scope_hierarchy.last().copied().unwrap_or(module_root);
        let mut current_scope = self.graph.add_scope_node();
        self.graph
            .add_edge(current_scope, lookup_parent, Edge::to_enclosing_scope());
        let parent_scope = current_scope;

        let is_method = self.instance_scope.is_some()
            && !has_decorator(node, "staticmethod")
            && !has_decorator(node, "classmethod");

        for default in &node.args.defaults {
            results.extend(self.visit_expr(default));
        }
        for default in node.args.kw_defaults.iter().flatten() {
            results.extend(self.visit_expr(default));
        }

        let mut self_name = None;
        let positional: Vec<&ast::Arg> = node.args.positional().collect();
        for (index, arg) in positional.iter().enumerate() {
            let (next_scope, arg_definition) = self.add_parameter(current_scope, arg);
            current_scope = next_scope;

            if index == 0 && is_method && self.class_name.is_some() {
                // The receiver binds to the class's instance scope: a use of `self.x` pushes its
                // way through `ClassName()` to reach the instance properties.
                self_name = Some(arg.arg.clone());
                let call = self.call_symbol();
                let call_push = self.graph.node().push(call).add();
                self.graph
                    .add_edge(arg_definition, call_push, Edge::same_rank());
                let class_name = self.class_name.clone().unwrap();
                let class_symbol = self.graph.add_symbol(&class_name);
                let class_name_scope = self
                    .graph
                    .node()
                    .name(class_symbol)
                    .push(class_symbol)
                    .add();
                self.graph
                    .add_edge(call_push, class_name_scope, Edge::same_rank());
                self.graph.add_edge(class_name_scope, parent_scope, Edge::new());
            }
        }
        let remaining: Vec<&ast::Arg> = node
            .args
            .vararg
            .iter()
            .chain(node.args.kwonlyargs.iter())
            .chain(node.args.kwarg.iter())
            .collect();
        for arg in remaining {
            let (next_scope, _) = self.add_parameter(current_scope, arg);
            current_scope = next_scope;
        }

        self.graph
            .add_edge(function_definition, current_scope, Edge::new());

        let function_bottom = self.graph.add_scope_node();
        let saved_self = self.self_name.take();
        self.self_name = self_name;
        self.scope_hierarchy.push(function_bottom);
        let body_exit = self.process_body(&node.body, current_scope);
        self.scope_hierarchy.pop();
        self.self_name = saved_self;
        self.graph.add_edge(function_bottom, body_exit, Edge::new());

        results.push(Fragment::span(in_scope, out_scope));
        results
    }

    fn add_parameter(
        &mut self,
        current_scope: Handle<Node>,
        arg: &ast::Arg,
    ) -> (Handle<Node>, Handle<Node>) {
        let next_scope = self.graph.add_scope_node();
        self.graph.add_edge(next_scope, current_scope, Edge::new());
        let position = self.source.node_position(arg.loc);
        let symbol = self.graph.add_symbol(&arg.arg);
        let definition = self
            .graph
            .node()
            .name(symbol)
            .position(position)
            .pop(symbol)
            .definition()
            .add();
        self.graph.add_edge(next_scope, definition, Edge::same_rank());
        (next_scope, definition)
    }

    fn visit_class_def(&mut self, node: &ast::ClassDef) -> Vec<Fragment> {
        let mut results = Vec::new();
        for decorator in &node.decorator_list {
            results.extend(self.visit_expr(decorator));
        }
        for keyword in &node.keywords {
            results.extend(self.visit_expr(&keyword.value));
        }

        let current_scope = self.graph.add_scope_node();
        let original_scope = current_scope;
        let position = self.source.node_position(node.loc) + 6;

        let dot = self.dot_symbol();
        let instance_scope = self.graph.node().pop(dot).add();
        let i_scope = self.graph.node().kind(NodeKind::Instance).add();
        self.graph
            .add_edge(i_scope, instance_scope, Edge::same_rank());

        let class_symbol = self.graph.add_symbol(&node.name);
        let parent = self
            .graph
            .node()
            .name(class_symbol)
            .position(position)
            .pop(class_symbol)
            .definition()
            .add();
        self.graph.add_edge(current_scope, parent, Edge::same_rank());

        // Lookups that fail in the class body fall through to the bases, linearized in source
        // order.
        let mut base_fragments = Vec::new();
        for base in &node.bases {
            let mut base_fragment: Option<Fragment> = None;
            for fragment in self.visit_expr(base) {
                base_fragment = Some(match base_fragment {
                    Some(existing) => self.graph.connect(&fragment, &existing, Edge::new()),
                    None => fragment,
                });
            }
            if let Some(base_fragment) = base_fragment {
                self.graph
                    .connect(&Fragment::point(parent), &base_fragment, Edge::new());
                if let Some(&outer) = self.scope_hierarchy.last() {
                    self.graph.add_edge(base_fragment.exit, outer, Edge::new());
                }
                base_fragments.push(base_fragment);
            }
        }

        let class_top_scope = self.graph.add_scope_node();
        let saved_instance = self.instance_scope.replace(i_scope);
        let saved_class_name = self.class_name.replace(node.name.clone());
        let saved_inheritance =
            std::mem::replace(&mut self.inheritance_hierarchy, base_fragments);
        let current_class_scope = self.process_body(&node.body, class_top_scope);
        self.inheritance_hierarchy = saved_inheritance;
        self.class_name = saved_class_name;
        self.instance_scope = saved_instance;

        self.graph
            .add_edge(instance_scope, current_class_scope, Edge::new());

        // Class-level attribute access (`C.attr`) reaches the instance scope without calling.
        let c_scope = self.graph.node().kind(NodeKind::Class).add();
        self.graph.add_edge(parent, c_scope, Edge::same_rank());
        self.graph.add_edge(c_scope, instance_scope, Edge::same_rank());

        // Calling the class yields an instance.
        let call = self.call_symbol();
        let constructor = self.graph.node().pop(call).add();
        self.graph.add_edge(constructor, i_scope, Edge::new());
        self.graph.add_edge(parent, constructor, Edge::new());

        results.push(Fragment::point(original_scope));
        results
    }

    //---------------------------------------------------------------------------------------------
    // Imports and scope declarations

    fn visit_import(&mut self, node: &ast::Import) -> Vec<Fragment> {
        let current_scope = self.graph.add_scope_node();
        for alias in &node.names {
            let local_name = alias.asname.as_deref().unwrap_or(&alias.name);
            let position = self.source.node_position(alias.loc);

            let local_symbol = self.graph.add_symbol(local_name);
            let local = self
                .graph
                .node()
                .name(local_symbol)
                .position(position)
                .pop(local_symbol)
                .add();
            self.graph.add_edge(current_scope, local, Edge::same_rank());

            // Dots go between components only: the trailing `.` of a member access is already on
            // the stack when resolution reaches this chain.
            let components: Vec<&str> = alias.name.split('.').collect();
            let mut parts: Vec<String> = Vec::new();
            for (index, component) in components.iter().enumerate() {
                if index > 0 {
                    parts.push(".".to_owned());
                }
                parts.push((*component).to_owned());
            }
            let total = parts.len();
            let mut parent = local;
            for (index, component) in parts.into_iter().rev().enumerate() {
                let symbol = self.graph.add_symbol(&component);
                let mut builder = self.graph.node().push(symbol);
                if index + 1 == total {
                    // The first dotted component carries the occurrence.
                    builder = builder.name(symbol).position(position);
                }
                let remote = builder.add();
                self.graph.add_edge(parent, remote, Edge::same_rank());
                parent = remote;
            }
            let root = self.graph.root();
            self.graph.add_edge(parent, root, Edge::new());
        }
        vec![Fragment::point(current_scope)]
    }

    fn visit_import_from(&mut self, node: &ast::ImportFrom) -> Vec<Fragment> {
        let current_scope = self.graph.add_scope_node();
        let module_components = self.resolve_import_base(node);

        for alias in &node.names {
            if alias.name == "*" {
                // Wildcard re-export: forward any lookup that reaches this module onward into the
                // imported module.
                let mut parent = current_scope;
                let components: Vec<&str> =
                    module_components.iter().map(String::as_str).collect();
                for part in parts_with_dots(&components).into_iter().rev() {
                    let symbol = self.graph.add_symbol(&part);
                    let push = self.graph.node().push(symbol).add();
                    self.graph.add_edge(parent, push, Edge::same_rank());
                    parent = push;
                }
                let root = self.graph.root();
                self.graph.add_edge(parent, root, Edge::new());
            } else {
                let local_name = alias.asname.as_deref().unwrap_or(&alias.name);
                let position = self.source.node_position(alias.loc);

                let local_symbol = self.graph.add_symbol(local_name);
                let local = self
                    .graph
                    .node()
                    .name(local_symbol)
                    .position(position)
                    .pop(local_symbol)
                    .add();
                self.graph.add_edge(current_scope, local, Edge::same_rank());

                let mut parts: Vec<String> = Vec::new();
                for component in &module_components {
                    parts.push(component.clone());
                    parts.push(".".to_owned());
                }
                parts.push(alias.name.clone());

                let mut parent = local;
                for part in parts.iter().rev() {
                    let symbol = self.graph.add_symbol(part);
                    let remote = self
                        .graph
                        .node()
                        .name(symbol)
                        .position(position)
                        .push(symbol)
                        .add();
                    self.graph.add_edge(parent, remote, Edge::same_rank());
                    parent = remote;
                }
                let root = self.graph.root();
                self.graph.add_edge(parent, root, Edge::new());
            }
        }
        vec![Fragment::point(current_scope)]
    }

    /// The dotted components of the module an `ImportFrom` targets, with relative levels resolved
    /// against the importing module's package.
    fn resolve_import_base(&self, node: &ast::ImportFrom) -> Vec<String> {
        let mut components: Vec<String> = Vec::new();
        if node.level > 0 {
            let own: Vec<&str> = self.source.module_name().split('.').collect();
            let package_len = own.len().saturating_sub(1);
            let keep = package_len.saturating_sub(node.level as usize - 1);
            components.extend(own[..keep].iter().map(|part| (*part).to_owned()));
        }
        if let Some(module) = &node.module {
            components.extend(module.split('.').map(str::to_owned));
        }
        components
    }

    fn visit_global(&mut self, node: &ast::NameList) -> Vec<Fragment> {
        let module_root = self
            .graph
            .module_root(self.source.module_name())
            .expect("module root exists while visiting its body");
        self.visit_scope_declaration(node, module_root)
    }

    fn visit_nonlocal(&mut self, node: &ast::NameList) -> Vec<Fragment> {
        let module_root = self
            .graph
            .module_root(self.source.module_name())
            .expect("module root exists while visiting its body");
        let target = if self.scope_hierarchy.len() >= 2 {
            self.scope_hierarchy[self.scope_hierarchy.len() - 2]
        } else {
            module_root
        };
        self.visit_scope_declaration(node, target)
    }

    /// `global x` / `nonlocal x`: a local pop for the occurrence itself, plus a push that routes
    /// lookup onward to the declared scope.  Both halves carry the occurrence's position, so a
    /// local write and a later outer write end up in one rename group.
    fn visit_scope_declaration(
        &mut self,
        node: &ast::NameList,
        target: Handle<Node>,
    ) -> Vec<Fragment> {
        let current_scope = self.graph.add_scope_node();
        let start = self.source.node_position(node.loc);
        for name in &node.names {
            let position = self.find_after_or(name, start);
            let symbol = self.graph.add_symbol(name);
            let pop = self
                .graph
                .node()
                .name(symbol)
                .position(position)
                .pop(symbol)
                .add();
            self.graph.add_edge(current_scope, pop, Edge::same_rank());
            let push = self
                .graph
                .node()
                .name(symbol)
                .position(position)
                .push(symbol)
                .add();
            self.graph.add_edge(pop, push, Edge::same_rank());
            self.graph.add_edge(push, target, Edge::new());
        }
        vec![Fragment::point(current_scope)]
    }

    //---------------------------------------------------------------------------------------------
    // Helpers

    fn dot_symbol(&mut self) -> Handle<Symbol> {
        self.graph.dot_symbol()
    }

    fn call_symbol(&mut self) -> Handle<Symbol> {
        self.graph.call_symbol()
    }

    /// `find_after` that falls back to the starting position when the token cannot be recovered
    /// from the text; the offending occurrence is then merely imprecise instead of fatal.
    fn find_after_or(&self, name: &str, start: Position) -> Position {
        self.source.find_after(name, start).unwrap_or(start)
    }
}

fn has_decorator(node: &ast::FunctionDef, name: &str) -> bool {
    node.decorator_list.iter().any(|decorator| {
        matches!(decorator, ast::Expr::Name(decorator_name) if decorator_name.id == name)
    })
}

/// The identifier components along a dotted path: `a.b.c()` has components `a`, `b`, `c`.
fn identifier_components(expr: &ast::Expr) -> Vec<&str> {
    match expr {
        ast::Expr::Name(node) => vec![node.id.as_str()],
        ast::Expr::Attribute(node) => {
            let mut components = identifier_components(&node.value);
            components.push(node.attr.as_str());
            components
        }
        ast::Expr::Call(node) => identifier_components(&node.func),
        _ => Vec::new(),
    }
}

/// Interleaves module path components with `.` symbols: `["a", "b"]` becomes `a . b .`.
fn parts_with_dots(components: &[&str]) -> Vec<String> {
    let mut parts = Vec::with_capacity(components.len() * 2);
    for component in components {
        parts.push((*component).to_owned());
        parts.push(".".to_owned());
    }
    parts
}

/// Splits a match pattern into the names it captures and the expressions it merely reads.
fn collect_pattern_parts<'a>(
    pattern: &'a ast::Pattern,
    captures: &mut Vec<&'a ast::CaptureName>,
    loads: &mut Vec<&'a ast::Expr>,
) {
    match pattern {
        ast::Pattern::MatchValue(value, _) => loads.push(value.as_ref()),
        ast::Pattern::MatchSingleton(_, _) => {}
        ast::Pattern::MatchSequence(patterns, _) | ast::Pattern::MatchOr(patterns, _) => {
            for pattern in patterns {
                collect_pattern_parts(pattern, captures, loads);
            }
        }
        ast::Pattern::MatchMapping {
            keys,
            patterns,
            rest,
            ..
        } => {
            loads.extend(keys.iter());
            for pattern in patterns {
                collect_pattern_parts(pattern, captures, loads);
            }
            if let Some(rest) = rest {
                captures.push(rest);
            }
        }
        ast::Pattern::MatchClass {
            cls,
            patterns,
            kwd_patterns,
            ..
        } => {
            loads.push(cls.as_ref());
            for pattern in patterns.iter().chain(kwd_patterns.iter()) {
                collect_pattern_parts(pattern, captures, loads);
            }
        }
        ast::Pattern::MatchStar(name, _) => {
            if let Some(name) = name {
                captures.push(name);
            }
        }
        ast::Pattern::MatchAs { pattern, name, .. } => {
            if let Some(pattern) = pattern {
                collect_pattern_parts(pattern, captures, loads);
            }
            if let Some(name) = name {
                captures.push(name);
            }
        }
    }
}
