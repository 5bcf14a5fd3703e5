// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, scope-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

//! The abstract syntax tree contract that the analysis consumes.
//!
//! The surface parser is an external collaborator: anything that can produce trees of these types
//! — with accurate locations — can drive the scope graph builder and the refactoring planner.  The
//! shapes follow the conventions of Python's `ast` module: every node carries a [`Loc`][] whose
//! `row` is 1-based and whose `column` is a UTF-8 **byte** offset into the line (translation into
//! Unicode scalar columns happens in the source model, not here), plus an exclusive end location.
//!
//! The [`walk`][] submodule provides child-slot iteration in field order, which is what the
//! builder's generic visitor and the search utilities use for any node kind they don't handle
//! explicitly.
//!
//! [`Loc`]: struct.Loc.html
//! [`walk`]: walk/index.html

/// A source extent attached to every AST node.  `row`/`end_row` are 1-based; `column`/`end_column`
/// are UTF-8 byte offsets into their lines; the end location is exclusive.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Loc {
    pub row: u32,
    pub column: u32,
    pub end_row: u32,
    pub end_column: u32,
}

impl Loc {
    pub fn new(row: u32, column: u32, end_row: u32, end_column: u32) -> Loc {
        Loc {
            row,
            column,
            end_row,
            end_column,
        }
    }

    /// A location for a node that starts and ends on one line.
    pub fn line_span(row: u32, column: u32, end_column: u32) -> Loc {
        Loc::new(row, column, row, end_column)
    }
}

/// Whether a name occurrence reads, writes, or deletes its binding.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ExprContext {
    Load,
    Store,
    Del,
}

//-------------------------------------------------------------------------------------------------
// Statements

#[derive(Clone, Debug)]
pub struct Module {
    pub body: Vec<Stmt>,
}

#[derive(Clone, Debug)]
pub enum Stmt {
    FunctionDef(FunctionDef),
    AsyncFunctionDef(FunctionDef),
    ClassDef(ClassDef),
    Return(Return),
    Delete(Delete),
    Assign(Assign),
    AugAssign(AugAssign),
    AnnAssign(AnnAssign),
    For(For),
    AsyncFor(For),
    While(While),
    If(If),
    With(With),
    AsyncWith(With),
    Match(Match),
    Try(Try),
    Import(Import),
    ImportFrom(ImportFrom),
    Global(NameList),
    Nonlocal(NameList),
    Expr(ExprStmt),
    Pass(Loc),
    Break(Loc),
    Continue(Loc),
}

impl Stmt {
    pub fn loc(&self) -> Loc {
        match self {
            Stmt::FunctionDef(node) | Stmt::AsyncFunctionDef(node) => node.loc,
            Stmt::ClassDef(node) => node.loc,
            Stmt::Return(node) => node.loc,
            Stmt::Delete(node) => node.loc,
            Stmt::Assign(node) => node.loc,
            Stmt::AugAssign(node) => node.loc,
            Stmt::AnnAssign(node) => node.loc,
            Stmt::For(node) | Stmt::AsyncFor(node) => node.loc,
            Stmt::While(node) => node.loc,
            Stmt::If(node) => node.loc,
            Stmt::With(node) | Stmt::AsyncWith(node) => node.loc,
            Stmt::Match(node) => node.loc,
            Stmt::Try(node) => node.loc,
            Stmt::Import(node) => node.loc,
            Stmt::ImportFrom(node) => node.loc,
            Stmt::Global(node) | Stmt::Nonlocal(node) => node.loc,
            Stmt::Expr(node) => node.loc,
            Stmt::Pass(loc) | Stmt::Break(loc) | Stmt::Continue(loc) => *loc,
        }
    }
}

#[derive(Clone, Debug)]
pub struct FunctionDef {
    pub name: String,
    pub args: Arguments,
    pub body: Vec<Stmt>,
    pub decorator_list: Vec<Expr>,
    pub returns: Option<Box<Expr>>,
    pub type_params: Vec<TypeParam>,
    pub loc: Loc,
}

#[derive(Clone, Debug)]
pub struct ClassDef {
    pub name: String,
    pub bases: Vec<Expr>,
    pub keywords: Vec<Keyword>,
    pub body: Vec<Stmt>,
    pub decorator_list: Vec<Expr>,
    pub type_params: Vec<TypeParam>,
    pub loc: Loc,
}

/// A PEP 695 type parameter.  Resolution treats these as opaque: they never participate in the
/// scope graph.
#[derive(Clone, Debug)]
pub struct TypeParam {
    pub name: String,
    pub loc: Loc,
}

#[derive(Clone, Debug)]
pub struct Return {
    pub value: Option<Box<Expr>>,
    pub loc: Loc,
}

#[derive(Clone, Debug)]
pub struct Delete {
    pub targets: Vec<Expr>,
    pub loc: Loc,
}

#[derive(Clone, Debug)]
pub struct Assign {
    pub targets: Vec<Expr>,
    pub value: Box<Expr>,
    pub loc: Loc,
}

#[derive(Clone, Debug)]
pub struct AugAssign {
    pub target: Box<Expr>,
    pub op: BinaryOperator,
    pub value: Box<Expr>,
    pub loc: Loc,
}

#[derive(Clone, Debug)]
pub struct AnnAssign {
    pub target: Box<Expr>,
    pub annotation: Box<Expr>,
    pub value: Option<Box<Expr>>,
    pub loc: Loc,
}

#[derive(Clone, Debug)]
pub struct For {
    pub target: Box<Expr>,
    pub iter: Box<Expr>,
    pub body: Vec<Stmt>,
    pub orelse: Vec<Stmt>,
    pub loc: Loc,
}

#[derive(Clone, Debug)]
pub struct While {
    pub test: Box<Expr>,
    pub body: Vec<Stmt>,
    pub orelse: Vec<Stmt>,
    pub loc: Loc,
}

#[derive(Clone, Debug)]
pub struct If {
    pub test: Box<Expr>,
    pub body: Vec<Stmt>,
    pub orelse: Vec<Stmt>,
    pub loc: Loc,
}

#[derive(Clone, Debug)]
pub struct With {
    pub items: Vec<WithItem>,
    pub body: Vec<Stmt>,
    pub loc: Loc,
}

#[derive(Clone, Debug)]
pub struct WithItem {
    pub context_expr: Expr,
    pub optional_vars: Option<Expr>,
}

#[derive(Clone, Debug)]
pub struct Match {
    pub subject: Box<Expr>,
    pub cases: Vec<MatchCase>,
    pub loc: Loc,
}

#[derive(Clone, Debug)]
pub struct MatchCase {
    pub pattern: Pattern,
    pub guard: Option<Expr>,
    pub body: Vec<Stmt>,
}

#[derive(Clone, Debug)]
pub struct Try {
    pub body: Vec<Stmt>,
    pub handlers: Vec<ExceptHandler>,
    pub orelse: Vec<Stmt>,
    pub finalbody: Vec<Stmt>,
    pub loc: Loc,
}

#[derive(Clone, Debug)]
pub struct ExceptHandler {
    pub typ: Option<Expr>,
    pub name: Option<String>,
    pub body: Vec<Stmt>,
    pub loc: Loc,
}

#[derive(Clone, Debug)]
pub struct Import {
    pub names: Vec<Alias>,
    pub loc: Loc,
}

#[derive(Clone, Debug)]
pub struct ImportFrom {
    pub module: Option<String>,
    pub names: Vec<Alias>,
    pub level: u32,
    pub loc: Loc,
}

#[derive(Clone, Debug)]
pub struct Alias {
    pub name: String,
    pub asname: Option<String>,
    pub loc: Loc,
}

/// A `global` or `nonlocal` statement.
#[derive(Clone, Debug)]
pub struct NameList {
    pub names: Vec<String>,
    pub loc: Loc,
}

#[derive(Clone, Debug)]
pub struct ExprStmt {
    pub value: Box<Expr>,
    pub loc: Loc,
}

//-------------------------------------------------------------------------------------------------
// Expressions

#[derive(Clone, Debug)]
pub enum Expr {
    BoolOp(BoolOp),
    BinOp(BinOp),
    UnaryOp(UnaryOp),
    Lambda(Lambda),
    IfExp(IfExp),
    Dict(Dict),
    Set(SetExpr),
    ListComp(Comp),
    SetComp(Comp),
    DictComp(DictComp),
    GeneratorExp(Comp),
    Await(Await),
    Yield(Yield),
    YieldFrom(YieldFrom),
    Compare(Compare),
    Call(Call),
    FormattedValue(FormattedValue),
    JoinedStr(JoinedStr),
    Constant(Constant),
    NamedExpr(NamedExpr),
    Attribute(Attribute),
    Subscript(Subscript),
    Starred(Starred),
    Name(Name),
    List(SequenceExpr),
    Tuple(SequenceExpr),
    Slice(Slice),
}

impl Expr {
    pub fn loc(&self) -> Loc {
        match self {
            Expr::BoolOp(node) => node.loc,
            Expr::BinOp(node) => node.loc,
            Expr::UnaryOp(node) => node.loc,
            Expr::Lambda(node) => node.loc,
            Expr::IfExp(node) => node.loc,
            Expr::Dict(node) => node.loc,
            Expr::Set(node) => node.loc,
            Expr::ListComp(node) | Expr::SetComp(node) | Expr::GeneratorExp(node) => node.loc,
            Expr::DictComp(node) => node.loc,
            Expr::Await(node) => node.loc,
            Expr::Yield(node) => node.loc,
            Expr::YieldFrom(node) => node.loc,
            Expr::Compare(node) => node.loc,
            Expr::Call(node) => node.loc,
            Expr::FormattedValue(node) => node.loc,
            Expr::JoinedStr(node) => node.loc,
            Expr::Constant(node) => node.loc,
            Expr::NamedExpr(node) => node.loc,
            Expr::Attribute(node) => node.loc,
            Expr::Subscript(node) => node.loc,
            Expr::Starred(node) => node.loc,
            Expr::Name(node) => node.loc,
            Expr::List(node) | Expr::Tuple(node) => node.loc,
            Expr::Slice(node) => node.loc,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BooleanOperator {
    And,
    Or,
}

#[derive(Clone, Debug)]
pub struct BoolOp {
    pub op: BooleanOperator,
    pub values: Vec<Expr>,
    pub loc: Loc,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mult,
    MatMult,
    Div,
    Mod,
    Pow,
    LShift,
    RShift,
    BitOr,
    BitXor,
    BitAnd,
    FloorDiv,
}

#[derive(Clone, Debug)]
pub struct BinOp {
    pub left: Box<Expr>,
    pub op: BinaryOperator,
    pub right: Box<Expr>,
    pub loc: Loc,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum UnaryOperator {
    Invert,
    Not,
    UAdd,
    USub,
}

#[derive(Clone, Debug)]
pub struct UnaryOp {
    pub op: UnaryOperator,
    pub operand: Box<Expr>,
    pub loc: Loc,
}

#[derive(Clone, Debug)]
pub struct Lambda {
    pub args: Arguments,
    pub body: Box<Expr>,
    pub loc: Loc,
}

#[derive(Clone, Debug)]
pub struct IfExp {
    pub test: Box<Expr>,
    pub body: Box<Expr>,
    pub orelse: Box<Expr>,
    pub loc: Loc,
}

#[derive(Clone, Debug)]
pub struct Dict {
    pub keys: Vec<Option<Expr>>,
    pub values: Vec<Expr>,
    pub loc: Loc,
}

#[derive(Clone, Debug)]
pub struct SetExpr {
    pub elts: Vec<Expr>,
    pub loc: Loc,
}

/// A list, set, or generator comprehension.
#[derive(Clone, Debug)]
pub struct Comp {
    pub elt: Box<Expr>,
    pub generators: Vec<Comprehension>,
    pub loc: Loc,
}

#[derive(Clone, Debug)]
pub struct DictComp {
    pub key: Box<Expr>,
    pub value: Box<Expr>,
    pub generators: Vec<Comprehension>,
    pub loc: Loc,
}

#[derive(Clone, Debug)]
pub struct Comprehension {
    pub target: Expr,
    pub iter: Expr,
    pub ifs: Vec<Expr>,
    pub is_async: bool,
}

#[derive(Clone, Debug)]
pub struct Await {
    pub value: Box<Expr>,
    pub loc: Loc,
}

#[derive(Clone, Debug)]
pub struct Yield {
    pub value: Option<Box<Expr>>,
    pub loc: Loc,
}

#[derive(Clone, Debug)]
pub struct YieldFrom {
    pub value: Box<Expr>,
    pub loc: Loc,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ComparisonOperator {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    Is,
    IsNot,
    In,
    NotIn,
}

#[derive(Clone, Debug)]
pub struct Compare {
    pub left: Box<Expr>,
    pub ops: Vec<ComparisonOperator>,
    pub comparators: Vec<Expr>,
    pub loc: Loc,
}

#[derive(Clone, Debug)]
pub struct Call {
    pub func: Box<Expr>,
    pub args: Vec<Expr>,
    pub keywords: Vec<Keyword>,
    pub loc: Loc,
}

/// A keyword argument `name=value`, or `**value` when `arg` is absent.  The location is that of
/// the keyword name, which is the occurrence used when renaming named parameters.
#[derive(Clone, Debug)]
pub struct Keyword {
    pub arg: Option<String>,
    pub value: Expr,
    pub loc: Loc,
}

#[derive(Clone, Debug)]
pub struct FormattedValue {
    pub value: Box<Expr>,
    pub format_spec: Option<Box<Expr>>,
    pub loc: Loc,
}

#[derive(Clone, Debug)]
pub struct JoinedStr {
    pub values: Vec<Expr>,
    pub loc: Loc,
}

/// A literal constant.  The value is kept in normalized textual form; two constants are the same
/// constant iff their kinds and texts agree.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum ConstantValue {
    None,
    Ellipsis,
    Bool(bool),
    Int(String),
    Float(String),
    Str(String),
    Bytes(Vec<u8>),
}

#[derive(Clone, Debug)]
pub struct Constant {
    pub value: ConstantValue,
    pub loc: Loc,
}

#[derive(Clone, Debug)]
pub struct NamedExpr {
    pub target: Box<Expr>,
    pub value: Box<Expr>,
    pub loc: Loc,
}

#[derive(Clone, Debug)]
pub struct Attribute {
    pub value: Box<Expr>,
    pub attr: String,
    pub ctx: ExprContext,
    pub loc: Loc,
}

#[derive(Clone, Debug)]
pub struct Subscript {
    pub value: Box<Expr>,
    pub slice: Box<Expr>,
    pub ctx: ExprContext,
    pub loc: Loc,
}

#[derive(Clone, Debug)]
pub struct Starred {
    pub value: Box<Expr>,
    pub ctx: ExprContext,
    pub loc: Loc,
}

#[derive(Clone, Debug)]
pub struct Name {
    pub id: String,
    pub ctx: ExprContext,
    pub loc: Loc,
}

/// A list or tuple display; the two share a shape.
#[derive(Clone, Debug)]
pub struct SequenceExpr {
    pub elts: Vec<Expr>,
    pub ctx: ExprContext,
    pub loc: Loc,
}

#[derive(Clone, Debug)]
pub struct Slice {
    pub lower: Option<Box<Expr>>,
    pub upper: Option<Box<Expr>>,
    pub step: Option<Box<Expr>>,
    pub loc: Loc,
}

//-------------------------------------------------------------------------------------------------
// Parameters

#[derive(Clone, Debug, Default)]
pub struct Arguments {
    pub posonlyargs: Vec<Arg>,
    pub args: Vec<Arg>,
    pub vararg: Option<Arg>,
    pub kwonlyargs: Vec<Arg>,
    pub kw_defaults: Vec<Option<Expr>>,
    pub kwarg: Option<Arg>,
    pub defaults: Vec<Expr>,
}

impl Arguments {
    /// All parameter names in declaration order.
    pub fn all_args(&self) -> impl Iterator<Item = &Arg> {
        self.posonlyargs
            .iter()
            .chain(self.args.iter())
            .chain(self.vararg.iter())
            .chain(self.kwonlyargs.iter())
            .chain(self.kwarg.iter())
    }

    /// The positional parameters (positional-only followed by regular), whose first entry is the
    /// receiver in methods.
    pub fn positional(&self) -> impl Iterator<Item = &Arg> {
        self.posonlyargs.iter().chain(self.args.iter())
    }
}

#[derive(Clone, Debug)]
pub struct Arg {
    pub arg: String,
    pub loc: Loc,
}

//-------------------------------------------------------------------------------------------------
// Match patterns

#[derive(Clone, Debug)]
pub enum Pattern {
    MatchValue(Box<Expr>, Loc),
    MatchSingleton(ConstantValue, Loc),
    MatchSequence(Vec<Pattern>, Loc),
    MatchMapping {
        keys: Vec<Expr>,
        patterns: Vec<Pattern>,
        rest: Option<CaptureName>,
        loc: Loc,
    },
    MatchClass {
        cls: Box<Expr>,
        patterns: Vec<Pattern>,
        kwd_attrs: Vec<String>,
        kwd_patterns: Vec<Pattern>,
        loc: Loc,
    },
    MatchStar(Option<CaptureName>, Loc),
    MatchAs {
        pattern: Option<Box<Pattern>>,
        name: Option<CaptureName>,
        loc: Loc,
    },
    MatchOr(Vec<Pattern>, Loc),
}

/// A name bound by a match pattern, with the location of the name itself.
#[derive(Clone, Debug)]
pub struct CaptureName {
    pub name: String,
    pub loc: Loc,
}

//-------------------------------------------------------------------------------------------------
// Generic child traversal

pub mod walk {
    //! Child-slot iteration over AST nodes, in field declaration order.
    //!
    //! This is the tagged-variant replacement for a visitor hierarchy: callers match on the node
    //! kinds they care about and hand everything else to [`each_child`][], which recurses exactly
    //! one level.
    //!
    //! [`each_child`]: fn.each_child.html

    use super::*;

    /// A borrowed reference to any AST node kind that generic traversal can stop at.
    #[derive(Clone, Copy, Debug)]
    pub enum NodeRef<'a> {
        Stmt(&'a Stmt),
        Expr(&'a Expr),
        Pattern(&'a Pattern),
        Arg(&'a Arg),
        Keyword(&'a Keyword),
    }

    /// Calls `f` for each direct child of `node`, in field order.
    pub fn each_child<'a, F>(node: NodeRef<'a>, f: &mut F)
    where
        F: FnMut(NodeRef<'a>),
    {
        match node {
            NodeRef::Stmt(stmt) => each_stmt_child(stmt, f),
            NodeRef::Expr(expr) => each_expr_child(expr, f),
            NodeRef::Pattern(pattern) => each_pattern_child(pattern, f),
            NodeRef::Arg(_) => {}
            NodeRef::Keyword(keyword) => f(NodeRef::Expr(&keyword.value)),
        }
    }

    fn each_exprs<'a, F>(exprs: &'a [Expr], f: &mut F)
    where
        F: FnMut(NodeRef<'a>),
    {
        for expr in exprs {
            f(NodeRef::Expr(expr));
        }
    }

    fn each_stmts<'a, F>(stmts: &'a [Stmt], f: &mut F)
    where
        F: FnMut(NodeRef<'a>),
    {
        for stmt in stmts {
            f(NodeRef::Stmt(stmt));
        }
    }

    fn each_arguments<'a, F>(args: &'a Arguments, f: &mut F)
    where
        F: FnMut(NodeRef<'a>),
    {
        for arg in args.all_args() {
            f(NodeRef::Arg(arg));
        }
        each_exprs(&args.defaults, f);
        for default in args.kw_defaults.iter().flatten() {
            f(NodeRef::Expr(default));
        }
    }

    fn each_stmt_child<'a, F>(stmt: &'a Stmt, f: &mut F)
    where
        F: FnMut(NodeRef<'a>),
    {
        match stmt {
            Stmt::FunctionDef(node) | Stmt::AsyncFunctionDef(node) => {
                each_exprs(&node.decorator_list, f);
                each_arguments(&node.args, f);
                if let Some(returns) = &node.returns {
                    f(NodeRef::Expr(returns));
                }
                each_stmts(&node.body, f);
            }
            Stmt::ClassDef(node) => {
                each_exprs(&node.decorator_list, f);
                each_exprs(&node.bases, f);
                for keyword in &node.keywords {
                    f(NodeRef::Keyword(keyword));
                }
                each_stmts(&node.body, f);
            }
            Stmt::Return(node) => {
                if let Some(value) = &node.value {
                    f(NodeRef::Expr(value));
                }
            }
            Stmt::Delete(node) => each_exprs(&node.targets, f),
            Stmt::Assign(node) => {
                each_exprs(&node.targets, f);
                f(NodeRef::Expr(&node.value));
            }
            Stmt::AugAssign(node) => {
                f(NodeRef::Expr(&node.target));
                f(NodeRef::Expr(&node.value));
            }
            Stmt::AnnAssign(node) => {
                f(NodeRef::Expr(&node.target));
                f(NodeRef::Expr(&node.annotation));
                if let Some(value) = &node.value {
                    f(NodeRef::Expr(value));
                }
            }
            Stmt::For(node) | Stmt::AsyncFor(node) => {
                f(NodeRef::Expr(&node.target));
                f(NodeRef::Expr(&node.iter));
                each_stmts(&node.body, f);
                each_stmts(&node.orelse, f);
            }
            Stmt::While(node) => {
                f(NodeRef::Expr(&node.test));
                each_stmts(&node.body, f);
                each_stmts(&node.orelse, f);
            }
            Stmt::If(node) => {
                f(NodeRef::Expr(&node.test));
                each_stmts(&node.body, f);
                each_stmts(&node.orelse, f);
            }
            Stmt::With(node) | Stmt::AsyncWith(node) => {
                for item in &node.items {
                    f(NodeRef::Expr(&item.context_expr));
                    if let Some(optional_vars) = &item.optional_vars {
                        f(NodeRef::Expr(optional_vars));
                    }
                }
                each_stmts(&node.body, f);
            }
            Stmt::Match(node) => {
                f(NodeRef::Expr(&node.subject));
                for case in &node.cases {
                    f(NodeRef::Pattern(&case.pattern));
                    if let Some(guard) = &case.guard {
                        f(NodeRef::Expr(guard));
                    }
                    each_stmts(&case.body, f);
                }
            }
            Stmt::Try(node) => {
                each_stmts(&node.body, f);
                for handler in &node.handlers {
                    if let Some(typ) = &handler.typ {
                        f(NodeRef::Expr(typ));
                    }
                    each_stmts(&handler.body, f);
                }
                each_stmts(&node.orelse, f);
                each_stmts(&node.finalbody, f);
            }
            Stmt::Import(_) | Stmt::ImportFrom(_) => {}
            Stmt::Global(_) | Stmt::Nonlocal(_) => {}
            Stmt::Expr(node) => f(NodeRef::Expr(&node.value)),
            Stmt::Pass(_) | Stmt::Break(_) | Stmt::Continue(_) => {}
        }
    }

    fn each_expr_child<'a, F>(expr: &'a Expr, f: &mut F)
    where
        F: FnMut(NodeRef<'a>),
    {
        match expr {
            Expr::BoolOp(node) => each_exprs(&node.values, f),
            Expr::BinOp(node) => {
                f(NodeRef::Expr(&node.left));
                f(NodeRef::Expr(&node.right));
            }
            Expr::UnaryOp(node) => f(NodeRef::Expr(&node.operand)),
            Expr::Lambda(node) => {
                each_arguments(&node.args, f);
                f(NodeRef::Expr(&node.body));
            }
            Expr::IfExp(node) => {
                f(NodeRef::Expr(&node.test));
                f(NodeRef::Expr(&node.body));
                f(NodeRef::Expr(&node.orelse));
            }
            Expr::Dict(node) => {
                for key in node.keys.iter().flatten() {
                    f(NodeRef::Expr(key));
                }
                each_exprs(&node.values, f);
            }
            Expr::Set(node) => each_exprs(&node.elts, f),
            Expr::ListComp(node) | Expr::SetComp(node) | Expr::GeneratorExp(node) => {
                f(NodeRef::Expr(&node.elt));
                for generator in &node.generators {
                    each_comprehension(generator, f);
                }
            }
            Expr::DictComp(node) => {
                f(NodeRef::Expr(&node.key));
                f(NodeRef::Expr(&node.value));
                for generator in &node.generators {
                    each_comprehension(generator, f);
                }
            }
            Expr::Await(node) => f(NodeRef::Expr(&node.value)),
            Expr::Yield(node) => {
                if let Some(value) = &node.value {
                    f(NodeRef::Expr(value));
                }
            }
            Expr::YieldFrom(node) => f(NodeRef::Expr(&node.value)),
            Expr::Compare(node) => {
                f(NodeRef::Expr(&node.left));
                each_exprs(&node.comparators, f);
            }
            Expr::Call(node) => {
                f(NodeRef::Expr(&node.func));
                each_exprs(&node.args, f);
                for keyword in &node.keywords {
                    f(NodeRef::Keyword(keyword));
                }
            }
            Expr::FormattedValue(node) => {
                f(NodeRef::Expr(&node.value));
                if let Some(format_spec) = &node.format_spec {
                    f(NodeRef::Expr(format_spec));
                }
            }
            Expr::JoinedStr(node) => each_exprs(&node.values, f),
            Expr::Constant(_) => {}
            Expr::NamedExpr(node) => {
                f(NodeRef::Expr(&node.target));
                f(NodeRef::Expr(&node.value));
            }
            Expr::Attribute(node) => f(NodeRef::Expr(&node.value)),
            Expr::Subscript(node) => {
                f(NodeRef::Expr(&node.value));
                f(NodeRef::Expr(&node.slice));
            }
            Expr::Starred(node) => f(NodeRef::Expr(&node.value)),
            Expr::Name(_) => {}
            Expr::List(node) | Expr::Tuple(node) => each_exprs(&node.elts, f),
            Expr::Slice(node) => {
                if let Some(lower) = &node.lower {
                    f(NodeRef::Expr(lower));
                }
                if let Some(upper) = &node.upper {
                    f(NodeRef::Expr(upper));
                }
                if let Some(step) = &node.step {
                    f(NodeRef::Expr(step));
                }
            }
        }
    }

    fn each_comprehension<'a, F>(generator: &'a Comprehension, f: &mut F)
    where
        F: FnMut(NodeRef<'a>),
    {
        f(NodeRef::Expr(&generator.target));
        f(NodeRef::Expr(&generator.iter));
        each_exprs(&generator.ifs, f);
    }

    fn each_pattern_child<'a, F>(pattern: &'a Pattern, f: &mut F)
    where
        F: FnMut(NodeRef<'a>),
    {
        match pattern {
            Pattern::MatchValue(value, _) => f(NodeRef::Expr(value)),
            Pattern::MatchSingleton(_, _) => {}
            Pattern::MatchSequence(patterns, _) | Pattern::MatchOr(patterns, _) => {
                for pattern in patterns {
                    f(NodeRef::Pattern(pattern));
                }
            }
            Pattern::MatchMapping { keys, patterns, .. } => {
                each_exprs(keys, f);
                for pattern in patterns {
                    f(NodeRef::Pattern(pattern));
                }
            }
            Pattern::MatchClass {
                cls,
                patterns,
                kwd_patterns,
                ..
            } => {
                f(NodeRef::Expr(cls));
                for pattern in patterns.iter().chain(kwd_patterns.iter()) {
                    f(NodeRef::Pattern(pattern));
                }
            }
            Pattern::MatchStar(_, _) => {}
            Pattern::MatchAs { pattern, .. } => {
                if let Some(pattern) = pattern {
                    f(NodeRef::Pattern(pattern));
                }
            }
        }
    }
}
