//! Owned syntax tree for Go source files
//!
//! The shape follows Go's own syntax tree: type expressions are ordinary
//! [`Expr`] values, and top-level declarations are either function
//! declarations or generic (`const`/`type`/`var`) declarations holding specs.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct FileId(pub u32);

/// Byte range inside one file of a compilation unit.
///
/// Every identifier occurrence has a distinct span, so spans double as the
/// identity of an occurrence in the resolution tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span {
    pub file: FileId,
    pub lo: u32,
    pub hi: u32,
}

impl Span {
    pub fn new(file: FileId, lo: u32, hi: u32) -> Self {
        Self { file, lo, hi }
    }

    pub fn to(self, end: Span) -> Span {
        Span {
            file: self.file,
            lo: self.lo.min(end.lo),
            hi: self.hi.max(end.hi),
        }
    }

    pub fn contains(self, inner: Span) -> bool {
        self.file == inner.file && self.lo <= inner.lo && inner.hi <= self.hi
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn is_blank(&self) -> bool {
        self.name == "_"
    }
}

#[derive(Debug, Clone)]
pub struct File {
    pub package: Ident,
    /// Span from the start of the file to the end of the package clause,
    /// including any leading comments and build constraints.
    pub header: Span,
    pub imports: Vec<ImportDecl>,
    pub decls: Vec<Decl>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ImportDecl {
    pub specs: Vec<ImportSpec>,
    pub grouped: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ImportSpec {
    /// Explicit local name, including `_` and `.`.
    pub name: Option<Ident>,
    pub path: String,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum Decl {
    Func(FuncDecl),
    Gen(GenDecl),
}

impl Decl {
    pub fn span(&self) -> Span {
        match self {
            Decl::Func(func) => func.span,
            Decl::Gen(gen_decl) => gen_decl.span,
        }
    }

    pub fn doc(&self) -> Option<Span> {
        match self {
            Decl::Func(func) => func.doc,
            Decl::Gen(gen_decl) => gen_decl.doc,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FuncDecl {
    pub recv: Option<FieldList>,
    pub name: Ident,
    pub type_params: Option<FieldList>,
    pub ty: FuncType,
    pub body: Option<Block>,
    pub span: Span,
    pub doc: Option<Span>,
}

impl FuncDecl {
    pub fn is_method(&self) -> bool {
        self.recv.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenKind {
    Const,
    Type,
    Var,
}

impl GenKind {
    pub fn keyword(self) -> &'static str {
        match self {
            GenKind::Const => "const",
            GenKind::Type => "type",
            GenKind::Var => "var",
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenDecl {
    pub kind: GenKind,
    pub specs: Vec<Spec>,
    /// Written with parentheses, `var ( ... )`.
    pub grouped: bool,
    pub span: Span,
    pub doc: Option<Span>,
}

impl GenDecl {
    /// A const group where some spec repeats the previous expression list
    /// implicitly (`iota` enumerations). Such a group cannot be split.
    pub fn has_implicit_repetition(&self) -> bool {
        if self.kind != GenKind::Const {
            return false;
        }
        self.specs.iter().skip(1).any(|spec| match spec {
            Spec::Value(value) => value.values.is_empty(),
            Spec::Type(_) => false,
        })
    }
}

#[derive(Debug, Clone)]
pub enum Spec {
    Type(TypeSpec),
    Value(ValueSpec),
}

impl Spec {
    pub fn span(&self) -> Span {
        match self {
            Spec::Type(spec) => spec.span,
            Spec::Value(spec) => spec.span,
        }
    }

    pub fn doc(&self) -> Option<Span> {
        match self {
            Spec::Type(spec) => spec.doc,
            Spec::Value(spec) => spec.doc,
        }
    }

    pub fn names(&self) -> Vec<&Ident> {
        match self {
            Spec::Type(spec) => vec![&spec.name],
            Spec::Value(spec) => spec.names.iter().collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TypeSpec {
    pub name: Ident,
    pub type_params: Option<FieldList>,
    /// `type A = B`
    pub alias: bool,
    pub ty: Expr,
    pub span: Span,
    pub doc: Option<Span>,
}

#[derive(Debug, Clone)]
pub struct ValueSpec {
    pub names: Vec<Ident>,
    pub ty: Option<Expr>,
    pub values: Vec<Expr>,
    pub span: Span,
    pub doc: Option<Span>,
}

#[derive(Debug, Clone, Default)]
pub struct FieldList {
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone)]
pub struct Field {
    /// Empty for embedded fields and unnamed parameters.
    pub names: Vec<Ident>,
    pub ty: Expr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct FuncType {
    pub params: FieldList,
    pub results: Option<FieldList>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

#[derive(Debug, Clone)]
pub enum InterfaceElem {
    Method { name: Ident, ty: FuncType },
    Embedded(Expr),
}

#[derive(Debug, Clone)]
pub enum Expr {
    Ident(Ident),
    BasicLit {
        span: Span,
    },
    CompositeLit {
        ty: Option<Box<Expr>>,
        elts: Vec<Expr>,
        span: Span,
    },
    FuncLit {
        ty: FuncType,
        body: Block,
        span: Span,
    },
    Paren {
        inner: Box<Expr>,
        span: Span,
    },
    Selector {
        base: Box<Expr>,
        sel: Ident,
        span: Span,
    },
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
        span: Span,
    },
    Slice {
        base: Box<Expr>,
        low: Option<Box<Expr>>,
        high: Option<Box<Expr>>,
        max: Option<Box<Expr>>,
        span: Span,
    },
    /// `x.(T)`; `ty` is `None` for the `x.(type)` of a type switch.
    TypeAssert {
        operand: Box<Expr>,
        ty: Option<Box<Expr>>,
        span: Span,
    },
    Call {
        fun: Box<Expr>,
        args: Vec<Expr>,
        ellipsis: bool,
        span: Span,
    },
    /// Pointer type `*T`.
    Star {
        operand: Box<Expr>,
        span: Span,
    },
    Unary {
        op: String,
        operand: Box<Expr>,
        span: Span,
    },
    Binary {
        op: String,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
    KeyValue {
        key: Box<Expr>,
        value: Box<Expr>,
        span: Span,
    },
    /// Array or slice type; `len` is `None` for slices.
    ArrayType {
        len: Option<Box<Expr>>,
        elem: Box<Expr>,
        span: Span,
    },
    StructType {
        fields: FieldList,
        span: Span,
    },
    FuncType(FuncType),
    InterfaceType {
        elems: Vec<InterfaceElem>,
        span: Span,
    },
    MapType {
        key: Box<Expr>,
        value: Box<Expr>,
        span: Span,
    },
    ChanType {
        dir: ChanDir,
        value: Box<Expr>,
        span: Span,
    },
    /// `...T` in a parameter list, or the `...` length of `[...]T`.
    Ellipsis {
        elem: Option<Box<Expr>>,
        span: Span,
    },
    /// Generic instantiation `T[A, B]`.
    Generic {
        base: Box<Expr>,
        args: Vec<Expr>,
        span: Span,
    },
    Bad {
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Ident(ident) => ident.span,
            Expr::FuncType(func) => func.span,
            Expr::BasicLit { span }
            | Expr::CompositeLit { span, .. }
            | Expr::FuncLit { span, .. }
            | Expr::Paren { span, .. }
            | Expr::Selector { span, .. }
            | Expr::Index { span, .. }
            | Expr::Slice { span, .. }
            | Expr::TypeAssert { span, .. }
            | Expr::Call { span, .. }
            | Expr::Star { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::KeyValue { span, .. }
            | Expr::ArrayType { span, .. }
            | Expr::StructType { span, .. }
            | Expr::InterfaceType { span, .. }
            | Expr::MapType { span, .. }
            | Expr::ChanType { span, .. }
            | Expr::Ellipsis { span, .. }
            | Expr::Generic { span, .. }
            | Expr::Bad { span } => *span,
        }
    }

    pub fn as_ident(&self) -> Option<&Ident> {
        match self {
            Expr::Ident(ident) => Some(ident),
            _ => None,
        }
    }

    /// Strips parentheses.
    pub fn unparen(&self) -> &Expr {
        match self {
            Expr::Paren { inner, .. } => inner.unparen(),
            other => other,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct CaseClause {
    /// Case expressions or types; empty for `default`.
    pub list: Vec<Expr>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct CommClause {
    /// Send or receive statement; `None` for `default`.
    pub comm: Option<Box<Stmt>>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Decl(GenDecl),
    Empty,
    Labeled {
        label: Ident,
        stmt: Option<Box<Stmt>>,
    },
    Expr(Expr),
    Send {
        chan: Expr,
        value: Expr,
    },
    IncDec(Expr),
    /// Plain assignment, or a short variable declaration when `define` is set.
    Assign {
        lhs: Vec<Expr>,
        rhs: Vec<Expr>,
        define: bool,
    },
    Go(Expr),
    Defer(Expr),
    Return(Vec<Expr>),
    /// `break`, `continue`, `goto` and `fallthrough`.
    Branch {
        label: Option<Ident>,
    },
    Block(Block),
    If {
        init: Option<Box<Stmt>>,
        cond: Expr,
        then: Block,
        els: Option<Box<Stmt>>,
    },
    Switch {
        init: Option<Box<Stmt>>,
        tag: Option<Expr>,
        clauses: Vec<CaseClause>,
    },
    TypeSwitch {
        init: Option<Box<Stmt>>,
        bind: Option<Ident>,
        subject: Expr,
        clauses: Vec<CaseClause>,
    },
    Select {
        clauses: Vec<CommClause>,
    },
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        post: Option<Box<Stmt>>,
        body: Block,
    },
    Range {
        key: Option<Expr>,
        value: Option<Expr>,
        define: bool,
        expr: Expr,
        body: Block,
    },
}
