//! Scope visitor for building ScopeTree and SymbolTable from the AST
//!
//! This module provides a visitor that traverses every file of a compilation
//! unit and builds the scope tree, the symbol table and the definition/use
//! tables keyed by identifier occurrence.

use std::collections::HashMap;

use crate::ast::{
    Block, Decl, Expr, FieldList, File, FileId, FuncDecl, FuncType, GenDecl, GenKind, Ident,
    InterfaceElem, Span, Spec, Stmt, TypeSpec, ValueSpec,
};
use crate::imports::package_name;

use super::scope::{ScopeId, ScopeKind, ScopeTree};
use super::symbols::{Symbol, SymbolId, SymbolKind, SymbolTable, UnresolvedReference};

const BUILTINS: &[&str] = &[
    // types
    "any", "bool", "byte", "comparable", "complex64", "complex128", "error", "float32",
    "float64", "int", "int8", "int16", "int32", "int64", "rune", "string", "uint", "uint8",
    "uint16", "uint32", "uint64", "uintptr",
    // constants and zero value
    "true", "false", "iota", "nil",
    // functions
    "append", "cap", "clear", "close", "complex", "copy", "delete", "imag", "len", "make", "max",
    "min", "new", "panic", "print", "println", "real", "recover",
];

/// One import spec of one file.
#[derive(Debug, Clone)]
pub struct ImportBinding {
    pub file: FileId,
    /// Name the package is referred to by in the file, including `_` and `.`.
    pub name: String,
    pub path: String,
    /// Written with an explicit local name.
    pub explicit: bool,
    pub span: Span,
    /// `None` for blank and dot imports, which bind no name.
    pub symbol: Option<SymbolId>,
}

/// Underlying shape of a named type, as far as composite literal keys care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TypeShape {
    Struct,
    Keyed,
    Other,
}

pub struct SemanticModel {
    pub scope_tree: ScopeTree,
    pub symbol_table: SymbolTable,
    pub package_scope: ScopeId,
    /// Identifier occurrences that declare a symbol.
    pub defs: HashMap<Span, SymbolId>,
    /// Identifier occurrences that refer to a symbol.
    pub uses: HashMap<Span, SymbolId>,
    /// Method selectors whose receiver type is unknown and whose name matches
    /// several methods of the unit.
    pub candidates: HashMap<Span, Vec<SymbolId>>,
    pub imports: Vec<ImportBinding>,
    pub unresolved_references: Vec<UnresolvedReference>,
}

impl SemanticModel {
    /// Symbol denoted by an identifier occurrence, looking at uses first.
    pub fn resolve(&self, ident: &Ident) -> Option<SymbolId> {
        self.uses
            .get(&ident.span)
            .or_else(|| self.defs.get(&ident.span))
            .copied()
    }

    pub fn candidates(&self, ident: &Ident) -> &[SymbolId] {
        self.candidates
            .get(&ident.span)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        self.symbol_table.get(id)
    }

    pub fn is_import_used(&self, binding: &ImportBinding) -> bool {
        binding
            .symbol
            .is_some_and(|id| !self.symbol_table.get(id).references.is_empty())
    }

    /// Unresolved `q` of every `q.Name` selector, in source order.
    pub fn unresolved_qualifiers(&self) -> impl Iterator<Item = &UnresolvedReference> {
        self.unresolved_references.iter().filter(|r| r.is_qualifier)
    }
}

pub struct ScopeBuilder {
    pub scope_tree: ScopeTree,
    pub symbol_table: SymbolTable,
    current_scope: ScopeId,
    package_scope: ScopeId,
    defs: HashMap<Span, SymbolId>,
    uses: HashMap<Span, SymbolId>,
    candidates: HashMap<Span, Vec<SymbolId>>,
    type_shapes: HashMap<SymbolId, TypeShape>,
    imports: Vec<ImportBinding>,
    unresolved_references: Vec<UnresolvedReference>,
}

impl Default for ScopeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeBuilder {
    pub fn new() -> Self {
        let mut scope_tree = ScopeTree::new();
        let mut symbol_table = SymbolTable::new();

        let universe = scope_tree.create_scope(ScopeKind::Universe, None, None);
        for name in BUILTINS {
            symbol_table.declare(name, SymbolKind::Builtin, universe, None, false);
        }
        let package_scope = scope_tree.create_scope(ScopeKind::Package, Some(universe), None);

        Self {
            scope_tree,
            symbol_table,
            current_scope: package_scope,
            package_scope,
            defs: HashMap::new(),
            uses: HashMap::new(),
            candidates: HashMap::new(),
            type_shapes: HashMap::new(),
            imports: Vec::new(),
            unresolved_references: Vec::new(),
        }
    }

    /// Resolves every file of one compilation unit.
    pub fn build<'a, I>(files: I) -> SemanticModel
    where
        I: IntoIterator<Item = &'a File>,
    {
        let files: Vec<&File> = files.into_iter().collect();
        let mut builder = Self::new();

        let file_scopes: Vec<ScopeId> = files.iter().map(|file| builder.declare_file(file)).collect();

        // Package-level names are visible in every file regardless of order.
        builder.current_scope = builder.package_scope;
        for file in &files {
            builder.hoist_decls(file);
        }
        for (file, &scope) in files.iter().zip(&file_scopes) {
            builder.current_scope = scope;
            builder.hoist_signatures(file);
        }

        // Initializers first, so that variables carry their type hints into
        // function bodies.
        for (file, &scope) in files.iter().zip(&file_scopes) {
            builder.current_scope = scope;
            for decl in &file.decls {
                if let Decl::Gen(gen_decl) = decl {
                    builder.visit_gen_decl(gen_decl, true);
                }
            }
        }
        for (file, &scope) in files.iter().zip(&file_scopes) {
            builder.current_scope = scope;
            for decl in &file.decls {
                if let Decl::Func(func) = decl {
                    builder.visit_func_decl(func);
                }
            }
        }

        SemanticModel {
            scope_tree: builder.scope_tree,
            symbol_table: builder.symbol_table,
            package_scope: builder.package_scope,
            defs: builder.defs,
            uses: builder.uses,
            candidates: builder.candidates,
            imports: builder.imports,
            unresolved_references: builder.unresolved_references,
        }
    }

    fn declare_file(&mut self, file: &File) -> ScopeId {
        let file_scope =
            self.scope_tree
                .create_scope(ScopeKind::File, Some(self.package_scope), Some(file.span));

        for spec in file.imports.iter().flat_map(|decl| &decl.specs) {
            let name = match &spec.name {
                Some(ident) => ident.name.clone(),
                None => package_name(&spec.path),
            };

            let symbol = if name == "_" || name == "." {
                None
            } else {
                let span = spec.name.as_ref().map(|ident| ident.span);
                let id = self
                    .symbol_table
                    .declare(&name, SymbolKind::Import, file_scope, span, false);
                if let Some(span) = span {
                    self.defs.insert(span, id);
                }
                Some(id)
            };

            self.imports.push(ImportBinding {
                file: spec.span.file,
                name,
                path: spec.path.clone(),
                explicit: spec.name.is_some(),
                span: spec.span,
                symbol,
            });
        }

        file_scope
    }

    fn hoist_decls(&mut self, file: &File) {
        for decl in &file.decls {
            match decl {
                Decl::Func(func) if !func.is_method() => {
                    let id = if func.name.name == "init" || func.name.is_blank() {
                        self.symbol_table.declare_hidden(
                            &func.name.name,
                            SymbolKind::Func,
                            self.package_scope,
                            Some(func.name.span),
                            true,
                        )
                    } else {
                        self.symbol_table.declare(
                            &func.name.name,
                            SymbolKind::Func,
                            self.package_scope,
                            Some(func.name.span),
                            true,
                        )
                    };
                    self.defs.insert(func.name.span, id);
                }
                Decl::Func(_) => {}
                Decl::Gen(gen_decl) => {
                    for spec in &gen_decl.specs {
                        match spec {
                            Spec::Type(type_spec) => {
                                let id = self.declare_ident(&type_spec.name, SymbolKind::Type, true);
                                self.type_shapes.insert(id, shape_of(&type_spec.ty));
                            }
                            Spec::Value(value_spec) => {
                                let kind = value_kind(gen_decl.kind);
                                for name in &value_spec.names {
                                    self.declare_ident(name, kind, true);
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    /// Declares methods and records the result type hints of functions.
    fn hoist_signatures(&mut self, file: &File) {
        for decl in &file.decls {
            let Decl::Func(func) = decl else {
                continue;
            };

            let id = match &func.recv {
                Some(recv) => {
                    let receiver = recv
                        .fields
                        .first()
                        .and_then(|field| receiver_base(&field.ty))
                        .and_then(|base| self.symbol_table.lookup_local(&base.name, self.package_scope))
                        .filter(|&id| self.symbol_table.get(id).kind == SymbolKind::Type);
                    let id = self.symbol_table.declare_method(
                        receiver,
                        &func.name.name,
                        self.package_scope,
                        Some(func.name.span),
                    );
                    self.defs.insert(func.name.span, id);
                    id
                }
                None => match self.defs.get(&func.name.span) {
                    Some(&id) => id,
                    None => continue,
                },
            };

            let hint = func
                .ty
                .results
                .as_ref()
                .and_then(|results| results.fields.first())
                .and_then(|field| self.named_type(&field.ty));
            self.symbol_table.set_type_hint(id, hint);
        }
    }

    fn declare_ident(&mut self, ident: &Ident, kind: SymbolKind, is_package_level: bool) -> SymbolId {
        let scope = self.current_scope;
        let id = if ident.is_blank() {
            self.symbol_table
                .declare_hidden(&ident.name, kind, scope, Some(ident.span), is_package_level)
        } else {
            self.symbol_table
                .declare(&ident.name, kind, scope, Some(ident.span), is_package_level)
        };
        self.defs.insert(ident.span, id);
        id
    }

    fn enter_scope(&mut self, kind: ScopeKind, span: Option<Span>) -> ScopeId {
        let parent_scope = self.current_scope;
        self.current_scope = self
            .scope_tree
            .create_scope(kind, Some(parent_scope), span);
        parent_scope
    }

    fn visit_gen_decl(&mut self, gen_decl: &GenDecl, is_package_level: bool) {
        for spec in &gen_decl.specs {
            match spec {
                Spec::Type(type_spec) => {
                    if !is_package_level {
                        let id = self.declare_ident(&type_spec.name, SymbolKind::Type, false);
                        self.type_shapes.insert(id, shape_of(&type_spec.ty));
                    }
                    self.visit_type_spec(type_spec);
                }
                Spec::Value(value_spec) => {
                    self.visit_value_spec(value_kind(gen_decl.kind), value_spec, is_package_level);
                }
            }
        }
    }

    fn visit_type_spec(&mut self, type_spec: &TypeSpec) {
        match &type_spec.type_params {
            Some(params) => {
                let parent_scope = self.enter_scope(ScopeKind::TypeParams, Some(type_spec.span));
                self.declare_type_params(params);
                self.visit_expr(&type_spec.ty);
                self.current_scope = parent_scope;
            }
            None => self.visit_expr(&type_spec.ty),
        }
    }

    fn visit_value_spec(&mut self, kind: SymbolKind, value_spec: &ValueSpec, is_package_level: bool) {
        if let Some(ty) = &value_spec.ty {
            self.visit_expr(ty);
        }
        for value in &value_spec.values {
            self.visit_expr(value);
        }

        let declared_type = value_spec.ty.as_ref().and_then(|ty| self.named_type(ty));
        let one_to_one = value_spec.values.len() == value_spec.names.len();

        for (i, name) in value_spec.names.iter().enumerate() {
            let id = if is_package_level {
                match self.defs.get(&name.span) {
                    Some(&id) => id,
                    None => continue,
                }
            } else {
                self.declare_ident(name, kind, false)
            };

            let hint = declared_type.or_else(|| {
                one_to_one
                    .then(|| value_spec.values.get(i))
                    .flatten()
                    .and_then(|value| self.type_of_expr(value))
            });
            self.symbol_table.set_type_hint(id, hint);
        }
    }

    fn declare_type_params(&mut self, params: &FieldList) {
        for field in &params.fields {
            for name in &field.names {
                self.declare_ident(name, SymbolKind::Type, false);
            }
        }
        for field in &params.fields {
            self.visit_expr(&field.ty);
        }
    }

    fn visit_func_decl(&mut self, func: &FuncDecl) {
        let parent_scope = self.enter_scope(ScopeKind::Function, Some(func.span));

        if let Some(recv) = &func.recv {
            for field in &recv.fields {
                self.visit_receiver_type(&field.ty);
            }
        }
        if let Some(params) = &func.type_params {
            self.declare_type_params(params);
        }
        if let Some(recv) = &func.recv {
            self.declare_params(recv);
        }
        self.visit_signature(&func.ty);

        if let Some(body) = &func.body {
            self.visit_stmts(&body.stmts);
        }

        self.current_scope = parent_scope;
    }

    /// The receiver's type arguments, as in `func (l *List[T])`, declare
    /// type parameters for the method.
    fn visit_receiver_type(&mut self, ty: &Expr) {
        match ty.unparen() {
            Expr::Star { operand, .. } => self.visit_receiver_type(operand),
            Expr::Generic { base, args, .. } => {
                self.visit_expr(base);
                for arg in args {
                    match arg {
                        Expr::Ident(ident) => {
                            self.declare_ident(ident, SymbolKind::Type, false);
                        }
                        other => self.visit_expr(other),
                    }
                }
            }
            Expr::Index { base, index, .. } => {
                self.visit_expr(base);
                match index.as_ref() {
                    Expr::Ident(ident) => {
                        self.declare_ident(ident, SymbolKind::Type, false);
                    }
                    other => self.visit_expr(other),
                }
            }
            other => self.visit_expr(other),
        }
    }

    /// Resolves parameter and result types, then declares their names in the
    /// current scope.
    fn visit_signature(&mut self, ty: &FuncType) {
        self.visit_func_type(ty);
        self.declare_params(&ty.params);
        if let Some(results) = &ty.results {
            self.declare_params(results);
        }
    }

    fn visit_func_type(&mut self, ty: &FuncType) {
        let fields = ty
            .params
            .fields
            .iter()
            .chain(ty.results.iter().flat_map(|results| &results.fields));
        for field in fields {
            self.visit_expr(&field.ty);
        }
    }

    fn declare_params(&mut self, params: &FieldList) {
        for field in &params.fields {
            let hint = self.named_type(&field.ty);
            for name in &field.names {
                let id = self.declare_ident(name, SymbolKind::Param, false);
                self.symbol_table.set_type_hint(id, hint);
            }
        }
    }

    fn visit_block(&mut self, block: &Block) {
        let parent_scope = self.enter_scope(ScopeKind::Block, Some(block.span));
        self.visit_stmts(&block.stmts);
        self.current_scope = parent_scope;
    }

    fn visit_stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.visit_stmt(stmt);
        }
    }

    fn visit_opt_stmt(&mut self, stmt: Option<&Stmt>) {
        if let Some(stmt) = stmt {
            self.visit_stmt(stmt);
        }
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Decl(gen_decl) => self.visit_gen_decl(gen_decl, false),
            Stmt::Empty | Stmt::Branch { .. } => {}
            Stmt::Labeled { stmt, .. } => self.visit_opt_stmt(stmt.as_deref()),
            Stmt::Expr(expr) | Stmt::IncDec(expr) | Stmt::Go(expr) | Stmt::Defer(expr) => {
                self.visit_expr(expr);
            }
            Stmt::Send { chan, value } => {
                self.visit_expr(chan);
                self.visit_expr(value);
            }
            Stmt::Assign { lhs, rhs, define } => {
                for expr in rhs {
                    self.visit_expr(expr);
                }
                if *define {
                    self.declare_short_vars(lhs, rhs);
                } else {
                    for expr in lhs {
                        self.visit_expr(expr);
                    }
                }
            }
            Stmt::Return(results) => {
                for expr in results {
                    self.visit_expr(expr);
                }
            }
            Stmt::Block(block) => self.visit_block(block),
            Stmt::If {
                init,
                cond,
                then,
                els,
            } => {
                let parent_scope = self.enter_scope(ScopeKind::If, None);
                self.visit_opt_stmt(init.as_deref());
                self.visit_expr(cond);
                self.visit_block(then);
                self.visit_opt_stmt(els.as_deref());
                self.current_scope = parent_scope;
            }
            Stmt::Switch { init, tag, clauses } => {
                let parent_scope = self.enter_scope(ScopeKind::Switch, None);
                self.visit_opt_stmt(init.as_deref());
                if let Some(tag) = tag {
                    self.visit_expr(tag);
                }
                for clause in clauses {
                    let switch_scope = self.enter_scope(ScopeKind::Case, Some(clause.span));
                    for expr in &clause.list {
                        self.visit_expr(expr);
                    }
                    self.visit_stmts(&clause.body);
                    self.current_scope = switch_scope;
                }
                self.current_scope = parent_scope;
            }
            Stmt::TypeSwitch {
                init,
                bind,
                subject,
                clauses,
            } => {
                let parent_scope = self.enter_scope(ScopeKind::Switch, None);
                self.visit_opt_stmt(init.as_deref());
                self.visit_expr(subject);
                for clause in clauses {
                    let switch_scope = self.enter_scope(ScopeKind::Case, Some(clause.span));
                    for expr in &clause.list {
                        self.visit_expr(expr);
                    }
                    // The bound name takes the clause's type when it lists one.
                    if let Some(bind) = bind.as_ref().filter(|bind| !bind.is_blank()) {
                        let hint = match clause.list.as_slice() {
                            [single] => self.named_type(single),
                            _ => None,
                        };
                        let id = self.declare_ident(bind, SymbolKind::Var, false);
                        self.symbol_table.set_type_hint(id, hint);
                    }
                    self.visit_stmts(&clause.body);
                    self.current_scope = switch_scope;
                }
                self.current_scope = parent_scope;
            }
            Stmt::Select { clauses } => {
                for clause in clauses {
                    let parent_scope = self.enter_scope(ScopeKind::Select, Some(clause.span));
                    self.visit_opt_stmt(clause.comm.as_deref());
                    self.visit_stmts(&clause.body);
                    self.current_scope = parent_scope;
                }
            }
            Stmt::For {
                init,
                cond,
                post,
                body,
            } => {
                let parent_scope = self.enter_scope(ScopeKind::For, None);
                self.visit_opt_stmt(init.as_deref());
                if let Some(cond) = cond {
                    self.visit_expr(cond);
                }
                self.visit_opt_stmt(post.as_deref());
                self.visit_block(body);
                self.current_scope = parent_scope;
            }
            Stmt::Range {
                key,
                value,
                define,
                expr,
                body,
            } => {
                let parent_scope = self.enter_scope(ScopeKind::For, None);
                self.visit_expr(expr);
                for target in [key, value].into_iter().flatten() {
                    match (define, target) {
                        (true, Expr::Ident(ident)) => {
                            if !ident.is_blank() {
                                self.declare_ident(ident, SymbolKind::Var, false);
                            }
                        }
                        _ => self.visit_expr(target),
                    }
                }
                self.visit_block(body);
                self.current_scope = parent_scope;
            }
        }
    }

    /// `a, b := ...` declares the names that are new in the current scope
    /// and assigns to the others.
    fn declare_short_vars(&mut self, lhs: &[Expr], rhs: &[Expr]) {
        let one_to_one = lhs.len() == rhs.len();

        for (i, target) in lhs.iter().enumerate() {
            let Expr::Ident(ident) = target else {
                self.visit_expr(target);
                continue;
            };
            if ident.is_blank() {
                continue;
            }

            if let Some(existing) = self
                .symbol_table
                .lookup_local(&ident.name, self.current_scope)
            {
                self.record_use(existing, ident.span);
                continue;
            }

            let hint = if one_to_one {
                rhs.get(i).and_then(|value| self.type_of_expr(value))
            } else {
                rhs.first().and_then(|value| self.type_of_expr(value)).filter(|_| i == 0)
            };
            let id = self.declare_ident(ident, SymbolKind::Var, false);
            self.symbol_table.set_type_hint(id, hint);
        }
    }

    fn visit_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Ident(ident) => {
                self.visit_ident_reference(ident, false);
            }
            Expr::BasicLit { .. } | Expr::Bad { .. } => {}
            Expr::CompositeLit { ty, elts, .. } => {
                if let Some(ty) = ty {
                    self.visit_expr(ty);
                }
                self.visit_composite_elts(ty.as_deref(), elts);
            }
            Expr::FuncLit { ty, body, span } => {
                let parent_scope = self.enter_scope(ScopeKind::Function, Some(*span));
                self.visit_signature(ty);
                self.visit_stmts(&body.stmts);
                self.current_scope = parent_scope;
            }
            Expr::Paren { inner, .. } => self.visit_expr(inner),
            Expr::Selector { base, sel, .. } => self.visit_selector(base, sel),
            Expr::Index { base, index, .. } => {
                self.visit_expr(base);
                self.visit_expr(index);
            }
            Expr::Slice {
                base,
                low,
                high,
                max,
                ..
            } => {
                self.visit_expr(base);
                for bound in [low, high, max].into_iter().flatten() {
                    self.visit_expr(bound);
                }
            }
            Expr::TypeAssert { operand, ty, .. } => {
                self.visit_expr(operand);
                if let Some(ty) = ty {
                    self.visit_expr(ty);
                }
            }
            Expr::Call { fun, args, .. } => {
                self.visit_expr(fun);
                for arg in args {
                    self.visit_expr(arg);
                }
            }
            Expr::Star { operand, .. } | Expr::Unary { operand, .. } => self.visit_expr(operand),
            Expr::Binary { left, right, .. } => {
                self.visit_expr(left);
                self.visit_expr(right);
            }
            Expr::KeyValue { key, value, .. } => {
                self.visit_expr(key);
                self.visit_expr(value);
            }
            Expr::ArrayType { len, elem, .. } => {
                if let Some(len) = len {
                    self.visit_expr(len);
                }
                self.visit_expr(elem);
            }
            Expr::StructType { fields, .. } => {
                for field in &fields.fields {
                    self.visit_expr(&field.ty);
                }
            }
            Expr::FuncType(func_type) => self.visit_func_type(func_type),
            Expr::InterfaceType { elems, .. } => {
                for elem in elems {
                    match elem {
                        InterfaceElem::Method { ty, .. } => self.visit_func_type(ty),
                        InterfaceElem::Embedded(embedded) => self.visit_expr(embedded),
                    }
                }
            }
            Expr::MapType { key, value, .. } => {
                self.visit_expr(key);
                self.visit_expr(value);
            }
            Expr::ChanType { value, .. } => self.visit_expr(value),
            Expr::Ellipsis { elem, .. } => {
                if let Some(elem) = elem {
                    self.visit_expr(elem);
                }
            }
            Expr::Generic { base, args, .. } => {
                self.visit_expr(base);
                for arg in args {
                    self.visit_expr(arg);
                }
            }
        }
    }

    /// Bare identifier keys of a struct literal name fields, which are not in
    /// scope; keys of map, slice and array literals are expressions.
    fn visit_composite_elts(&mut self, lit_type: Option<&Expr>, elts: &[Expr]) {
        let lit_type = lit_type.map(Expr::unparen);
        let (key_type, elem_type) = match lit_type {
            Some(Expr::MapType { key, value, .. }) => (Some(key.as_ref()), Some(value.as_ref())),
            Some(Expr::ArrayType { elem, .. }) => (None, Some(elem.as_ref())),
            _ => (None, None),
        };
        let shape = match lit_type {
            Some(Expr::MapType { .. } | Expr::ArrayType { .. }) => Some(TypeShape::Keyed),
            Some(Expr::StructType { .. }) => Some(TypeShape::Struct),
            Some(Expr::Ident(ident)) => self
                .symbol_table
                .lookup(&ident.name, self.current_scope, &self.scope_tree)
                .and_then(|id| self.type_shapes.get(&id).copied()),
            Some(Expr::Generic { base, .. }) => base
                .as_ident()
                .and_then(|ident| {
                    self.symbol_table
                        .lookup(&ident.name, self.current_scope, &self.scope_tree)
                })
                .and_then(|id| self.type_shapes.get(&id).copied()),
            Some(Expr::Selector { .. }) => Some(TypeShape::Struct),
            _ => None,
        };

        for elt in elts {
            match elt {
                Expr::KeyValue { key, value, .. } => {
                    match (key.as_ref(), shape) {
                        (Expr::Ident(_), Some(TypeShape::Struct)) => {}
                        (Expr::Ident(ident), None | Some(TypeShape::Other)) => {
                            self.visit_ident_if_bound(ident);
                        }
                        (key, _) => self.visit_element(key, key_type),
                    }
                    self.visit_element(value, elem_type);
                }
                other => self.visit_element(other, elem_type),
            }
        }
    }

    fn visit_element(&mut self, elt: &Expr, elided_type: Option<&Expr>) {
        match elt {
            Expr::CompositeLit { ty: None, elts, .. } => self.visit_composite_elts(elided_type, elts),
            Expr::Unary { op, operand, .. } if op == "&" => self.visit_element(operand, elided_type),
            other => self.visit_expr(other),
        }
    }

    fn visit_selector(&mut self, base: &Expr, sel: &Ident) {
        let base_symbol = match base.unparen() {
            Expr::Ident(ident) => {
                let Some(id) = self.visit_ident_reference(ident, true) else {
                    return;
                };
                if self.symbol_table.get(id).kind == SymbolKind::Import {
                    return;
                }
                Some(id)
            }
            other => {
                self.visit_expr(other);
                None
            }
        };

        let receiver = match base_symbol {
            Some(id) => self.type_of_symbol(id),
            None => self.type_of_expr(base),
        };

        if let Some(method) = receiver.and_then(|r| self.symbol_table.lookup_method(r, &sel.name)) {
            self.record_use(method, sel.span);
            return;
        }

        match self.symbol_table.methods_named(&sel.name) {
            [] => {}
            [only] => {
                let only = *only;
                self.record_use(only, sel.span);
            }
            several => {
                let several = several.to_vec();
                for &id in &several {
                    self.symbol_table.add_reference(id, sel.span);
                }
                self.candidates.insert(sel.span, several);
            }
        }
    }

    fn visit_ident_reference(&mut self, ident: &Ident, is_qualifier: bool) -> Option<SymbolId> {
        if ident.is_blank() || self.defs.contains_key(&ident.span) {
            return None;
        }

        let current_scope = self.current_scope;
        match self
            .symbol_table
            .lookup(&ident.name, current_scope, &self.scope_tree)
        {
            Some(symbol_id) => {
                self.record_use(symbol_id, ident.span);
                Some(symbol_id)
            }
            None => {
                self.unresolved_references.push(UnresolvedReference {
                    name: ident.name.clone(),
                    span: ident.span,
                    scope: current_scope,
                    is_qualifier,
                });
                None
            }
        }
    }

    fn visit_ident_if_bound(&mut self, ident: &Ident) {
        if let Some(id) = self
            .symbol_table
            .lookup(&ident.name, self.current_scope, &self.scope_tree)
            .filter(|&id| self.symbol_table.get(id).kind != SymbolKind::Import)
        {
            self.record_use(id, ident.span);
        }
    }

    fn record_use(&mut self, symbol_id: SymbolId, span: Span) {
        self.symbol_table.add_reference(symbol_id, span);
        self.uses.insert(span, symbol_id);
    }

    /// Named type a type expression refers to, seen from the current scope.
    fn named_type(&self, ty: &Expr) -> Option<SymbolId> {
        match ty.unparen() {
            Expr::Star { operand, .. } => self.named_type(operand),
            Expr::Generic { base, .. } | Expr::Index { base, .. } => self.named_type(base),
            Expr::Ident(ident) => self
                .symbol_table
                .lookup(&ident.name, self.current_scope, &self.scope_tree)
                .filter(|&id| {
                    let symbol = self.symbol_table.get(id);
                    symbol.kind == SymbolKind::Type && symbol.is_package_level
                }),
            _ => None,
        }
    }

    fn type_of_symbol(&self, id: SymbolId) -> Option<SymbolId> {
        let symbol = self.symbol_table.get(id);
        match symbol.kind {
            SymbolKind::Type => Some(id),
            _ => symbol.type_hint,
        }
    }

    /// Best-effort named type of an already resolved value expression.
    fn type_of_expr(&self, expr: &Expr) -> Option<SymbolId> {
        match expr.unparen() {
            Expr::Ident(ident) => self
                .uses
                .get(&ident.span)
                .and_then(|&id| self.type_of_symbol(id)),
            Expr::CompositeLit { ty: Some(ty), .. } => self.named_type(ty),
            Expr::Unary { op, operand, .. } if op == "&" || op == "*" => self.type_of_expr(operand),
            Expr::Star { operand, .. } => self.type_of_expr(operand),
            Expr::Call { fun, args, .. } => match fun.unparen() {
                Expr::Ident(ident) => {
                    let id = *self.uses.get(&ident.span)?;
                    let symbol = self.symbol_table.get(id);
                    match symbol.kind {
                        SymbolKind::Builtin if symbol.name == "new" => {
                            args.first().and_then(|arg| self.named_type(arg))
                        }
                        _ => self.type_of_symbol(id),
                    }
                }
                Expr::Selector { sel, .. } => self
                    .uses
                    .get(&sel.span)
                    .and_then(|&id| self.symbol_table.get(id).type_hint),
                Expr::Generic { base, .. } | Expr::Index { base, .. } => base
                    .as_ident()
                    .and_then(|ident| self.uses.get(&ident.span))
                    .and_then(|&id| self.type_of_symbol(id)),
                other => self.named_type(other),
            },
            _ => None,
        }
    }
}

fn value_kind(kind: GenKind) -> SymbolKind {
    match kind {
        GenKind::Const => SymbolKind::Const,
        _ => SymbolKind::Var,
    }
}

fn shape_of(ty: &Expr) -> TypeShape {
    match ty.unparen() {
        Expr::StructType { .. } => TypeShape::Struct,
        Expr::MapType { .. } | Expr::ArrayType { .. } => TypeShape::Keyed,
        _ => TypeShape::Other,
    }
}

/// Base type name of a method receiver: `T`, `*T`, `T[K]`, `*T[K, V]`.
fn receiver_base(ty: &Expr) -> Option<&Ident> {
    match ty.unparen() {
        Expr::Ident(ident) => Some(ident),
        Expr::Star { operand, .. } | Expr::Unary { operand, .. } => receiver_base(operand),
        Expr::Generic { base, .. } | Expr::Index { base, .. } => receiver_base(base),
        _ => None,
    }
}
