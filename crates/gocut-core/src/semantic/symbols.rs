//! Symbol table for tracking declarations and references
//!
//! This module provides a symbol table that stores every resolved entity of
//! a compilation unit with its scope, supports lookup with scope chain
//! traversal, and keeps the method sets of named types.

use std::collections::HashMap;

use id_arena::{Arena, Id};

use crate::ast::Span;

use super::scope::{ScopeId, ScopeTree};

pub type SymbolId = Id<Symbol>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Func,
    Method,
    Type,
    Var,
    Const,
    Param,
    Import,
    Builtin,
}

#[derive(Debug)]
pub struct Symbol {
    pub id: SymbolId,
    pub name: String,
    pub kind: SymbolKind,
    pub scope: ScopeId,
    /// Span of the defining identifier; `None` for universe builtins and
    /// implicitly named imports.
    pub span: Option<Span>,
    /// Declared at package level (functions, methods, types, variables and
    /// constants of the unit).
    pub is_package_level: bool,
    /// Named type of the value, or the result type of a function, when it
    /// can be read off the declaration.
    pub type_hint: Option<SymbolId>,
    pub references: Vec<Span>,
}

#[derive(Debug, Clone)]
pub struct UnresolvedReference {
    pub name: String,
    pub span: Span,
    pub scope: ScopeId,
    /// Used as the qualifier of a selector, `name.Member`.
    pub is_qualifier: bool,
}

pub struct SymbolTable {
    arena: Arena<Symbol>,
    by_scope: HashMap<ScopeId, HashMap<String, SymbolId>>,
    methods: HashMap<SymbolId, HashMap<String, SymbolId>>,
    methods_by_name: HashMap<String, Vec<SymbolId>>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            by_scope: HashMap::new(),
            methods: HashMap::new(),
            methods_by_name: HashMap::new(),
        }
    }

    fn alloc(
        &mut self,
        name: &str,
        kind: SymbolKind,
        scope: ScopeId,
        span: Option<Span>,
        is_package_level: bool,
    ) -> SymbolId {
        self.arena.alloc_with_id(|id| Symbol {
            id,
            name: name.to_string(),
            kind,
            scope,
            span,
            is_package_level,
            type_hint: None,
            references: Vec::new(),
        })
    }

    /// Declares `name` in `scope`, shadowing any binding of an outer scope.
    pub fn declare(
        &mut self,
        name: &str,
        kind: SymbolKind,
        scope: ScopeId,
        span: Option<Span>,
        is_package_level: bool,
    ) -> SymbolId {
        let id = self.alloc(name, kind, scope, span, is_package_level);

        self.by_scope
            .entry(scope)
            .or_default()
            .insert(name.to_string(), id);

        id
    }

    /// Creates a symbol that is not visible by name, such as `init`
    /// functions.
    pub fn declare_hidden(
        &mut self,
        name: &str,
        kind: SymbolKind,
        scope: ScopeId,
        span: Option<Span>,
        is_package_level: bool,
    ) -> SymbolId {
        self.alloc(name, kind, scope, span, is_package_level)
    }

    /// Declares a method. Methods live in the method set of their receiver's
    /// base type, never in a scope.
    pub fn declare_method(
        &mut self,
        receiver: Option<SymbolId>,
        name: &str,
        scope: ScopeId,
        span: Option<Span>,
    ) -> SymbolId {
        let id = self.alloc(name, SymbolKind::Method, scope, span, true);

        if let Some(receiver) = receiver {
            self.methods
                .entry(receiver)
                .or_default()
                .insert(name.to_string(), id);
        }
        self.methods_by_name
            .entry(name.to_string())
            .or_default()
            .push(id);

        id
    }

    pub fn lookup(&self, name: &str, scope: ScopeId, scope_tree: &ScopeTree) -> Option<SymbolId> {
        if let Some(scope_symbols) = self.by_scope.get(&scope) {
            if let Some(&id) = scope_symbols.get(name) {
                return Some(id);
            }
        }

        if let Some(parent) = scope_tree.get(scope).parent {
            return self.lookup(name, parent, scope_tree);
        }

        None
    }

    pub fn lookup_local(&self, name: &str, scope: ScopeId) -> Option<SymbolId> {
        self.by_scope
            .get(&scope)
            .and_then(|symbols| symbols.get(name))
            .copied()
    }

    pub fn lookup_method(&self, receiver: SymbolId, name: &str) -> Option<SymbolId> {
        self.methods
            .get(&receiver)
            .and_then(|methods| methods.get(name))
            .copied()
    }

    /// Every method called `name`, across all receiver types.
    pub fn methods_named(&self, name: &str) -> &[SymbolId] {
        self.methods_by_name
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.arena[id]
    }

    pub fn get_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.arena[id]
    }

    pub fn add_reference(&mut self, symbol_id: SymbolId, reference_span: Span) {
        self.arena[symbol_id].references.push(reference_span);
    }

    pub fn set_type_hint(&mut self, symbol_id: SymbolId, hint: Option<SymbolId>) {
        if hint.is_some() {
            self.arena[symbol_id].type_hint = hint;
        }
    }

    pub fn symbols_in_scope(&self, scope: ScopeId) -> impl Iterator<Item = &Symbol> {
        self.by_scope
            .get(&scope)
            .into_iter()
            .flat_map(|symbols| symbols.values().map(|&id| &self.arena[id]))
    }

    pub fn all_symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.arena.iter().map(|(_, s)| s)
    }
}
