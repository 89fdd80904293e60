//! Scope analysis for Go bindings and references
//!
//! This module provides a scope tree data structure for representing the
//! nested scopes of a Go compilation unit: the universe, the package, one
//! scope per file (holding imports), and function and block scopes below.

use id_arena::{Arena, Id};

use crate::ast::Span;

pub type ScopeId = Id<Scope>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Universe,
    Package,
    File,
    Function,
    Block,
    If,
    For,
    Switch,
    Case,
    Select,
    TypeParams,
}

#[derive(Debug)]
pub struct Scope {
    pub id: ScopeId,
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    pub span: Option<Span>,
}

pub struct ScopeTree {
    arena: Arena<Scope>,
    root: Option<ScopeId>,
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTree {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
        }
    }

    pub fn create_scope(
        &mut self,
        kind: ScopeKind,
        parent: Option<ScopeId>,
        span: Option<Span>,
    ) -> ScopeId {
        let id = self.arena.alloc_with_id(|id| Scope {
            id,
            kind,
            parent,
            children: Vec::new(),
            span,
        });

        if let Some(parent_id) = parent {
            self.arena[parent_id].children.push(id);
        }

        if self.root.is_none() {
            self.root = Some(id);
        }

        id
    }

    pub fn root(&self) -> Option<ScopeId> {
        self.root
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.arena[id]
    }

    pub fn parent(&self, id: ScopeId) -> Option<&Scope> {
        self.arena[id].parent.map(|p| &self.arena[p])
    }

    pub fn children(&self, id: ScopeId) -> impl Iterator<Item = &Scope> {
        self.arena[id].children.iter().map(|&c| &self.arena[c])
    }

    pub fn ancestors(&self, id: ScopeId) -> AncestorIter<'_> {
        AncestorIter {
            tree: self,
            current: Some(id),
        }
    }

    pub fn is_descendant_of(&self, scope: ScopeId, ancestor: ScopeId) -> bool {
        self.ancestors(scope).any(|s| s.id == ancestor)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.len() == 0
    }
}

pub struct AncestorIter<'a> {
    tree: &'a ScopeTree,
    current: Option<ScopeId>,
}

impl<'a> Iterator for AncestorIter<'a> {
    type Item = &'a Scope;

    fn next(&mut self) -> Option<Self::Item> {
        let current_id = self.current?;
        let scope = &self.tree.arena[current_id];
        self.current = scope.parent;
        Some(scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::FileId;

    fn span_at(lo: u32, hi: u32) -> Option<Span> {
        Some(Span::new(FileId(0), lo, hi))
    }

    #[test]
    fn creates_universe_scope() {
        let mut tree = ScopeTree::new();
        let universe = tree.create_scope(ScopeKind::Universe, None, None);

        assert_eq!(tree.root(), Some(universe));

        let scope = tree.get(universe);
        assert_eq!(scope.kind, ScopeKind::Universe);
        assert!(scope.parent.is_none());
        assert!(scope.children.is_empty());
    }

    #[test]
    fn file_scopes_hang_off_the_package() {
        let mut tree = ScopeTree::new();
        let universe = tree.create_scope(ScopeKind::Universe, None, None);
        let package = tree.create_scope(ScopeKind::Package, Some(universe), None);
        let a = tree.create_scope(ScopeKind::File, Some(package), span_at(0, 100));
        let b = tree.create_scope(ScopeKind::File, Some(package), span_at(0, 50));

        assert_eq!(tree.get(package).children, vec![a, b]);
        assert_eq!(tree.get(a).parent, Some(package));
        assert!(!tree.is_descendant_of(a, b));
    }

    #[test]
    fn nested_scopes_have_correct_parent() {
        let mut tree = ScopeTree::new();

        let universe = tree.create_scope(ScopeKind::Universe, None, None);
        let package = tree.create_scope(ScopeKind::Package, Some(universe), None);
        let file = tree.create_scope(ScopeKind::File, Some(package), span_at(0, 100));
        let func = tree.create_scope(ScopeKind::Function, Some(file), span_at(10, 90));
        let block = tree.create_scope(ScopeKind::Block, Some(func), span_at(20, 80));

        assert_eq!(tree.get(block).parent, Some(func));
        assert_eq!(tree.get(func).parent, Some(file));
        assert_eq!(tree.get(file).parent, Some(package));
        assert_eq!(tree.get(package).parent, Some(universe));
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn ancestors_iterator_traverses_parent_chain() {
        let mut tree = ScopeTree::new();
        let universe = tree.create_scope(ScopeKind::Universe, None, None);
        let package = tree.create_scope(ScopeKind::Package, Some(universe), None);
        let func = tree.create_scope(ScopeKind::Function, Some(package), None);
        let block = tree.create_scope(ScopeKind::Block, Some(func), None);

        let ancestors: Vec<ScopeKind> = tree.ancestors(block).map(|s| s.kind).collect();

        assert_eq!(
            ancestors,
            vec![
                ScopeKind::Block,
                ScopeKind::Function,
                ScopeKind::Package,
                ScopeKind::Universe
            ]
        );
    }

    #[test]
    fn parent_and_children() {
        let mut tree = ScopeTree::new();
        let universe = tree.create_scope(ScopeKind::Universe, None, None);
        let package = tree.create_scope(ScopeKind::Package, Some(universe), None);

        assert_eq!(tree.parent(package).map(|s| s.kind), Some(ScopeKind::Universe));
        assert!(tree.parent(universe).is_none());

        let kinds: Vec<ScopeKind> = tree.children(universe).map(|s| s.kind).collect();
        assert_eq!(kinds, vec![ScopeKind::Package]);
    }

    #[test]
    fn is_descendant_of_checks_ancestry() {
        let mut tree = ScopeTree::new();
        let universe = tree.create_scope(ScopeKind::Universe, None, None);
        let func = tree.create_scope(ScopeKind::Function, Some(universe), None);
        let block = tree.create_scope(ScopeKind::Block, Some(func), None);

        assert!(tree.is_descendant_of(block, block));
        assert!(tree.is_descendant_of(block, func));
        assert!(tree.is_descendant_of(block, universe));
        assert!(!tree.is_descendant_of(universe, func));
        assert!(!tree.is_descendant_of(func, block));
    }
}
