//! Semantic analysis module
//!
//! Provides scope analysis, symbol tables, and identifier resolution for a
//! Go compilation unit.

pub mod scope;
pub mod symbols;
pub mod visitor;

pub use scope::{AncestorIter, Scope, ScopeId, ScopeKind, ScopeTree};
pub use symbols::{Symbol, SymbolId, SymbolKind, SymbolTable, UnresolvedReference};
pub use visitor::{ImportBinding, ScopeBuilder, SemanticModel};
