//! AstVisitor trait for uniform AST traversal.

use std::ops::ControlFlow;

use crate::ast::{Expr, FuncDecl, GenDecl, Ident, Stmt};

use super::context::VisitorContext;

pub trait AstVisitor {
    fn visit_func_decl(&mut self, _node: &FuncDecl, _ctx: &VisitorContext) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    fn visit_gen_decl(&mut self, _node: &GenDecl, _ctx: &VisitorContext) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    fn visit_stmt(&mut self, _node: &Stmt, _ctx: &VisitorContext) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    fn visit_expr(&mut self, _node: &Expr, _ctx: &VisitorContext) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    fn visit_ident(&mut self, _node: &Ident, _ctx: &VisitorContext) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}
