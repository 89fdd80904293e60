//! Visitor pattern for AST traversal.
//!
//! Provides a uniform way to traverse AST nodes with context information.

mod context;
mod traits;

pub use context::VisitorContext;
pub use traits::AstVisitor;

use std::ops::ControlFlow;

use crate::ast::{
    Block, Decl, Expr, Field, FieldList, FuncDecl, FuncType, GenDecl, Ident, InterfaceElem, Spec,
    Stmt,
};

/// Walks one declaration, calling the visitor for every node and identifier
/// until it breaks.
pub fn walk_decl<V: AstVisitor>(decl: &Decl, visitor: &mut V, ctx: &VisitorContext) {
    let mut walker = Walker {
        visitor,
        ctx,
        stopped: false,
    };
    walker.walk_decl(decl);
}

pub fn walk_block<V: AstVisitor>(block: &Block, visitor: &mut V, ctx: &VisitorContext) {
    let mut walker = Walker {
        visitor,
        ctx,
        stopped: false,
    };
    walker.walk_stmts(&block.stmts);
}

pub fn walk_expr<V: AstVisitor>(expr: &Expr, visitor: &mut V, ctx: &VisitorContext) {
    let mut walker = Walker {
        visitor,
        ctx,
        stopped: false,
    };
    walker.walk_expr(expr);
}

struct Walker<'a, 'c, V: AstVisitor> {
    visitor: &'a mut V,
    ctx: &'a VisitorContext<'c>,
    stopped: bool,
}

impl<V: AstVisitor> Walker<'_, '_, V> {
    fn walk_decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Func(func) => self.walk_func_decl(func),
            Decl::Gen(gen_decl) => self.walk_gen_decl(gen_decl),
        }
    }

    fn walk_func_decl(&mut self, node: &FuncDecl) {
        if self.stopped {
            return;
        }
        if let ControlFlow::Break(()) = self.visitor.visit_func_decl(node, self.ctx) {
            self.stopped = true;
            return;
        }
        if let Some(recv) = &node.recv {
            self.walk_fields(recv);
        }
        self.walk_ident(&node.name);
        if let Some(params) = &node.type_params {
            self.walk_fields(params);
        }
        self.walk_func_type(&node.ty);
        if let Some(body) = &node.body {
            self.walk_stmts(&body.stmts);
        }
    }

    fn walk_gen_decl(&mut self, node: &GenDecl) {
        if self.stopped {
            return;
        }
        if let ControlFlow::Break(()) = self.visitor.visit_gen_decl(node, self.ctx) {
            self.stopped = true;
            return;
        }
        for spec in &node.specs {
            match spec {
                Spec::Type(type_spec) => {
                    self.walk_ident(&type_spec.name);
                    if let Some(params) = &type_spec.type_params {
                        self.walk_fields(params);
                    }
                    self.walk_expr(&type_spec.ty);
                }
                Spec::Value(value_spec) => {
                    for name in &value_spec.names {
                        self.walk_ident(name);
                    }
                    if let Some(ty) = &value_spec.ty {
                        self.walk_expr(ty);
                    }
                    for value in &value_spec.values {
                        self.walk_expr(value);
                    }
                }
            }
        }
    }

    fn walk_fields(&mut self, list: &FieldList) {
        for Field { names, ty, .. } in &list.fields {
            for name in names {
                self.walk_ident(name);
            }
            self.walk_expr(ty);
        }
    }

    fn walk_func_type(&mut self, ty: &FuncType) {
        self.walk_fields(&ty.params);
        if let Some(results) = &ty.results {
            self.walk_fields(results);
        }
    }

    fn walk_ident(&mut self, node: &Ident) {
        if self.stopped {
            return;
        }
        if let ControlFlow::Break(()) = self.visitor.visit_ident(node, self.ctx) {
            self.stopped = true;
        }
    }

    fn walk_opt_expr(&mut self, expr: Option<&Expr>) {
        if let Some(expr) = expr {
            self.walk_expr(expr);
        }
    }

    fn walk_opt_stmt(&mut self, stmt: Option<&Stmt>) {
        if let Some(stmt) = stmt {
            self.walk_stmt(stmt);
        }
    }

    fn walk_stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.walk_stmt(stmt);
        }
    }

    fn walk_stmt(&mut self, node: &Stmt) {
        if self.stopped {
            return;
        }
        if let ControlFlow::Break(()) = self.visitor.visit_stmt(node, self.ctx) {
            self.stopped = true;
            return;
        }

        match node {
            Stmt::Decl(gen_decl) => self.walk_gen_decl(gen_decl),
            Stmt::Empty => {}
            Stmt::Labeled { label, stmt } => {
                self.walk_ident(label);
                self.walk_opt_stmt(stmt.as_deref());
            }
            Stmt::Expr(expr) | Stmt::IncDec(expr) | Stmt::Go(expr) | Stmt::Defer(expr) => {
                self.walk_expr(expr);
            }
            Stmt::Send { chan, value } => {
                self.walk_expr(chan);
                self.walk_expr(value);
            }
            Stmt::Assign { lhs, rhs, .. } => {
                for expr in lhs.iter().chain(rhs) {
                    self.walk_expr(expr);
                }
            }
            Stmt::Return(results) => {
                for expr in results {
                    self.walk_expr(expr);
                }
            }
            Stmt::Branch { label } => {
                if let Some(label) = label {
                    self.walk_ident(label);
                }
            }
            Stmt::Block(block) => self.walk_stmts(&block.stmts),
            Stmt::If {
                init,
                cond,
                then,
                els,
            } => {
                self.walk_opt_stmt(init.as_deref());
                self.walk_expr(cond);
                self.walk_stmts(&then.stmts);
                self.walk_opt_stmt(els.as_deref());
            }
            Stmt::Switch { init, tag, clauses } => {
                self.walk_opt_stmt(init.as_deref());
                self.walk_opt_expr(tag.as_ref());
                for clause in clauses {
                    for expr in &clause.list {
                        self.walk_expr(expr);
                    }
                    self.walk_stmts(&clause.body);
                }
            }
            Stmt::TypeSwitch {
                init,
                bind,
                subject,
                clauses,
            } => {
                self.walk_opt_stmt(init.as_deref());
                if let Some(bind) = bind {
                    self.walk_ident(bind);
                }
                self.walk_expr(subject);
                for clause in clauses {
                    for expr in &clause.list {
                        self.walk_expr(expr);
                    }
                    self.walk_stmts(&clause.body);
                }
            }
            Stmt::Select { clauses } => {
                for clause in clauses {
                    self.walk_opt_stmt(clause.comm.as_deref());
                    self.walk_stmts(&clause.body);
                }
            }
            Stmt::For {
                init,
                cond,
                post,
                body,
            } => {
                self.walk_opt_stmt(init.as_deref());
                self.walk_opt_expr(cond.as_ref());
                self.walk_opt_stmt(post.as_deref());
                self.walk_stmts(&body.stmts);
            }
            Stmt::Range {
                key,
                value,
                expr,
                body,
                ..
            } => {
                self.walk_opt_expr(key.as_ref());
                self.walk_opt_expr(value.as_ref());
                self.walk_expr(expr);
                self.walk_stmts(&body.stmts);
            }
        }
    }

    fn walk_expr(&mut self, node: &Expr) {
        if self.stopped {
            return;
        }
        if let ControlFlow::Break(()) = self.visitor.visit_expr(node, self.ctx) {
            self.stopped = true;
            return;
        }

        match node {
            Expr::Ident(ident) => self.walk_ident(ident),
            Expr::BasicLit { .. } | Expr::Bad { .. } => {}
            Expr::CompositeLit { ty, elts, .. } => {
                self.walk_opt_expr(ty.as_deref());
                for elt in elts {
                    self.walk_expr(elt);
                }
            }
            Expr::FuncLit { ty, body, .. } => {
                self.walk_func_type(ty);
                self.walk_stmts(&body.stmts);
            }
            Expr::Paren { inner, .. } => self.walk_expr(inner),
            Expr::Selector { base, sel, .. } => {
                self.walk_expr(base);
                self.walk_ident(sel);
            }
            Expr::Index { base, index, .. } => {
                self.walk_expr(base);
                self.walk_expr(index);
            }
            Expr::Slice {
                base,
                low,
                high,
                max,
                ..
            } => {
                self.walk_expr(base);
                for bound in [low, high, max].into_iter().flatten() {
                    self.walk_expr(bound);
                }
            }
            Expr::TypeAssert { operand, ty, .. } => {
                self.walk_expr(operand);
                self.walk_opt_expr(ty.as_deref());
            }
            Expr::Call { fun, args, .. } => {
                self.walk_expr(fun);
                for arg in args {
                    self.walk_expr(arg);
                }
            }
            Expr::Star { operand, .. } | Expr::Unary { operand, .. } => self.walk_expr(operand),
            Expr::Binary { left, right, .. } => {
                self.walk_expr(left);
                self.walk_expr(right);
            }
            Expr::KeyValue { key, value, .. } => {
                self.walk_expr(key);
                self.walk_expr(value);
            }
            Expr::ArrayType { len, elem, .. } => {
                self.walk_opt_expr(len.as_deref());
                self.walk_expr(elem);
            }
            Expr::StructType { fields, .. } => self.walk_fields(fields),
            Expr::FuncType(func_type) => self.walk_func_type(func_type),
            Expr::InterfaceType { elems, .. } => {
                for elem in elems {
                    match elem {
                        InterfaceElem::Method { name, ty } => {
                            self.walk_ident(name);
                            self.walk_func_type(ty);
                        }
                        InterfaceElem::Embedded(embedded) => self.walk_expr(embedded),
                    }
                }
            }
            Expr::MapType { key, value, .. } => {
                self.walk_expr(key);
                self.walk_expr(value);
            }
            Expr::ChanType { value, .. } => self.walk_expr(value),
            Expr::Ellipsis { elem, .. } => self.walk_opt_expr(elem.as_deref()),
            Expr::Generic { base, args, .. } => {
                self.walk_expr(base);
                for arg in args {
                    self.walk_expr(arg);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::FileId;
    use crate::parser::ParsedFile;

    #[derive(Default)]
    struct IdentCollector {
        names: Vec<String>,
        limit: Option<usize>,
    }

    impl AstVisitor for IdentCollector {
        fn visit_ident(&mut self, node: &Ident, _ctx: &VisitorContext) -> ControlFlow<()> {
            self.names.push(node.name.clone());
            if self.limit.is_some_and(|limit| self.names.len() >= limit) {
                return ControlFlow::Break(());
            }
            ControlFlow::Continue(())
        }
    }

    struct FuncLitCounter(usize);

    impl AstVisitor for FuncLitCounter {
        fn visit_expr(&mut self, node: &Expr, _ctx: &VisitorContext) -> ControlFlow<()> {
            if matches!(node, Expr::FuncLit { .. }) {
                self.0 += 1;
            }
            ControlFlow::Continue(())
        }
    }

    const CODE: &str = r#"package main

func run(n int) Result {
	for i := range n {
		go func() { work(i) }()
	}
	return Result{Count: total}
}
"#;

    #[test]
    fn collects_every_identifier_in_order() {
        let parsed = ParsedFile::from_source(FileId(0), "main.go", CODE);
        let ctx = VisitorContext::new(&parsed);
        let file = parsed.ast().expect("parse failed");

        let mut collector = IdentCollector::default();
        walk_decl(&file.decls[0], &mut collector, &ctx);

        assert_eq!(
            collector.names,
            vec!["run", "n", "int", "Result", "i", "n", "work", "i", "Result", "Count", "total"]
        );
    }

    #[test]
    fn break_stops_the_walk() {
        let parsed = ParsedFile::from_source(FileId(0), "main.go", CODE);
        let ctx = VisitorContext::new(&parsed);
        let file = parsed.ast().expect("parse failed");

        let mut collector = IdentCollector {
            limit: Some(2),
            ..Default::default()
        };
        walk_decl(&file.decls[0], &mut collector, &ctx);

        assert_eq!(collector.names, vec!["run", "n"]);
    }

    #[test]
    fn visits_nested_expressions() {
        let parsed = ParsedFile::from_source(FileId(0), "main.go", CODE);
        let ctx = VisitorContext::new(&parsed);
        let file = parsed.ast().expect("parse failed");

        let mut counter = FuncLitCounter(0);
        walk_decl(&file.decls[0], &mut counter, &ctx);

        assert_eq!(counter.0, 1);
    }
}
