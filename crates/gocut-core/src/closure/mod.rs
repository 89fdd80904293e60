//! Reachability closure over the declarations of a compilation unit
//!
//! Starting from every identifier written in the entry file, the closure
//! follows resolved references through function bodies, struct field types
//! and value initializers until no new symbol turns up. Traversal state lives
//! in a [`Walk`] with an explicit worklist; a symbol is marked visited before
//! its declaration is expanded, so reference cycles terminate.
//!
//! Two boundaries are deliberate: interface method sets are never expanded,
//! and function literals inside package-level initializers are not inspected.

mod index;
mod type_walker;
mod value_walker;

pub use index::{DeclIndex, DeclRef, decl_refs};

use std::collections::{BTreeSet, HashSet};
use std::ops::ControlFlow;

use tracing::{debug, instrument, trace};

use crate::ast::{Decl, Expr, FuncDecl, Ident, Spec};
use crate::loader::Package;
use crate::parser::ParsedFile;
use crate::semantic::{SemanticModel, SymbolId};
use crate::visitor::{AstVisitor, VisitorContext, walk_block, walk_decl};

/// Result of one closure computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Closure {
    /// Names of the reachable package-level symbols.
    pub used: BTreeSet<String>,
    /// Retained declarations in source order.
    pub retained: Vec<DeclRef>,
    /// Number of distinct symbols visited, including locals and builtins.
    pub visited: usize,
}

impl Closure {
    pub fn contains(&self, name: &str) -> bool {
        self.used.contains(name)
    }
}

pub struct ClosureBuilder<'a> {
    package: &'a Package,
    model: &'a SemanticModel,
    index: DeclIndex,
}

impl<'a> ClosureBuilder<'a> {
    pub fn new(package: &'a Package, model: &'a SemanticModel) -> Self {
        Self {
            package,
            model,
            index: DeclIndex::build(package, model),
        }
    }

    pub fn index(&self) -> &DeclIndex {
        &self.index
    }

    #[instrument(skip(self), fields(package = %self.package.name))]
    pub fn build(&self) -> Closure {
        let mut walk = Walk::new(self.package, self.model, &self.index);
        walk.seed();
        walk.run();

        let closure = walk.finish();
        debug!(
            used = closure.used.len(),
            retained = closure.retained.len(),
            visited = closure.visited,
            "closure complete"
        );
        closure
    }
}

/// Traversal state of one closure computation.
pub(crate) struct Walk<'a> {
    package: &'a Package,
    model: &'a SemanticModel,
    index: &'a DeclIndex,
    visited: HashSet<SymbolId>,
    worklist: Vec<SymbolId>,
    used: BTreeSet<String>,
    retained: BTreeSet<DeclRef>,
}

impl<'a> Walk<'a> {
    fn new(package: &'a Package, model: &'a SemanticModel, index: &'a DeclIndex) -> Self {
        Self {
            package,
            model,
            index,
            visited: HashSet::new(),
            worklist: Vec::new(),
            used: BTreeSet::new(),
            retained: BTreeSet::new(),
        }
    }

    /// Retains every declaration of the entry file and discovers every
    /// identifier written in it, definitions included.
    fn seed(&mut self) {
        let package = self.package;
        let Some(entry) = package.entry_file() else {
            return;
        };
        let Some(file) = entry.ast() else {
            return;
        };
        let ctx = VisitorContext::new(entry);

        for (index, decl) in file.decls.iter().enumerate() {
            self.retained.extend(decl_refs(entry.id(), index, decl));
            walk_decl(decl, &mut IdentScan { walk: self }, &ctx);
        }
    }

    fn run(&mut self) {
        while let Some(symbol) = self.worklist.pop() {
            self.process(symbol);
        }
    }

    fn finish(self) -> Closure {
        Closure {
            used: self.used,
            retained: self.retained.into_iter().collect(),
            visited: self.visited.len(),
        }
    }

    /// Queues a symbol the first time it is seen. Returns whether it was new.
    fn discover(&mut self, symbol: SymbolId) -> bool {
        if !self.visited.insert(symbol) {
            return false;
        }
        self.worklist.push(symbol);
        true
    }

    /// Discovers whatever an identifier occurrence resolves to.
    pub(crate) fn reach(&mut self, ident: &Ident) -> bool {
        let model = self.model;
        let mut found = false;
        if let Some(symbol) = model.resolve(ident) {
            found |= self.discover(symbol);
        }
        for &candidate in model.candidates(ident) {
            found |= self.discover(candidate);
        }
        found
    }

    fn process(&mut self, id: SymbolId) {
        let model = self.model;
        let symbol = model.symbol(id);
        if !symbol.is_package_level {
            return;
        }
        if symbol.name != "_" {
            self.used.insert(symbol.name.clone());
        }
        debug!(symbol = %symbol.name, kind = ?symbol.kind, "visited");

        let Some(decl_ref) = self.index.get(id) else {
            return;
        };
        if self.retained.insert(decl_ref) {
            self.expand(decl_ref);
        }
    }

    fn expand(&mut self, decl_ref: DeclRef) {
        let package = self.package;
        let Some(file) = package.file(decl_ref.file) else {
            return;
        };
        let Some(decl) = package.decl(decl_ref) else {
            return;
        };

        match decl {
            Decl::Func(func) => self.expand_func(func, file),
            Decl::Gen(gen_decl) => match decl_ref.spec {
                Some(index) => {
                    if let Some(spec) = gen_decl.specs.get(index) {
                        self.expand_spec(spec);
                    }
                }
                None => {
                    for spec in &gen_decl.specs {
                        self.expand_spec(spec);
                    }
                }
            },
        }
    }

    /// Signature types with the type walker, then every identifier of the
    /// body.
    fn expand_func(&mut self, func: &FuncDecl, file: &ParsedFile) {
        let signature = func
            .recv
            .iter()
            .chain(func.type_params.iter())
            .chain([&func.ty.params])
            .chain(func.ty.results.iter());
        for list in signature {
            for field in &list.fields {
                self.walk_type(&field.ty);
            }
        }

        if let Some(body) = &func.body {
            let ctx = VisitorContext::new(file);
            walk_block(body, &mut IdentScan { walk: self }, &ctx);
        }
    }

    fn expand_spec(&mut self, spec: &Spec) {
        match spec {
            Spec::Type(type_spec) => {
                for param in type_spec.type_params.iter().flat_map(|list| &list.fields) {
                    self.walk_type(&param.ty);
                }
                // Only struct bodies are followed; aliases, interfaces and
                // other named types stop at the name.
                if let Expr::StructType { fields, .. } = type_spec.ty.unparen() {
                    for field in &fields.fields {
                        self.walk_type(&field.ty);
                    }
                }
            }
            Spec::Value(value_spec) => {
                if let Some(ty) = &value_spec.ty {
                    self.walk_type(ty);
                }
                for value in &value_spec.values {
                    self.walk_value(value);
                }
            }
        }
    }
}

/// Discovers every identifier of a subtree.
struct IdentScan<'w, 'a> {
    walk: &'w mut Walk<'a>,
}

impl AstVisitor for IdentScan<'_, '_> {
    fn visit_ident(&mut self, node: &Ident, ctx: &VisitorContext) -> ControlFlow<()> {
        if self.walk.reach(node) {
            let (line, column) = ctx.span_to_location(node.span);
            let file = &ctx.file().metadata().filename;
            trace!(name = %node.name, %file, line, column, "discovered");
        }
        ControlFlow::Continue(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::FileId;

    /// Builds a package from `(file name, source)` pairs; the first file is
    /// the entry.
    fn package(files: &[(&str, &str)]) -> Package {
        Package {
            name: "p".to_string(),
            dir: ".".into(),
            files: files
                .iter()
                .enumerate()
                .map(|(i, (name, code))| ParsedFile::from_source(FileId(i as u32), name, code))
                .collect(),
            entry: FileId(0),
        }
    }

    fn closure_of(files: &[(&str, &str)]) -> (Package, Closure) {
        let package = package(files);
        let model = package.resolve();
        let closure = ClosureBuilder::new(&package, &model).build();
        (package, closure)
    }

    fn used(closure: &Closure) -> Vec<&str> {
        closure.used.iter().map(String::as_str).collect()
    }

    #[test]
    fn self_contained_entry_uses_only_its_own_names() {
        let (_, closure) = closure_of(&[
            (
                "main.go",
                "package p\n\nconst Limit = 3\n\nfunc Main() int { return Limit * 2 }\n",
            ),
            ("other.go", "package p\n\nfunc Other() {}\n"),
        ]);

        assert_eq!(used(&closure), vec!["Limit", "Main"]);
        assert_eq!(closure.retained.len(), 2);
    }

    #[test]
    fn follows_calls_across_files() {
        let (package, closure) = closure_of(&[
            ("main.go", "package p\n\nfunc Main() { helper() }\n"),
            (
                "lib.go",
                "package p\n\nfunc helper() { deeper() }\n\nfunc deeper() {}\n\nfunc unused() {}\n",
            ),
        ]);

        assert_eq!(used(&closure), vec!["Main", "deeper", "helper"]);
        let names: Vec<String> = closure
            .retained
            .iter()
            .flat_map(|r| package.declared_names(*r))
            .collect();
        assert_eq!(names, vec!["Main", "helper", "deeper"]);
    }

    #[test]
    fn mutual_recursion_terminates() {
        let (_, closure) = closure_of(&[
            ("main.go", "package p\n\nfunc Main() { ping(3) }\n"),
            (
                "pingpong.go",
                "package p\n\nfunc ping(n int) { if n > 0 { pong(n - 1) } }\n\nfunc pong(n int) { ping(n) }\n",
            ),
        ]);

        assert!(closure.contains("ping"));
        assert!(closure.contains("pong"));
        assert_eq!(closure.retained.len(), 3);
    }

    #[test]
    fn self_referential_struct_terminates() {
        let (_, closure) = closure_of(&[
            ("main.go", "package p\n\nvar Root *Node\n"),
            ("node.go", "package p\n\ntype Node struct {\n\tNext *Node\n\tData Payload\n}\n\ntype Payload []byte\n"),
        ]);

        assert_eq!(used(&closure), vec!["Node", "Payload", "Root"]);
    }

    #[test]
    fn local_shadowing_does_not_pull_package_symbol() {
        let (_, closure) = closure_of(&[
            ("main.go", "package p\n\nfunc Main() int {\n\tconfig := 1\n\treturn config\n}\n"),
            ("config.go", "package p\n\nvar config = load()\n\nfunc load() int { return 0 }\n"),
        ]);

        assert_eq!(used(&closure), vec!["Main"]);
    }

    #[test]
    fn signature_types_are_retained() {
        let (_, closure) = closure_of(&[
            ("main.go", "package p\n\nfunc Main() { _ = build(nil) }\n"),
            (
                "types.go",
                "package p\n\ntype Options struct{}\n\ntype Result struct{}\n\nfunc build(o *Options) Result { return Result{} }\n",
            ),
        ]);

        assert_eq!(used(&closure), vec!["Main", "Options", "Result", "build"]);
    }

    #[test]
    fn type_parameter_constraints_are_retained() {
        let (_, closure) = closure_of(&[
            ("main.go", "package p\n\nvar s Set[int]\n\nvar total = Sum(1, 2)\n"),
            (
                "generic.go",
                "package p\n\ntype Key interface{ comparable }\n\ntype Number interface{ ~int | ~float64 }\n\ntype Set[T Key] struct {\n\titems map[T]bool\n}\n\nfunc Sum[N Number](xs ...N) N { return xs[0] }\n\ntype Unrelated struct{}\n",
            ),
        ]);

        assert_eq!(used(&closure), vec!["Key", "Number", "Set", "Sum", "s", "total"]);
    }

    #[test]
    fn grouped_vars_keep_only_reached_specs() {
        let (_, closure) = closure_of(&[
            ("main.go", "package p\n\nfunc Main() int { return b }\n"),
            ("vars.go", "package p\n\nvar (\n\ta = 1\n\tb = 2\n\tc = 3\n)\n"),
        ]);

        assert_eq!(used(&closure), vec!["Main", "b"]);
        assert!(closure.retained.contains(&DeclRef {
            file: FileId(1),
            decl: 0,
            spec: Some(1),
        }));
        assert_eq!(closure.retained.len(), 2);
    }

    #[test]
    fn iota_group_is_kept_whole() {
        let (_, closure) = closure_of(&[
            ("main.go", "package p\n\nvar Default = Green\n"),
            ("color.go", "package p\n\ntype Color int\n\nconst (\n\tRed Color = iota\n\tGreen\n\tBlue\n)\n"),
        ]);

        assert!(closure.retained.contains(&DeclRef {
            file: FileId(1),
            decl: 1,
            spec: None,
        }));
        assert!(closure.contains("Color"));
        assert!(closure.contains("Green"));
    }

    #[test]
    fn reached_method_is_retained_but_siblings_are_not() {
        let (_, closure) = closure_of(&[
            ("main.go", "package p\n\nfunc Main() {\n\ts := NewServer()\n\ts.Start()\n}\n"),
            (
                "server.go",
                "package p\n\ntype Server struct{}\n\nfunc NewServer() *Server { return &Server{} }\n\nfunc (s *Server) Start() {}\n\nfunc (s *Server) Stop() {}\n",
            ),
        ]);

        assert_eq!(used(&closure), vec!["Main", "NewServer", "Server", "Start"]);
    }

    #[test]
    fn blank_and_init_declarations_of_entry_are_kept() {
        let (_, closure) = closure_of(&[(
            "main.go",
            "package p\n\nvar _ = register()\n\nfunc init() {}\n\nfunc register() bool { return true }\n",
        )]);

        assert_eq!(closure.retained.len(), 3);
        assert_eq!(used(&closure), vec!["init", "register"]);
    }

    #[test]
    fn idempotent_across_runs() {
        let files = [
            ("main.go", "package p\n\nfunc Main() { a(); b() }\n"),
            ("lib.go", "package p\n\nfunc a() { b() }\n\nfunc b() {}\n\nfunc c() {}\n"),
        ];
        let package = package(&files);
        let model = package.resolve();
        let builder = ClosureBuilder::new(&package, &model);

        assert_eq!(builder.build(), builder.build());
        assert_eq!(builder.index().len(), 4);
    }
}
