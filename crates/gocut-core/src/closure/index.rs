//! Declaration index keyed by symbol identity

use std::collections::HashMap;

use serde::Serialize;

use crate::ast::{Decl, FileId, GenDecl};
use crate::loader::Package;
use crate::semantic::{SemanticModel, SymbolId};

/// A top-level declaration of a file, or one spec of a grouped declaration.
///
/// The derived order is the original source order of the unit: file, then
/// declaration, then spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DeclRef {
    pub file: FileId,
    pub decl: usize,
    /// `None` addresses the whole declaration.
    pub spec: Option<usize>,
}

/// Splits a declaration into the units that can be retained on their own.
///
/// Ungrouped declarations and const groups with implicit repetition are a
/// single unit.
pub fn decl_refs(file: FileId, index: usize, decl: &Decl) -> Vec<DeclRef> {
    let whole = DeclRef {
        file,
        decl: index,
        spec: None,
    };

    match decl {
        Decl::Gen(gen_decl) if is_divisible(gen_decl) => (0..gen_decl.specs.len())
            .map(|spec| DeclRef {
                spec: Some(spec),
                ..whole
            })
            .collect(),
        _ => vec![whole],
    }
}

fn is_divisible(gen_decl: &GenDecl) -> bool {
    gen_decl.grouped && !gen_decl.has_implicit_repetition()
}

#[derive(Debug, Default)]
pub struct DeclIndex {
    by_symbol: HashMap<SymbolId, DeclRef>,
}

impl DeclIndex {
    pub fn build(package: &Package, model: &SemanticModel) -> Self {
        let mut by_symbol = HashMap::new();

        for file in package.asts() {
            let file_id = file.span.file;
            for (index, decl) in file.decls.iter().enumerate() {
                match decl {
                    Decl::Func(func) => {
                        if let Some(&id) = model.defs.get(&func.name.span) {
                            by_symbol.insert(
                                id,
                                DeclRef {
                                    file: file_id,
                                    decl: index,
                                    spec: None,
                                },
                            );
                        }
                    }
                    Decl::Gen(gen_decl) => {
                        let divisible = is_divisible(gen_decl);
                        for (spec_index, spec) in gen_decl.specs.iter().enumerate() {
                            let decl_ref = DeclRef {
                                file: file_id,
                                decl: index,
                                spec: divisible.then_some(spec_index),
                            };
                            for name in spec.names() {
                                if let Some(&id) = model.defs.get(&name.span) {
                                    by_symbol.insert(id, decl_ref);
                                }
                            }
                        }
                    }
                }
            }
        }

        Self { by_symbol }
    }

    pub fn get(&self, symbol: SymbolId) -> Option<DeclRef> {
        self.by_symbol.get(&symbol).copied()
    }

    pub fn len(&self) -> usize {
        self.by_symbol.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_symbol.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Ident;
    use crate::parser::ParsedFile;

    fn single_file_package(code: &str) -> Package {
        Package {
            name: "p".to_string(),
            dir: ".".into(),
            files: vec![ParsedFile::from_source(FileId(0), "p.go", code)],
            entry: FileId(0),
        }
    }

    fn def(package: &Package, model: &SemanticModel, name: &str) -> SymbolId {
        let file = package.entry_file().and_then(ParsedFile::ast).expect("ast");
        let idents: Vec<&Ident> = file
            .decls
            .iter()
            .flat_map(|decl| match decl {
                Decl::Func(func) => vec![&func.name],
                Decl::Gen(gen_decl) => gen_decl.specs.iter().flat_map(|s| s.names()).collect(),
            })
            .collect();
        let ident = idents
            .into_iter()
            .find(|ident| ident.name == name)
            .expect("declared name");
        model.defs[&ident.span]
    }

    #[test]
    fn grouped_specs_are_indexed_individually() {
        let package = single_file_package(
            "package p\n\nfunc F() {}\n\nvar (\n\ta = 1\n\tb, c = 2, 3\n)\n\ntype T int\n",
        );
        let model = package.resolve();
        let index = DeclIndex::build(&package, &model);

        let at = |decl, spec| Some(DeclRef { file: FileId(0), decl, spec });
        assert_eq!(index.get(def(&package, &model, "F")), at(0, None));
        assert_eq!(index.get(def(&package, &model, "a")), at(1, Some(0)));
        assert_eq!(index.get(def(&package, &model, "b")), at(1, Some(1)));
        assert_eq!(index.get(def(&package, &model, "c")), at(1, Some(1)));
        assert_eq!(index.get(def(&package, &model, "T")), at(2, None));
        assert_eq!(index.len(), 5);
    }

    #[test]
    fn iota_groups_are_indivisible() {
        let package =
            single_file_package("package p\n\nconst (\n\tRed = iota\n\tGreen\n\tBlue\n)\n");
        let model = package.resolve();
        let index = DeclIndex::build(&package, &model);

        let whole = Some(DeclRef {
            file: FileId(0),
            decl: 0,
            spec: None,
        });
        for name in ["Red", "Green", "Blue"] {
            assert_eq!(index.get(def(&package, &model, name)), whole);
        }
    }

    #[test]
    fn decl_refs_split_only_divisible_groups() {
        let package = single_file_package(
            "package p\n\nvar x = 1\n\nvar (\n\ty = 2\n\tz = 3\n)\n\nconst (\n\tA = iota\n\tB\n)\n",
        );
        let file = package.entry_file().and_then(ParsedFile::ast).expect("ast");

        let counts: Vec<usize> = file
            .decls
            .iter()
            .enumerate()
            .map(|(i, decl)| decl_refs(FileId(0), i, decl).len())
            .collect();
        assert_eq!(counts, vec![1, 2, 1]);
    }

    #[test]
    fn decl_refs_sort_in_source_order() {
        let mut refs = vec![
            DeclRef { file: FileId(1), decl: 0, spec: None },
            DeclRef { file: FileId(0), decl: 3, spec: Some(1) },
            DeclRef { file: FileId(0), decl: 3, spec: Some(0) },
            DeclRef { file: FileId(0), decl: 1, spec: None },
        ];
        refs.sort();

        let order: Vec<(u32, usize, Option<usize>)> =
            refs.iter().map(|r| (r.file.0, r.decl, r.spec)).collect();
        assert_eq!(
            order,
            vec![(0, 1, None), (0, 3, Some(0)), (0, 3, Some(1)), (1, 0, None)]
        );
    }
}
