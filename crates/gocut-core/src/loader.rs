//! Loading of the compilation unit that contains an entry file
//!
//! A unit is every `.go` file of the entry file's directory that shares its
//! `package` clause and whose build constraints hold for the target. Test
//! files only belong to the unit when the entry file is itself a test file.
//! The entry file always belongs to its unit.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::ast::{self, Decl, FileId, Span};
use crate::closure::DeclRef;
use crate::constraint::{BuildTarget, ConstraintError};
use crate::parser::{ParseError, ParsedFile};
use crate::semantic::{ScopeBuilder, SemanticModel};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse '{}': {source}", .path.display())]
    Parse { path: PathBuf, source: ParseError },
    #[error("invalid build constraint in '{}': {source}", .path.display())]
    Constraint {
        path: PathBuf,
        source: ConstraintError,
    },
    #[error("entry file '{}' not found in its package", .path.display())]
    EntryNotFound { path: PathBuf },
    #[error("'{}' is not a Go source file", .path.display())]
    NotGoFile { path: PathBuf },
}

#[derive(Debug)]
pub struct Package {
    pub name: String,
    pub dir: PathBuf,
    /// Files in file name order; ids are positions in the directory listing
    /// and may skip files of other packages.
    pub files: Vec<ParsedFile>,
    pub entry: FileId,
}

impl Package {
    pub fn file(&self, id: FileId) -> Option<&ParsedFile> {
        self.files.iter().find(|file| file.id() == id)
    }

    pub fn entry_file(&self) -> Option<&ParsedFile> {
        self.file(self.entry)
    }

    pub fn asts(&self) -> impl Iterator<Item = &ast::File> {
        self.files.iter().filter_map(ParsedFile::ast)
    }

    pub fn resolve(&self) -> SemanticModel {
        ScopeBuilder::build(self.asts())
    }

    pub fn decl(&self, decl_ref: DeclRef) -> Option<&Decl> {
        self.file(decl_ref.file)
            .and_then(ParsedFile::ast)
            .and_then(|file| file.decls.get(decl_ref.decl))
    }

    /// Span of the spec `decl_ref` points at, or of the whole declaration.
    pub fn decl_span(&self, decl_ref: DeclRef) -> Option<Span> {
        let decl = self.decl(decl_ref)?;
        match (decl, decl_ref.spec) {
            (Decl::Gen(gen_decl), Some(index)) => gen_decl.specs.get(index).map(ast::Spec::span),
            _ => Some(decl.span()),
        }
    }

    /// Names declared by the declaration or spec `decl_ref` points at.
    /// Methods are spelled `Recv.Name`.
    pub fn declared_names(&self, decl_ref: DeclRef) -> Vec<String> {
        let Some(decl) = self.decl(decl_ref) else {
            return Vec::new();
        };

        match decl {
            Decl::Func(func) => {
                let receiver = func
                    .recv
                    .as_ref()
                    .and_then(|recv| recv.fields.first())
                    .and_then(|field| receiver_name(&field.ty));
                match receiver {
                    Some(receiver) => vec![format!("{}.{}", receiver, func.name.name)],
                    None => vec![func.name.name.clone()],
                }
            }
            Decl::Gen(gen_decl) => {
                let specs: Vec<&ast::Spec> = match decl_ref.spec {
                    Some(index) => gen_decl.specs.get(index).into_iter().collect(),
                    None => gen_decl.specs.iter().collect(),
                };
                specs
                    .into_iter()
                    .flat_map(|spec| spec.names())
                    .map(|ident| ident.name.clone())
                    .collect()
            }
        }
    }
}

fn receiver_name(ty: &ast::Expr) -> Option<&str> {
    match ty.unparen() {
        ast::Expr::Ident(ident) => Some(&ident.name),
        ast::Expr::Star { operand, .. }
        | ast::Expr::Generic { base: operand, .. }
        | ast::Expr::Index { base: operand, .. } => receiver_name(operand),
        _ => None,
    }
}

pub fn is_go_file(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some("go")
}

pub fn is_test_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with("_test.go"))
}

/// Loads the unit of `entry` for the target described by `GOOS`, `GOARCH`
/// and friends, defaulting to the host.
pub fn load_package(entry: &Path) -> Result<Package, LoadError> {
    load_package_for(entry, &BuildTarget::from_env())
}

pub fn load_package_for(entry: &Path, target: &BuildTarget) -> Result<Package, LoadError> {
    if !is_go_file(entry) {
        return Err(LoadError::NotGoFile {
            path: entry.to_path_buf(),
        });
    }
    if !entry.is_file() {
        return Err(LoadError::EntryNotFound {
            path: entry.to_path_buf(),
        });
    }

    let entry_path = entry.canonicalize().map_err(|source| LoadError::Io {
        path: entry.to_path_buf(),
        source,
    })?;
    let dir = entry_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let entry_name = entry_path.file_name().map(|name| name.to_os_string());
    let include_tests = is_test_file(&entry_path);

    let mut paths = Vec::new();
    for dir_entry in WalkDir::new(&dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let dir_entry = dir_entry.map_err(|err| LoadError::Io {
            path: dir.clone(),
            source: err.into(),
        })?;
        let path = dir_entry.path();
        if !dir_entry.file_type().is_file() || !is_go_file(path) {
            continue;
        }
        if is_test_file(path) && !include_tests {
            continue;
        }
        let is_entry = path.file_name() == entry_name.as_deref();
        let name = dir_entry.file_name().to_string_lossy();
        if !is_entry && !target.matches_file_name(&name) {
            debug!(
                path = %path.display(),
                goos = %target.goos,
                goarch = %target.goarch,
                "skipping file for another target"
            );
            continue;
        }
        paths.push(path.to_path_buf());
    }

    let mut files = Vec::new();
    let mut entry_id = None;
    for (index, path) in paths.into_iter().enumerate() {
        let is_entry = path.file_name() == entry_name.as_deref();
        let source = fs::read_to_string(&path).map_err(|source| LoadError::Io {
            path: path.clone(),
            source,
        })?;

        let included = target
            .matches_source(&source)
            .map_err(|source| LoadError::Constraint {
                path: path.clone(),
                source,
            })?;
        if !is_entry && !included {
            debug!(path = %path.display(), "skipping file excluded by build constraint");
            continue;
        }

        let id = FileId(index as u32);
        let parsed = ParsedFile::from_source(id, &path.to_string_lossy(), &source);
        if let Some(error) = parsed.errors().first() {
            return Err(LoadError::Parse {
                path,
                source: error.clone(),
            });
        }

        debug!(
            path = %path.display(),
            package = parsed.metadata().package.as_deref().unwrap_or_default(),
            lines = parsed.metadata().line_count,
            "parsed file"
        );
        if is_entry {
            entry_id = Some(id);
        }
        files.push(parsed);
    }

    let Some(entry_id) = entry_id else {
        return Err(LoadError::EntryNotFound { path: entry_path });
    };
    let name = files
        .iter()
        .find(|file| file.id() == entry_id)
        .and_then(|file| file.metadata().package.clone())
        .unwrap_or_default();

    files.retain(|file| file.metadata().package.as_deref() == Some(name.as_str()));

    info!(
        package = %name,
        dir = %dir.display(),
        files = files.len(),
        "loaded package"
    );

    Ok(Package {
        name,
        dir,
        files,
        entry: entry_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).expect("write fixture");
        path
    }

    fn file_names(package: &Package) -> Vec<String> {
        package
            .files
            .iter()
            .filter_map(|file| file.path().file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn loads_sibling_files_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b.go", "package demo\n\nfunc B() {}\n");
        let entry = write(dir.path(), "main.go", "package demo\n\nfunc main() { B() }\n");
        write(dir.path(), "a.go", "package demo\n\nfunc A() {}\n");
        write(dir.path(), "README.md", "not go");

        let package = load_package(&entry).unwrap();

        assert_eq!(package.name, "demo");
        assert_eq!(file_names(&package), vec!["a.go", "b.go", "main.go"]);
        assert_eq!(package.entry, FileId(2));
        assert_eq!(package.entry_file().map(ParsedFile::id), Some(FileId(2)));
    }

    #[test]
    fn excludes_tests_other_packages_and_ignored_files() {
        let dir = tempfile::tempdir().unwrap();
        let entry = write(dir.path(), "main.go", "package demo\n");
        write(dir.path(), "main_test.go", "package demo\n");
        write(dir.path(), "other.go", "package other\n");
        write(dir.path(), "gen.go", "//go:build ignore\n\npackage demo\n");
        write(dir.path(), "util.go", "package demo\n");

        let package = load_package(&entry).unwrap();

        assert_eq!(file_names(&package), vec!["main.go", "util.go"]);
    }

    #[test]
    fn test_entry_includes_test_files() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "lib.go", "package demo\n");
        let entry = write(dir.path(), "lib_test.go", "package demo\n");
        write(dir.path(), "ext_test.go", "package demo_test\n");

        let package = load_package(&entry).unwrap();

        assert_eq!(file_names(&package), vec!["lib.go", "lib_test.go"]);
    }

    #[test]
    fn rejects_non_go_path() {
        let dir = tempfile::tempdir().unwrap();
        let entry = write(dir.path(), "main.txt", "package demo\n");

        assert!(matches!(
            load_package(&entry),
            Err(LoadError::NotGoFile { .. })
        ));
    }

    #[test]
    fn missing_entry_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let entry = dir.path().join("missing.go");

        match load_package(&entry) {
            Err(LoadError::EntryNotFound { path }) => assert_eq!(path, entry),
            other => panic!("expected EntryNotFound, got {other:?}"),
        }
    }

    #[test]
    fn unparseable_sibling_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let entry = write(dir.path(), "main.go", "package demo\n");
        let broken = write(dir.path(), "broken.go", "package demo\n\nfunc {\n");

        match load_package(&entry) {
            Err(LoadError::Parse { path, source }) => {
                assert_eq!(path.file_name(), broken.file_name());
                assert!(source.line >= 3);
            }
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn declared_names_cover_methods_and_specs() {
        let dir = tempfile::tempdir().unwrap();
        let entry = write(
            dir.path(),
            "main.go",
            "package demo\n\ntype T struct{}\n\nfunc (t *T) Run() {}\n\nvar (\n\ta = 1\n\tb, c = 2, 3\n)\n",
        );
        let package = load_package(&entry).unwrap();
        let file = package.entry;

        let names = |decl, spec| package.declared_names(DeclRef { file, decl, spec });
        assert_eq!(names(0, None), vec!["T"]);
        assert_eq!(names(1, None), vec!["T.Run"]);
        assert_eq!(names(2, Some(1)), vec!["b", "c"]);
        assert_eq!(names(2, None), vec!["a", "b", "c"]);
        assert!(names(9, None).is_empty());
    }

    #[test]
    fn platform_files_follow_the_target() {
        let dir = tempfile::tempdir().unwrap();
        let entry = write(dir.path(), "main.go", "package demo\n\nfunc main() { platform() }\n");
        write(dir.path(), "os_linux.go", "package demo\n\nfunc platform() string { return \"linux\" }\n");
        write(dir.path(), "os_windows.go", "package demo\n\nfunc platform() string { return \"windows\" }\n");
        write(dir.path(), "os_darwin_arm64.go", "package demo\n\nfunc platform() string { return \"mac\" }\n");

        let linux = load_package_for(&entry, &BuildTarget::new("linux", "amd64")).unwrap();
        assert_eq!(file_names(&linux), vec!["main.go", "os_linux.go"]);

        let windows = load_package_for(&entry, &BuildTarget::new("windows", "amd64")).unwrap();
        assert_eq!(file_names(&windows), vec!["main.go", "os_windows.go"]);

        let mac = load_package_for(&entry, &BuildTarget::new("darwin", "arm64")).unwrap();
        assert_eq!(file_names(&mac), vec!["main.go", "os_darwin_arm64.go"]);
    }

    #[test]
    fn go_build_lines_follow_the_target() {
        let dir = tempfile::tempdir().unwrap();
        let entry = write(dir.path(), "main.go", "package demo\n");
        write(dir.path(), "posix.go", "//go:build unix && !android\n\npackage demo\n");
        write(dir.path(), "nt.go", "//go:build windows\n\npackage demo\n");
        write(dir.path(), "old.go", "// +build !windows,amd64\n\npackage demo\n");

        let linux = load_package_for(&entry, &BuildTarget::new("linux", "amd64")).unwrap();
        assert_eq!(file_names(&linux), vec!["main.go", "old.go", "posix.go"]);

        let windows = load_package_for(&entry, &BuildTarget::new("windows", "amd64")).unwrap();
        assert_eq!(file_names(&windows), vec!["main.go", "nt.go"]);
    }

    #[test]
    fn entry_is_kept_whatever_its_constraints() {
        let dir = tempfile::tempdir().unwrap();
        let entry = write(dir.path(), "gen_windows.go", "//go:build ignore\n\npackage demo\n");
        write(dir.path(), "util.go", "package demo\n");

        let package = load_package_for(&entry, &BuildTarget::new("linux", "amd64")).unwrap();

        assert_eq!(file_names(&package), vec!["gen_windows.go", "util.go"]);
    }

    #[test]
    fn malformed_constraint_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let entry = write(dir.path(), "main.go", "package demo\n");
        write(dir.path(), "bad.go", "//go:build linux &&\n\npackage demo\n");

        match load_package_for(&entry, &BuildTarget::new("linux", "amd64")) {
            Err(LoadError::Constraint { path, .. }) => {
                assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("bad.go"))
            }
            other => panic!("expected Constraint, got {other:?}"),
        }
    }
}
