//! Import list normalization for emitted files
//!
//! The emitted file starts with the entry file's imports, which may name
//! packages only the dropped declarations used and may miss packages that
//! retained declarations from sibling files need. [`ImportNormalizer`]
//! rewrites the import block to exactly the packages the text refers to.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use tracing::{debug, trace, warn};

use crate::ast::{FileId, Span};
use crate::closure::DeclRef;
use crate::loader::Package;
use crate::parser::{ParseError, ParsedFile};
use crate::semantic::{ScopeBuilder, SemanticModel, SymbolId};
use crate::visitor::VisitorContext;

/// Standard library packages that may be imported without appearing in the
/// compilation unit. When two paths share a package name the first one wins.
const STDLIB: &[&str] = &[
    "bufio",
    "bytes",
    "cmp",
    "context",
    "crypto",
    "crypto/aes",
    "crypto/cipher",
    "crypto/ecdsa",
    "crypto/ed25519",
    "crypto/hmac",
    "crypto/md5",
    "crypto/sha1",
    "crypto/sha256",
    "crypto/sha512",
    "crypto/subtle",
    "crypto/tls",
    "crypto/x509",
    "database/sql",
    "embed",
    "encoding",
    "encoding/base64",
    "encoding/binary",
    "encoding/csv",
    "encoding/hex",
    "encoding/json",
    "encoding/pem",
    "encoding/xml",
    "errors",
    "expvar",
    "flag",
    "fmt",
    "go/ast",
    "go/format",
    "go/parser",
    "go/token",
    "hash",
    "hash/crc32",
    "hash/fnv",
    "io",
    "io/fs",
    "iter",
    "log",
    "log/slog",
    "maps",
    "math",
    "math/big",
    "math/bits",
    "math/rand",
    "mime",
    "net",
    "net/http",
    "net/netip",
    "net/url",
    "os",
    "os/exec",
    "os/signal",
    "path",
    "path/filepath",
    "reflect",
    "regexp",
    "runtime",
    "runtime/debug",
    "slices",
    "sort",
    "strconv",
    "strings",
    "sync",
    "sync/atomic",
    "syscall",
    "testing",
    "text/tabwriter",
    "text/template",
    "time",
    "unicode",
    "unicode/utf16",
    "unicode/utf8",
    "unsafe",
];

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("emitted source does not parse: {0}")]
    Unparseable(#[from] ParseError),
}

/// Name a package is assumed to declare, derived from its import path.
///
/// The last path element is used, skipping a trailing major version
/// element (`v2`), dropping a `go-` prefix and stopping at the first
/// character that cannot appear in an identifier.
pub fn package_name(path: &str) -> String {
    let mut elements = path.rsplit('/');
    let mut base = elements.next().unwrap_or(path);

    let is_major_version = base
        .strip_prefix('v')
        .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()));
    if is_major_version {
        if let Some(parent) = elements.next() {
            base = parent;
        }
    }

    let base = base.strip_prefix("go-").unwrap_or(base);
    let end = base
        .char_indices()
        .find(|&(_, c)| !(c.is_alphanumeric() || c == '_'))
        .map(|(i, _)| i)
        .unwrap_or(base.len());
    base[..end].to_string()
}

fn is_stdlib_path(path: &str) -> bool {
    path.split('/').next().is_some_and(|first| !first.contains('.'))
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct ImportLine {
    path: String,
    alias: Option<String>,
}

impl ImportLine {
    fn new(name: &str, path: &str) -> Self {
        let alias = (package_name(path) != name).then(|| name.to_string());
        Self {
            path: path.to_string(),
            alias,
        }
    }

    fn render(&self) -> String {
        match &self.alias {
            Some(alias) => format!("{} {:?}", alias, self.path),
            None => format!("{:?}", self.path),
        }
    }
}

/// Packages available to satisfy a qualifier, by the name they are used
/// under.
#[derive(Debug, Default, Clone)]
pub struct ImportPool {
    by_name: BTreeMap<String, String>,
}

impl ImportPool {
    /// Every named import of the compilation unit. The first file to bind a
    /// name decides its path.
    pub fn from_model(model: &SemanticModel) -> Self {
        let mut by_name = BTreeMap::new();
        for binding in model.imports.iter().filter(|b| b.symbol.is_some()) {
            by_name
                .entry(binding.name.clone())
                .or_insert_with(|| binding.path.clone());
        }
        Self { by_name }
    }

    /// Like [`ImportPool::from_model`], except that a name used by a
    /// retained declaration maps to the path that declaration's own file
    /// imports under it.
    pub fn for_retained(model: &SemanticModel, package: &Package, retained: &[DeclRef]) -> Self {
        let spans: Vec<Span> = retained
            .iter()
            .filter_map(|&decl_ref| package.decl_span(decl_ref))
            .collect();
        let referenced: HashSet<SymbolId> = model
            .uses
            .iter()
            .filter(|(span, _)| spans.iter().any(|outer| outer.contains(**span)))
            .map(|(_, &id)| id)
            .collect();

        let mut own: BTreeMap<String, String> = BTreeMap::new();
        for binding in &model.imports {
            if !binding.symbol.is_some_and(|id| referenced.contains(&id)) {
                continue;
            }
            match own.get(&binding.name) {
                Some(path) if *path != binding.path => warn!(
                    name = %binding.name,
                    kept = %path,
                    dropped = %binding.path,
                    "retained declarations import one name from two paths"
                ),
                Some(_) => {}
                None => {
                    trace!(name = %binding.name, path = %binding.path, "import of a retained declaration");
                    own.insert(binding.name.clone(), binding.path.clone());
                }
            }
        }

        let mut pool = Self::from_model(model);
        pool.by_name.extend(own);
        pool
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    fn lookup(&self, name: &str) -> Option<ImportLine> {
        if let Some(path) = self.by_name.get(name) {
            return Some(ImportLine::new(name, path));
        }
        STDLIB
            .iter()
            .find(|path| package_name(path) == name)
            .map(|path| ImportLine::new(name, path))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub text: String,
    /// Paths of imports added for unresolved qualifiers.
    pub added: Vec<String>,
    /// Paths of imports dropped because nothing refers to them.
    pub removed: Vec<String>,
    /// Qualifiers no import could be found for.
    pub unresolved: Vec<String>,
}

pub struct ImportNormalizer {
    pool: ImportPool,
}

impl ImportNormalizer {
    pub fn new(pool: ImportPool) -> Self {
        Self { pool }
    }

    pub fn normalize(&self, text: &str) -> Result<Normalized, ImportError> {
        let parsed = ParsedFile::from_source(FileId(0), "cut.go", text);
        if let Some(error) = parsed.errors().first() {
            return Err(ImportError::Unparseable(error.clone()));
        }
        let Some(ast) = parsed.ast() else {
            return Ok(Normalized {
                text: text.to_string(),
                added: Vec::new(),
                removed: Vec::new(),
                unresolved: Vec::new(),
            });
        };

        let model = ScopeBuilder::build(std::iter::once(ast));

        let mut lines = BTreeSet::new();
        let mut removed = Vec::new();
        for binding in &model.imports {
            if binding.symbol.is_none() || model.is_import_used(binding) {
                let alias = binding.explicit.then(|| binding.name.clone());
                lines.insert(ImportLine {
                    path: binding.path.clone(),
                    alias,
                });
            } else {
                debug!(path = %binding.path, "dropping unused import");
                removed.push(binding.path.clone());
            }
        }

        let mut added = Vec::new();
        let mut unresolved = Vec::new();
        let mut seen = BTreeSet::new();
        for reference in model.unresolved_qualifiers() {
            if !seen.insert(reference.name.as_str()) {
                continue;
            }
            match self.pool.lookup(&reference.name) {
                Some(line) => {
                    debug!(name = %reference.name, path = %line.path, "adding import");
                    added.push(line.path.clone());
                    lines.insert(line);
                }
                None => {
                    warn!(name = %reference.name, "no import provides qualifier");
                    unresolved.push(reference.name.clone());
                }
            }
        }

        if added.is_empty() && removed.is_empty() {
            return Ok(Normalized {
                text: text.to_string(),
                added,
                removed,
                unresolved,
            });
        }

        let ctx = VisitorContext::new(&parsed);
        let header = ctx.get_source_text(ast.header).unwrap_or_default();
        let body_start = ast
            .imports
            .last()
            .map(|decl| decl.span.hi)
            .unwrap_or(ast.header.hi) as usize;
        let body = text.get(body_start..).unwrap_or_default().trim_start();

        let mut out = String::from(header);
        let block = render_block(&lines);
        if !block.is_empty() {
            out.push_str("\n\n");
            out.push_str(&block);
        }
        if body.is_empty() {
            out.push('\n');
        } else {
            out.push_str("\n\n");
            out.push_str(body);
        }

        Ok(Normalized {
            text: out,
            added,
            removed,
            unresolved,
        })
    }
}

/// Standard library imports first, then the rest, each sorted by path.
fn render_block(lines: &BTreeSet<ImportLine>) -> String {
    let (std, other): (Vec<&ImportLine>, Vec<&ImportLine>) =
        lines.iter().partition(|line| is_stdlib_path(&line.path));

    if let ([line], []) | ([], [line]) = (std.as_slice(), other.as_slice()) {
        return format!("import {}", line.render());
    }
    if lines.is_empty() {
        return String::new();
    }

    let mut out = String::from("import (\n");
    for (i, group) in [std, other].iter().filter(|g| !g.is_empty()).enumerate() {
        if i > 0 {
            out.push('\n');
        }
        for line in group {
            out.push('\t');
            out.push_str(&line.render());
            out.push('\n');
        }
    }
    out.push(')');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> ImportNormalizer {
        ImportNormalizer::new(ImportPool::default())
    }

    #[test]
    fn package_names_follow_import_paths() {
        assert_eq!(package_name("fmt"), "fmt");
        assert_eq!(package_name("net/http"), "http");
        assert_eq!(package_name("github.com/foo/bar/v2"), "bar");
        assert_eq!(package_name("github.com/mattn/go-sqlite3"), "sqlite3");
        assert_eq!(package_name("gopkg.in/yaml.v3"), "yaml");
        assert_eq!(package_name("example.com/my-lib"), "my");
        assert_eq!(package_name("v2"), "v2");
    }

    #[test]
    fn stdlib_detection() {
        assert!(is_stdlib_path("net/http"));
        assert!(!is_stdlib_path("github.com/x/y"));
    }

    #[test]
    fn removes_unused_and_adds_missing_stdlib() {
        let text = "package main\n\nimport (\n\t\"fmt\"\n\t\"os\"\n)\n\nfunc main() {\n\tfmt.Println(strings.ToUpper(\"x\"))\n}\n";

        let normalized = normalizer().normalize(text).unwrap();

        assert_eq!(normalized.removed, vec!["os"]);
        assert_eq!(normalized.added, vec!["strings"]);
        assert!(normalized.unresolved.is_empty());
        assert_eq!(
            normalized.text,
            "package main\n\nimport (\n\t\"fmt\"\n\t\"strings\"\n)\n\nfunc main() {\n\tfmt.Println(strings.ToUpper(\"x\"))\n}\n"
        );
    }

    #[test]
    fn blank_and_dot_imports_are_kept() {
        let text = "package main\n\nimport (\n\t_ \"embed\"\n\t\"os\"\n)\n\nvar x = 1\n";

        let normalized = normalizer().normalize(text).unwrap();

        assert_eq!(normalized.removed, vec!["os"]);
        assert_eq!(
            normalized.text,
            "package main\n\nimport _ \"embed\"\n\nvar x = 1\n"
        );
    }

    #[test]
    fn unchanged_text_is_returned_as_is() {
        let text = "package main\n\nimport \"fmt\"\n\nfunc main() { fmt.Println() }\n";

        let normalized = normalizer().normalize(text).unwrap();

        assert_eq!(normalized.text, text);
        assert!(normalized.added.is_empty() && normalized.removed.is_empty());
    }

    #[test]
    fn pool_provides_third_party_paths_and_aliases() {
        let unit = ParsedFile::from_source(
            FileId(0),
            "a.go",
            "package main\n\nimport (\n\t\"gopkg.in/yaml.v3\"\n\tsq \"github.com/Masterminds/squirrel\"\n)\n\nvar _ = yaml.Marshal\nvar _ = sq.Select\n",
        );
        let model = ScopeBuilder::build(unit.ast());
        let pool = ImportPool::from_model(&model);
        assert_eq!(pool.len(), 2);

        let text = "package main\n\nfunc f() {\n\tyaml.Marshal(sq.Select(\"x\"))\n\tfmt.Println()\n}\n";
        let normalized = ImportNormalizer::new(pool).normalize(text).unwrap();

        assert_eq!(
            normalized.text,
            "package main\n\nimport (\n\t\"fmt\"\n\n\tsq \"github.com/Masterminds/squirrel\"\n\t\"gopkg.in/yaml.v3\"\n)\n\nfunc f() {\n\tyaml.Marshal(sq.Select(\"x\"))\n\tfmt.Println()\n}\n"
        );
    }

    #[test]
    fn retained_declarations_keep_their_own_import_paths() {
        let package = Package {
            name: "main".to_string(),
            dir: ".".into(),
            files: vec![
                ParsedFile::from_source(FileId(0), "main.go", "package main\n\nfunc main() { _ = token() }\n"),
                ParsedFile::from_source(
                    FileId(1),
                    "a.go",
                    "package main\n\nimport \"math/rand\"\n\nfunc roll() int { return rand.Intn(6) }\n",
                ),
                ParsedFile::from_source(
                    FileId(2),
                    "b.go",
                    "package main\n\nimport \"crypto/rand\"\n\nfunc token() []byte {\n\tb := make([]byte, 8)\n\trand.Read(b)\n\treturn b\n}\n",
                ),
            ],
            entry: FileId(0),
        };
        let model = package.resolve();
        let retained = [
            DeclRef { file: FileId(0), decl: 0, spec: None },
            DeclRef { file: FileId(2), decl: 0, spec: None },
        ];
        let text = "package main\n\nfunc main() { _ = token() }\n\nfunc token() []byte {\n\tb := make([]byte, 8)\n\trand.Read(b)\n\treturn b\n}\n";

        let pool = ImportPool::for_retained(&model, &package, &retained);
        let normalized = ImportNormalizer::new(pool).normalize(text).unwrap();

        assert_eq!(normalized.added, vec!["crypto/rand"]);
        assert!(normalized.text.contains("import \"crypto/rand\"\n"));

        let unit_wide = ImportNormalizer::new(ImportPool::from_model(&model));
        assert_eq!(unit_wide.normalize(text).unwrap().added, vec!["math/rand"]);
    }

    #[test]
    fn unknown_qualifiers_are_reported() {
        let text = "package main\n\nimport \"os\"\n\nvar x = mystery.Value\n";

        let normalized = normalizer().normalize(text).unwrap();

        assert_eq!(normalized.unresolved, vec!["mystery"]);
        assert_eq!(normalized.text, "package main\n\nvar x = mystery.Value\n");
    }

    #[test]
    fn unparseable_text_fails() {
        let err = normalizer().normalize("package main\n\nfunc {\n").unwrap_err();

        assert!(matches!(err, ImportError::Unparseable(_)));
    }
}
