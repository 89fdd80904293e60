//! Serializable summary of one cut

use std::path::PathBuf;

use serde::Serialize;

use crate::ast::Decl;
use crate::closure::{Closure, DeclRef};
use crate::loader::Package;
use crate::visitor::VisitorContext;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CutReport {
    pub entry: PathBuf,
    /// Written file; `None` when the cut was only analyzed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    pub package: String,
    pub files: usize,
    pub used: Vec<String>,
    pub retained: Vec<RetainedDecl>,
    pub visited: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub imports_added: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub imports_removed: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unresolved_qualifiers: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RetainedDecl {
    /// File name relative to the package directory.
    pub file: String,
    pub line: usize,
    pub names: Vec<String>,
}

impl CutReport {
    pub fn new(entry: PathBuf, package: &Package, closure: &Closure) -> Self {
        Self {
            entry,
            output: None,
            package: package.name.clone(),
            files: package.files.len(),
            used: closure.used.iter().cloned().collect(),
            retained: closure
                .retained
                .iter()
                .map(|&decl_ref| RetainedDecl::new(package, decl_ref))
                .collect(),
            visited: closure.visited,
            imports_added: Vec::new(),
            imports_removed: Vec::new(),
            unresolved_qualifiers: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl RetainedDecl {
    fn new(package: &Package, decl_ref: DeclRef) -> Self {
        let file = package.file(decl_ref.file);
        let file_name = file
            .and_then(|f| f.path().file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let span = package.decl(decl_ref).map(|decl| match (decl, decl_ref.spec) {
            (Decl::Gen(gen_decl), Some(index)) => gen_decl
                .specs
                .get(index)
                .map(|spec| spec.span())
                .unwrap_or(gen_decl.span),
            (decl, _) => decl.span(),
        });
        let line = match (file, span) {
            (Some(file), Some(span)) => VisitorContext::new(file).span_to_location(span).0,
            _ => 0,
        };

        Self {
            file: file_name,
            line,
            names: package.declared_names(decl_ref),
        }
    }
}
