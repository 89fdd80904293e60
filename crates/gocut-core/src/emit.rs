//! Rendering of the cut file
//!
//! Retained declarations are copied verbatim from the files that declare
//! them, so the output keeps the formatting and comments of the input.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::ast::{Decl, FileId, Span};
use crate::closure::DeclRef;
use crate::config::EmitConfig;
use crate::loader::Package;
use crate::parser::ParsedFile;
use crate::visitor::VisitorContext;

#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    #[error("failed to write '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Renders the entry file's package clause and imports followed by every
/// retained declaration, in source order.
pub fn emit(package: &Package, retained: &[DeclRef], options: &EmitConfig) -> String {
    let mut chunks: Vec<String> = Vec::new();

    if let Some(entry) = package.entry_file() {
        let ctx = VisitorContext::new(entry);
        if let Some(ast) = entry.ast() {
            chunks.extend(ctx.get_source_text(ast.header).map(str::to_string));
            for import in &ast.imports {
                chunks.extend(ctx.get_source_text(import.span).map(str::to_string));
            }
        }
    }

    // Specs of the same declaration are rendered together.
    let mut groups: BTreeMap<(FileId, usize), Option<Vec<usize>>> = BTreeMap::new();
    for decl_ref in retained {
        let entry = groups
            .entry((decl_ref.file, decl_ref.decl))
            .or_insert_with(|| Some(Vec::new()));
        match (decl_ref.spec, entry.as_mut()) {
            (Some(spec), Some(specs)) => specs.push(spec),
            _ => *entry = None,
        }
    }

    for ((file_id, index), specs) in groups {
        let Some(file) = package.file(file_id) else {
            continue;
        };
        let Some(decl) = file.ast().and_then(|ast| ast.decls.get(index)) else {
            continue;
        };
        match render_decl(file, decl, specs.as_deref(), options) {
            Some(text) => chunks.push(text),
            None => debug!(file = file_id.0, decl = index, "declaration has no source text"),
        }
    }

    let mut out = chunks.join("\n\n");
    out.push('\n');
    out
}

fn render_decl(
    file: &ParsedFile,
    decl: &Decl,
    specs: Option<&[usize]>,
    options: &EmitConfig,
) -> Option<String> {
    let ctx = VisitorContext::new(file);
    let with_doc = |text: &str, doc: Option<Span>, indent: &str| {
        match doc.filter(|_| options.doc_comments).and_then(|d| ctx.get_source_text(d)) {
            Some(doc) => format!("{indent}{doc}\n{indent}{text}"),
            None => format!("{indent}{text}"),
        }
    };

    let whole = |decl: &Decl| {
        ctx.get_source_text(decl.span())
            .map(|text| with_doc(text, decl.doc(), ""))
    };

    let (Decl::Gen(gen_decl), Some(specs)) = (decl, specs) else {
        return whole(decl);
    };
    if specs.len() == gen_decl.specs.len() {
        return whole(decl);
    }

    let mut out = String::new();
    if let Some(doc) = gen_decl.doc.filter(|_| options.doc_comments) {
        out.push_str(ctx.get_source_text(doc)?);
        out.push('\n');
    }
    out.push_str(gen_decl.kind.keyword());
    out.push_str(" (\n");
    for &index in specs {
        let spec = gen_decl.specs.get(index)?;
        let text = ctx.get_source_text(spec.span())?;
        out.push_str(&with_doc(text, spec.doc(), "\t"));
        out.push('\n');
    }
    out.push(')');
    Some(out)
}

/// Writes `text` to `dir/file_name`, creating `dir` first.
pub fn write_output(dir: &Path, file_name: &str, text: &str) -> Result<PathBuf, EmitError> {
    fs::create_dir_all(dir).map_err(|source| EmitError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(file_name);
    fs::write(&path, text).map_err(|source| EmitError::Io {
        path: path.clone(),
        source,
    })?;

    info!(path = %path.display(), bytes = text.len(), "wrote output");
    Ok(path)
}
