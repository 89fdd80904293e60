//! Parser module for Go source code
//!
//! Integrates with tree-sitter for parsing source files and lowers the
//! concrete syntax tree into the owned [`ast`](crate::ast) representation.

mod lower;

use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tree_sitter::{Node, Tree};

use crate::ast::{self, FileId};

use lower::Lowerer;

#[derive(Debug, Clone, thiserror::Error)]
#[error("{message} at {line}:{column}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub span_lo: u32,
    pub span_hi: u32,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub filename: String,
    pub package: Option<String>,
    pub line_count: usize,
    pub has_errors: bool,
}

pub struct ParsedFile {
    id: FileId,
    path: PathBuf,
    source: String,
    metadata: FileMetadata,
    ast: Option<ast::File>,
    errors: Vec<ParseError>,
    line_ranges: OnceLock<Vec<Range<usize>>>,
}

impl std::fmt::Debug for ParsedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsedFile")
            .field("id", &self.id)
            .field("metadata", &self.metadata)
            .field("has_ast", &self.ast.is_some())
            .field("error_count", &self.errors.len())
            .finish()
    }
}

impl ParsedFile {
    pub fn from_source(id: FileId, filename: &str, source: &str) -> Self {
        let parse_result = Parser::new().parse(id, source);

        let line_count = if source.is_empty() {
            0
        } else {
            source.lines().count()
        };

        let metadata = FileMetadata {
            filename: filename.to_string(),
            package: parse_result.file.as_ref().map(|f| f.package.name.clone()),
            line_count,
            has_errors: !parse_result.errors.is_empty(),
        };

        Self {
            id,
            path: PathBuf::from(filename),
            source: source.to_string(),
            metadata,
            ast: parse_result.file,
            errors: parse_result.errors,
            line_ranges: OnceLock::new(),
        }
    }

    pub fn id(&self) -> FileId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn metadata(&self) -> &FileMetadata {
        &self.metadata
    }

    pub fn ast(&self) -> Option<&ast::File> {
        self.ast.as_ref()
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn get_line(&self, line_number: usize) -> Option<&str> {
        if line_number == 0 {
            return None;
        }

        let ranges = self.line_ranges.get_or_init(|| self.build_line_ranges());
        let index = line_number - 1;

        ranges.get(index).map(|range| &self.source[range.clone()])
    }

    fn build_line_ranges(&self) -> Vec<Range<usize>> {
        let mut ranges = Vec::new();
        let mut start = 0;

        for (i, c) in self.source.char_indices() {
            if c == '\n' {
                ranges.push(start..i);
                start = i + 1;
            }
        }

        if start < self.source.len() || (start == 0 && !self.source.is_empty()) {
            ranges.push(start..self.source.len());
        }

        ranges
    }
}

#[derive(Debug)]
pub struct ParseResult {
    pub file: Option<ast::File>,
    pub errors: Vec<ParseError>,
}

impl ParseResult {
    pub fn is_ok(&self) -> bool {
        self.file.is_some() && self.errors.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Parser;

impl Parser {
    pub fn new() -> Self {
        Self
    }

    fn parse_tree(&self, code: &str) -> Result<Tree, ParseError> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|e| ParseError {
                line: 1,
                column: 1,
                span_lo: 0,
                span_hi: 0,
                message: format!("failed to load Go grammar: {e}"),
            })?;

        parser.parse(code, None).ok_or_else(|| ParseError {
            line: 1,
            column: 1,
            span_lo: 0,
            span_hi: 0,
            message: "parser produced no syntax tree".to_string(),
        })
    }

    /// Parses a whole file, keeping the lowered tree even when the source has
    /// syntax errors.
    pub fn parse(&self, id: FileId, code: &str) -> ParseResult {
        let tree = match self.parse_tree(code) {
            Ok(tree) => tree,
            Err(error) => {
                return ParseResult {
                    file: None,
                    errors: vec![error],
                };
            }
        };

        let root = tree.root_node();
        let mut errors = Vec::new();
        if root.has_error() {
            collect_errors(root, code, &mut errors);
        }

        let file = Lowerer::new(code, id).lower_file(root);
        if file.package.name.is_empty() && errors.is_empty() {
            errors.push(ParseError {
                line: 1,
                column: 1,
                span_lo: 0,
                span_hi: 0,
                message: "expected 'package' clause".to_string(),
            });
        }

        ParseResult {
            file: Some(file),
            errors,
        }
    }
}

fn collect_errors(node: Node, code: &str, errors: &mut Vec<ParseError>) {
    if node.is_error() || node.is_missing() {
        let position = node.start_position();
        let message = if node.is_missing() {
            format!("missing '{}'", node.kind())
        } else {
            let text = &code[node.byte_range()];
            let snippet: String = text.chars().take(20).collect();
            format!("unexpected '{}'", snippet.trim())
        };
        errors.push(ParseError {
            line: position.row + 1,
            column: position.column + 1,
            span_lo: node.start_byte() as u32,
            span_hi: node.end_byte() as u32,
            message,
        });
        return;
    }

    if !node.has_error() {
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_errors(child, code, errors);
    }
}
