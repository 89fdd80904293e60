//! Visitor context providing file information during AST traversal.

use crate::ast::Span;
use crate::parser::ParsedFile;

pub struct VisitorContext<'a> {
    file: &'a ParsedFile,
}

impl<'a> VisitorContext<'a> {
    pub fn new(file: &'a ParsedFile) -> Self {
        Self { file }
    }

    pub fn file(&self) -> &'a ParsedFile {
        self.file
    }

    /// One-based line and column of the start of `span`.
    pub fn span_to_location(&self, span: Span) -> (usize, usize) {
        let source = self.file.source();
        let lo = span.lo as usize;

        if source.is_empty() || lo == 0 {
            return (1, 1);
        }

        let prefix = &source[..lo.min(source.len())];
        let line = prefix.matches('\n').count() + 1;
        let last_newline = prefix.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let column = lo - last_newline + 1;

        (line, column)
    }

    pub fn get_source_text(&self, span: Span) -> Option<&'a str> {
        let source = self.file.source();
        let lo = span.lo as usize;
        let hi = span.hi as usize;

        if span.file == self.file.id() && lo <= hi && hi <= source.len() {
            source.get(lo..hi)
        } else {
            None
        }
    }
}
