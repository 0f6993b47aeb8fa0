//! Shared swc parsing front end.

use super::codes;
use crate::diagnostics::{Diagnostic, SourceFile};
use std::path::PathBuf;
use std::sync::Arc;
use swc_common::{comments::SingleThreadedComments, sync::Lrc, FileName, SourceMap, Span, Spanned};
use swc_ecma_ast::{EsVersion, Module};
use swc_ecma_parser::{lexer::Lexer, Parser, StringInput, Syntax, TsSyntax};

/// A parsed TypeScript module together with the swc state needed to emit it.
pub(crate) struct ParsedModule {
    pub cm: Lrc<SourceMap>,
    pub comments: SingleThreadedComments,
    /// `None` when the parser hit an unrecoverable error.
    pub module: Option<Module>,
    /// Recoverable and fatal syntax errors, in source order.
    pub errors: Vec<Diagnostic>,
    start_pos: u32,
}

impl ParsedModule {
    /// Byte offset and length of `span` within the parsed text.
    pub fn range(&self, span: Span) -> (usize, usize) {
        range_of(span, self.start_pos)
    }
}

fn range_of(span: Span, start_pos: u32) -> (usize, usize) {
    let start = span.lo.0.saturating_sub(start_pos) as usize;
    let length = span.hi.0.saturating_sub(span.lo.0) as usize;
    (start, length)
}

/// Parse `file` as a TypeScript module. TSX is enabled for `.tsx` files.
pub(crate) fn parse_module(file: &Arc<SourceFile>) -> ParsedModule {
    let cm: Lrc<SourceMap> = Lrc::default();
    let fm = cm.new_source_file(
        Lrc::new(FileName::Real(PathBuf::from(file.file_name()))),
        file.text().to_string(),
    );
    let start_pos = fm.start_pos.0;

    let syntax = Syntax::Typescript(TsSyntax {
        tsx: file.file_name().ends_with(".tsx"),
        decorators: true,
        dts: file.is_declaration_file(),
        ..Default::default()
    });

    let comments = SingleThreadedComments::default();
    let lexer = Lexer::new(
        syntax,
        EsVersion::EsNext,
        StringInput::from(&*fm),
        Some(&comments),
    );
    let mut parser = Parser::new_from(lexer);

    let result = parser.parse_module();
    let mut errors: Vec<_> = parser
        .take_errors()
        .into_iter()
        .map(|e| syntax_diagnostic(file, e, start_pos))
        .collect();

    let module = match result {
        Ok(module) => Some(module),
        Err(e) => {
            errors.push(syntax_diagnostic(file, e, start_pos));
            None
        }
    };
    errors.sort_by_key(|d| d.start);

    ParsedModule {
        cm,
        comments,
        module,
        errors,
        start_pos,
    }
}

fn syntax_diagnostic(
    file: &Arc<SourceFile>,
    error: swc_ecma_parser::error::Error,
    start_pos: u32,
) -> Diagnostic {
    let (start, length) = range_of(error.span(), start_pos);
    Diagnostic::error(codes::SYNTAX_ERROR, error.kind().msg().into_owned())
        .with_span(Arc::clone(file), start, length)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(name: &str, text: &str) -> ParsedModule {
        parse_module(&Arc::new(SourceFile::new(name, text)))
    }

    #[test]
    fn test_valid_module() {
        let parsed = parse("a.ts", "export const x: number = 1;\n");
        assert!(parsed.module.is_some());
        assert!(parsed.errors.is_empty());
    }

    #[test]
    fn test_tsx_only_for_tsx_files() {
        let source = "export const el = <div />;\n";
        assert!(parse("a.tsx", source).errors.is_empty());
        assert!(!parse("a.ts", source).errors.is_empty());
    }

    #[test]
    fn test_syntax_error_has_position() {
        let parsed = parse("a.ts", "const ok = 1;\nconst x = {;\n");
        let error = &parsed.errors[0];
        assert!(error.is_error());
        assert_eq!(error.code, codes::SYNTAX_ERROR);
        let start = error.start.unwrap();
        assert!(start >= "const ok = 1;\n".len(), "error at {start}");
    }
}
