//! Diagnostic routing.
//!
//! Inside a build, diagnostics go to the build context's `warn`/`error`
//! channels. Outside a build (config parsing happens before any context
//! exists), the first diagnostic becomes a [`DiagnosticError`] carrying a
//! rendered code frame.

use super::{code_frame, Diagnostic, DiagnosticCategory};
use serde::Serialize;
use std::fmt;

/// Source location attached to a reported diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    pub file: String,
    /// 1-based line.
    pub line: usize,
    /// 0-based column.
    pub column: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Warning/error channels of a running build.
///
/// The error channel is expected to abort the build once the current hook
/// returns; the warning channel is advisory.
pub trait BuildContext: Send + Sync {
    fn warn(&self, message: &str, loc: Option<Location>);
    fn error(&self, message: &str, loc: Option<Location>);
}

/// A diagnostic raised outside of a build context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct DiagnosticError {
    pub message: String,
    /// Originating file name.
    pub id: Option<String>,
    pub loc: Option<Location>,
    /// Rendered source frame around `loc`.
    pub frame: Option<String>,
}

impl DiagnosticError {
    /// Build the structured error for a single diagnostic.
    #[must_use]
    pub fn from_diagnostic(diagnostic: &Diagnostic) -> Self {
        let loc = location_of(diagnostic);
        let frame = match (&diagnostic.file, &loc) {
            (Some(file), Some(loc)) => Some(code_frame(file.text(), loc.line, loc.column)),
            _ => None,
        };
        Self {
            message: diagnostic.message(),
            id: diagnostic.file.as_ref().map(|f| f.file_name().to_string()),
            loc,
            frame,
        }
    }

    /// Multi-line human-readable rendering: location, message, frame.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        match (&self.loc, &self.id) {
            (Some(loc), _) => out.push_str(&format!("{loc}: ")),
            (None, Some(id)) => out.push_str(&format!("{id}: ")),
            (None, None) => {}
        }
        out.push_str(&self.message);
        if let Some(frame) = &self.frame {
            out.push('\n');
            out.push_str(frame);
        }
        out
    }
}

/// Location of a diagnostic, if it carries both a file and a start offset.
#[must_use]
pub fn location_of(diagnostic: &Diagnostic) -> Option<Location> {
    let file = diagnostic.file.as_ref()?;
    let start = diagnostic.start?;
    let lc = file.line_and_character_of_position(start);
    Some(Location {
        file: file.file_name().to_string(),
        line: lc.line + 1,
        column: lc.character,
    })
}

/// Forward diagnostics to a build context.
///
/// Errors go to the error channel, warnings to the warning channel, other
/// categories are dropped. Every diagnostic is traced at debug level.
pub fn report_diagnostics(diagnostics: &[Diagnostic], ctx: &dyn BuildContext) {
    for diagnostic in diagnostics {
        let message = diagnostic.message();
        let loc = location_of(diagnostic);
        tracing::debug!(
            code = diagnostic.code,
            category = diagnostic.category.as_str(),
            "{message}"
        );
        match diagnostic.category {
            DiagnosticCategory::Error => ctx.error(&message, loc),
            DiagnosticCategory::Warning => ctx.warn(&message, loc),
            DiagnosticCategory::Suggestion | DiagnosticCategory::Message => {}
        }
    }
}

/// Report diagnostics to `ctx`, or fail with the first one when there is no
/// build context.
pub fn print_diagnostics(
    diagnostics: &[Diagnostic],
    ctx: Option<&dyn BuildContext>,
) -> Result<(), DiagnosticError> {
    match ctx {
        Some(ctx) => {
            report_diagnostics(diagnostics, ctx);
            Ok(())
        }
        None => match diagnostics.first() {
            Some(first) => Err(DiagnosticError::from_diagnostic(first)),
            None => Ok(()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::SourceFile;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recorder {
        entries: Mutex<Vec<(&'static str, String, Option<Location>)>>,
    }

    impl BuildContext for Recorder {
        fn warn(&self, message: &str, loc: Option<Location>) {
            self.entries
                .lock()
                .unwrap()
                .push(("warn", message.to_string(), loc));
        }

        fn error(&self, message: &str, loc: Option<Location>) {
            self.entries
                .lock()
                .unwrap()
                .push(("error", message.to_string(), loc));
        }
    }

    fn mismatch() -> Diagnostic {
        let file = Arc::new(SourceFile::new(
            "/project/a.ts",
            "// header\nconst x: number = 'a';\n",
        ));
        Diagnostic::error(2322, "Type 'string' is not assignable to type 'number'.")
            .with_span(file, 16, 1)
    }

    #[test]
    fn test_location_is_one_based_line_zero_based_column() {
        let loc = location_of(&mismatch()).unwrap();
        assert_eq!(
            loc,
            Location {
                file: "/project/a.ts".to_string(),
                line: 2,
                column: 6,
            }
        );
    }

    #[test]
    fn test_offset_zero_still_has_location() {
        let file = Arc::new(SourceFile::new("a.ts", "}"));
        let diag = Diagnostic::error(1128, "Declaration or statement expected.").with_span(file, 0, 1);
        let loc = location_of(&diag).unwrap();
        assert_eq!((loc.line, loc.column), (1, 0));
    }

    #[test]
    fn test_no_location_without_file() {
        let diag = Diagnostic::error(5023, "Unknown compiler option 'foo'.");
        assert!(location_of(&diag).is_none());
    }

    #[test]
    fn test_context_routes_by_category() {
        let recorder = Recorder::default();
        let diagnostics = vec![
            mismatch(),
            Diagnostic::warning(6133, "'y' is declared but its value is never read."),
            Diagnostic::new(DiagnosticCategory::Suggestion, 80001, "File is a CommonJS module."),
            Diagnostic::new(DiagnosticCategory::Message, 6194, "Found 1 error."),
        ];

        print_diagnostics(&diagnostics, Some(&recorder)).unwrap();

        let entries = recorder.entries.lock().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, "error");
        assert_eq!(entries[0].2.as_ref().unwrap().line, 2);
        assert_eq!(entries[1].0, "warn");
        assert!(entries[1].2.is_none());
    }

    #[test]
    fn test_standalone_fails_with_first_diagnostic() {
        let diagnostics = vec![
            mismatch(),
            Diagnostic::error(5023, "Unknown compiler option 'foo'."),
        ];

        let err = print_diagnostics(&diagnostics, None).unwrap_err();
        assert_eq!(
            err.message,
            "Type 'string' is not assignable to type 'number'."
        );
        assert_eq!(err.id.as_deref(), Some("/project/a.ts"));
        assert_eq!(err.loc.as_ref().unwrap().column, 6);
        let frame = err.frame.unwrap();
        assert!(frame.contains("2: const x: number = 'a';"));
        assert!(frame.ends_with('^'));
    }

    #[test]
    fn test_standalone_without_file_has_null_fields() {
        let err = print_diagnostics(
            &[Diagnostic::error(5023, "Unknown compiler option 'foo'.")],
            None,
        )
        .unwrap_err();
        assert!(err.id.is_none());
        assert!(err.loc.is_none());
        assert!(err.frame.is_none());
        assert_eq!(err.render(), "Unknown compiler option 'foo'.");
    }

    #[test]
    fn test_standalone_empty_is_ok() {
        assert!(print_diagnostics(&[], None).is_ok());
    }

    #[test]
    fn test_error_serializes_with_nulls() {
        let err = DiagnosticError::from_diagnostic(&Diagnostic::error(5083, "Cannot read file."));
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["message"], "Cannot read file.");
        assert!(json["id"].is_null());
        assert!(json["loc"].is_null());
        assert!(json["frame"].is_null());
    }
}
