//! Compiler diagnostics and the source text they point into.
//!
//! A [`Diagnostic`] is produced by the compiler engine (or by config parsing)
//! and consumed exactly once by the reporter in [`report`], which either
//! forwards it to a build context or turns it into a [`DiagnosticError`].

pub mod frame;
pub mod report;

pub use frame::code_frame;
pub use report::{
    location_of, print_diagnostics, report_diagnostics, BuildContext, DiagnosticError, Location,
};

use std::fmt;
use std::sync::Arc;

/// Platform newline used when flattening message chains.
pub const NEW_LINE: &str = if cfg!(windows) { "\r\n" } else { "\n" };

/// Diagnostic category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCategory {
    Warning,
    Error,
    Suggestion,
    Message,
}

impl DiagnosticCategory {
    /// Get the string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Suggestion => "suggestion",
            Self::Message => "message",
        }
    }
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One link of a nested diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageChain {
    pub message_text: String,
    pub next: Vec<MessageChain>,
}

impl MessageChain {
    #[must_use]
    pub fn new(message_text: impl Into<String>) -> Self {
        Self {
            message_text: message_text.into(),
            next: Vec::new(),
        }
    }

    /// Append a nested message.
    #[must_use]
    pub fn with_next(mut self, next: MessageChain) -> Self {
        self.next.push(next);
        self
    }
}

/// Diagnostic message text: either plain or a nested chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticMessage {
    Text(String),
    Chain(MessageChain),
}

impl From<String> for DiagnosticMessage {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for DiagnosticMessage {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<MessageChain> for DiagnosticMessage {
    fn from(chain: MessageChain) -> Self {
        Self::Chain(chain)
    }
}

/// Flatten a possibly nested message into a single string.
///
/// Every nested level starts on a new line, indented two spaces per depth.
#[must_use]
pub fn flatten_message_text(message: &DiagnosticMessage, new_line: &str) -> String {
    match message {
        DiagnosticMessage::Text(text) => text.clone(),
        DiagnosticMessage::Chain(chain) => {
            let mut out = String::new();
            flatten_chain(chain, new_line, 0, &mut out);
            out
        }
    }
}

fn flatten_chain(chain: &MessageChain, new_line: &str, indent: usize, out: &mut String) {
    if indent > 0 {
        out.push_str(new_line);
        for _ in 0..indent {
            out.push_str("  ");
        }
    }
    out.push_str(&chain.message_text);
    for next in &chain.next {
        flatten_chain(next, new_line, indent + 1, out);
    }
}

/// Zero-based line and character of a position in a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineAndCharacter {
    pub line: usize,
    pub character: usize,
}

/// A source file known to the compiler, with a lazily usable line index.
///
/// Positions are byte offsets into `text`; characters are counted in
/// Unicode scalar values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    file_name: String,
    text: String,
    line_starts: Vec<usize>,
}

impl SourceFile {
    #[must_use]
    pub fn new(file_name: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let mut line_starts = vec![0];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            file_name: file_name.into(),
            text,
            line_starts,
        }
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether this is a `.d.ts` declaration file.
    #[must_use]
    pub fn is_declaration_file(&self) -> bool {
        self.file_name.ends_with(".d.ts")
    }

    /// Convert a byte offset into a zero-based line and character.
    ///
    /// Offsets past the end clamp to the end of the text.
    #[must_use]
    pub fn line_and_character_of_position(&self, position: usize) -> LineAndCharacter {
        let position = position.min(self.text.len());
        let line = match self.line_starts.binary_search(&position) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let start = self.line_starts[line];
        let character = self.text[start..]
            .char_indices()
            .take_while(|(i, _)| start + i < position)
            .count();
        LineAndCharacter { line, character }
    }

    /// Convert a zero-based line and character back into a byte offset.
    #[must_use]
    pub fn position_of_line_and_character(&self, line: usize, character: usize) -> usize {
        let Some(&start) = self.line_starts.get(line) else {
            return self.text.len();
        };
        self.text[start..]
            .char_indices()
            .nth(character)
            .map_or(self.text.len(), |(i, _)| start + i)
    }
}

/// A compiler diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    /// Numeric diagnostic code (e.g. 2322).
    pub code: u32,
    pub message_text: DiagnosticMessage,
    pub file: Option<Arc<SourceFile>>,
    /// Byte offset of the diagnostic start in `file`.
    pub start: Option<usize>,
    pub length: Option<usize>,
}

impl Diagnostic {
    #[must_use]
    pub fn new(
        category: DiagnosticCategory,
        code: u32,
        message_text: impl Into<DiagnosticMessage>,
    ) -> Self {
        Self {
            category,
            code,
            message_text: message_text.into(),
            file: None,
            start: None,
            length: None,
        }
    }

    /// Create a new error diagnostic.
    #[must_use]
    pub fn error(code: u32, message_text: impl Into<DiagnosticMessage>) -> Self {
        Self::new(DiagnosticCategory::Error, code, message_text)
    }

    /// Create a new warning diagnostic.
    #[must_use]
    pub fn warning(code: u32, message_text: impl Into<DiagnosticMessage>) -> Self {
        Self::new(DiagnosticCategory::Warning, code, message_text)
    }

    /// Attach a source span.
    #[must_use]
    pub fn with_span(mut self, file: Arc<SourceFile>, start: usize, length: usize) -> Self {
        self.file = Some(file);
        self.start = Some(start);
        self.length = Some(length);
        self
    }

    /// Attach a file without a position.
    #[must_use]
    pub fn with_file(mut self, file: Arc<SourceFile>) -> Self {
        self.file = Some(file);
        self
    }

    /// The flattened message text.
    #[must_use]
    pub fn message(&self) -> String {
        flatten_message_text(&self.message_text, NEW_LINE)
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(loc) = location_of(self) {
            write!(f, "{}({},{}): ", loc.file, loc.line, loc.column + 1)?;
        }
        write!(
            f,
            "{} TS{}: {}",
            self.category,
            self.code,
            self.message()
        )
    }
}
