//! Compiler engine abstraction.
//!
//! The plugin never calls swc directly. It talks to a [`CompilerEngine`],
//! which offers two services:
//!
//! 1. **Whole-program analysis** - [`CompilerEngine::create_program`] builds a
//!    [`Program`] over a set of root files and answers pre-emit diagnostics
//!    for any file in it
//! 2. **Single-file transpilation** - [`CompilerEngine::transpile_module`]
//!    turns one file's text into JavaScript (plus an optional source map)
//!    without looking at any other file
//!
//! ## Usage
//!
//! ```ignore
//! use tsplugin_core::compiler::{CompilerEngine, SwcEngine};
//! use tsplugin_core::config::CompilerOptions;
//!
//! let engine = SwcEngine::new();
//! let options = CompilerOptions::baseline();
//! let output = engine.transpile_module("const x: number = 1;", "a.ts", &options)?;
//! println!("{}", output.code);
//! ```

mod check;
mod parse;
mod program;
mod swc;

pub use program::SwcProgram;
pub use swc::SwcEngine;

use crate::config::CompilerOptions;
use crate::diagnostics::{Diagnostic, SourceFile};
use std::fmt;
use std::sync::Arc;

/// Diagnostic codes produced by the engine itself.
pub mod codes {
    /// Generic syntax error reported by the parser.
    pub const SYNTAX_ERROR: u32 = 1005;
    /// `Type 'A' is not assignable to type 'B'.`
    pub const NOT_ASSIGNABLE: u32 = 2322;
    /// `Cannot find module '{0}' or its corresponding type declarations.`
    pub const CANNOT_FIND_MODULE: u32 = 2307;
    /// `File '{0}' not found.`
    pub const FILE_NOT_FOUND: u32 = 6053;
    /// The requested `module` kind is emitted as ES modules instead.
    pub const MODULE_KIND_IGNORED: u32 = 90001;
    /// The requested `target` is below what the emitter can lower to.
    pub const TARGET_NOT_LOWERED: u32 = 90002;
}

/// Result of transpiling one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranspileOutput {
    /// Transpiled JavaScript code.
    pub code: String,
    /// Source map JSON text (if generated).
    pub source_map: Option<String>,
    /// Non-fatal engine diagnostics.
    pub diagnostics: Vec<Diagnostic>,
}

impl TranspileOutput {
    /// Create a new transpile output.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            source_map: None,
            diagnostics: Vec::new(),
        }
    }

    /// Set the source map.
    #[must_use]
    pub fn with_source_map(mut self, source_map: impl Into<String>) -> Self {
        self.source_map = Some(source_map.into());
        self
    }

    /// Add diagnostics.
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Vec<Diagnostic>) -> Self {
        self.diagnostics = diagnostics;
        self
    }
}

/// Error during compilation.
#[derive(Debug)]
pub struct CompilerError {
    /// Error code.
    pub code: &'static str,
    /// Human-readable error message.
    pub message: String,
    /// Compiler diagnostics (if available).
    pub diagnostics: Vec<Diagnostic>,
}

impl CompilerError {
    /// Create a new compiler error.
    #[must_use]
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            diagnostics: Vec::new(),
        }
    }

    /// Create an error with diagnostics.
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Vec<Diagnostic>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Create a parse error.
    #[must_use]
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new("COMPILER_PARSE_ERROR", message)
    }

    /// Create an emit error.
    #[must_use]
    pub fn emit_error(message: impl Into<String>) -> Self {
        Self::new("COMPILER_EMIT_ERROR", message)
    }
}

impl fmt::Display for CompilerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        for diag in &self.diagnostics {
            write!(f, "\n  - {diag}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CompilerError {}

/// A whole-program context built once over a fixed set of root files.
///
/// File names are absolute, lexically normalized paths.
pub trait Program: Send + Sync {
    /// Root file names the program was created with, in order.
    fn root_names(&self) -> &[String];

    /// Every file the program loaded: roots plus files reached by imports.
    fn source_files(&self) -> Vec<Arc<SourceFile>>;

    /// Look up a loaded file by name.
    fn source_file(&self, file_name: &str) -> Option<Arc<SourceFile>>;

    /// Syntactic, global and semantic diagnostics for one file.
    fn pre_emit_diagnostics(&self, file: &SourceFile) -> Vec<Diagnostic>;
}

/// Compiler engine trait.
///
/// Implementations are `Send + Sync` so one engine can serve concurrent
/// transform calls.
pub trait CompilerEngine: Send + Sync {
    /// Get the engine name (e.g., "swc").
    fn name(&self) -> &'static str;

    /// Build a program over `root_names`. Missing files become diagnostics,
    /// never errors. Blocks on file I/O.
    fn create_program(&self, root_names: &[String], options: &CompilerOptions)
        -> Arc<dyn Program>;

    /// Transpile one file in isolation.
    ///
    /// # Errors
    ///
    /// Returns a `CompilerError` if the source has syntax errors or emit
    /// fails.
    fn transpile_module(
        &self,
        source: &str,
        file_name: &str,
        options: &CompilerOptions,
    ) -> Result<TranspileOutput, CompilerError>;
}
