#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]

pub mod bundler;
pub mod compiler;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod paths;
pub mod typescript;
pub mod version;

pub use bundler::{
    BuildLog, HookResult, InputOption, InputOptions, LogLevel, Plugin, PluginContainer,
    PluginContext, PluginError, ResolveIdResult, TransformResult,
};
pub use compiler::{CompilerEngine, CompilerError, Program, SwcEngine, TranspileOutput};
pub use config::{resolve_compiler_options, CompilerOptions, CONFIG_FILE_NAME};
pub use diagnostics::{
    print_diagnostics, report_diagnostics, BuildContext, Diagnostic, DiagnosticCategory,
    DiagnosticError, Location, SourceFile,
};
pub use error::Error;
pub use typescript::{TypeScriptPlugin, TypeScriptPluginOptions};
pub use version::VERSION;
