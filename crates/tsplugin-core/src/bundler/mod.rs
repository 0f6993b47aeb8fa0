//! Bundler-facing plugin host.
//!
//! The bundler itself (module graph, chunking, output) lives elsewhere; this
//! module is the seam it talks to.
//!
//! ## Architecture
//!
//! 1. **Options** - `options` hook receives the declared entry inputs
//! 2. **Resolution** - `resolve_id` hooks map specifiers to file paths
//! 3. **Transform** - `transform` hooks rewrite module source
//! 4. **Logs** - hooks report warnings/errors on the [`PluginContext`];
//!    a recorded error fails the build

mod input;
mod plugin;
pub mod resolve;

pub use input::{InputOption, InputOptions};
pub use plugin::{
    BuildLog, HookResult, LogLevel, Plugin, PluginContainer, PluginContext, PluginError,
    ResolveIdResult, TransformResult,
};
pub use resolve::resolve_typescript_import;
