#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]

mod commands;
mod logging;

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tsplugin")]
#[command(author, version, about = "Type-check and transpile TypeScript the way the bundler plugin does", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output (stable, machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Override the working directory
    #[arg(long, global = true, value_name = "PATH")]
    cwd: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print version information
    Version,

    /// Declare entry inputs and type-check each of them
    Check {
        /// Entry files, relative to the working directory
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Inline compiler options as a JSON object (replaces tsconfig.json)
        #[arg(long, value_name = "JSON")]
        compiler_options: Option<String>,

        /// Also check files that are not part of the program
        #[arg(long)]
        check_unlisted: bool,
    },

    /// Transpile one file and print the emitted code
    Transform {
        /// File to transform
        file: String,

        /// Also print the source map
        #[arg(long)]
        map: bool,

        /// Inline compiler options as a JSON object (replaces tsconfig.json)
        #[arg(long, value_name = "JSON")]
        compiler_options: Option<String>,
    },

    /// Resolve an import specifier the way the plugin would
    Resolve {
        /// Import specifier, e.g. "./util"
        specifier: String,

        /// Importing file
        #[arg(long, value_name = "IMPORTER")]
        from: String,
    },

    /// Print the finalized compiler options
    ShowConfig {
        /// Inline compiler options as a JSON object (replaces tsconfig.json)
        #[arg(long, value_name = "JSON")]
        compiler_options: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Determine working directory
    let cwd = cli
        .cwd
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    let command = match cli.command {
        Some(Commands::Version) | None => return commands::version::run(),
        Some(command) => command,
    };

    logging::init(cli.verbose, cli.json);

    let runtime = tokio::runtime::Runtime::new().into_diagnostic()?;
    let ok = match command {
        Commands::Version => true,
        Commands::Check {
            inputs,
            compiler_options,
            check_unlisted,
        } => runtime.block_on(commands::check::run(
            &cwd,
            inputs,
            compiler_options.as_deref(),
            check_unlisted,
            cli.json,
        ))?,
        Commands::Transform {
            file,
            map,
            compiler_options,
        } => runtime.block_on(commands::transform::run(
            &cwd,
            &file,
            map,
            compiler_options.as_deref(),
            cli.json,
        ))?,
        Commands::Resolve { specifier, from } => {
            runtime.block_on(commands::resolve::run(&cwd, &specifier, &from, cli.json))?
        }
        Commands::ShowConfig { compiler_options } => runtime.block_on(
            commands::show_config::run(&cwd, compiler_options.as_deref(), cli.json),
        )?,
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
