//! nbmdx CLI - Notebook to MDX documentation toolchain.
//!
//! Provides commands for:
//! - `build`: Convert changed notebooks in a directory to markdown
//! - `convert`: Convert a single notebook
//! - `check`: Check front matter and length of generated docs

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{BuildArgs, CheckArgs, ConvertArgs};
use output::Output;

/// nbmdx - Notebook to MDX documentation toolchain.
#[derive(Parser)]
#[command(name = "nbmdx", version, about)]
struct Cli {
    /// Enable verbose output (log every converted notebook).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert notebooks that changed since the last build.
    Build(BuildArgs),
    /// Convert a single notebook.
    Convert(ConvertArgs),
    /// Check generated markdown files.
    Check(CheckArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Build(args) => args.execute(),
        Commands::Convert(args) => args.execute(),
        Commands::Check(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
