//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Generate Markdown API docs for PHP codebases with a language model
#[derive(Parser, Debug)]
#[command(name = "docscribe")]
#[command(about = "Generate Markdown API docs for PHP codebases with a language model")]
#[command(version)]
pub struct Args {
    /// Debug-level diagnostics
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extract classes and generate the documentation file
    Generate {
        /// Source directory (defaults to `source.root`, usually ./src)
        path: Option<PathBuf>,

        /// Output Markdown file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Completion backend (command, ollama, openai, echo)
        #[arg(long)]
        provider: Option<String>,

        /// Model name passed to the backend
        #[arg(short, long)]
        model: Option<String>,

        /// Glob patterns to exclude, relative to the source root (can be repeated)
        #[arg(long)]
        exclude: Vec<String>,

        /// Send real method bodies instead of skeletons
        #[arg(long)]
        include_source: bool,

        /// Stop at the first backend failure
        #[arg(long)]
        fail_fast: bool,

        /// Show progress bars
        #[arg(long)]
        progress: bool,
    },

    /// Print extracted classes and methods as JSON
    Extract {
        /// Source directory (defaults to `source.root`, usually ./src)
        path: Option<PathBuf>,

        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Glob patterns to exclude (can be repeated)
        #[arg(long)]
        exclude: Vec<String>,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Show version information
    Version,
}
