use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Incremental code graph for TypeScript/JavaScript projects.
///
/// code-context indexes a project into file and symbol nodes and assembles the
/// source excerpts most relevant to a free-text prompt.
#[derive(Parser, Debug)]
#[command(
    name = "code-context",
    version,
    about,
    long_about = None,
    propagate_version = true,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Index a project directory once and print a summary.
    Index {
        /// Path to the project root to index.
        path: PathBuf,

        /// Print each discovered file path during indexing.
        #[arg(short, long)]
        verbose: bool,

        /// Output the summary as JSON instead of human-readable text.
        #[arg(long)]
        json: bool,

        /// Print the full graph (nodes and edges) as JSON instead of a summary.
        #[arg(long, conflicts_with = "json")]
        graph: bool,
    },

    /// Print the context document assembled for a prompt.
    Context {
        /// Free-text prompt, e.g. "rename getUser".
        prompt: String,

        /// Path to the project root to index and query.
        path: PathBuf,
    },

    /// Print the instruction document a plan generator would receive for a prompt.
    Instruction {
        /// Free-text prompt.
        prompt: String,

        /// Path to the project root to index and query.
        path: PathBuf,
    },

    /// Index a project and keep the graph current until interrupted.
    Watch {
        /// Path to the project root to watch.
        path: PathBuf,
    },
}
