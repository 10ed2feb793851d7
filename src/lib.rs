//! Incremental code knowledge graph for TypeScript/JavaScript projects.
//!
//! A [`ProjectSession`] scans a project tree into a [`GraphStore`] of file and
//! symbol nodes, keeps it current from filesystem events, and answers free-text
//! prompts with a context document of the most relevant source excerpts.

pub mod config;
pub mod graph;
pub mod indexer;
pub mod logging;
pub mod output;
pub mod parser;
pub mod planning;
pub mod query;
pub mod session;
pub mod walker;
pub mod watcher;

use std::path::Path;
use std::time::Instant;

pub use config::CodeContextConfig;
pub use graph::{GraphSnapshot, GraphStore};
pub use output::IndexStats;
pub use planning::{Plan, PlanGenerator, PlanStep, PlanningPipeline, StepKind};
pub use session::ProjectSession;

/// Scan `root` once into a fresh store, without watching.
pub fn build_graph(root: &Path, config: &CodeContextConfig, verbose: bool) -> (GraphStore, IndexStats) {
    let start = Instant::now();
    let files = walker::walk_project(root, config, verbose);
    let scan = indexer::scan_files(&files);
    let unreadable = scan.unreadable;

    let mut store = GraphStore::new();
    let parse_failed = scan.apply(&mut store);
    let stats = IndexStats::from_store(
        &store,
        unreadable + parse_failed,
        start.elapsed().as_secs_f64(),
    );
    (store, stats)
}
