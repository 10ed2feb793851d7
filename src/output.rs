use serde::Serialize;

use crate::graph::GraphStore;
use crate::graph::node::NodeKind;

/// Aggregate statistics produced by an indexing run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct IndexStats {
    pub file_count: usize,
    pub functions: usize,
    pub components: usize,
    pub interfaces: usize,
    pub types: usize,
    pub variables: usize,
    pub edges: usize,
    /// Files that could not be read, or whose parse failed (File node only).
    pub skipped: usize,
    /// Wall-clock time for the indexing run in seconds.
    pub elapsed_secs: f64,
}

impl IndexStats {
    /// Count the store's contents. `skipped` and `elapsed_secs` come from the run.
    pub fn from_store(store: &GraphStore, skipped: usize, elapsed_secs: f64) -> Self {
        let by_kind = store.counts_by_kind();
        let count = |kind: NodeKind| by_kind.get(&kind).copied().unwrap_or(0);
        Self {
            file_count: count(NodeKind::File),
            functions: count(NodeKind::Function),
            components: count(NodeKind::Component),
            interfaces: count(NodeKind::Interface),
            types: count(NodeKind::Type),
            variables: count(NodeKind::Variable),
            edges: store.edge_count(),
            skipped,
            elapsed_secs,
        }
    }

    pub fn symbol_count(&self) -> usize {
        self.functions + self.components + self.interfaces + self.types + self.variables
    }
}

/// Print a summary of the indexing run.
///
/// - `json = true`: emit a pretty-printed JSON object to stdout.
/// - `json = false`: emit a cargo-style human-readable summary to stdout.
///
/// If `stats.skipped > 0`, a warning line is written to **stderr** so that
/// the stdout stream remains clean for downstream JSON consumers.
pub fn print_summary(stats: &IndexStats, json: bool) {
    if json {
        match serde_json::to_string_pretty(stats) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("error serialising stats: {}", e),
        }
        return;
    }

    println!(
        "Indexed {} files in {:.2}s",
        stats.file_count, stats.elapsed_secs
    );
    println!("  {} symbols", stats.symbol_count());
    println!(
        "    {} functions, {} components, {} interfaces, {} types, {} variables",
        stats.functions, stats.components, stats.interfaces, stats.types, stats.variables
    );
    println!("  {} edges", stats.edges);

    if stats.skipped > 0 {
        eprintln!("  {} files skipped (read or parse errors)", stats.skipped);
    }
}
