use tracing::{debug, info};

use crate::graph::GraphStore;
use crate::indexer::{ApplyOutcome, FileIndex};

use super::event::WatchEvent;

/// A watch event turned into a store mutation, prepared without holding the store lock.
#[derive(Debug)]
pub enum PreparedChange {
    /// Replace the file's entry with a freshly parsed one.
    Reindex(FileIndex),
    /// Retract the file and everything it defines.
    Remove(String),
}

/// What applying a [`PreparedChange`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOutcome {
    Reindexed(ApplyOutcome),
    Removed { nodes: usize },
}

/// Read and parse the file behind `event`. Blocking; run it off the async runtime.
///
/// A changed file that cannot be read any more (deleted between the event and
/// this call) becomes a removal.
pub fn prepare(event: &WatchEvent) -> PreparedChange {
    match event {
        WatchEvent::Changed(path) => {
            let file_path = path.to_string_lossy().into_owned();
            match std::fs::read_to_string(path) {
                Ok(text) => PreparedChange::Reindex(FileIndex::build(&file_path, &text)),
                Err(err) => {
                    debug!(path = %file_path, error = %err, "changed file unreadable, removing");
                    PreparedChange::Remove(file_path)
                }
            }
        }
        WatchEvent::Removed(path) => PreparedChange::Remove(path.to_string_lossy().into_owned()),
    }
}

/// Apply a prepared change to `store`.
pub fn apply(store: &mut GraphStore, change: PreparedChange) -> ChangeOutcome {
    match change {
        PreparedChange::Reindex(index) => {
            let path = index.file.id.clone();
            let outcome = index.apply(store);
            info!(path = %path, symbols = outcome.symbols, "reindexed");
            ChangeOutcome::Reindexed(outcome)
        }
        PreparedChange::Remove(path) => {
            let nodes = store.remove_file(&path);
            info!(path = %path, nodes, "removed");
            ChangeOutcome::Removed { nodes }
        }
    }
}
