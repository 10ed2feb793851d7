pub mod context;
pub mod keywords;
pub mod rank;

use tokio::sync::RwLock;
use tracing::debug;

use crate::graph::GraphStore;
use crate::graph::node::CodeNode;

use context::assemble_context;
use keywords::extract_keywords;
use rank::rank;

/// Top-ranked nodes for `prompt` against the current store contents.
pub fn top_nodes(store: &GraphStore, prompt: &str) -> Vec<CodeNode> {
    let keywords = extract_keywords(prompt);
    let ranked = rank(store.nodes(), &keywords);
    debug!(
        keywords = ?keywords,
        hits = ranked.len(),
        "ranked prompt against graph"
    );
    ranked.into_iter().map(|r| r.node).collect()
}

/// Analyzer -> Ranker -> Assembler for one prompt.
///
/// The read lock is held only while ranking; excerpt reads happen after it is
/// released so watcher writes are never blocked on file I/O.
pub async fn context_for_prompt(
    store: &RwLock<GraphStore>,
    prompt: &str,
    max_bytes: Option<usize>,
) -> String {
    let nodes = {
        let guard = store.read().await;
        top_nodes(&guard, prompt)
    };
    assemble_context(&nodes, max_bytes).await
}
