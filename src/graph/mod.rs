pub mod edge;
pub mod node;

use std::collections::{HashMap, HashSet};

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use edge::{CodeEdge, EdgeKind};
use node::{CodeNode, NodeKind};

/// Insertion-ordered copy of the graph returned to callers.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<CodeNode>,
    pub edges: Vec<CodeEdge>,
}

/// The in-memory code graph: an id-keyed node map plus an edge list.
///
/// The node map keeps insertion order. Overwriting an existing id replaces the
/// node in place, so its position (and therefore its rank tie-break) is stable
/// across reindexes.
#[derive(Debug, Default)]
pub struct GraphStore {
    nodes: IndexMap<String, CodeNode>,
    edges: Vec<CodeEdge>,
    /// File id -> ids it has `Defines` edges to, in first-append order.
    defined: HashMap<String, IndexSet<String>>,
}

impl GraphStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `node`, or overwrite the node with the same id in place.
    pub fn upsert_node(&mut self, node: CodeNode) {
        self.nodes.insert(node.id.clone(), node);
    }

    /// Append `edge` to the edge list. No integrity or duplicate check.
    pub fn append_edge(&mut self, edge: CodeEdge) {
        if edge.kind == EdgeKind::Defines {
            self.defined
                .entry(edge.source_id.clone())
                .or_default()
                .insert(edge.target_id.clone());
        }
        self.edges.push(edge);
    }

    /// Copy of every node (insertion order) and edge.
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes.values().cloned().collect(),
            edges: self.edges.clone(),
        }
    }

    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&CodeNode> {
        self.nodes.get(id)
    }

    /// Iterate nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &CodeNode> {
        self.nodes.values()
    }

    pub fn edges(&self) -> &[CodeEdge] {
        &self.edges
    }

    /// Ids of every node the file `file_id` has a `Defines` edge to.
    pub fn defined_by(&self, file_id: &str) -> Vec<String> {
        self.defined
            .get(file_id)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// True when `file_id` already has a `Defines` edge to `symbol_id`.
    pub fn defines(&self, file_id: &str, symbol_id: &str) -> bool {
        self.defined
            .get(file_id)
            .is_some_and(|ids| ids.contains(symbol_id))
    }

    /// Remove the nodes in `ids` together with every edge touching them.
    ///
    /// Returns the number of nodes actually removed.
    pub fn retract_nodes(&mut self, ids: &HashSet<String>) -> usize {
        if ids.is_empty() {
            return 0;
        }
        let mut removed = 0;
        for id in ids {
            if self.nodes.shift_remove(id).is_some() {
                removed += 1;
            }
        }
        self.edges
            .retain(|e| !ids.contains(&e.source_id) && !ids.contains(&e.target_id));
        self.defined.retain(|source, targets| {
            targets.retain(|t| !ids.contains(t));
            !ids.contains(source) && !targets.is_empty()
        });
        removed
    }

    /// Remove the File node for `file_path` and every node it defines.
    ///
    /// Returns the number of nodes removed (0 when the file was never indexed).
    pub fn remove_file(&mut self, file_path: &str) -> usize {
        let mut ids: HashSet<String> = self.defined_by(file_path).into_iter().collect();
        ids.insert(file_path.to_owned());
        self.retract_nodes(&ids)
    }

    /// Number of File nodes.
    pub fn file_count(&self) -> usize {
        self.nodes.values().filter(|n| n.is_file()).count()
    }

    /// Number of non-File nodes.
    pub fn symbol_count(&self) -> usize {
        self.nodes.values().filter(|n| !n.is_file()).count()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Count of nodes broken down by kind.
    pub fn counts_by_kind(&self) -> HashMap<NodeKind, usize> {
        let mut map: HashMap<NodeKind, usize> = HashMap::new();
        for node in self.nodes.values() {
            *map.entry(node.kind).or_insert(0) += 1;
        }
        map
    }
}
