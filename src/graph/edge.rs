use serde::{Deserialize, Serialize};

/// The kind of directed edge between two nodes in the code graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeKind {
    /// File -> Symbol: the file declares this symbol.
    Defines,
    /// File -> File. Reserved, not populated.
    Imports,
    /// Symbol -> Symbol. Reserved, not populated.
    Uses,
    /// Symbol -> Symbol. Reserved, not populated.
    Extends,
}

/// A directed relationship between two graph nodes, referenced by id.
///
/// Edges are not checked for referential integrity; a dangling edge is possible
/// when the target node was never created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodeEdge {
    pub source_id: String,
    pub target_id: String,
    pub kind: EdgeKind,
}

impl CodeEdge {
    pub fn defines(file_id: &str, symbol_id: &str) -> Self {
        Self {
            source_id: file_id.to_owned(),
            target_id: symbol_id.to_owned(),
            kind: EdgeKind::Defines,
        }
    }
}
