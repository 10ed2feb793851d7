use serde::{Deserialize, Serialize};

/// The kind of entity a graph node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// A source file. Spans the whole file.
    File,
    /// A function declaration or a variable initialised with a function/arrow expression.
    Function,
    /// A function-shaped declaration whose name starts with an uppercase letter.
    Component,
    /// A TypeScript interface declaration.
    Interface,
    /// A TypeScript type alias declaration.
    Type,
    /// Everything else: plain variables, classes, enums.
    Variable,
    /// Reserved for import entities; not populated by the indexer.
    Import,
}

impl NodeKind {
    /// Lowercase label used in summaries and context block headers.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::File => "file",
            NodeKind::Function => "function",
            NodeKind::Component => "component",
            NodeKind::Interface => "interface",
            NodeKind::Type => "type",
            NodeKind::Variable => "variable",
            NodeKind::Import => "import",
        }
    }
}

/// A line/column location. Lines are 1-based, columns 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// A node in the code graph: either a file or a named declaration within a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeNode {
    /// Deterministic id. The file path for File nodes, `path:name` (optionally
    /// scope-qualified, `path:outer:name`) for symbols.
    pub id: String,
    pub kind: NodeKind,
    pub name: String,
    pub file_path: String,
    pub start: Position,
    pub end: Position,
    /// `[name]` when the declaration is exported, empty otherwise.
    pub exports: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl CodeNode {
    /// Build the File node for `file_path` spanning `line_count` lines.
    pub fn file(file_path: &str, line_count: usize) -> Self {
        let name = std::path::Path::new(file_path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(file_path)
            .to_owned();
        Self {
            id: file_path.to_owned(),
            kind: NodeKind::File,
            name,
            file_path: file_path.to_owned(),
            start: Position::new(1, 0),
            end: Position::new(line_count, 0),
            exports: Vec::new(),
            summary: None,
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }
}

/// Compose a symbol id from its file, enclosing scope names (outermost first), and name.
pub fn symbol_id(file_path: &str, scope: &[String], name: &str) -> String {
    let mut id = String::with_capacity(file_path.len() + name.len() + 1);
    id.push_str(file_path);
    for segment in scope {
        id.push(':');
        id.push_str(segment);
    }
    id.push(':');
    id.push_str(name);
    id
}
