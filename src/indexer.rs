use std::collections::HashSet;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::graph::GraphStore;
use crate::graph::edge::CodeEdge;
use crate::graph::node::{CodeNode, symbol_id};
use crate::parser::declarations::Declaration;
use crate::parser::{self, ParseError};

/// Signature shared by [`parser::parse_file`] and [`parser::parse_file_parallel`].
pub type ParseFn = fn(&Path, &[u8]) -> Result<Vec<Declaration>, ParseError>;

/// Everything one file contributes to the graph, built off-lock and applied later.
#[derive(Debug)]
pub struct FileIndex {
    /// The File node, present even when parsing failed.
    pub file: CodeNode,
    /// Symbol nodes in source order. Same-id entries are kept; the last one wins on apply.
    pub symbols: Vec<CodeNode>,
    /// Set when the parser rejected the file.
    pub parse_error: Option<ParseError>,
}

/// What applying a [`FileIndex`] changed in the store.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub symbols: usize,
    pub retracted: usize,
    pub parse_failed: bool,
}

/// Number of `\n`-separated segments. An empty file counts as one line.
pub fn line_count(text: &str) -> usize {
    text.split('\n').count()
}

fn symbol_node(file_path: &str, decl: Declaration) -> CodeNode {
    let kind = decl.shape.classify(&decl.name);
    let exports = if decl.exported {
        vec![decl.name.clone()]
    } else {
        Vec::new()
    };
    CodeNode {
        id: symbol_id(file_path, &decl.scope, &decl.name),
        kind,
        name: decl.name,
        file_path: file_path.to_owned(),
        start: decl.start,
        end: decl.end,
        exports,
        summary: None,
    }
}

impl FileIndex {
    /// Parse `text` with a fresh parser.
    pub fn build(file_path: &str, text: &str) -> Self {
        Self::build_with(file_path, text, parser::parse_file)
    }

    /// Parse `text` with `parse`, producing the File node and symbol nodes.
    ///
    /// Parse failures are logged and yield a File node with no symbols.
    pub fn build_with(file_path: &str, text: &str, parse: ParseFn) -> Self {
        let file = CodeNode::file(file_path, line_count(text));
        match parse(Path::new(file_path), text.as_bytes()) {
            Ok(decls) => Self {
                file,
                symbols: decls
                    .into_iter()
                    .map(|d| symbol_node(file_path, d))
                    .collect(),
                parse_error: None,
            },
            Err(err) => {
                warn!(path = file_path, error = %err, "parse failed, keeping file node only");
                Self {
                    file,
                    symbols: Vec::new(),
                    parse_error: Some(err),
                }
            }
        }
    }

    /// Write this file's nodes and `Defines` edges into `store`.
    ///
    /// Symbols the file defined before but no longer declares are retracted, and
    /// an edge that already exists is not appended again, so applying the same
    /// content twice leaves the store unchanged.
    pub fn apply(self, store: &mut GraphStore) -> ApplyOutcome {
        let file_id = self.file.id.clone();
        let mut stale: HashSet<String> = store.defined_by(&file_id).into_iter().collect();
        let parse_failed = self.parse_error.is_some();

        store.upsert_node(self.file);

        let mut symbols = 0;
        for node in self.symbols {
            let id = node.id.clone();
            store.upsert_node(node);
            if !store.defines(&file_id, &id) {
                store.append_edge(CodeEdge::defines(&file_id, &id));
            }
            stale.remove(&id);
            symbols += 1;
        }

        let retracted = store.retract_nodes(&stale);
        debug!(path = %file_id, symbols, retracted, "file indexed");

        ApplyOutcome {
            symbols,
            retracted,
            parse_failed,
        }
    }
}

/// Index one file's full text into `store`.
pub fn index_file(store: &mut GraphStore, file_path: &str, text: &str) -> ApplyOutcome {
    FileIndex::build(file_path, text).apply(store)
}

/// Result of reading and parsing a batch of files.
#[derive(Debug, Default)]
pub struct ScanResult {
    /// One entry per readable file, in input order.
    pub indexes: Vec<FileIndex>,
    /// Files that could not be read as UTF-8 text.
    pub unreadable: usize,
}

/// Read and parse `files` in parallel (rayon + thread-local parsers).
///
/// Output order matches input order, so applying the result sequentially
/// gives the same store as indexing the files one by one.
pub fn scan_files(files: &[PathBuf]) -> ScanResult {
    let results: Vec<Option<FileIndex>> = files
        .par_iter()
        .map(|path| {
            let file_path = path.to_string_lossy();
            match std::fs::read_to_string(path) {
                Ok(text) => Some(FileIndex::build_with(
                    &file_path,
                    &text,
                    parser::parse_file_parallel,
                )),
                Err(err) => {
                    warn!(path = %file_path, error = %err, "skipping unreadable file");
                    None
                }
            }
        })
        .collect();

    let unreadable = results.iter().filter(|r| r.is_none()).count();
    ScanResult {
        indexes: results.into_iter().flatten().collect(),
        unreadable,
    }
}

impl ScanResult {
    /// Apply every index to `store` in order. Returns the number of files whose parse failed.
    pub fn apply(self, store: &mut GraphStore) -> usize {
        self.indexes
            .into_iter()
            .map(|index| index.apply(store))
            .filter(|outcome| outcome.parse_failed)
            .count()
    }
}
