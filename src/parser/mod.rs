pub mod declarations;
pub mod languages;

use std::cell::RefCell;
use std::path::Path;

use thiserror::Error;
use tree_sitter::{Parser, Tree};

use declarations::{Declaration, extract_declarations};
use languages::Grammar;

/// Why a file produced no declarations.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unsupported file extension: {0:?}")]
    UnsupportedExtension(String),
    #[error("failed to load {grammar:?} grammar: {message}")]
    Grammar { grammar: Grammar, message: String },
    #[error("tree-sitter returned no tree for {0}")]
    NoTree(String),
}

// Thread-local Parser instances, one per rayon worker thread.
// Each Parser is initialised once per thread with the appropriate grammar.
thread_local! {
    static PARSER_TS: RefCell<Parser> = RefCell::new(new_parser(Grammar::TypeScript));
    static PARSER_TSX: RefCell<Parser> = RefCell::new(new_parser(Grammar::Tsx));
    static PARSER_JS: RefCell<Parser> = RefCell::new(new_parser(Grammar::JavaScript));
}

fn new_parser(grammar: Grammar) -> Parser {
    let mut parser = Parser::new();
    parser
        .set_language(&grammar.language())
        .expect("bundled grammar is ABI-compatible with tree-sitter");
    parser
}

fn grammar_for_path(path: &Path) -> Result<Grammar, ParseError> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    Grammar::for_extension(ext).ok_or_else(|| ParseError::UnsupportedExtension(ext.to_owned()))
}

/// Parse a source file and extract its declarations.
///
/// Allocates a fresh `Parser` on every call, suitable for single-file watcher
/// updates where the overhead is negligible. For bulk parsing use
/// [`parse_file_parallel`] instead.
///
/// Malformed source does not fail: tree-sitter recovers and the declarations it
/// can still see are returned.
///
/// # Errors
/// - the file extension has no grammar
/// - tree-sitter returns `None`
pub fn parse_file(path: &Path, source: &[u8]) -> Result<Vec<Declaration>, ParseError> {
    let grammar = grammar_for_path(path)?;
    let mut parser = Parser::new();
    parser
        .set_language(&grammar.language())
        .map_err(|e| ParseError::Grammar {
            grammar,
            message: e.to_string(),
        })?;
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| ParseError::NoTree(path.display().to_string()))?;
    Ok(extract_declarations(&tree, source))
}

/// Parse a source file using thread-local Parser instances (for rayon parallel use).
///
/// Same as [`parse_file`] but reuses a per-thread Parser instead of allocating a new one.
pub fn parse_file_parallel(path: &Path, source: &[u8]) -> Result<Vec<Declaration>, ParseError> {
    let grammar = grammar_for_path(path)?;
    let parse = |p: &RefCell<Parser>| -> Option<Tree> { p.borrow_mut().parse(source, None) };
    let tree = match grammar {
        Grammar::TypeScript => PARSER_TS.with(parse),
        Grammar::Tsx => PARSER_TSX.with(parse),
        Grammar::JavaScript => PARSER_JS.with(parse),
    };
    let tree = tree.ok_or_else(|| ParseError::NoTree(path.display().to_string()))?;
    Ok(extract_declarations(&tree, source))
}
