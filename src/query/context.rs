use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;

use tracing::{debug, warn};

use crate::graph::node::CodeNode;

/// First line of every context document.
pub const CONTEXT_HEADER: &str = "Relevant code from the project:";

/// True when `document` carries no excerpts (header only, or empty).
///
/// Callers must read this as "no context", not as a failure.
pub fn is_empty_context(document: &str) -> bool {
    let trimmed = document.trim();
    trimmed.is_empty() || trimmed == CONTEXT_HEADER
}

/// Lines `[start.line - 1, end.line)` of `content`, joined with `\n`.
///
/// Out-of-range bounds are clamped, so a node that outlived an edit to its file
/// yields a shorter (possibly empty) excerpt instead of an error.
pub fn excerpt(content: &str, node: &CodeNode) -> String {
    let lines: Vec<&str> = content.split('\n').collect();
    let start = node.start.line.saturating_sub(1).min(lines.len());
    let end = node.end.line.min(lines.len());
    if start >= end {
        return String::new();
    }
    lines[start..end].join("\n")
}

fn fence_language(file_path: &str) -> &str {
    Path::new(file_path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
}

fn excerpt_block(node: &CodeNode, body: &str) -> String {
    format!(
        "\n\n// {} ({} {}, lines {}-{})\n```{}\n{}\n```",
        node.file_path,
        node.kind.as_str(),
        node.name,
        node.start.line,
        node.end.line,
        fence_language(&node.file_path),
        body
    )
}

fn unreadable_block(node: &CodeNode, reason: &str) -> String {
    format!(
        "\n\n// {} ({} {})\n[content could not be read: {}]",
        node.file_path,
        node.kind.as_str(),
        node.name,
        reason
    )
}

/// Build the context document for `nodes`, in order.
///
/// Each node's file is read and the node's line range appended as a fenced,
/// path-labelled block. A file that cannot be read becomes a placeholder block
/// and assembly continues. When `max_bytes` is set, assembly stops before the
/// first block that would push the document past it and a truncation note is
/// appended instead.
pub async fn assemble_context(nodes: &[CodeNode], max_bytes: Option<usize>) -> String {
    let mut document = String::from(CONTEXT_HEADER);
    let mut files: HashMap<&str, Result<String, String>> = HashMap::new();

    for (i, node) in nodes.iter().enumerate() {
        if !files.contains_key(node.file_path.as_str()) {
            let read = tokio::fs::read_to_string(&node.file_path)
                .await
                .map_err(|e| e.to_string());
            files.insert(node.file_path.as_str(), read);
        }

        let block = match &files[node.file_path.as_str()] {
            Ok(content) => excerpt_block(node, &excerpt(content, node)),
            Err(reason) => {
                warn!(path = %node.file_path, error = %reason, "excerpt unreadable");
                unreadable_block(node, reason)
            }
        };

        if let Some(limit) = max_bytes
            && document.len() + block.len() > limit
        {
            let omitted = nodes.len() - i;
            debug!(limit, omitted, "context budget reached");
            let _ = write!(
                document,
                "\n\n[context truncated: {omitted} more excerpt(s) omitted]"
            );
            break;
        }
        document.push_str(&block);
    }

    document
}
