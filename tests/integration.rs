//! Integration test suite: builds small TypeScript projects in temp directories and
//! drives them through the public session API and the compiled `code-context` binary.
//!
//! Session tests cover the retrieval contract end to end (scan -> rank -> assemble):
//! insertion-order tie-breaks, the top-5 cap, placeholder blocks for unreadable files,
//! and the stop/epoch guarantee. Binary tests check that the CLI wiring reaches the
//! same code paths and keeps stdout clean.
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use code_context::graph::node::NodeKind;
use code_context::query::context::{CONTEXT_HEADER, is_empty_context};
use code_context::{CodeContextConfig, ProjectSession, build_graph};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_code-context"))
}

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn fast_config() -> CodeContextConfig {
    let mut config = CodeContextConfig::default();
    config.watch.debounce_ms = 20;
    config
}

/// Count source excerpts in a context document; placeholders carry no line range.
fn excerpt_count(doc: &str) -> usize {
    doc.matches(", lines ").count()
}

/// Run a code-context command and assert it exits successfully.
/// Returns stdout as a String.
fn run_success(args: &[&str]) -> String {
    let out = Command::new(binary())
        .args(args)
        .output()
        .expect("failed to invoke code-context binary");
    let stdout = String::from_utf8_lossy(&out.stdout).to_string();
    let stderr = String::from_utf8_lossy(&out.stderr).to_string();
    assert!(
        out.status.success(),
        "command {:?} failed with status {:?}\nstdout: {}\nstderr: {}",
        args,
        out.status,
        stdout,
        stderr
    );
    stdout
}

// ---------------------------------------------------------------------------
// Session API
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread")]
async fn test_rename_prompt_ranks_matching_function_first() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.ts", "export function getUser(id: string) {\n  return id;\n}\n");
    write(dir.path(), "b.ts", "export const formatDate = (d: Date) => d.toISOString();\n");

    let session = ProjectSession::with_config(fast_config());
    session.start_indexing(dir.path()).await.unwrap();
    let doc = session.context_for_prompt("rename getUser").await;
    session.stop_indexing().await;

    assert!(doc.starts_with(CONTEXT_HEADER));
    assert!(doc.contains("(function getUser, lines 1-3)"));
    assert!(doc.contains("export function getUser(id: string) {\n  return id;\n}"));
    assert!(!doc.contains("formatDate"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_same_named_helpers_keep_file_order() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "x.ts", "export function helper() {}\n");
    write(dir.path(), "y.ts", "export function helper() {}\n");

    let session = ProjectSession::with_config(fast_config());
    session.start_indexing(dir.path()).await.unwrap();
    let doc = session.context_for_prompt("helper").await;
    session.stop_indexing().await;

    let x = doc.find("x.ts (function helper").expect("x.ts excerpt");
    let y = doc.find("y.ts (function helper").expect("y.ts excerpt");
    assert!(x < y, "x.ts indexed first must rank first on a tie");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_context_never_exceeds_five_excerpts() {
    let dir = tempfile::tempdir().unwrap();
    let body: String = (0..9)
        .map(|i| format!("export function widget{i}() {{}}\n"))
        .collect();
    write(dir.path(), "widgets.ts", &body);

    let session = ProjectSession::with_config(fast_config());
    session.start_indexing(dir.path()).await.unwrap();
    let doc = session.context_for_prompt("widget").await;
    session.stop_indexing().await;

    assert_eq!(excerpt_count(&doc), 5);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_no_match_prompt_yields_header_only() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.ts", "export const a = 1;\n");

    let session = ProjectSession::with_config(fast_config());
    session.start_indexing(dir.path()).await.unwrap();
    let doc = session.context_for_prompt("an in on to").await;
    let unrelated = session.context_for_prompt("zebra quantum").await;
    session.stop_indexing().await;

    assert_eq!(doc, CONTEXT_HEADER);
    assert!(is_empty_context(&unrelated));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_deleted_backing_file_becomes_placeholder() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["alpha", "beta", "gamma", "delta", "omega"] {
        write(
            dir.path(),
            &format!("{name}.ts"),
            &format!("export function report_{name}() {{}}\n"),
        );
    }

    let session = ProjectSession::with_config(fast_config());
    session.start_indexing(dir.path()).await.unwrap();
    // Stop first so the watcher does not retract the deleted file's nodes.
    session.stop_indexing().await;
    fs::remove_file(dir.path().join("gamma.ts")).unwrap();

    let doc = session.context_for_prompt("report").await;

    assert_eq!(excerpt_count(&doc), 4);
    assert_eq!(doc.matches("content could not be read").count(), 1);
    assert!(doc.contains("gamma.ts (function report_gamma)"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_component_classification_through_session() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "UserCard.tsx",
        "export const UserCard = () => {\n  return <div/>;\n};\n",
    );

    let session = ProjectSession::with_config(fast_config());
    session.start_indexing(dir.path()).await.unwrap();
    let graph = session.graph().await;
    session.stop_indexing().await;

    let card = graph
        .nodes
        .iter()
        .find(|n| n.name == "UserCard" && n.kind != NodeKind::File)
        .expect("UserCard symbol");
    assert_eq!(card.kind, NodeKind::Component);
    assert_eq!(card.exports, vec!["UserCard".to_string()]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_watcher_reindexes_and_retracts() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.ts", "export const a = 1;\n");

    let session = ProjectSession::with_config(fast_config());
    session.start_indexing(dir.path()).await.unwrap();

    write(dir.path(), "b.ts", "export function fresh() {}\n");
    let mut seen = false;
    for _ in 0..100 {
        if session.graph().await.nodes.iter().any(|n| n.name == "fresh") {
            seen = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(seen, "new file should be indexed by the watcher");

    fs::remove_file(dir.path().join("b.ts")).unwrap();
    let mut gone = false;
    for _ in 0..100 {
        if !session.graph().await.nodes.iter().any(|n| n.name == "fresh") {
            gone = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    session.stop_indexing().await;
    assert!(gone, "deleted file's nodes should be retracted");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_change_after_stop_adds_no_nodes() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.ts", "export const a = 1;\n");

    let session = ProjectSession::with_config(fast_config());
    session.start_indexing(dir.path()).await.unwrap();
    session.stop_indexing().await;

    write(dir.path(), "a.ts", "export const a = 1;\nexport function late() {}\n");
    tokio::time::sleep(Duration::from_millis(300)).await;

    let graph = session.graph().await;
    assert!(!graph.nodes.iter().any(|n| n.name == "late"));
}

#[test]
fn test_build_graph_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "src/a.ts", "export function a() {}\nfunction b() { function a() {} }\n");
    write(dir.path(), "src/types.ts", "export interface User {}\nexport type Id = string;\n");

    let config = CodeContextConfig::default();
    let (first, stats) = build_graph(dir.path(), &config, false);
    let (second, _) = build_graph(dir.path(), &config, false);

    assert_eq!(stats.file_count, 2);
    assert_eq!(stats.symbol_count(), 5);
    assert_eq!(first.snapshot().nodes, second.snapshot().nodes);
}

// ---------------------------------------------------------------------------
// Binary
// ---------------------------------------------------------------------------

#[test]
fn test_index_json_output() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.ts", "export function getUser() {}\ninterface User {}\n");

    let stdout = run_success(&["index", dir.path().to_str().unwrap(), "--json"]);
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("stdout is JSON");
    assert_eq!(json["file_count"], 1);
    assert_eq!(json["functions"], 1);
    assert_eq!(json["interfaces"], 1);
}

#[test]
fn test_index_graph_output() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.ts", "export function getUser() {}\n");

    let stdout = run_success(&["index", dir.path().to_str().unwrap(), "--graph"]);
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("stdout is JSON");
    assert_eq!(json["nodes"].as_array().map(Vec::len), Some(2));
    assert_eq!(json["edges"][0]["kind"], "DEFINES");
}

#[test]
fn test_context_command_prints_excerpt() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.ts", "export function getUser() {\n  return 1;\n}\n");

    let stdout = run_success(&["context", "rename getUser", dir.path().to_str().unwrap()]);
    assert!(stdout.starts_with(CONTEXT_HEADER));
    assert!(stdout.contains("export function getUser() {"));
}

#[test]
fn test_instruction_command_ends_with_prompt() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.ts", "export function getUser() {}\n");

    let stdout = run_success(&["instruction", "rename getUser", dir.path().to_str().unwrap()]);
    assert!(stdout.contains("getUser"));
    assert!(stdout.ends_with("Request:\nrename getUser\n"));
}

#[test]
fn test_missing_root_fails() {
    let out = Command::new(binary())
        .args(["index", "/definitely/not/a/project"])
        .output()
        .expect("failed to invoke code-context binary");
    assert!(!out.status.success());
}

#[test]
fn test_malformed_config_warns_and_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.ts", "export function getUser() {}\n");
    write(dir.path(), "code-context.toml", "exclude = 3\n");

    let out = Command::new(binary())
        .args(["index", dir.path().to_str().unwrap(), "--json"])
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to invoke code-context binary");
    assert!(out.status.success());

    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(
        stderr.contains("code-context.toml"),
        "expected a config warning on stderr, got: {stderr}"
    );
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).expect("stdout is JSON");
    assert_eq!(json["functions"], 1);
}
