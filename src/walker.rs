use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::CodeContextConfig;
use crate::parser::languages::is_source_extension;

/// Directory names never descended into: build output, version control, dependency caches.
pub const IGNORED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    ".hg",
    ".svn",
    "dist",
    "build",
    "out",
    "coverage",
    ".next",
    ".nuxt",
    ".turbo",
    ".cache",
    "target",
];

/// Walk a project directory and collect source files.
///
/// The walk is depth-first with entries sorted by file name, so the result
/// order (and therefore the graph's insertion order) is reproducible. Ignored
/// directories and dotfiles are pruned; `config.exclude` globs are applied to
/// every path; `.gitignore` rules are honoured only when
/// `config.respect_gitignore` is set.
///
/// Entries that cannot be read (permission denied, vanished mid-walk) are
/// logged and skipped; the rest of the tree is still walked.
///
/// When `verbose` is true, each discovered file path is printed to stderr.
pub fn walk_project(root: &Path, config: &CodeContextConfig, verbose: bool) -> Vec<PathBuf> {
    let mut builder = ignore::WalkBuilder::new(root);
    builder
        .standard_filters(false)
        .hidden(true)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(|entry| {
            let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
            !(is_dir && entry.depth() > 0 && is_ignored_dir_name(entry.file_name().to_str()))
        });
    if config.respect_gitignore {
        builder
            .git_ignore(true)
            .git_exclude(true)
            .ignore(true)
            // Read .gitignore files even when the directory is not inside a git repository.
            .require_git(false);
    }

    let mut files = Vec::new();
    for result in builder.build() {
        let entry = match result {
            Ok(e) => e,
            Err(err) => {
                warn!("scan: {err}");
                continue;
            }
        };

        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }

        let path = entry.path();
        if !has_source_extension(path) || is_excluded_by_config(path, config) {
            continue;
        }

        if verbose {
            eprintln!("{}", path.display());
        }
        files.push(path.to_path_buf());
    }

    debug!(root = %root.display(), files = files.len(), "scan complete");
    files
}

fn is_ignored_dir_name(name: Option<&str>) -> bool {
    name.is_some_and(|n| IGNORED_DIRS.contains(&n))
}

/// True when the path's extension is a supported source extension.
pub fn has_source_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(is_source_extension)
}

/// True when any component of `path` below `root` is an ignored directory or a dotfile.
pub fn is_ignored_path(path: &Path, root: &Path) -> bool {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components().any(|c| {
        c.as_os_str()
            .to_str()
            .is_some_and(|s| s.starts_with('.') || IGNORED_DIRS.contains(&s))
    })
}

/// Returns true if `path` matches any exclusion pattern from config.
pub fn is_excluded_by_config(path: &Path, config: &CodeContextConfig) -> bool {
    let patterns = match &config.exclude {
        Some(p) => p,
        None => return false,
    };

    let path_str = path.to_string_lossy();

    for pattern in patterns {
        let Ok(matcher) = glob::Pattern::new(pattern) else {
            continue;
        };
        if matcher.matches(&path_str) {
            return true;
        }
        // Also check if any component matches the pattern directly.
        if path
            .components()
            .filter_map(|c| c.as_os_str().to_str())
            .any(|s| matcher.matches(s))
        {
            return true;
        }
    }

    false
}
