pub mod event;
pub mod incremental;

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::RecursiveMode;
use notify_debouncer_mini::{DebounceEventResult, new_debouncer};
use tokio::sync::mpsc as tokio_mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::CodeContextConfig;
use crate::walker::{has_source_extension, is_excluded_by_config, is_ignored_path};

use event::WatchEvent;

/// Handle to a running watcher. Keeps the debouncer alive (dropping stops watching).
pub struct WatcherHandle {
    /// Keep alive: dropping the debouncer stops the OS watcher.
    _debouncer: notify_debouncer_mini::Debouncer<notify::RecommendedWatcher>,
    /// The bridge task forwarding events from std channel to tokio channel.
    _bridge_task: JoinHandle<()>,
}

impl WatcherHandle {
    /// Stop delivering events. Events already forwarded stay in the receiver.
    pub fn stop(self) {
        drop(self);
    }
}

/// Start a debounced file watcher on `watch_root`.
///
/// Returns a `WatcherHandle` (must be kept alive) and a tokio mpsc receiver
/// that yields classified `WatchEvent`s.
///
/// Must be called from within a tokio runtime.
pub fn start_watcher(
    watch_root: &Path,
    config: &CodeContextConfig,
) -> anyhow::Result<(WatcherHandle, tokio_mpsc::Receiver<WatchEvent>)> {
    let (std_tx, std_rx) = std::sync::mpsc::channel::<DebounceEventResult>();

    let mut debouncer = new_debouncer(
        Duration::from_millis(config.watch.debounce_ms),
        move |res| {
            let _ = std_tx.send(res);
        },
    )?;
    debouncer
        .watcher()
        .watch(watch_root, RecursiveMode::Recursive)?;

    let (tokio_tx, tokio_rx) = tokio_mpsc::channel::<WatchEvent>(256);

    // Bridge: spawn_blocking to receive from std channel, classify, forward to tokio
    let root = watch_root.to_path_buf();
    let config = config.clone();
    let bridge_task = tokio::task::spawn_blocking(move || {
        while let Ok(result) = std_rx.recv() {
            match result {
                Ok(events) => {
                    for debounced_event in events {
                        let path = debounced_event.path;
                        if let Some(watch_event) = classify_event(&path, &root, &config) {
                            debug!(?watch_event, "forwarding");
                            if tokio_tx.blocking_send(watch_event).is_err() {
                                return; // receiver dropped, shutdown
                            }
                        }
                    }
                }
                Err(err) => {
                    warn!("watcher error: {err:?}");
                }
            }
        }
    });

    Ok((
        WatcherHandle {
            _debouncer: debouncer,
            _bridge_task: bridge_task,
        },
        tokio_rx,
    ))
}

/// Classify a filesystem event path into a WatchEvent, or None if it should be ignored.
///
/// Filtering order:
/// 1. Ignored directories and dotfiles below the root
/// 2. `exclude` globs from config
/// 3. Source extension filter
/// 4. File existence check (Changed vs Removed)
pub fn classify_event(
    path: &Path,
    project_root: &Path,
    config: &CodeContextConfig,
) -> Option<WatchEvent> {
    if is_ignored_path(path, project_root) || is_excluded_by_config(path, config) {
        return None;
    }

    if !has_source_extension(path) {
        return None;
    }

    // notify-debouncer-mini doesn't distinguish create from modify; both reindex.
    let path: PathBuf = path.to_path_buf();
    if path.is_file() {
        Some(WatchEvent::Changed(path))
    } else if path.exists() {
        // A directory named like a source file.
        None
    } else {
        Some(WatchEvent::Removed(path))
    }
}
