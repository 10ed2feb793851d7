use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::sync::{Mutex, RwLock, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::CodeContextConfig;
use crate::graph::{GraphSnapshot, GraphStore};
use crate::indexer::scan_files;
use crate::output::IndexStats;
use crate::query;
use crate::walker::walk_project;
use crate::watcher::event::WatchEvent;
use crate::watcher::{WatcherHandle, incremental, start_watcher};

/// Shared handle to a session's graph.
pub type SharedStore = Arc<RwLock<GraphStore>>;

struct ActiveIndexing {
    root: PathBuf,
    watcher: WatcherHandle,
    events: JoinHandle<()>,
}

/// One indexed project: the graph, the watcher feeding it, and the write epoch.
///
/// Writers are the initial scan and a single event task, so the store sees one
/// writer at a time. Every write carries the epoch it was dispatched under and is
/// dropped if the epoch moved on; [`stop_indexing`](Self::stop_indexing) bumps the
/// epoch under the write lock, so nothing lands in the store after it returns.
pub struct ProjectSession {
    store: SharedStore,
    epoch: Arc<AtomicU64>,
    active: Mutex<Option<ActiveIndexing>>,
    config: Option<CodeContextConfig>,
    /// Context byte budget of the current config, readable without `active`.
    budget: watch::Sender<Option<usize>>,
}

impl Default for ProjectSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectSession {
    /// Session that loads `code-context.toml` from each indexed root.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(GraphStore::new())),
            epoch: Arc::new(AtomicU64::new(0)),
            active: Mutex::new(None),
            config: None,
            budget: watch::channel(None).0,
        }
    }

    /// Session that uses `config` instead of reading it from the project root.
    pub fn with_config(config: CodeContextConfig) -> Self {
        Self {
            budget: watch::channel(config.context.max_bytes).0,
            config: Some(config),
            ..Self::new()
        }
    }

    /// The session's store, for collaborators that query it directly.
    pub fn store(&self) -> SharedStore {
        Arc::clone(&self.store)
    }

    /// Whether indexing is active. Waits for a `start_indexing` in progress.
    pub async fn is_indexing(&self) -> bool {
        self.active.lock().await.is_some()
    }

    /// Scan `root` into the graph, then keep it current from filesystem events.
    ///
    /// A no-op (logged) when indexing is already active. Returns statistics for the
    /// initial scan, or `None` for the no-op case.
    ///
    /// # Errors
    /// - `root` does not exist or cannot be resolved
    /// - the OS watcher cannot be started
    pub async fn start_indexing(&self, root: impl AsRef<Path>) -> Result<Option<IndexStats>> {
        let mut active = self.active.lock().await;
        if let Some(current) = active.as_ref() {
            info!(root = %current.root.display(), "indexing already active");
            return Ok(None);
        }

        let root = std::fs::canonicalize(root.as_ref())
            .with_context(|| format!("cannot resolve project root {}", root.as_ref().display()))?;
        let config = self
            .config
            .clone()
            .unwrap_or_else(|| CodeContextConfig::load(&root));
        self.budget.send_replace(config.context.max_bytes);
        let epoch = self.epoch.load(Ordering::SeqCst);

        // Subscribe before scanning so changes made during the scan are queued, not lost.
        let (watcher, rx) = start_watcher(&root, &config)
            .with_context(|| format!("cannot watch {}", root.display()))?;

        let stats = self.initial_scan(&root, &config, epoch).await?;

        let events = tokio::spawn(run_event_loop(
            Arc::clone(&self.store),
            Arc::clone(&self.epoch),
            epoch,
            rx,
        ));

        info!(
            root = %root.display(),
            files = stats.file_count,
            symbols = stats.symbol_count(),
            "indexing started"
        );
        *active = Some(ActiveIndexing {
            root,
            watcher,
            events,
        });
        Ok(Some(stats))
    }

    async fn initial_scan(
        &self,
        root: &Path,
        config: &CodeContextConfig,
        epoch: u64,
    ) -> Result<IndexStats> {
        let start = Instant::now();
        let (scan_root, scan_config) = (root.to_path_buf(), config.clone());
        let scan = tokio::task::spawn_blocking(move || {
            scan_files(&walk_project(&scan_root, &scan_config, false))
        })
        .await
        .context("initial scan task failed")?;

        let mut store = self.store.write().await;
        if self.epoch.load(Ordering::SeqCst) != epoch {
            debug!("discarding stale initial scan");
            return Ok(IndexStats::from_store(&store, 0, 0.0));
        }
        let unreadable = scan.unreadable;
        let parse_failed = scan.apply(&mut store);
        Ok(IndexStats::from_store(
            &store,
            unreadable + parse_failed,
            start.elapsed().as_secs_f64(),
        ))
    }

    /// Stop watching. Work already in flight is discarded rather than applied.
    ///
    /// The graph itself is kept; a later `start_indexing` rescans into it.
    pub async fn stop_indexing(&self) {
        let mut active = self.active.lock().await;
        let Some(current) = active.take() else {
            debug!("stop requested but indexing is not active");
            return;
        };

        {
            let _store = self.store.write().await;
            self.epoch.fetch_add(1, Ordering::SeqCst);
        }
        current.events.abort();
        current.watcher.stop();
        info!(root = %current.root.display(), "indexing stopped");
    }

    /// Insertion-ordered copy of the graph.
    pub async fn graph(&self) -> GraphSnapshot {
        self.store.read().await.snapshot()
    }

    /// Context document for `prompt`: ranked excerpts under a fixed header.
    ///
    /// Never fails; a prompt with no matches yields the header alone. Does not
    /// wait for a `start_indexing` in progress.
    pub async fn context_for_prompt(&self, prompt: &str) -> String {
        let max_bytes = *self.budget.borrow();
        query::context_for_prompt(&self.store, prompt, max_bytes).await
    }
}

/// Apply watch events one at a time until the channel closes or the epoch moves.
async fn run_event_loop(
    store: SharedStore,
    epoch: Arc<AtomicU64>,
    dispatched: u64,
    mut rx: mpsc::Receiver<WatchEvent>,
) {
    while let Some(event) = rx.recv().await {
        if epoch.load(Ordering::SeqCst) != dispatched {
            break;
        }
        debug!(path = %event.path().display(), "watch event");

        // Read + parse with no lock held.
        let change = match tokio::task::spawn_blocking(move || incremental::prepare(&event)).await {
            Ok(change) => change,
            Err(err) => {
                warn!("reindex task failed: {err}");
                continue;
            }
        };

        let mut guard = store.write().await;
        if epoch.load(Ordering::SeqCst) != dispatched {
            debug!("discarding change prepared before stop");
            break;
        }
        incremental::apply(&mut guard, change);
    }
}
