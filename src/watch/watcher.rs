// src/watch/watcher.rs

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::watch::event_handler::{WatchEvent, classify_event};
use crate::watch::patterns::CategoryMatchers;

/// Handle for the filesystem watcher.
///
/// Keeps the underlying `RecommendedWatcher` alive. Dropping this handle
/// stops file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Watch `watch_dir` recursively and forward every categorized change to
/// `events_tx`, in arrival order.
///
/// - `project_root` is what the derived globs are relative to.
/// - `watch_dir` is normally the source root.
pub fn spawn_watcher(
    project_root: impl Into<PathBuf>,
    watch_dir: impl Into<PathBuf>,
    matchers: CategoryMatchers,
    events_tx: mpsc::UnboundedSender<WatchEvent>,
) -> Result<WatcherHandle> {
    let project_root = project_root.into();
    let root = project_root
        .canonicalize()
        .unwrap_or_else(|_| project_root.clone());
    let watch_dir = watch_dir.into();

    let matchers = Arc::new(matchers);

    // notify calls back on its own thread; hop into the async world.
    let (raw_tx, mut raw_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = raw_tx.send(event) {
                    warn!(error = %err, "failed to forward notify event");
                }
            }
            Err(err) => warn!(error = %err, "file watch error"),
        },
        Config::default(),
    )
    .context("creating file watcher")?;

    watcher
        .watch(&watch_dir, RecursiveMode::Recursive)
        .with_context(|| format!("watching {}", watch_dir.display()))?;

    info!(dir = %watch_dir.display(), "file watcher started");

    tokio::spawn(async move {
        while let Some(event) = raw_rx.recv().await {
            debug!(?event, "received notify event");
            for watch_event in classify_event(&root, &event, &matchers) {
                if events_tx.send(watch_event).is_err() {
                    debug!("watch event receiver dropped; stopping");
                    return;
                }
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle { _inner: watcher })
}
