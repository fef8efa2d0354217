// src/watch/event_handler.rs

//! Turns raw `notify` events into categorized [`WatchEvent`]s.

use std::path::{Path, PathBuf};

use notify::event::{EventKind, ModifyKind, RenameMode};
use tracing::{debug, warn};

use crate::types::{Category, WatchEventKind};
use crate::watch::path_utils::relative_str;
use crate::watch::patterns::CategoryMatchers;

/// A change to a source file of a watched category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    /// Path relative to the project root, forward slashes.
    pub path: String,
    pub kind: WatchEventKind,
    pub category: Category,
}

/// Map one notify event to zero or more watch events.
///
/// Renames become a removal of the old path and an addition of the new
/// one; an unpaired rename is an addition when the path still exists.
/// Access and metadata-only notifications are ignored, as are paths no
/// category sources.
pub fn classify_event(
    root: &Path,
    event: &notify::Event,
    matchers: &CategoryMatchers,
) -> Vec<WatchEvent> {
    let kinds: Vec<(WatchEventKind, &Path)> = match event.kind {
        EventKind::Create(_) => with_kind(WatchEventKind::Added, &event.paths),
        EventKind::Remove(_) => with_kind(WatchEventKind::Removed, &event.paths),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            with_kind(WatchEventKind::Removed, &event.paths)
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            with_kind(WatchEventKind::Added, &event.paths)
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            let mut out = Vec::new();
            if let Some(from) = event.paths.first() {
                out.push((WatchEventKind::Removed, from.as_path()));
            }
            if let Some(to) = event.paths.get(1) {
                out.push((WatchEventKind::Added, to.as_path()));
            }
            out
        }
        // Platforms that cannot tell the two sides apart: decide by existence.
        EventKind::Modify(ModifyKind::Name(_)) => event
            .paths
            .iter()
            .map(|p| {
                let kind = if p.exists() {
                    WatchEventKind::Added
                } else {
                    WatchEventKind::Removed
                };
                (kind, p.as_path())
            })
            .collect(),
        EventKind::Modify(ModifyKind::Metadata(_)) | EventKind::Access(_) => Vec::new(),
        EventKind::Modify(_) | EventKind::Any | EventKind::Other => {
            with_kind(WatchEventKind::Changed, &event.paths)
        }
    };

    kinds
        .into_iter()
        .filter_map(|(kind, path)| {
            let Some(rel) = relative_str(root, path) else {
                warn!(
                    path = %path.display(),
                    root = %root.display(),
                    "event outside the project root"
                );
                return None;
            };
            let Some(category) = matchers.classify(&rel) else {
                debug!(path = %rel, "path not sourced by any category; ignored");
                return None;
            };
            Some(WatchEvent {
                path: rel,
                kind,
                category,
            })
        })
        .collect()
}

fn with_kind(kind: WatchEventKind, paths: &[PathBuf]) -> Vec<(WatchEventKind, &Path)> {
    paths.iter().map(|p| (kind, p.as_path())).collect()
}
