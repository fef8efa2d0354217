// src/watch/path_utils.rs

use std::path::Path;

/// `path` relative to `root` with forward slashes, or `None` when it lies
/// outside `root`.
///
/// Watcher paths may use a different absolute prefix than the root (for
/// example `/private/var` against `/var` on macOS). When the plain prefix
/// check fails both sides are canonicalized; a removed file no longer
/// exists, so its parent directory is canonicalized instead.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(to_slash(rel));
    }

    let root_canon = root.canonicalize().ok()?;
    let path_canon = path.canonicalize().ok().or_else(|| {
        let parent = path.parent()?.canonicalize().ok()?;
        Some(parent.join(path.file_name()?))
    })?;

    path_canon.strip_prefix(&root_canon).ok().map(to_slash)
}

fn to_slash(rel: &Path) -> String {
    rel.to_string_lossy().replace('\\', "/")
}
