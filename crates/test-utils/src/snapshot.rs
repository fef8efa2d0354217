use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use sitepipe::fs::mock::MockFileSystem;
use sitepipe::fs::FileSystem;

/// Relative path → blake3 hex digest of every file below `root`.
pub fn tree_snapshot(root: &Path) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    if root.exists() {
        walk(root, root, &mut out);
    }
    out
}

fn walk(root: &Path, dir: &Path, out: &mut BTreeMap<String, String>) {
    let mut entries: Vec<_> = fs::read_dir(dir)
        .expect("read_dir failed")
        .map(|e| e.expect("dir entry").path())
        .collect();
    entries.sort();

    for path in entries {
        if path.is_dir() {
            walk(root, &path, out);
        } else {
            let bytes = fs::read(&path).expect("read failed");
            let rel = path
                .strip_prefix(root)
                .expect("path below root")
                .to_string_lossy()
                .replace('\\', "/");
            out.insert(rel, blake3::hash(&bytes).to_hex().to_string());
        }
    }
}

/// Same as [`tree_snapshot`], for the files of a mock filesystem below
/// `prefix`.
pub fn mock_snapshot(fs: &MockFileSystem, prefix: &str) -> BTreeMap<String, String> {
    let prefix = Path::new(prefix);
    fs.file_paths()
        .into_iter()
        .filter_map(|path| {
            let rel = path.strip_prefix(prefix).ok()?.to_string_lossy().replace('\\', "/");
            let bytes = fs.read(&path).ok()?;
            Some((rel, blake3::hash(&bytes).to_hex().to_string()))
        })
        .collect()
}
