// tests/integration/fs_abstraction.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use sitepipe::engine::TriggerReason;
use sitepipe::fs::FileSystem;
use sitepipe::fs::mock::MockFileSystem;
use sitepipe::globs::{GlobList, collect_matching_files};
use sitepipe::pipeline::{build_step, run_plan};
use sitepipe::stages::StageContext;
use sitepipe::types::BuildMode;
use sitepipe_test_utils::snapshot::mock_snapshot;
use sitepipe_test_utils::{ConcatBundler, ManifestBuilder, init_tracing, with_timeout};

fn mock_ctx(fs: &MockFileSystem, builder: ManifestBuilder) -> StageContext {
    let fs: Arc<dyn FileSystem> = Arc::new(fs.clone());
    let bundler = Arc::new(ConcatBundler::new(Arc::clone(&fs)));
    StageContext::new(builder.build(), BuildMode::Development, ".", fs, bundler)
}

#[test]
fn test_mock_fs_write_creates_parent_dirs() {
    let fs = MockFileSystem::new();
    fs.write(Path::new("./dist/a/b/c.txt"), b"x").unwrap();

    assert!(fs.is_dir(Path::new("dist")));
    assert!(fs.is_dir(Path::new("dist/a/b")));
    assert!(fs.is_file(Path::new("dist/a/b/c.txt")));
    assert_eq!(fs.read_dir(Path::new("dist/a")).unwrap(), vec![PathBuf::from("dist/a/b")]);
}

#[test]
fn test_mock_fs_remove_dir_all_drops_the_subtree() {
    let fs = MockFileSystem::new();
    fs.add_file("dist/keep.txt", b"k");
    fs.add_file("dist/sub/x.txt", b"x");
    fs.add_file("dist/sub/deeper/y.txt", b"y");

    fs.remove_dir_all(Path::new("dist/sub")).unwrap();

    assert_eq!(fs.file_paths(), vec![PathBuf::from("dist/keep.txt")]);
    assert_eq!(fs.read_dir(Path::new("dist")).unwrap(), vec![PathBuf::from("dist/keep.txt")]);
}

#[test]
fn test_mock_fs_mtime_round_trip() {
    let fs = MockFileSystem::new();
    let then = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
    fs.add_file_with_mtime("src/a.txt", b"a", then);
    assert_eq!(fs.modified(Path::new("./src/a.txt")).unwrap(), then);

    let later = then + Duration::from_secs(60);
    fs.set_modified(Path::new("src/a.txt"), later).unwrap();
    assert_eq!(fs.modified(Path::new("src/a.txt")).unwrap(), later);

    assert!(fs.set_modified(Path::new("src"), later).is_err());
    assert!(fs.remove_file(Path::new("src/missing.txt")).is_err());
}

#[test]
fn test_mock_fs_patterns() {
    let fs = MockFileSystem::new();
    fs.add_file("./src/app.js", b"app");
    fs.add_file("./src/lib/util.js", b"util");
    fs.add_file("./src/index.html", b"<p>");
    fs.add_file("./dist/old.js", b"old");

    let list: GlobList = ["src/**/*.js"].into_iter().collect();
    let matcher = list.compile().unwrap();
    let files = collect_matching_files(&fs, Path::new("."), "src", &matcher).unwrap();

    let mut rels: Vec<String> = files
        .iter()
        .map(|p| p.to_string_lossy().trim_start_matches("./").to_string())
        .collect();
    rels.sort();
    assert_eq!(rels, vec!["src/app.js", "src/lib/util.js"]);
}

#[tokio::test]
async fn test_build_against_mock_fs() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("src/app.js", "run();");
    fs.add_file("src/partials/nav.html", "<nav>@@label</nav>");
    fs.add_file(
        "src/index.html",
        "<body>\n  @@include('partials/nav.html', {\"label\": \"Menu\"})\n</body>",
    );
    fs.add_file("src/img/logo.svg", "<svg/>");
    fs.add_file("dist/stale.txt", "stale");

    let builder = ManifestBuilder::new()
        .script(&["**/*.js"])
        .markup(&["**/*.html"])
        .partials(&["partials/**"])
        .file(&["**/*"]);
    let ctx = mock_ctx(&fs, builder);

    let summary = with_timeout(run_plan(&build_step(&ctx.manifest), &ctx, TriggerReason::Manual))
        .await
        .unwrap();
    assert!(summary.is_success(), "{summary:?}");

    let out = mock_snapshot(&fs, "dist");
    let names: Vec<&str> = out.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["app.js", "img/logo.svg", "index.html"]);

    assert_eq!(fs.read_to_string(Path::new("dist/index.html")).unwrap(), "<body><nav>Menu</nav></body>");
    assert_eq!(fs.read_to_string(Path::new("dist/app.js")).unwrap(), "run();\n");
}
