#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use sitepipe::config::Manifest;
use sitepipe::engine::{RunSummary, TriggerReason};
use sitepipe::fs::{FileSystem, RealFileSystem};
use sitepipe::pipeline::{build_step, handler_step, run_plan};
use sitepipe::stages::StageContext;
use sitepipe::types::{BuildMode, Category, WatchEventKind};

pub use sitepipe_test_utils::{ConcatBundler, ManifestBuilder, init_tracing, with_timeout};

/// Stage context over a real directory, with the in-process bundler.
pub fn real_ctx(root: &Path, manifest: Manifest, mode: BuildMode) -> StageContext {
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let bundler = Arc::new(ConcatBundler::new(Arc::clone(&fs)));
    StageContext::new(manifest, mode, root, fs, bundler)
}

pub async fn build(ctx: &StageContext) -> RunSummary {
    with_timeout(run_plan(&build_step(&ctx.manifest), ctx, TriggerReason::Manual))
        .await
        .expect("build plan could not run")
}

pub async fn handle(ctx: &StageContext, category: Category, kind: WatchEventKind) -> RunSummary {
    with_timeout(run_plan(
        &handler_step(category, kind),
        ctx,
        TriggerReason::FileWatch,
    ))
    .await
    .expect("handler plan could not run")
}

/// Minimal site: one page pulling in a partial, a script and a stylesheet.
pub const INDEX_HTML: &str = r#"<!doctype html>
<html>
  <head>
    @@include('partials/head.html', {"title": "Home"})
    <link rel="stylesheet" href="/style.css">
  </head>
  <body>
    <h1 class="title">Hello</h1>
    <script src="/app.js"></script>
  </body>
</html>
"#;

pub const HEAD_HTML: &str = "<title>@@title</title>\n<meta charset=\"utf-8\">\n";

pub const STYLE_SCSS: &str = r#"$accent: #ff0000;
h1 { color: $accent; }
.title { margin: 0; }
.unused { padding: 4px; }
"#;

pub const APP_JS: &str = "console.log('app');";
