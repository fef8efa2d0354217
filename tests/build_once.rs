// tests/build_once.rs

mod common;
use crate::common::{
    APP_JS, HEAD_HTML, INDEX_HTML, ManifestBuilder, STYLE_SCSS, build, init_tracing, real_ctx,
};

use std::error::Error;
use std::fs;

use serde_json::json;
use sitepipe::types::BuildMode;
use sitepipe_test_utils::fixtures::{png_icon, write_tree};
use sitepipe_test_utils::snapshot::tree_snapshot;
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn Error>>;

fn site_tree(root: &std::path::Path) {
    write_tree(
        root,
        &[
            ("src/index.html", INDEX_HTML.as_bytes()),
            ("src/partials/head.html", HEAD_HTML.as_bytes()),
            ("src/style.scss", STYLE_SCSS.as_bytes()),
            ("src/app.js", APP_JS.as_bytes()),
        ],
    );
}

fn dist_files(root: &std::path::Path) -> Vec<String> {
    tree_snapshot(&root.join("dist")).into_keys().collect()
}

#[tokio::test]
async fn build_writes_one_artifact_per_claimed_source() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    site_tree(dir.path());

    let ctx = real_ctx(dir.path(), ManifestBuilder::site().build(), BuildMode::Development);
    let summary = build(&ctx).await;
    assert!(summary.is_success(), "build failed: {summary:?}");

    assert_eq!(dist_files(dir.path()), vec!["app.js", "index.html", "style.css"]);

    let js = fs::read_to_string(dir.path().join("dist/app.js"))?;
    assert_eq!(js, format!("{APP_JS}\n"));

    let css = fs::read_to_string(dir.path().join("dist/style.css"))?;
    assert!(css.contains("h1{color:red}"), "css was: {css}");
    assert!(!css.contains('\n'));
    Ok(())
}

#[tokio::test]
async fn markup_expands_includes_inlines_critical_css_and_minifies() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    site_tree(dir.path());

    let ctx = real_ctx(dir.path(), ManifestBuilder::site().build(), BuildMode::Development);
    build(&ctx).await;

    let html = fs::read_to_string(dir.path().join("dist/index.html"))?;
    assert!(html.contains("<title>Home</title>"), "html was: {html}");
    assert!(!html.contains("@@"));
    assert!(html.contains("<style>"));
    assert!(html.contains("h1{color:red}"));
    assert!(html.contains(".title{margin:0}"));
    assert!(!html.contains(".unused"));
    assert!(html.contains("<noscript>"));
    assert!(!html.contains(">\n"));
    Ok(())
}

#[tokio::test]
async fn files_are_copied_with_their_mtime_and_dotfiles() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    site_tree(dir.path());
    write_tree(
        dir.path(),
        &[
            ("src/img/logo.svg", b"<svg/>"),
            ("src/.htaccess", b"Options -Indexes"),
        ],
    );

    let ctx = real_ctx(dir.path(), ManifestBuilder::site().build(), BuildMode::Development);
    build(&ctx).await;

    let files = dist_files(dir.path());
    assert!(files.contains(&"img/logo.svg".to_string()));
    assert!(files.contains(&".htaccess".to_string()));

    let src_mtime = fs::metadata(dir.path().join("src/img/logo.svg"))?.modified()?;
    let out_mtime = fs::metadata(dir.path().join("dist/img/logo.svg"))?.modified()?;
    assert_eq!(src_mtime, out_mtime);
    Ok(())
}

#[tokio::test]
async fn rebuilding_an_unchanged_tree_gives_the_same_output() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    site_tree(dir.path());
    write_tree(dir.path(), &[("src/favicon.png", &png_icon(64))]);

    let manifest = ManifestBuilder::site()
        .favicon("favicon.png")
        .version("1.2.3")
        .build();
    let ctx = real_ctx(dir.path(), manifest, BuildMode::Development);

    build(&ctx).await;
    let first = tree_snapshot(&dir.path().join("dist"));
    build(&ctx).await;
    let second = tree_snapshot(&dir.path().join("dist"));

    assert_eq!(first, second);
    Ok(())
}

#[tokio::test]
async fn stale_outputs_are_removed_by_the_initial_clean() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    site_tree(dir.path());
    write_tree(
        dir.path(),
        &[("dist/old.js", b"stale"), ("dist/.cache/x", b"stale")],
    );

    let ctx = real_ctx(dir.path(), ManifestBuilder::site().build(), BuildMode::Development);
    build(&ctx).await;

    assert_eq!(dist_files(dir.path()), vec!["app.js", "index.html", "style.css"]);
    Ok(())
}

#[tokio::test]
async fn a_missing_include_drops_only_that_page() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    site_tree(dir.path());
    write_tree(
        dir.path(),
        &[("src/broken.html", b"<p>@@include('partials/nope.html')</p>")],
    );

    let ctx = real_ctx(dir.path(), ManifestBuilder::site().build(), BuildMode::Development);
    let summary = build(&ctx).await;

    assert!(summary.is_success());
    assert!(dir.path().join("dist/index.html").exists());
    assert!(!dir.path().join("dist/broken.html").exists());
    Ok(())
}

#[tokio::test]
async fn favicon_snippet_is_kept_in_development_only() -> TestResult {
    init_tracing();

    for (mode, keeps_snippet) in [
        (BuildMode::Development, true),
        (BuildMode::Production, false),
    ] {
        let dir = TempDir::new()?;
        site_tree(dir.path());
        write_tree(
            dir.path(),
            &[
                ("src/favicon.png", &png_icon(64)),
                (
                    "src/about.html",
                    b"<html><head>%%include('favicons/favicons.html')</head><body></body></html>",
                ),
            ],
        );

        let manifest = ManifestBuilder::site()
            .favicon("favicon.png")
            .version("2.0.0")
            .build();
        let ctx = real_ctx(dir.path(), manifest, mode);
        let summary = build(&ctx).await;
        assert!(summary.is_success(), "{mode}: {summary:?}");

        let favicons = dir.path().join("dist/favicons");
        assert!(favicons.join("favicon.ico").exists());
        assert!(favicons.join("apple-touch-icon.png").exists());
        assert!(favicons.join("manifest.webmanifest").exists());
        assert_eq!(favicons.join("favicons.html").exists(), keeps_snippet, "{mode}");

        let about = fs::read_to_string(dir.path().join("dist/about.html"))?;
        assert!(about.contains("/favicons/favicon-32x32.png?v=2.0.0"), "about was: {about}");

        // The favicon source is claimed by its own category, not copied.
        assert!(!dir.path().join("dist/favicon.png").exists());
    }
    Ok(())
}

#[tokio::test]
async fn named_bundles_concatenate_in_declaration_order() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    write_tree(
        dir.path(),
        &[
            ("src/js/vendor.js", b"vendor();"),
            ("src/js/main.js", b"main();"),
            ("src/css/a.scss", b".a { color: blue; }"),
            ("src/css/_vars.scss", b"$x: 1px;"),
        ],
    );

    let manifest = ManifestBuilder::new()
        .script_bundle("js/app.js", &["js/vendor.js", "js/*.js"])
        .style_bundle("css/site.css", &["css/*.scss"])
        .build();
    let ctx = real_ctx(dir.path(), manifest, BuildMode::Production);
    let summary = build(&ctx).await;
    assert!(summary.is_success());

    assert_eq!(dist_files(dir.path()), vec!["css/site.css", "js/app.js"]);
    assert_eq!(
        fs::read_to_string(dir.path().join("dist/js/app.js"))?,
        "vendor();\nmain();\n"
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("dist/css/site.css"))?,
        ".a{color:#00f}"
    );
    Ok(())
}

#[tokio::test]
async fn a_failing_bundle_is_dropped_and_the_build_continues() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    write_tree(
        dir.path(),
        &[("src/ok.js", b"ok();"), ("src/bad.js", b"bad();")],
    );

    let manifest = ManifestBuilder::new().script(&["*.js"]).build();
    let mut ctx = real_ctx(dir.path(), manifest, BuildMode::Development);
    ctx.bundler = std::sync::Arc::new(
        sitepipe_test_utils::ConcatBundler::new(std::sync::Arc::clone(&ctx.fs)).failing_on("bad"),
    );

    let summary = build(&ctx).await;
    assert!(summary.is_success());
    assert_eq!(dist_files(dir.path()), vec!["ok.js"]);
    Ok(())
}

#[tokio::test]
async fn listing_tool_is_copied_and_its_config_patched() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    write_tree(
        dir.path(),
        &[
            ("src/app.js", APP_JS.as_bytes()),
            ("vendor/h5ai/.htaccess", b"deny"),
            ("vendor/h5ai/client/app.js", b"listing();"),
            (
                "vendor/h5ai/private/conf/options.json",
                b"// comment\n{ view: { modes: ['details'], binary: true }, sort: 'name', }",
            ),
        ],
    );

    let manifest = ManifestBuilder::new()
        .script(&["*.js"])
        .listing(
            "vendor/h5ai",
            "_h5ai",
            json!({ "view": { "binary": false }, "lang": "en" }),
        )
        .build();
    let ctx = real_ctx(dir.path(), manifest, BuildMode::Development);
    let summary = build(&ctx).await;
    assert!(summary.is_success(), "{summary:?}");

    let files = dist_files(dir.path());
    assert!(files.contains(&"_h5ai/.htaccess".to_string()));
    assert!(files.contains(&"_h5ai/client/app.js".to_string()));

    let options: serde_json::Value = serde_json::from_str(&fs::read_to_string(
        dir.path().join("dist/_h5ai/private/conf/options.json"),
    )?)?;
    assert_eq!(
        options,
        json!({
            "view": { "modes": ["details"], "binary": false },
            "sort": "name",
            "lang": "en"
        })
    );
    Ok(())
}
