// tests/config_loading.rs

use std::error::Error;
use std::io::Write;
use std::path::Path;

use sitepipe::config::loader::ManifestFormat;
use sitepipe::config::{load_and_validate, parse_manifest};
use sitepipe::config_root_dir;
use tempfile::{Builder, NamedTempFile};

type TestResult = Result<(), Box<dyn Error>>;

fn temp_with_suffix(suffix: &str, contents: &str) -> Result<NamedTempFile, Box<dyn Error>> {
    let mut file = Builder::new().suffix(suffix).tempfile()?;
    write!(file, "{contents}")?;
    Ok(file)
}

#[test]
fn package_json_build_section_is_the_manifest() -> TestResult {
    let file = temp_with_suffix(
        ".json",
        r#"{
  "name": "site",
  "version": "1.4.0",
  "build": {
    "source": "./src/",
    "dist": "dist/",
    "script": ["**/*.js"],
    "scss": ["**/*.scss"],
    "html": ["**/*.html"],
    "partials": ["partials/**/*.html"],
    "file": ["**/*"],
    "favicon": "favicon.png",
    "h5aiConfig": {
      "source": "vendor/h5ai",
      "dist": "_h5ai",
      "configDir": "private/conf",
      "configOverrides": { "view": { "binary": false } }
    }
  }
}"#,
    )?;

    let manifest = load_and_validate(file.path())?;

    assert_eq!(manifest.source_root(), "src");
    assert_eq!(manifest.dist_root(), "dist");
    assert_eq!(manifest.style, vec!["**/*.scss"]);
    assert_eq!(manifest.markup, vec!["**/*.html"]);
    assert_eq!(manifest.version.as_deref(), Some("1.4.0"));
    assert_eq!(manifest.favicon.as_deref(), Some("favicon.png"));
    assert_eq!(manifest.listing_dist().as_deref(), Some("dist/_h5ai"));

    let listing = manifest.listing.as_ref().ok_or("listing missing")?;
    assert_eq!(listing.config_file, "options.json");
    Ok(())
}

#[test]
fn build_section_version_wins_over_the_package_version() -> TestResult {
    let raw = parse_manifest(
        r#"{ "version": "1.0.0", "build": { "source": "src", "dist": "dist", "version": "9" } }"#,
        ManifestFormat::Json,
    )?;
    assert_eq!(raw.version.as_deref(), Some("9"));
    Ok(())
}

#[test]
fn bare_json_manifest_is_accepted() -> TestResult {
    let raw = parse_manifest(
        r#"{ "source": "site", "dist": "public", "markup": ["*.html"] }"#,
        ManifestFormat::Json,
    )?;
    assert_eq!(raw.source, "site");
    assert_eq!(raw.markup, vec!["*.html"]);
    assert_eq!(raw.style_include_paths, vec!["node_modules"]);
    Ok(())
}

#[test]
fn toml_manifest_loads_with_defaults() -> TestResult {
    let file = temp_with_suffix(
        ".toml",
        r#"
source = "src"
dist = "dist"
script = ["**/*.js"]
style = ["**/*.scss"]

[server]
port = 8080

[[bundles.script]]
name = "js/app.js"
sources = ["js/vendor/*.js", "js/*.js"]
"#,
    )?;

    let manifest = load_and_validate(file.path())?;

    assert_eq!(manifest.server.port, 8080);
    assert_eq!(manifest.server.host, "::1");
    assert_eq!(manifest.bundler.command, "esbuild");
    assert_eq!(manifest.bundles.script.len(), 1);
    assert_eq!(manifest.bundles.script[0].name, "js/app.js");
    assert!(manifest.listing.is_none());
    Ok(())
}

#[test]
fn bundle_sources_stand_in_for_a_missing_category_list() -> TestResult {
    let raw = parse_manifest(
        r#"{
  "source": "src",
  "dist": "dist",
  "bundles": {
    "style": [
      { "name": "css/a.css", "sources": ["css/a.scss", "css/shared.scss"] },
      { "name": "css/b.css", "sources": ["css/b.scss", "css/shared.scss"] }
    ]
  }
}"#,
        ManifestFormat::Json,
    )?;
    let manifest = sitepipe::config::Manifest::try_from(raw)?;

    assert_eq!(
        manifest.style,
        vec!["css/a.scss", "css/shared.scss", "css/b.scss"]
    );
    Ok(())
}

#[test]
fn config_root_is_the_manifest_directory() {
    assert_eq!(
        config_root_dir(Path::new("site/package.json")),
        Path::new("site")
    );
    assert_eq!(
        config_root_dir(Path::new("package.json")),
        std::env::current_dir().unwrap()
    );
}
