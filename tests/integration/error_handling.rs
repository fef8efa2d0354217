// tests/integration/error_handling.rs

use std::io::Write;

use sitepipe::config::{Manifest, load_and_validate};
use sitepipe::errors::SitepipeError;
use sitepipe_test_utils::ManifestBuilder;
use tempfile::NamedTempFile;
use serde_json::json;

fn config_error(builder: ManifestBuilder) -> String {
    match Manifest::try_from(builder.raw()) {
        Err(SitepipeError::ConfigError(msg)) => msg,
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_dist_inside_source_is_rejected() {
    let msg = config_error(ManifestBuilder::new().roots("site", "site/out"));
    assert!(msg.contains("dist"));

    let msg = config_error(ManifestBuilder::new().roots("src/", "./src"));
    assert!(msg.contains("must not be the source root"));
}

#[test]
fn test_project_root_as_dist_is_rejected() {
    let msg = config_error(ManifestBuilder::new().roots("src", "."));
    assert!(msg.contains("not the project root"), "{msg}");

    let msg = config_error(ManifestBuilder::new().roots("src", "./"));
    assert!(msg.contains("not the project root"), "{msg}");
}

#[test]
fn test_source_inside_dist_is_rejected() {
    let msg = config_error(ManifestBuilder::new().roots("dist/src", "dist"));
    assert!(msg.contains("must not lie inside the output root"), "{msg}");

    let msg = config_error(ManifestBuilder::new().roots("public/site/src", "public/"));
    assert!(msg.contains("`source`"), "{msg}");
}

#[test]
fn test_roots_must_stay_inside_the_project() {
    let msg = config_error(ManifestBuilder::new().roots("src", "../dist"));
    assert!(msg.contains("must not leave"), "{msg}");

    let msg = config_error(ManifestBuilder::new().roots("src/../..", "dist"));
    assert!(msg.contains("`source`"), "{msg}");

    let msg = config_error(ManifestBuilder::new().roots("src", "/tmp/dist"));
    assert!(msg.contains("must be relative"), "{msg}");

    let msg = config_error(ManifestBuilder::new().listing("vendor/h5ai", "../_h5ai", json!({})));
    assert!(msg.contains("listing.dist"), "{msg}");
}

#[test]
fn test_sibling_with_common_prefix_is_not_nested() {
    let manifest = Manifest::try_from(ManifestBuilder::new().roots("src", "src-dist").raw());
    assert!(manifest.is_ok());
}

#[test]
fn test_negated_glob_is_rejected() {
    let msg = config_error(ManifestBuilder::new().file(&["**/*", "!**/*.md"]));
    assert!(msg.contains("negated"));
    assert!(msg.contains("file"));
}

#[test]
fn test_invalid_glob_names_its_key() {
    let msg = config_error(ManifestBuilder::new().script(&["js/[a-"]));
    assert!(msg.contains("`script`"));
    assert!(msg.contains("invalid"));
}

#[test]
fn test_duplicate_bundle_name_is_rejected() {
    let msg = config_error(
        ManifestBuilder::new()
            .script_bundle("js/app.js", &["a.js"])
            .script_bundle("js/app.js", &["b.js"]),
    );
    assert!(msg.contains("duplicate script bundle name 'js/app.js'"));
}

#[test]
fn test_bundle_without_sources_is_rejected() {
    let msg = config_error(ManifestBuilder::new().style_bundle("css/site.css", &[]));
    assert!(msg.contains("has no sources"));
}

#[test]
fn test_listing_overrides_must_be_an_object() {
    let msg = config_error(ManifestBuilder::new().listing("vendor/h5ai", "_h5ai", json!([1, 2])));
    assert!(msg.contains("configOverrides"));

    let msg = config_error(ManifestBuilder::new().listing("vendor/h5ai", "./", json!({})));
    assert!(msg.contains("listing.dist"));
}

#[test]
fn test_missing_roots_is_a_json_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, r#"{{ "build": {{ "dist": "dist" }} }}"#).unwrap();

    match load_and_validate(file.path()) {
        Err(SitepipeError::JsonError(e)) => assert!(e.to_string().contains("source")),
        Err(e) => panic!("Expected JsonError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_malformed_toml_is_a_toml_error() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    write!(file, "source = \"src\"\ndist = [").unwrap();

    let result = load_and_validate(file.path());
    assert!(matches!(result, Err(SitepipeError::TomlError(_))), "got {:?}", result);
}

#[test]
fn test_missing_manifest_is_an_io_error() {
    let result = load_and_validate("definitely/not/here/package.json");
    assert!(matches!(result, Err(SitepipeError::IoError(_))));
}

#[test]
fn test_build_failure_lists_failed_tasks() {
    let err = SitepipeError::BuildFailed(vec!["style".into(), "markup".into()]);
    assert_eq!(err.to_string(), "Build failed; failed tasks: style, markup");
}
