// src/config/validate.rs

use std::collections::HashSet;
use std::path::Path;

use crate::config::model::{BundleDef, Manifest, RawManifest, normalize_root};
use crate::errors::{Result, SitepipeError};
use crate::globs::pattern::compile_glob;

impl TryFrom<RawManifest> for Manifest {
    type Error = SitepipeError;

    fn try_from(raw: RawManifest) -> std::result::Result<Self, Self::Error> {
        validate_raw_manifest(&raw)?;
        Ok(Manifest::new_unchecked(raw))
    }
}

fn validate_raw_manifest(raw: &RawManifest) -> Result<()> {
    validate_roots(raw)?;
    validate_globs(raw)?;
    validate_bundles("script", &raw.bundles.script)?;
    validate_bundles("style", &raw.bundles.style)?;
    validate_listing(raw)?;
    Ok(())
}

fn config_error(msg: impl Into<String>) -> SitepipeError {
    SitepipeError::ConfigError(msg.into())
}

fn validate_roots(raw: &RawManifest) -> Result<()> {
    if raw.source.trim().is_empty() {
        return Err(config_error("`source` must not be empty"));
    }
    if raw.dist.trim().is_empty() {
        return Err(config_error("`dist` must not be empty"));
    }

    let source = normalize_root(&raw.source);
    let dist = normalize_root(&raw.dist);

    for (key, root) in [("source", &source), ("dist", &dist)] {
        check_relative(key, root)?;
    }

    // The output tree is cleaned wholesale and must never overlap the sources
    // or the manifest.
    if dist == "." {
        return Err(config_error(
            "`dist` must be a sub-directory of the project, not the project root",
        ));
    }
    if is_within(&dist, &source) {
        return Err(config_error(format!(
            "`dist` ({dist}) must not be the source root or lie inside it ({source})"
        )));
    }
    if is_within(&source, &dist) {
        return Err(config_error(format!(
            "`source` ({source}) must not lie inside the output root ({dist})"
        )));
    }
    Ok(())
}

/// `path` equals `root` or is nested below it. Everything is inside `"."`.
fn is_within(path: &str, root: &str) -> bool {
    root == "." || path == root || path.starts_with(&format!("{root}/"))
}

/// Roots and sub-paths stay inside the project: no absolute paths, no `..`.
fn check_relative(key: &str, path: &str) -> Result<()> {
    if path.starts_with('/') || Path::new(path).is_absolute() {
        return Err(config_error(format!(
            "`{key}` ({path}) must be relative to the manifest's directory"
        )));
    }
    if path.split('/').any(|segment| segment == "..") {
        return Err(config_error(format!(
            "`{key}` ({path}) must not leave the manifest's directory"
        )));
    }
    Ok(())
}

fn validate_globs(raw: &RawManifest) -> Result<()> {
    let lists: [(&str, &Vec<String>); 5] = [
        ("script", &raw.script),
        ("style", &raw.style),
        ("markup", &raw.markup),
        ("partials", &raw.partials),
        ("file", &raw.file),
    ];

    for (key, list) in lists {
        for fragment in list {
            check_fragment(key, fragment)?;
        }
    }

    if let Some(favicon) = &raw.favicon {
        if favicon.trim().is_empty() {
            return Err(config_error("`favicon` must not be empty when present"));
        }
        check_fragment("favicon", favicon)?;
    }

    Ok(())
}

fn check_fragment(key: &str, fragment: &str) -> Result<()> {
    if fragment.trim().is_empty() {
        return Err(config_error(format!("`{key}` contains an empty glob")));
    }
    if fragment.starts_with('!') {
        return Err(config_error(format!(
            "`{key}` glob '{fragment}' is negated; exclusions are derived automatically"
        )));
    }
    compile_glob(fragment)
        .map_err(|e| config_error(format!("`{key}` glob '{fragment}' is invalid: {e}")))?;
    Ok(())
}

fn validate_bundles(kind: &str, bundles: &[BundleDef]) -> Result<()> {
    let mut seen = HashSet::new();
    for bundle in bundles {
        if bundle.name.trim().is_empty() {
            return Err(config_error(format!("a {kind} bundle has an empty `name`")));
        }
        if !seen.insert(bundle.name.as_str()) {
            return Err(config_error(format!(
                "duplicate {kind} bundle name '{}'",
                bundle.name
            )));
        }
        if bundle.sources.is_empty() {
            return Err(config_error(format!(
                "{kind} bundle '{}' has no sources",
                bundle.name
            )));
        }
        for src in &bundle.sources {
            check_fragment(&format!("bundles.{kind}.{}", bundle.name), src)?;
        }
    }
    Ok(())
}

fn validate_listing(raw: &RawManifest) -> Result<()> {
    let Some(listing) = &raw.listing else {
        return Ok(());
    };

    if listing.source.trim().is_empty() {
        return Err(config_error("`listing.source` must not be empty"));
    }
    let listing_dist = normalize_root(&listing.dist);
    check_relative("listing.dist", &listing_dist)?;
    if listing_dist == "." {
        return Err(config_error(
            "`listing.dist` must name a sub-path of the output root",
        ));
    }
    if listing.config_file.trim().is_empty() {
        return Err(config_error("`listing.configFile` must not be empty"));
    }
    if !listing.config_overrides.is_object() {
        return Err(config_error("`listing.configOverrides` must be a JSON object"));
    }
    Ok(())
}
