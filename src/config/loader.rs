// src/config/loader.rs

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::config::model::{Manifest, RawManifest};
use crate::errors::Result;

/// On-disk manifest syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Json,
    Toml,
}

impl ManifestFormat {
    /// `.toml` files are TOML; everything else (including `package.json`) is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ManifestFormat::Toml,
            _ => ManifestFormat::Json,
        }
    }
}

/// Load a manifest from a given path and return the raw `RawManifest`.
///
/// This only performs deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawManifest> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    parse_manifest(&contents, ManifestFormat::from_path(path))
}

/// Parse manifest text.
///
/// For JSON, a document whose top level carries a `build` object is treated
/// as a `package.json`: the `build` object is the manifest and the top-level
/// `version` is copied into it unless it declares its own.
pub fn parse_manifest(contents: &str, format: ManifestFormat) -> Result<RawManifest> {
    match format {
        ManifestFormat::Toml => Ok(toml::from_str(contents)?),
        ManifestFormat::Json => {
            let mut doc: Value = serde_json::from_str(contents)?;
            let version = doc.get("version").cloned();

            let manifest = match doc.get_mut("build") {
                Some(Value::Object(build)) => {
                    if !build.contains_key("version") {
                        if let Some(v @ Value::String(_)) = version {
                            build.insert("version".to_string(), v);
                        }
                    }
                    Value::Object(build.clone())
                }
                _ => doc,
            };

            Ok(serde_json::from_value(manifest)?)
        }
    }
}

/// Load a manifest from path and validate it.
///
/// This is the recommended entry point for the rest of the application. Any
/// error returned here is fatal and happens before a single stage runs.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Manifest> {
    let raw = load_from_path(&path)?;
    Manifest::try_from(raw)
}
