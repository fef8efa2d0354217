#![allow(dead_code)]

use serde_json::{Value, json};
use sitepipe::config::{Manifest, RawManifest};

/// Builder for `Manifest` to simplify test setup.
///
/// Starts from `source = "src"`, `dist = "dist"` and no categories.
pub struct ManifestBuilder {
    doc: Value,
}

impl ManifestBuilder {
    pub fn new() -> Self {
        Self {
            doc: json!({ "source": "src", "dist": "dist" }),
        }
    }

    /// The manifest used by most scenario tests: scripts, styles, markup,
    /// partials and a catch-all copy, no favicon.
    pub fn site() -> Self {
        Self::new()
            .script(&["**/*.js"])
            .style(&["**/*.scss"])
            .markup(&["**/*.html"])
            .partials(&["partials/**"])
            .file(&["**/*"])
    }

    pub fn roots(self, source: &str, dist: &str) -> Self {
        self.set("source", json!(source)).set("dist", json!(dist))
    }

    pub fn script(self, globs: &[&str]) -> Self {
        self.set("script", json!(globs))
    }

    pub fn style(self, globs: &[&str]) -> Self {
        self.set("style", json!(globs))
    }

    pub fn markup(self, globs: &[&str]) -> Self {
        self.set("markup", json!(globs))
    }

    pub fn partials(self, globs: &[&str]) -> Self {
        self.set("partials", json!(globs))
    }

    pub fn file(self, globs: &[&str]) -> Self {
        self.set("file", json!(globs))
    }

    pub fn favicon(self, path: &str) -> Self {
        self.set("favicon", json!(path))
    }

    pub fn version(self, version: &str) -> Self {
        self.set("version", json!(version))
    }

    pub fn script_bundle(self, name: &str, sources: &[&str]) -> Self {
        self.bundle("script", name, sources)
    }

    pub fn style_bundle(self, name: &str, sources: &[&str]) -> Self {
        self.bundle("style", name, sources)
    }

    pub fn listing(self, source: &str, dist: &str, overrides: Value) -> Self {
        self.set(
            "listing",
            json!({
                "source": source,
                "dist": dist,
                "configDir": "private/conf",
                "configFile": "options.json",
                "configOverrides": overrides,
            }),
        )
    }

    /// Set any top-level key directly.
    pub fn set(mut self, key: &str, value: Value) -> Self {
        self.doc[key] = value;
        self
    }

    pub fn raw(&self) -> RawManifest {
        serde_json::from_value(self.doc.clone()).expect("builder produced an invalid manifest")
    }

    pub fn build(self) -> Manifest {
        Manifest::try_from(self.raw()).expect("Failed to build valid manifest from builder")
    }

    fn bundle(mut self, kind: &str, name: &str, sources: &[&str]) -> Self {
        if !self.doc["bundles"].is_object() {
            self.doc["bundles"] = json!({});
        }
        if !self.doc["bundles"][kind].is_array() {
            self.doc["bundles"][kind] = json!([]);
        }
        if let Some(list) = self.doc["bundles"][kind].as_array_mut() {
            list.push(json!({ "name": name, "sources": sources }));
        }
        self
    }
}

impl Default for ManifestBuilder {
    fn default() -> Self {
        Self::new()
    }
}
