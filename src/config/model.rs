// src/config/model.rs

use serde::Deserialize;
use serde_json::Value;

/// Manifest as read from disk, before validation.
///
/// In JSON form this is usually the `build` object of a `package.json`:
///
/// ```json
/// {
///   "version": "1.4.0",
///   "build": {
///     "source": "src/",
///     "dist": "dist/",
///     "script": ["**/*.js"],
///     "scss": ["**/*.scss"],
///     "html": ["**/*.html"],
///     "partials": ["partials/**/*.html"],
///     "file": ["**/*"],
///     "favicon": "favicon.png"
///   }
/// }
/// ```
///
/// The original key names (`scss`, `html`, `h5aiConfig`) are accepted as
/// aliases of `style`, `markup` and `listing`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawManifest {
    /// Source root, relative to the manifest's directory.
    pub source: String,

    /// Output root, relative to the manifest's directory.
    pub dist: String,

    #[serde(default)]
    pub script: Vec<String>,

    #[serde(default, alias = "scss")]
    pub style: Vec<String>,

    #[serde(default, alias = "html")]
    pub markup: Vec<String>,

    #[serde(default)]
    pub partials: Vec<String>,

    #[serde(default)]
    pub file: Vec<String>,

    /// Single icon file the favicon set is generated from.
    #[serde(default)]
    pub favicon: Option<String>,

    #[serde(default)]
    pub favicon_config: FaviconOptions,

    #[serde(default)]
    pub bundles: BundleSection,

    #[serde(default, alias = "h5aiConfig")]
    pub listing: Option<ListingConfig>,

    #[serde(default)]
    pub bundler: BundlerConfig,

    #[serde(default = "default_style_include_paths")]
    pub style_include_paths: Vec<String>,

    #[serde(default)]
    pub server: ServerConfig,

    /// Package version, fed to the favicon generator for cache busting.
    #[serde(default)]
    pub version: Option<String>,
}

fn default_style_include_paths() -> Vec<String> {
    vec!["node_modules".to_string()]
}

/// Options forwarded to the favicon generator.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FaviconOptions {
    #[serde(default)]
    pub app_name: Option<String>,
    #[serde(default)]
    pub app_short_name: Option<String>,
    #[serde(default)]
    pub app_description: Option<String>,
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default, alias = "theme_color")]
    pub theme_color: Option<String>,
    #[serde(default)]
    pub lang: Option<String>,
}

/// Named bundles per kind.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BundleSection {
    #[serde(default)]
    pub script: Vec<BundleDef>,
    #[serde(default)]
    pub style: Vec<BundleDef>,
}

/// One output artifact assembled from several sources.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct BundleDef {
    /// Output path relative to the output root, e.g. `"js/app.js"`.
    pub name: String,
    /// Glob fragments relative to the source root, in concatenation order.
    pub sources: Vec<String>,
}

/// Vendored directory-listing tool (h5ai in the original site).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingConfig {
    /// Directory holding the tool's assets, relative to the manifest's directory.
    pub source: String,
    /// Sub-path of the output root the assets are copied to.
    pub dist: String,
    /// Directory of the tool's JSON config, relative to `dist`.
    #[serde(default)]
    pub config_dir: String,
    #[serde(default = "default_listing_config_file")]
    pub config_file: String,
    /// Object deep-merged into the tool's config file.
    #[serde(default = "empty_object")]
    pub config_overrides: Value,
}

fn default_listing_config_file() -> String {
    "options.json".to_string()
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

/// External script bundler invocation.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BundlerConfig {
    #[serde(default = "default_bundler_command")]
    pub command: String,
    #[serde(default = "default_dev_args")]
    pub dev_args: Vec<String>,
    #[serde(default = "default_prod_args")]
    pub prod_args: Vec<String>,
}

fn default_bundler_command() -> String {
    "esbuild".to_string()
}

fn default_dev_args() -> Vec<String> {
    ["--bundle", "--sourcemap=inline", "--format=iife"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_prod_args() -> Vec<String> {
    ["--bundle", "--minify", "--format=iife"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for BundlerConfig {
    fn default() -> Self {
        Self {
            command: default_bundler_command(),
            dev_args: default_dev_args(),
            prod_args: default_prod_args(),
        }
    }
}

/// Dev server bind address.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "::1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Validated manifest.
///
/// Only constructed through `Manifest::try_from(RawManifest)`, so every
/// instance has passed validation. Root paths are normalised (no leading
/// `./`, no trailing `/`).
#[derive(Debug, Clone)]
pub struct Manifest {
    source: String,
    dist: String,
    pub script: Vec<String>,
    pub style: Vec<String>,
    pub markup: Vec<String>,
    pub partials: Vec<String>,
    pub file: Vec<String>,
    pub favicon: Option<String>,
    pub favicon_config: FaviconOptions,
    pub bundles: BundleSection,
    pub listing: Option<ListingConfig>,
    pub bundler: BundlerConfig,
    pub style_include_paths: Vec<String>,
    pub server: ServerConfig,
    pub version: Option<String>,
}

impl Manifest {
    pub(crate) fn new_unchecked(raw: RawManifest) -> Self {
        let script = if raw.script.is_empty() {
            bundle_sources(&raw.bundles.script)
        } else {
            raw.script
        };
        let style = if raw.style.is_empty() {
            bundle_sources(&raw.bundles.style)
        } else {
            raw.style
        };

        Self {
            source: normalize_root(&raw.source),
            dist: normalize_root(&raw.dist),
            script,
            style,
            markup: raw.markup,
            partials: raw.partials,
            file: raw.file,
            favicon: raw.favicon,
            favicon_config: raw.favicon_config,
            bundles: raw.bundles,
            listing: raw.listing,
            bundler: raw.bundler,
            style_include_paths: raw.style_include_paths,
            server: raw.server,
            version: raw.version,
        }
    }

    /// Source root relative to the project root, e.g. `"src"`.
    pub fn source_root(&self) -> &str {
        &self.source
    }

    /// Output root relative to the project root, e.g. `"dist"`.
    pub fn dist_root(&self) -> &str {
        &self.dist
    }

    /// Output sub-tree owned by the listing tool, e.g. `"dist/_h5ai"`.
    pub fn listing_dist(&self) -> Option<String> {
        self.listing
            .as_ref()
            .map(|l| join_root(&self.dist, &l.dist))
    }
}

/// Strip `./` prefixes and trailing slashes; `"./"` and `""` become `"."`.
pub fn normalize_root(root: &str) -> String {
    let mut s = root.trim().replace('\\', "/");
    while let Some(rest) = s.strip_prefix("./") {
        s = rest.to_string();
    }
    let trimmed = s.trim_end_matches('/');
    if trimmed.is_empty() || trimmed == "." {
        ".".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Join a glob fragment or sub-path onto a normalised root with exactly one `/`.
pub fn join_root(root: &str, fragment: &str) -> String {
    let mut frag = fragment.trim().replace('\\', "/");
    while let Some(rest) = frag.strip_prefix("./") {
        frag = rest.to_string();
    }
    let frag = frag.trim_start_matches('/');
    let root = normalize_root(root);
    if root == "." {
        frag.to_string()
    } else if frag.is_empty() {
        root
    } else {
        format!("{root}/{frag}")
    }
}

fn bundle_sources(bundles: &[BundleDef]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for src in bundles.iter().flat_map(|b| b.sources.iter()) {
        if !out.contains(src) {
            out.push(src.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roots_are_normalised() {
        assert_eq!(normalize_root("src/"), "src");
        assert_eq!(normalize_root("./dist//"), "dist");
        assert_eq!(normalize_root("./"), ".");
    }

    #[test]
    fn fragments_join_with_a_single_slash() {
        assert_eq!(join_root("src/", "**/*.js"), "src/**/*.js");
        assert_eq!(join_root("src", "/favicon.png"), "src/favicon.png");
        assert_eq!(join_root(".", "./a/b.html"), "a/b.html");
        assert_eq!(join_root("dist", ""), "dist");
    }
}
