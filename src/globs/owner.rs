// src/globs/owner.rs

//! Which category an existing output file belongs to.
//!
//! Output-side glob sets overlap where one category's output extension is
//! another category's source extension (a compiled `style.css` and a copied
//! `vendor/lib.css` both match `dist/**/*.css`). Ownership is therefore
//! settled by looking for the source that would produce the output.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::Result;

use crate::fs::FileSystem;
use crate::globs::derive::{CLAIM_ORDER, DerivedGlobs};
use crate::globs::pattern::GlobMatcher;
use crate::types::Category;

/// Resolves output paths to the category whose current sources produce them.
pub struct OutputOwners<'a> {
    globs: &'a DerivedGlobs,
    sources: BTreeMap<Category, GlobMatcher>,
    bundled: BTreeSet<Category>,
}

impl<'a> OutputOwners<'a> {
    pub fn new(globs: &'a DerivedGlobs) -> Result<Self> {
        let mut sources = BTreeMap::new();
        for category in CLAIM_ORDER {
            let list = globs.source(category);
            if list.has_includes() {
                sources.insert(category, list.compile()?);
            }
        }
        Ok(Self {
            globs,
            sources,
            bundled: globs.bundled(),
        })
    }

    /// Owner of `output`, a project-relative path below the output root.
    ///
    /// `None` means no current source produces it: the output is stale and
    /// any category whose output set matches it may remove it.
    pub fn owner(
        &self,
        fs: &dyn FileSystem,
        project_root: &Path,
        output: &str,
    ) -> Option<Category> {
        let favicon_prefix = format!("{}/", self.globs.favicon_dist());
        if output.starts_with(&favicon_prefix) {
            return Some(Category::Favicon);
        }
        if let Some(category) = self.globs.bundle_owner(output) {
            return Some(category);
        }

        let dist_prefix = format!("{}/", self.globs.dist_root());
        let rel = output.strip_prefix(&dist_prefix)?;

        CLAIM_ORDER.into_iter().find(|&category| {
            let Some(matcher) = self.sources.get(&category) else {
                return false;
            };
            self.candidate_sources(category, rel)
                .iter()
                .any(|src| matcher.matches(src) && fs.is_file(&project_root.join(src)))
        })
    }

    /// Source paths that `category` would turn into `<dist>/<rel>`.
    fn candidate_sources(&self, category: Category, rel: &str) -> Vec<String> {
        let src = self.globs.source_root();
        let in_source = |rel: &str| {
            if src == "." {
                rel.to_string()
            } else {
                format!("{src}/{rel}")
            }
        };

        match category {
            Category::Favicon | Category::Partial => Vec::new(),
            Category::Script | Category::Style if self.bundled.contains(&category) => Vec::new(),
            Category::Style => match rel.strip_suffix(".css") {
                Some(stem) => ["scss", "sass", "css"]
                    .iter()
                    .map(|ext| in_source(&format!("{stem}.{ext}")))
                    .collect(),
                None => Vec::new(),
            },
            Category::Script | Category::Markup | Category::File => vec![in_source(rel)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Manifest, RawManifest};
    use crate::fs::mock::MockFileSystem;
    use crate::globs::derive_globs;

    fn globs(doc: serde_json::Value) -> DerivedGlobs {
        let raw: RawManifest = serde_json::from_value(doc).unwrap();
        derive_globs(&Manifest::try_from(raw).unwrap())
    }

    fn site() -> DerivedGlobs {
        globs(serde_json::json!({
            "source": "src",
            "dist": "dist",
            "script": ["**/*.js"],
            "style": ["**/*.scss"],
            "markup": ["**/*.html"],
            "file": ["**/*"],
        }))
    }

    #[test]
    fn compiled_and_copied_stylesheets_have_different_owners() {
        let globs = site();
        let owners = OutputOwners::new(&globs).unwrap();
        let fs = MockFileSystem::new();
        fs.add_file("/p/src/style.scss", "h1{}");
        fs.add_file("/p/src/vendor/lib.css", "p{}");
        let root = Path::new("/p");

        assert_eq!(owners.owner(&fs, root, "dist/style.css"), Some(Category::Style));
        assert_eq!(owners.owner(&fs, root, "dist/vendor/lib.css"), Some(Category::File));
    }

    #[test]
    fn outputs_without_a_source_have_no_owner() {
        let globs = site();
        let owners = OutputOwners::new(&globs).unwrap();
        let fs = MockFileSystem::new();

        assert_eq!(owners.owner(&fs, Path::new("/p"), "dist/gone.css"), None);
        assert_eq!(
            owners.owner(&fs, Path::new("/p"), "dist/favicons/favicon.ico"),
            Some(Category::Favicon)
        );
    }

    #[test]
    fn bundle_outputs_belong_to_their_kind() {
        let globs = globs(serde_json::json!({
            "source": "src",
            "dist": "dist",
            "file": ["**/*"],
            "bundles": { "script": [{ "name": "js/app.js", "sources": ["js/*.js"] }] },
        }));
        let owners = OutputOwners::new(&globs).unwrap();
        let fs = MockFileSystem::new();
        fs.add_file("/p/src/js/app.js", "main();");

        assert_eq!(owners.owner(&fs, Path::new("/p"), "dist/js/app.js"), Some(Category::Script));
    }
}
