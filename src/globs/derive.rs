// src/globs/derive.rs

use std::collections::{BTreeMap, BTreeSet};

use crate::config::model::{BundleDef, Manifest, join_root};
use crate::globs::pattern::GlobList;
use crate::types::Category;

/// Sub-directory of the output root the favicon set is written to.
pub const FAVICON_DIR: &str = "favicons";

/// Categories in claim order. A file goes to the first category whose
/// includes match it; every category excludes the includes of the
/// categories before it. `File` comes last, so it claims the remainder.
pub const CLAIM_ORDER: [Category; 6] = [
    Category::Favicon,
    Category::Partial,
    Category::Script,
    Category::Style,
    Category::Markup,
    Category::File,
];

/// Include / exclude glob sets for every category, derived from a manifest.
///
/// All patterns are relative to the project root (the manifest's directory).
///
/// Source-side sets partition the source tree. Output-side sets say which
/// outputs a category can produce and may overlap: `dist/**/*.css` covers
/// both compiled stylesheets and copied plain `.css` files. Which category
/// owns an overlapping output is decided against the source tree by
/// [`OutputOwners`](crate::globs::OutputOwners).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedGlobs {
    source_root: String,
    dist_root: String,
    favicon_dist: String,
    listing_dist: Option<String>,
    source: BTreeMap<Category, GlobList>,
    dist: BTreeMap<Category, GlobList>,
    /// Project-relative bundle output path → its category.
    bundle_outputs: BTreeMap<String, Category>,
}

impl DerivedGlobs {
    pub fn source_root(&self) -> &str {
        &self.source_root
    }

    pub fn dist_root(&self) -> &str {
        &self.dist_root
    }

    /// `<dist>/favicons`
    pub fn favicon_dist(&self) -> &str {
        &self.favicon_dist
    }

    pub fn listing_dist(&self) -> Option<&str> {
        self.listing_dist.as_deref()
    }

    /// Source-side set of `category`. Every category has one, possibly
    /// without includes.
    pub fn source(&self, category: Category) -> &GlobList {
        static EMPTY: GlobList = GlobList::empty();
        self.source.get(&category).unwrap_or(&EMPTY)
    }

    /// Output-side set of `category`. Partials have none.
    pub fn dist(&self, category: Category) -> Option<&GlobList> {
        self.dist.get(&category)
    }

    pub fn bundle_owner(&self, output: &str) -> Option<Category> {
        self.bundle_outputs.get(output).copied()
    }

    /// Categories whose outputs are named bundles rather than mirrored sources.
    pub fn bundled(&self) -> BTreeSet<Category> {
        self.bundle_outputs.values().copied().collect()
    }
}

/// Expand a validated manifest into per-category glob sets.
pub fn derive_globs(manifest: &Manifest) -> DerivedGlobs {
    let src = manifest.source_root();
    let dist = manifest.dist_root();
    let favicon_dist = join_root(dist, FAVICON_DIR);
    let listing_dist = manifest.listing_dist();

    // Raw include lists, before any exclusion is applied.
    let mut source_includes: BTreeMap<Category, GlobList> = BTreeMap::new();
    source_includes.insert(Category::Script, rooted(src, &manifest.script));
    source_includes.insert(Category::Style, rooted(src, &manifest.style));
    source_includes.insert(Category::Markup, rooted(src, &manifest.markup));
    source_includes.insert(Category::Partial, rooted(src, &manifest.partials));
    source_includes.insert(
        Category::Favicon,
        rooted(src, manifest.favicon.as_slice()),
    );
    source_includes.insert(Category::File, rooted(src, &manifest.file));

    let mut dist_includes: BTreeMap<Category, GlobList> = BTreeMap::new();
    dist_includes.insert(
        Category::Script,
        script_outputs(dist, &manifest.script, &manifest.bundles.script),
    );
    dist_includes.insert(
        Category::Style,
        style_outputs(dist, &manifest.style, &manifest.bundles.style),
    );
    dist_includes.insert(Category::Markup, rooted(dist, &manifest.markup));
    dist_includes.insert(
        Category::Favicon,
        GlobList::from_includes([format!("{favicon_dist}/**")]),
    );
    dist_includes.insert(Category::File, rooted(dist, &manifest.file));

    let source = apply_claim_order(&source_includes);
    let mut dist_sets = dist_includes;

    // Stage-owned output sub-trees are never matched by another category.
    for (category, set) in dist_sets.iter_mut() {
        if *category != Category::Favicon {
            set.push_exclude(format!("{favicon_dist}/**"));
        }
        if let Some(listing) = &listing_dist {
            set.push_exclude(format!("{listing}/**"));
        }
    }

    DerivedGlobs {
        source_root: src.to_string(),
        dist_root: dist.to_string(),
        favicon_dist,
        listing_dist,
        source,
        dist: dist_sets,
        bundle_outputs: bundle_outputs(dist, manifest),
    }
}

fn bundle_outputs(dist: &str, manifest: &Manifest) -> BTreeMap<String, Category> {
    let script = manifest.bundles.script.iter().map(|b| (b, Category::Script));
    let style = manifest.bundles.style.iter().map(|b| (b, Category::Style));
    script
        .chain(style)
        .map(|(bundle, category)| (join_root(dist, &bundle.name), category))
        .collect()
}

fn rooted(root: &str, fragments: &[String]) -> GlobList {
    GlobList::from_includes(fragments.iter().map(|f| join_root(root, f)))
}

fn apply_claim_order(includes: &BTreeMap<Category, GlobList>) -> BTreeMap<Category, GlobList> {
    let mut out = BTreeMap::new();
    for (idx, category) in CLAIM_ORDER.iter().enumerate() {
        let Some(own) = includes.get(category) else {
            continue;
        };
        let mut set = own.clone();
        for earlier in &CLAIM_ORDER[..idx] {
            if let Some(other) = includes.get(earlier) {
                set.exclude_all_of(other);
            }
        }
        out.insert(*category, set);
    }
    out
}

fn script_outputs(dist: &str, fragments: &[String], bundles: &[BundleDef]) -> GlobList {
    if bundles.is_empty() {
        rooted(dist, fragments)
    } else {
        GlobList::from_includes(bundles.iter().map(|b| join_root(dist, &b.name)))
    }
}

fn style_outputs(dist: &str, fragments: &[String], bundles: &[BundleDef]) -> GlobList {
    if bundles.is_empty() {
        GlobList::from_includes(fragments.iter().map(|f| join_root(dist, &css_output_glob(f))))
    } else {
        GlobList::from_includes(bundles.iter().map(|b| join_root(dist, &b.name)))
    }
}

/// Rewrite a style-source glob to the glob its compiled output matches.
///
/// `**/*.scss` becomes `**/*.css`; globs without a Sass extension are
/// returned unchanged.
pub fn css_output_glob(fragment: &str) -> String {
    for ext in [".scss", ".sass"] {
        if let Some(stem) = fragment.strip_suffix(ext) {
            return format!("{stem}.css");
        }
    }
    fragment.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sass_extensions_map_to_css() {
        assert_eq!(css_output_glob("**/*.scss"), "**/*.css");
        assert_eq!(css_output_glob("css/main.sass"), "css/main.css");
        assert_eq!(css_output_glob("**/*.css"), "**/*.css");
    }

    #[test]
    fn claim_order_excludes_only_earlier_categories() {
        let mut includes = BTreeMap::new();
        includes.insert(Category::Partial, GlobList::from_includes(["src/partials/**"]));
        includes.insert(Category::Markup, GlobList::from_includes(["src/**/*.html"]));
        includes.insert(Category::File, GlobList::from_includes(["src/**/*"]));

        let sets = apply_claim_order(&includes);

        assert_eq!(sets[&Category::Partial].to_strings(), vec!["src/partials/**"]);
        assert_eq!(
            sets[&Category::Markup].to_strings(),
            vec!["src/**/*.html", "!src/partials/**"]
        );
        assert_eq!(
            sets[&Category::File].to_strings(),
            vec!["src/**/*", "!src/partials/**", "!src/**/*.html"]
        );
    }
}
