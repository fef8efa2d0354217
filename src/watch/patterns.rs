// src/watch/patterns.rs

//! Compiled source-side glob sets used to classify changed paths.

use anyhow::Result;

use crate::globs::{CLAIM_ORDER, DerivedGlobs, GlobMatcher};
use crate::types::Category;

/// Compiled source-side sets, in claim order.
///
/// The derived sets partition the source tree, so the first matching
/// category is the only one.
#[derive(Debug)]
pub struct CategoryMatchers {
    matchers: Vec<(Category, GlobMatcher)>,
    dist_prefix: Option<String>,
}

impl CategoryMatchers {
    pub fn from_globs(globs: &DerivedGlobs) -> Result<Self> {
        let mut matchers = Vec::new();
        for category in CLAIM_ORDER {
            let list = globs.source(category);
            if list.has_includes() {
                matchers.push((category, list.compile()?));
            }
        }

        let dist_prefix = match globs.dist_root() {
            "." => None,
            dist => Some(format!("{dist}/")),
        };

        Ok(Self {
            matchers,
            dist_prefix,
        })
    }

    /// Categories with at least one include, in claim order.
    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.matchers.iter().map(|(c, _)| *c)
    }

    /// Category of a project-relative path, or `None` when no stage
    /// sources it. Paths below the output root never belong to a category.
    pub fn classify(&self, rel_path: &str) -> Option<Category> {
        if let Some(prefix) = &self.dist_prefix {
            if rel_path.starts_with(prefix.as_str()) {
                return None;
            }
        }
        self.matchers
            .iter()
            .find(|(_, m)| m.matches(rel_path))
            .map(|(c, _)| *c)
    }
}
