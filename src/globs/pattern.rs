// src/globs/pattern.rs

use std::convert::Infallible;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};

use crate::fs::FileSystem;

/// A single include or exclude pattern, relative to the project root.
///
/// The textual form uses a leading `!` for exclusions, e.g. `!dist/favicons/**`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GlobPattern {
    pattern: String,
    negated: bool,
}

impl GlobPattern {
    pub fn include(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            negated: false,
        }
    }

    pub fn exclude(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            negated: true,
        }
    }

    /// The pattern without its negation marker.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }
}

impl fmt::Display for GlobPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, "!{}", self.pattern)
        } else {
            f.write_str(&self.pattern)
        }
    }
}

impl FromStr for GlobPattern {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.strip_prefix('!') {
            Some(rest) => GlobPattern::exclude(rest),
            None => GlobPattern::include(s),
        })
    }
}

/// Ordered list of include / exclude patterns.
///
/// A path belongs to the list when it matches at least one include and no
/// exclude. Exclusions are always appended after the includes they restrict,
/// so this is equivalent to gulp's ordered evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobList {
    patterns: Vec<GlobPattern>,
}

impl GlobList {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn empty() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    pub fn from_includes<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(GlobPattern::include).collect(),
        }
    }

    pub fn push(&mut self, pattern: GlobPattern) {
        if !self.patterns.contains(&pattern) {
            self.patterns.push(pattern);
        }
    }

    pub fn push_include(&mut self, pattern: impl Into<String>) {
        self.push(GlobPattern::include(pattern));
    }

    pub fn push_exclude(&mut self, pattern: impl Into<String>) {
        self.push(GlobPattern::exclude(pattern));
    }

    /// Append the include patterns of `other` as exclusions.
    pub fn exclude_all_of(&mut self, other: &GlobList) {
        for pattern in other.includes() {
            self.push_exclude(pattern);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &GlobPattern> {
        self.patterns.iter()
    }

    pub fn includes(&self) -> impl Iterator<Item = &str> {
        self.patterns
            .iter()
            .filter(|p| !p.negated)
            .map(|p| p.pattern.as_str())
    }

    pub fn excludes(&self) -> impl Iterator<Item = &str> {
        self.patterns
            .iter()
            .filter(|p| p.negated)
            .map(|p| p.pattern.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn has_includes(&self) -> bool {
        self.includes().next().is_some()
    }

    /// Textual form, e.g. `["src/**/*.js", "!src/vendor/**"]`.
    pub fn to_strings(&self) -> Vec<String> {
        self.patterns.iter().map(|p| p.to_string()).collect()
    }

    pub fn compile(&self) -> Result<GlobMatcher> {
        let include: Vec<&str> = self.includes().collect();
        let exclude: Vec<&str> = self.excludes().collect();

        let include_set = build_globset(&include).context("building include globset")?;
        let exclude_set = if exclude.is_empty() {
            None
        } else {
            Some(build_globset(&exclude).context("building exclude globset")?)
        };

        Ok(GlobMatcher {
            include_set,
            exclude_set,
        })
    }
}

impl<S: AsRef<str>> FromIterator<S> for GlobList {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        let mut list = GlobList::new();
        for s in iter {
            // Infallible parse.
            if let Ok(p) = s.as_ref().parse::<GlobPattern>() {
                list.push(p);
            }
        }
        list
    }
}

/// Compiled form of a [`GlobList`].
#[derive(Clone)]
pub struct GlobMatcher {
    include_set: GlobSet,
    exclude_set: Option<GlobSet>,
}

impl fmt::Debug for GlobMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobMatcher")
            .field("includes", &self.include_set.len())
            .finish_non_exhaustive()
    }
}

impl GlobMatcher {
    /// Returns true if the project-root-relative path (forward slashes)
    /// belongs to the compiled list.
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.include_set.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude_set {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }
}

/// Compile one pattern with gulp-like semantics: `*` never crosses `/`.
pub fn compile_glob(pattern: &str) -> std::result::Result<Glob, globset::Error> {
    GlobBuilder::new(pattern).literal_separator(true).build()
}

fn build_globset(patterns: &[&str]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = compile_glob(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Collect all files below `root/walk_base` whose root-relative path matches.
///
/// Directories are never returned. A missing `walk_base` yields no files.
/// The result is sorted so stage output order is deterministic.
pub fn collect_matching_files(
    fs: &dyn FileSystem,
    root: &Path,
    walk_base: &str,
    matcher: &GlobMatcher,
) -> Result<Vec<PathBuf>> {
    let base = if walk_base == "." {
        root.to_path_buf()
    } else {
        root.join(walk_base)
    };

    let mut files = Vec::new();
    if !fs.is_dir(&base) {
        return Ok(files);
    }

    let mut stack = vec![base];
    while let Some(dir) = stack.pop() {
        for path in fs.read_dir(&dir)? {
            if fs.is_dir(&path) {
                stack.push(path);
            } else if fs.is_file(&path) {
                if let Some(rel) = rel_string(root, &path) {
                    if matcher.matches(&rel) {
                        files.push(path);
                    }
                }
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Root-relative path with forward slashes.
///
/// `.` components are ignored on both sides, so `./src/a.js` is inside `src`.
pub fn rel_string(root: &Path, path: &Path) -> Option<String> {
    let root = without_curdir(root);
    let path = without_curdir(path);
    let rel = path.strip_prefix(&root).ok()?;
    Some(rel.to_string_lossy().replace('\\', "/"))
}

fn without_curdir(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}
