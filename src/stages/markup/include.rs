// src/stages/markup/include.rs

//! Textual include directives: `@@include('partials/nav.html')`.
//!
//! The directive prefix selects the base directory: the source pass uses
//! `@@` against the source root and the output pass uses `%%` against the
//! output root. An optional JSON object after the path supplies variables
//! substituted as `<prefix>name` inside the included text:
//!
//! ```text
//! @@include('partials/head.html', {"title": "Home"})
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use regex::Regex;
use serde_json::Value;

use crate::fs::FileSystem;

/// Nested includes deeper than this are treated as runaway recursion.
pub const MAX_INCLUDE_DEPTH: usize = 32;

pub struct IncludeResolver<'a> {
    fs: &'a dyn FileSystem,
    base: PathBuf,
    prefix: &'static str,
    directive: Regex,
}

impl<'a> IncludeResolver<'a> {
    pub fn new(
        fs: &'a dyn FileSystem,
        base: impl Into<PathBuf>,
        prefix: &'static str,
    ) -> Result<Self> {
        let pattern = format!(
            r#"{}include\(\s*(?:'([^']*)'|"([^"]*)")\s*(?:,\s*(\{{[^)]*\}}))?\s*\)"#,
            regex::escape(prefix)
        );
        Ok(Self {
            fs,
            base: base.into(),
            prefix,
            directive: Regex::new(&pattern).context("building include pattern")?,
        })
    }

    /// Expand every directive in `text`, recursively.
    pub fn expand(&self, text: &str) -> Result<String> {
        let mut stack = Vec::new();
        self.expand_inner(text, &mut stack)
    }

    fn expand_inner(&self, text: &str, stack: &mut Vec<PathBuf>) -> Result<String> {
        if stack.len() > MAX_INCLUDE_DEPTH {
            bail!("include depth exceeds {MAX_INCLUDE_DEPTH}");
        }

        let mut out = String::with_capacity(text.len());
        let mut last = 0;

        for caps in self.directive.captures_iter(text) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            out.push_str(&text[last..whole.start()]);
            last = whole.end();

            let rel = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            let path = self.resolve(rel);

            if stack.contains(&path) {
                bail!("include cycle through {}", path.display());
            }

            let included = self
                .fs
                .read_to_string(&path)
                .with_context(|| format!("{}include('{rel}')", self.prefix))?;

            let included = match caps.get(3) {
                Some(ctx) => {
                    let vars: Value = serde_json::from_str(ctx.as_str())
                        .with_context(|| format!("include context for '{rel}'"))?;
                    self.substitute(&included, &vars)
                }
                None => included,
            };

            stack.push(path);
            let expanded = self.expand_inner(&included, stack)?;
            stack.pop();

            out.push_str(&expanded);
        }

        out.push_str(&text[last..]);
        Ok(out)
    }

    fn resolve(&self, rel: &str) -> PathBuf {
        let rel = rel.trim().trim_start_matches("./").trim_start_matches('/');
        self.base.join(Path::new(rel))
    }

    fn substitute(&self, text: &str, vars: &Value) -> String {
        let Some(map) = vars.as_object() else {
            return text.to_string();
        };
        // Longest names first so `@@titleLong` is not clobbered by `@@title`.
        let mut keys: Vec<&String> = map.keys().collect();
        keys.sort_by_key(|k| std::cmp::Reverse(k.len()));

        let mut out = text.to_string();
        for key in keys {
            let value = match &map[key] {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            out = out.replace(&format!("{}{}", self.prefix, key), &value);
        }
        out
    }
}
