// src/stages/markup/minify.rs

//! Whitespace-level HTML minification.
//!
//! Runs of whitespace collapse to one space and whitespace between a closing
//! `>` and the next `<` on different lines is removed. The bodies of
//! `pre`, `textarea`, `script` and `style` elements are left untouched.

use anyhow::{Context, Result};
use regex::Regex;

// Protected blocks are swapped for tag-shaped placeholders so the
// between-tags rule treats them like the elements they stand for.
const PLACEHOLDER_OPEN: char = '\u{E000}';
const PLACEHOLDER_CLOSE: char = '\u{E001}';

pub struct HtmlMinifier {
    protected: Regex,
    between_tags: Regex,
    runs: Regex,
    placeholder: Regex,
}

impl HtmlMinifier {
    pub fn new() -> Result<Self> {
        Ok(Self {
            protected: Regex::new(r"(?is)<(pre|textarea|script|style)\b[^>]*>.*?</(?:pre|textarea|script|style)\s*>")
                .context("building protected-block pattern")?,
            between_tags: Regex::new(r">\s*\n\s*<").context("building tag-gap pattern")?,
            runs: Regex::new(r"\s+").context("building whitespace pattern")?,
            placeholder: Regex::new("<\u{E000}(\\d+)\u{E001}>").context("building placeholder pattern")?,
        })
    }

    pub fn minify(&self, html: &str) -> String {
        let mut blocks: Vec<String> = Vec::new();
        let shielded = self.protected.replace_all(html, |caps: &regex::Captures<'_>| {
            blocks.push(caps[0].to_string());
            format!("<{PLACEHOLDER_OPEN}{}{PLACEHOLDER_CLOSE}>", blocks.len() - 1)
        });

        let tight = self.between_tags.replace_all(&shielded, "><");
        let collapsed = self.runs.replace_all(&tight, " ");

        let restored = self.placeholder.replace_all(&collapsed, |caps: &regex::Captures<'_>| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|i| blocks.get(i).cloned())
                .unwrap_or_default()
        });

        restored.trim().to_string()
    }
}
