// src/stages/markup/critical.rs

//! Static critical-CSS inlining.
//!
//! For every local `<link rel="stylesheet">` in a page the referenced
//! stylesheet is read from the output tree and reduced to the rules whose
//! selectors only mention tags, classes and ids that occur in the page.
//! The reduced CSS is inlined in a `<style>` element ahead of the first
//! stylesheet link, and each link is turned into a non-blocking preload
//! with a `<noscript>` fallback.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use lightningcss::rules::{CssRule, CssRuleList};
use lightningcss::selector::{Component, Selector};
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use regex::Regex;

use crate::fs::FileSystem;

/// Tags, classes and ids that occur in a document.
#[derive(Debug, Default)]
struct DocumentTokens {
    tags: HashSet<String>,
    classes: HashSet<String>,
    ids: HashSet<String>,
}

/// One stylesheet link found in a page.
#[derive(Debug, Clone, PartialEq, Eq)]
struct StylesheetLink {
    start: usize,
    end: usize,
    href: String,
}

pub struct CriticalCss<'a> {
    fs: &'a dyn FileSystem,
    dist_root: PathBuf,
    link_tag: Regex,
    rel_stylesheet: Regex,
    href: Regex,
    open_tag: Regex,
    class_attr: Regex,
    id_attr: Regex,
}

impl<'a> CriticalCss<'a> {
    pub fn new(fs: &'a dyn FileSystem, dist_root: impl Into<PathBuf>) -> Result<Self> {
        let re = |p: &str| Regex::new(p).with_context(|| format!("building pattern {p}"));
        Ok(Self {
            fs,
            dist_root: dist_root.into(),
            link_tag: re(r"(?i)<link\b[^>]*>")?,
            rel_stylesheet: re(r#"(?i)\brel\s*=\s*["']?stylesheet["']?"#)?,
            href: re(r#"(?i)\bhref\s*=\s*["']([^"']+)["']"#)?,
            open_tag: re(r"<([a-zA-Z][a-zA-Z0-9-]*)")?,
            class_attr: re(r#"(?i)\bclass\s*=\s*["']([^"']*)["']"#)?,
            id_attr: re(r#"(?i)\bid\s*=\s*["']([^"']*)["']"#)?,
        })
    }

    /// Inline the critical rules of every local stylesheet linked from
    /// `html`, which lives at `page` in the output tree.
    ///
    /// A linked stylesheet that cannot be read is an error for the page.
    pub fn inline(&self, html: &str, page: &Path) -> Result<String> {
        let links = self.stylesheet_links(html);
        if links.is_empty() {
            return Ok(html.to_string());
        }

        let tokens = self.document_tokens(html);
        let mut critical = String::new();
        for link in &links {
            let path = self.resolve_href(&link.href, page);
            let css = self
                .fs
                .read_to_string(&path)
                .with_context(|| format!("reading stylesheet {}", link.href))?;
            let kept = critical_rules(&css, &tokens)
                .with_context(|| format!("extracting critical rules of {}", link.href))?;
            critical.push_str(&kept);
        }

        let mut out = String::with_capacity(html.len() + critical.len());
        let mut last = 0;
        for (i, link) in links.iter().enumerate() {
            out.push_str(&html[last..link.start]);
            if i == 0 && !critical.is_empty() {
                out.push_str("<style>");
                out.push_str(&critical);
                out.push_str("</style>");
            }
            out.push_str(&preload_link(&link.href));
            last = link.end;
        }
        out.push_str(&html[last..]);
        Ok(out)
    }

    fn stylesheet_links(&self, html: &str) -> Vec<StylesheetLink> {
        self.link_tag
            .find_iter(html)
            .filter(|m| self.rel_stylesheet.is_match(m.as_str()))
            .filter_map(|m| {
                let href = self.href.captures(m.as_str())?.get(1)?.as_str().to_string();
                is_local_href(&href).then_some(StylesheetLink {
                    start: m.start(),
                    end: m.end(),
                    href,
                })
            })
            .collect()
    }

    fn resolve_href(&self, href: &str, page: &Path) -> PathBuf {
        let clean = href.split(['?', '#']).next().unwrap_or(href);
        match clean.strip_prefix('/') {
            Some(rooted) => self.dist_root.join(rooted),
            None => page
                .parent()
                .map(|dir| dir.join(clean))
                .unwrap_or_else(|| PathBuf::from(clean)),
        }
    }

    fn document_tokens(&self, html: &str) -> DocumentTokens {
        let mut tokens = DocumentTokens::default();
        for caps in self.open_tag.captures_iter(html) {
            tokens.tags.insert(caps[1].to_ascii_lowercase());
        }
        for caps in self.class_attr.captures_iter(html) {
            tokens
                .classes
                .extend(caps[1].split_whitespace().map(str::to_string));
        }
        for caps in self.id_attr.captures_iter(html) {
            tokens.ids.insert(caps[1].trim().to_string());
        }
        tokens
    }
}

fn is_local_href(href: &str) -> bool {
    let lower = href.to_ascii_lowercase();
    !(lower.starts_with("http://")
        || lower.starts_with("https://")
        || lower.starts_with("//")
        || lower.starts_with("data:"))
}

fn preload_link(href: &str) -> String {
    format!(
        r#"<link rel="preload" href="{href}" as="style" onload="this.onload=null;this.rel='stylesheet'"><noscript><link rel="stylesheet" href="{href}"></noscript>"#
    )
}

/// Parse and minify `css`, keep the rules `tokens` can match and print the
/// result minified.
fn critical_rules(css: &str, tokens: &DocumentTokens) -> Result<String> {
    let mut sheet = StyleSheet::parse(css, ParserOptions::default())
        .map_err(|e| anyhow!("parsing css: {e}"))?;
    sheet
        .minify(MinifyOptions::default())
        .map_err(|e| anyhow!("minifying css: {e}"))?;
    retain_critical(&mut sheet.rules, tokens);
    let out = sheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .map_err(|e| anyhow!("printing css: {e}"))?;
    Ok(out.code)
}

/// Style rules survive when one of their selectors can match the page.
/// `@media` and `@supports` blocks keep their surviving children and vanish
/// when none are left. `@font-face` is kept; every other at-rule is dropped.
fn retain_critical(rules: &mut CssRuleList<'_>, tokens: &DocumentTokens) {
    rules.0.retain_mut(|rule| match rule {
        CssRule::Style(style) => {
            style.selectors.0.iter().any(|s| selector_applies(s, tokens))
        }
        CssRule::Media(media) => {
            retain_critical(&mut media.rules, tokens);
            !media.rules.0.is_empty()
        }
        CssRule::Supports(supports) => {
            retain_critical(&mut supports.rules, tokens);
            !supports.rules.0.is_empty()
        }
        CssRule::FontFace(_) => true,
        _ => false,
    });
}

/// Every type, class and id the selector names occurs in the page.
///
/// Pseudo-classes, pseudo-elements, attribute tests and combinators do not
/// restrict the match.
fn selector_applies(selector: &Selector<'_>, tokens: &DocumentTokens) -> bool {
    selector.iter_raw_match_order().all(|component| match component {
        Component::LocalName(local) => tokens.tags.contains(&*local.lower_name.0),
        Component::Class(class) => tokens.classes.contains(&*class.0),
        Component::ID(id) => tokens.ids.contains(&*id.0),
        _ => true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    const PAGE: &str = r#"<html><head><link rel="stylesheet" href="/css/site.css"></head><body class="home"><h1 id="title">Hi</h1></body></html>"#;

    #[test]
    fn inlines_only_rules_used_by_the_page() {
        let fs = MockFileSystem::new();
        fs.add_file(
            "dist/css/site.css",
            "h1 { color: red; }\n.sidebar { width: 10px; }\n.home #title { margin: 0; }\n",
        );

        let critical = CriticalCss::new(&fs, "dist").unwrap();
        let out = critical.inline(PAGE, Path::new("dist/index.html")).unwrap();

        assert!(out.contains("<style>h1{color:red}.home #title{margin:0}</style>"));
        assert!(!out.contains(".sidebar"));
        assert!(out.contains(r#"<link rel="preload" href="/css/site.css" as="style""#));
        assert!(out.contains(r#"<noscript><link rel="stylesheet" href="/css/site.css"></noscript>"#));
    }

    #[test]
    fn media_blocks_keep_matching_rules_only() {
        let fs = MockFileSystem::new();
        fs.add_file(
            "dist/css/site.css",
            "@media (min-width: 600px) { h1 { font-size: 2em } .nav { display: flex } }\n@media print { .nav { display: none } }",
        );

        let critical = CriticalCss::new(&fs, "dist").unwrap();
        let out = critical.inline(PAGE, Path::new("dist/index.html")).unwrap();

        assert!(out.contains("h1{font-size:2em}"));
        assert!(!out.contains(".nav"));
        assert!(!out.contains("print"));
    }

    #[test]
    fn relative_hrefs_resolve_against_the_page_directory() {
        let fs = MockFileSystem::new();
        fs.add_file("dist/blog/post.css", "p { margin: 0 }");
        let html = r#"<link rel="stylesheet" href="post.css"><p>x</p>"#;

        let critical = CriticalCss::new(&fs, "dist").unwrap();
        let out = critical.inline(html, Path::new("dist/blog/index.html")).unwrap();
        assert!(out.starts_with("<style>p{margin:0}</style>"));
    }

    #[test]
    fn remote_stylesheets_are_left_alone() {
        let fs = MockFileSystem::new();
        let html = r#"<link rel="stylesheet" href="https://cdn.example.com/x.css"><p>x</p>"#;

        let critical = CriticalCss::new(&fs, "dist").unwrap();
        let out = critical.inline(html, Path::new("dist/index.html")).unwrap();
        assert_eq!(out, html);
    }

    #[test]
    fn missing_stylesheet_is_an_error() {
        let fs = MockFileSystem::new();
        let critical = CriticalCss::new(&fs, "dist").unwrap();
        assert!(critical.inline(PAGE, Path::new("dist/index.html")).is_err());
    }

    #[test]
    fn selector_lists_keep_rules_matched_by_any_member() {
        let fs = MockFileSystem::new();
        fs.add_file(
            "dist/css/site.css",
            ".nav, h1::before { content: 'x' }\nul > li.item { margin: 0 }\na:not(.x, .y) { color: blue }",
        );
        let html = r#"<link rel="stylesheet" href="/css/site.css"><h1>x</h1><a href="/">y</a>"#;

        let critical = CriticalCss::new(&fs, "dist").unwrap();
        let out = critical.inline(html, Path::new("dist/index.html")).unwrap();

        assert!(out.contains("content:"), "out was: {out}");
        assert!(out.contains("a:not("), "out was: {out}");
        assert!(!out.contains("li.item"));
    }

    #[test]
    fn font_faces_survive_and_other_at_rules_are_dropped() {
        let fs = MockFileSystem::new();
        fs.add_file(
            "dist/css/site.css",
            "@font-face { font-family: Body; src: url(body.woff2) }\n@keyframes spin { to { opacity: 0 } }\n@supports (display: grid) { .home { display: grid } .gone { display: grid } }",
        );

        let critical = CriticalCss::new(&fs, "dist").unwrap();
        let out = critical.inline(PAGE, Path::new("dist/index.html")).unwrap();

        assert!(out.contains("@font-face"));
        assert!(!out.contains("@keyframes"));
        assert!(out.contains("@supports"));
        assert!(out.contains(".home{display:grid}"), "out was: {out}");
        assert!(!out.contains(".gone"));
    }
}
