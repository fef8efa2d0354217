// src/stages/markup/mod.rs

pub mod critical;
pub mod include;
pub mod minify;

use std::path::Path;
use std::time::SystemTime;

use anyhow::{Context, Result};
use tracing::{debug, error, info};

use crate::fs::FileSystem;
use crate::stages::StageContext;
use crate::types::Category;

pub use critical::CriticalCss;
pub use include::IncludeResolver;
pub use minify::HtmlMinifier;

/// Prefix of includes resolved against the source root.
pub const SOURCE_INCLUDE_PREFIX: &str = "@@";
/// Prefix of includes resolved against the output root.
pub const DIST_INCLUDE_PREFIX: &str = "%%";

/// Process every markup source into the output root.
///
/// Include, critical-CSS and decoding failures drop the offending page and
/// are logged; the remaining pages are still written. Every written page
/// gets a fresh modification time.
pub fn run(ctx: &StageContext) -> Result<()> {
    let files = ctx.collect_sources(ctx.globs.source(Category::Markup))?;
    let pipeline = MarkupPipeline::new(ctx)?;

    let mut written = 0usize;
    let mut dropped = 0usize;

    for file in &files {
        let out_path = ctx.dist_path_for(file, None)?;
        let html = match pipeline.process(file, &out_path) {
            Ok(html) => html,
            Err(err) => {
                error!(file = %file.display(), error = ?err, "markup failed; file dropped");
                dropped += 1;
                continue;
            }
        };

        ctx.fs.write(&out_path, html.as_bytes())?;
        ctx.fs
            .set_modified(&out_path, SystemTime::now())
            .with_context(|| format!("touching {}", out_path.display()))?;
        debug!(file = %out_path.display(), "markup written");
        written += 1;
    }

    info!(written, dropped, "markup stage done");
    Ok(())
}

struct MarkupPipeline<'a> {
    source_includes: IncludeResolver<'a>,
    dist_includes: IncludeResolver<'a>,
    critical: CriticalCss<'a>,
    minifier: HtmlMinifier,
    fs: &'a dyn FileSystem,
}

impl<'a> MarkupPipeline<'a> {
    fn new(ctx: &'a StageContext) -> Result<Self> {
        let fs = ctx.fs.as_ref();
        Ok(Self {
            source_includes: IncludeResolver::new(fs, ctx.source_dir(), SOURCE_INCLUDE_PREFIX)?,
            dist_includes: IncludeResolver::new(fs, ctx.dist_dir(), DIST_INCLUDE_PREFIX)?,
            critical: CriticalCss::new(fs, ctx.dist_dir())?,
            minifier: HtmlMinifier::new()?,
            fs,
        })
    }

    fn process(&self, source: &Path, out_path: &Path) -> Result<String> {
        let html = self.fs.read_to_string(source)?;
        let html = self.source_includes.expand(&html)?;
        let html = self.dist_includes.expand(&html)?;
        let html = self.critical.inline(&html, out_path)?;
        Ok(self.minifier.minify(&html))
    }
}
