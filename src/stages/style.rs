// src/stages/style.rs

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use tracing::{error, info, warn};

use crate::fs::FileSystem;
use crate::stages::StageContext;
use crate::stages::script::bundle_sources;
use crate::types::Category;

/// Compile, minify and write stylesheets.
///
/// Without named bundles every non-partial source (`_name.scss` files are
/// partials) becomes `<rel>.css`. With bundles, each bundle concatenates its
/// compiled sources. A compile failure drops the affected output and is
/// logged.
pub fn run(ctx: &StageContext) -> Result<()> {
    let compiler = SassCompiler::new(ctx);
    let dist = ctx.dist_dir();
    let mut written = 0usize;
    let mut dropped = 0usize;

    if ctx.manifest.bundles.style.is_empty() {
        let files = ctx.collect_sources(ctx.globs.source(Category::Style))?;
        for file in files.iter().filter(|f| !is_sass_partial(f)) {
            let css = match compiler.compile(file).and_then(|css| minify_css(&css)) {
                Ok(css) => css,
                Err(err) => {
                    error!(file = %file.display(), error = %err, "style compile failed; file dropped");
                    dropped += 1;
                    continue;
                }
            };
            ctx.fs.write(&ctx.dist_path_for(file, Some("css"))?, css.as_bytes())?;
            written += 1;
        }
    } else {
        for bundle in &ctx.manifest.bundles.style {
            let sources = bundle_sources(ctx, &bundle.sources)?;
            let sources: Vec<&PathBuf> = sources.iter().filter(|f| !is_sass_partial(f)).collect();
            if sources.is_empty() {
                warn!(bundle = %bundle.name, "no sources matched; bundle skipped");
                continue;
            }

            match compile_bundle(&compiler, &sources) {
                Ok(css) => {
                    ctx.fs.write(&dist.join(&bundle.name), css.as_bytes())?;
                    written += 1;
                }
                Err(err) => {
                    error!(bundle = %bundle.name, error = %err, "style bundle failed; bundle dropped");
                    dropped += 1;
                }
            }
        }
    }

    info!(written, dropped, "style stage done");
    Ok(())
}

fn compile_bundle(compiler: &SassCompiler<'_>, sources: &[&PathBuf]) -> Result<String> {
    let mut joined = String::new();
    for src in sources {
        joined.push_str(&compiler.compile(src)?);
        joined.push('\n');
    }
    minify_css(&joined)
}

fn is_sass_partial(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('_'))
}

/// Minify CSS text.
pub fn minify_css(css: &str) -> Result<String> {
    let mut sheet = StyleSheet::parse(css, ParserOptions::default())
        .map_err(|e| anyhow!("parsing css: {e}"))?;
    sheet
        .minify(MinifyOptions::default())
        .map_err(|e| anyhow!("minifying css: {e}"))?;
    let out = sheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .map_err(|e| anyhow!("printing css: {e}"))?;
    Ok(out.code)
}

/// Sass compiler reading through the stage filesystem.
struct SassCompiler<'a> {
    fs: GrassFs<'a>,
    load_paths: Vec<PathBuf>,
}

impl<'a> SassCompiler<'a> {
    fn new(ctx: &'a StageContext) -> Self {
        Self {
            fs: GrassFs(ctx.fs.as_ref()),
            load_paths: ctx
                .manifest
                .style_include_paths
                .iter()
                .map(|p| ctx.abs(p))
                .collect(),
        }
    }

    fn compile(&self, path: &Path) -> Result<String> {
        let options = grass::Options::default()
            .fs(&self.fs)
            .load_paths(self.load_paths.as_slice())
            .style(grass::OutputStyle::Expanded);
        grass::from_path(path, &options).map_err(|e| anyhow!("{}: {e}", path.display()))
    }
}

#[derive(Debug)]
struct GrassFs<'a>(&'a dyn FileSystem);

impl grass::Fs for GrassFs<'_> {
    fn is_dir(&self, path: &Path) -> bool {
        self.0.is_dir(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.0.is_file(path)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.0.read(path).map_err(|e| io::Error::other(format!("{e:#}")))
    }
}
