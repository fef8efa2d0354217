// src/stages/mod.rs

//! Stage implementations.
//!
//! Every stage reads its inputs through the [`StageContext`]'s filesystem,
//! sources the files matched by its glob set and writes into the output
//! root. Per-file and per-tool failures are logged and the offending input
//! is dropped; filesystem failures fail the stage.

pub mod action;
pub mod bundler;
pub mod clean;
pub mod favicon;
pub mod file;
pub mod listing;
pub mod markup;
pub mod script;
pub mod style;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};

use crate::config::Manifest;
use crate::fs::FileSystem;
use crate::globs::{DerivedGlobs, GlobList, collect_matching_files, derive_globs, rel_string};
use crate::types::BuildMode;

pub use action::{CleanTarget, StageAction};
pub use bundler::{BundleRequest, Bundler, CommandBundler};

/// Everything a stage needs to run. Cheap to clone.
#[derive(Clone)]
pub struct StageContext {
    pub manifest: Arc<Manifest>,
    pub globs: Arc<DerivedGlobs>,
    pub mode: BuildMode,
    /// Directory all manifest paths are relative to.
    pub project_root: PathBuf,
    pub fs: Arc<dyn FileSystem>,
    pub bundler: Arc<dyn Bundler>,
}

impl fmt::Debug for StageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageContext")
            .field("mode", &self.mode)
            .field("project_root", &self.project_root)
            .field("source", &self.globs.source_root())
            .field("dist", &self.globs.dist_root())
            .finish_non_exhaustive()
    }
}

impl StageContext {
    pub fn new(
        manifest: Manifest,
        mode: BuildMode,
        project_root: impl Into<PathBuf>,
        fs: Arc<dyn FileSystem>,
        bundler: Arc<dyn Bundler>,
    ) -> Self {
        let globs = derive_globs(&manifest);
        Self {
            manifest: Arc::new(manifest),
            globs: Arc::new(globs),
            mode,
            project_root: project_root.into(),
            fs,
            bundler,
        }
    }

    /// Resolve a project-root-relative path.
    pub fn abs(&self, rel: &str) -> PathBuf {
        if rel == "." || rel.is_empty() {
            self.project_root.clone()
        } else {
            self.project_root.join(rel)
        }
    }

    pub fn source_dir(&self) -> PathBuf {
        self.abs(self.globs.source_root())
    }

    pub fn dist_dir(&self) -> PathBuf {
        self.abs(self.globs.dist_root())
    }

    /// Files below `walk_base` matched by `list`, sorted.
    pub fn collect(&self, list: &GlobList, walk_base: &str) -> Result<Vec<PathBuf>> {
        if !list.has_includes() {
            return Ok(Vec::new());
        }
        let matcher = list.compile()?;
        collect_matching_files(self.fs.as_ref(), &self.project_root, walk_base, &matcher)
    }

    /// Files of the source tree matched by `list`.
    pub fn collect_sources(&self, list: &GlobList) -> Result<Vec<PathBuf>> {
        self.collect(list, self.globs.source_root())
    }

    /// Path of `path` relative to the source root, forward slashes.
    pub fn source_relative(&self, path: &Path) -> Result<String> {
        rel_string(&self.source_dir(), path)
            .ok_or_else(|| anyhow!("{} is outside the source root", path.display()))
    }

    /// Output path mirroring a source file, optionally with a new extension.
    pub fn dist_path_for(&self, source_file: &Path, extension: Option<&str>) -> Result<PathBuf> {
        let rel = PathBuf::from(self.source_relative(source_file)?);
        let rel = match extension {
            Some(ext) => rel.with_extension(ext),
            None => rel,
        };
        Ok(self.dist_dir().join(rel))
    }

    /// Copy a file, keeping its modification time.
    pub fn copy_preserving_mtime(&self, from: &Path, to: &Path) -> Result<()> {
        let bytes = self.fs.read(from)?;
        self.fs.write(to, &bytes)?;
        let mtime = self.fs.modified(from)?;
        self.fs
            .set_modified(to, mtime)
            .with_context(|| format!("preserving mtime of {}", to.display()))
    }
}

/// Run one stage to completion.
///
/// The script stage awaits its external bundler; CPU-heavy stages run on the
/// blocking pool; the rest run inline.
pub async fn run_action(ctx: &StageContext, action: StageAction) -> Result<()> {
    match action {
        StageAction::Script => script::run(ctx).await,
        _ if action.is_blocking() => {
            let ctx = ctx.clone();
            tokio::task::spawn_blocking(move || run_sync(&ctx, action))
                .await
                .with_context(|| format!("stage '{action}' panicked"))?
        }
        _ => run_sync(ctx, action),
    }
}

fn run_sync(ctx: &StageContext, action: StageAction) -> Result<()> {
    match action {
        StageAction::Clean(target) => clean::run(ctx, target),
        StageAction::Style => style::run(ctx),
        StageAction::Markup => markup::run(ctx),
        StageAction::File => file::run(ctx),
        StageAction::Favicon => favicon::run(ctx),
        StageAction::FaviconPost => favicon::run_post(ctx),
        StageAction::ListingCopy => listing::run_copy(ctx),
        StageAction::ListingConfig => listing::run_config(ctx),
        StageAction::Script => Err(anyhow!("the script stage cannot run synchronously")),
    }
}
