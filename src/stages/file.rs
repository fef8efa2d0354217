// src/stages/file.rs

use anyhow::Result;
use tracing::info;

use crate::stages::StageContext;
use crate::types::Category;

/// Copy every catch-all source verbatim, keeping its relative path and
/// modification time. Dotfiles are included.
pub fn run(ctx: &StageContext) -> Result<()> {
    let files = ctx.collect_sources(ctx.globs.source(Category::File))?;
    for file in &files {
        let target = ctx.dist_path_for(file, None)?;
        ctx.copy_preserving_mtime(file, &target)?;
    }
    info!(copied = files.len(), "file stage done");
    Ok(())
}
