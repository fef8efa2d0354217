// src/stages/clean.rs

use anyhow::Result;
use tracing::{debug, info};

use crate::globs::{OutputOwners, rel_string};
use crate::stages::{CleanTarget, StageContext};
use crate::types::Category;

pub fn run(ctx: &StageContext, target: CleanTarget) -> Result<()> {
    match target {
        CleanTarget::All => clean_all(ctx),
        CleanTarget::Category(category) => clean_category(ctx, category),
    }
}

/// Remove the outputs of one category.
///
/// Files matched by the category's output set but produced by another
/// category's sources are left alone. Files no source produces any more are
/// removed.
fn clean_category(ctx: &StageContext, category: Category) -> Result<()> {
    let Some(list) = ctx.globs.dist(category) else {
        debug!(%category, "category has no output side; nothing to clean");
        return Ok(());
    };
    let files = ctx.collect(list, ctx.globs.dist_root())?;
    let owners = OutputOwners::new(&ctx.globs)?;

    let mut removed = 0usize;
    let mut kept = 0usize;
    for path in &files {
        let Some(rel) = rel_string(&ctx.project_root, path) else {
            continue;
        };
        match owners.owner(ctx.fs.as_ref(), &ctx.project_root, &rel) {
            Some(owner) if owner != category => {
                debug!(%category, %owner, output = %rel, "output of another category; kept");
                kept += 1;
            }
            _ => {
                ctx.fs.remove_file(path)?;
                removed += 1;
            }
        }
    }

    info!(%category, removed, kept, "cleaned category output");
    Ok(())
}

/// Remove every child of the output root, keeping the root itself.
fn clean_all(ctx: &StageContext) -> Result<()> {
    let dist = ctx.dist_dir();
    if !ctx.fs.is_dir(&dist) {
        debug!(dist = %dist.display(), "output root does not exist; nothing to clean");
        return Ok(());
    }

    let entries = ctx.fs.read_dir(&dist)?;
    for path in &entries {
        if ctx.fs.is_dir(path) {
            ctx.fs.remove_dir_all(path)?;
        } else {
            ctx.fs.remove_file(path)?;
        }
    }

    info!(dist = %dist.display(), removed = entries.len(), "cleaned output root");
    Ok(())
}
