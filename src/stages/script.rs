// src/stages/script.rs

use std::path::PathBuf;

use anyhow::Result;
use tracing::{error, info, warn};

use crate::config::model::join_root;
use crate::globs::GlobList;
use crate::stages::{BundleRequest, StageContext};
use crate::types::Category;

/// Bundle scripts and write each bundle to the output root.
///
/// With named bundles each bundle gathers its own sources; otherwise every
/// matched script is its own bundle, written at its source-relative path.
/// A bundler failure drops that bundle and is logged.
pub async fn run(ctx: &StageContext) -> Result<()> {
    let requests = plan_bundles(ctx)?;
    let dist = ctx.dist_dir();

    let mut written = 0usize;
    let mut dropped = 0usize;

    for request in &requests {
        match ctx.bundler.bundle(request).await {
            Ok(bytes) => {
                ctx.fs.write(&dist.join(&request.name), &bytes)?;
                written += 1;
            }
            Err(err) => {
                error!(bundle = %request.name, error = ?err, "bundling failed; bundle dropped");
                dropped += 1;
            }
        }
    }

    info!(mode = %ctx.mode, written, dropped, "script stage done");
    Ok(())
}

fn plan_bundles(ctx: &StageContext) -> Result<Vec<BundleRequest>> {
    let resolve_dir = ctx.source_dir();
    let bundles = &ctx.manifest.bundles.script;

    if bundles.is_empty() {
        let files = ctx.collect_sources(ctx.globs.source(Category::Script))?;
        return files
            .into_iter()
            .map(|file| {
                Ok(BundleRequest {
                    name: ctx.source_relative(&file)?,
                    sources: vec![file],
                    resolve_dir: resolve_dir.clone(),
                    mode: ctx.mode,
                })
            })
            .collect();
    }

    let mut requests = Vec::new();
    for bundle in bundles {
        let sources = bundle_sources(ctx, &bundle.sources)?;
        if sources.is_empty() {
            warn!(bundle = %bundle.name, "no sources matched; bundle skipped");
            continue;
        }
        requests.push(BundleRequest {
            name: bundle.name.clone(),
            sources,
            resolve_dir: resolve_dir.clone(),
            mode: ctx.mode,
        });
    }
    Ok(requests)
}

/// Files matched by each fragment, in fragment order, without duplicates.
pub(crate) fn bundle_sources(ctx: &StageContext, fragments: &[String]) -> Result<Vec<PathBuf>> {
    let mut out: Vec<PathBuf> = Vec::new();
    for fragment in fragments {
        let list = GlobList::from_includes([join_root(ctx.globs.source_root(), fragment)]);
        for file in ctx.collect_sources(&list)? {
            if !out.contains(&file) {
                out.push(file);
            }
        }
    }
    Ok(out)
}
