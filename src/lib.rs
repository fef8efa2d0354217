// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod devloop;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod globs;
pub mod logging;
pub mod pipeline;
pub mod server;
pub mod stages;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::{CliArgs, Command};
use crate::config::Manifest;
use crate::config::loader::load_and_validate;
use crate::dag::{Step, TaskPlan};
use crate::engine::{RunSummary, TriggerReason};
use crate::errors::SitepipeError;
use crate::fs::RealFileSystem;
use crate::pipeline::{build_step, clean_step, run_plan};
use crate::stages::{CommandBundler, StageContext};
use crate::types::{BuildMode, Category};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - manifest loading and validation
/// - glob derivation and the stage context
/// - the build graph and the engine that runs it
/// - (for `start`) the watcher, dev server and dev loop
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let manifest = load_and_validate(&config_path)?;
    let mode = BuildMode::from_prod_flag(args.prod);
    let command = args.command();

    let bundler = Arc::new(CommandBundler::new(manifest.bundler.clone()));
    let ctx = StageContext::new(
        manifest,
        mode,
        config_root_dir(&config_path),
        Arc::new(RealFileSystem),
        bundler,
    );
    debug!(?ctx, ?command, "stage context ready");

    if args.dry_run {
        print_dry_run(&ctx, command)?;
        return Ok(());
    }

    match command {
        Command::Build => {
            info!(%mode, "building");
            let summary = run_plan(&build_step(&ctx.manifest), &ctx, TriggerReason::Manual).await?;
            ensure_success(summary)?;
        }
        Command::Clean => {
            let summary = run_plan(&clean_step(), &ctx, TriggerReason::Manual).await?;
            ensure_success(summary)?;
        }
        Command::Start => {
            info!(%mode, "starting dev loop");
            devloop::run_dev_loop(ctx).await?;
        }
    }
    Ok(())
}

fn ensure_success(summary: RunSummary) -> Result<()> {
    if summary.failed.is_empty() {
        return Ok(());
    }
    Err(SitepipeError::BuildFailed(summary.failed).into())
}

/// Directory every manifest path is relative to.
///
/// - If the manifest path has a non-empty parent (e.g. "site/package.json"),
///   that directory is used.
/// - A bare file name like "package.json" resolves to the current working
///   directory.
pub fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

fn step_for(command: Command, manifest: &Manifest) -> Step {
    match command {
        Command::Clean => clean_step(),
        Command::Build | Command::Start => build_step(manifest),
    }
}

/// Print the derived glob sets and the task graph without running anything.
fn print_dry_run(ctx: &StageContext, command: Command) -> Result<()> {
    let globs = &ctx.globs;

    println!("sitepipe dry-run ({})", ctx.mode);
    println!("  source = {}", globs.source_root());
    println!("  dist = {}", globs.dist_root());
    if let Some(listing) = globs.listing_dist() {
        println!("  listing = {listing}");
    }
    println!();

    println!("globs:");
    for category in Category::ALL {
        println!("  {category}:");
        println!("      source: {:?}", globs.source(category).to_strings());
        if let Some(dist) = globs.dist(category) {
            println!("      dist: {:?}", dist.to_strings());
        }
    }
    println!();

    let plan = TaskPlan::from_step(&step_for(command, &ctx.manifest))?;
    println!("tasks ({}):", plan.len());
    for task in plan.tasks() {
        println!("  - {}", task.name());
        if !task.after.is_empty() {
            println!("      after: {:?}", task.after);
        }
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}
