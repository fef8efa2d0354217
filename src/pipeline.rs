// src/pipeline.rs

//! The build graph and the per-event handler graphs, plus the glue that runs
//! a graph to completion through the engine.

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::Manifest;
use crate::dag::{Scheduler, Step, TaskPlan, parallel, series, task};
use crate::engine::{CoreRuntime, RunSummary, Runtime, RuntimeEvent, TriggerReason};
use crate::errors::Result;
use crate::exec::{RealStageBackend, StageBackend};
use crate::stages::{CleanTarget, StageAction, StageContext};
use crate::types::{Category, WatchEventKind};

/// The full build:
///
/// ```text
/// clean
///  └─ parallel
///      ├─ series: parallel(favicon, style) → markup → favicon-post
///      ├─ series: listing-copy → listing-config
///      ├─ script
///      └─ file
/// ```
///
/// Favicon and listing steps are left out when the manifest does not
/// configure them.
pub fn build_step(manifest: &Manifest) -> Step {
    let has_favicon = manifest.favicon.is_some();

    let mut pre_markup = Vec::new();
    if has_favicon {
        pre_markup.push(task(StageAction::Favicon));
    }
    pre_markup.push(task(StageAction::Style));

    let mut markup_chain = vec![parallel(pre_markup), task(StageAction::Markup)];
    if has_favicon {
        markup_chain.push(task(StageAction::FaviconPost));
    }

    let mut branches = vec![series(markup_chain)];
    if manifest.listing.is_some() {
        branches.push(series([
            task(StageAction::ListingCopy),
            task(StageAction::ListingConfig),
        ]));
    }
    branches.push(task(StageAction::Script));
    branches.push(task(StageAction::File));

    series([task(StageAction::Clean(CleanTarget::All)), parallel(branches)])
}

/// Remove everything below the output root.
pub fn clean_step() -> Step {
    task(StageAction::Clean(CleanTarget::All))
}

/// Graph run in response to a filesystem event on a source of `category`.
///
/// Additions and modifications re-run the category's stage. Removals run a
/// clean of the category's output first so the stale artifact disappears.
/// Partials, styles and favicon sources feed the markup stage, so their
/// handlers rebuild markup as well.
pub fn handler_step(category: Category, kind: WatchEventKind) -> Step {
    use StageAction::*;

    let clean = |c: Category| task(Clean(CleanTarget::Category(c)));

    match (category, kind) {
        (Category::Script, WatchEventKind::Removed) => {
            series([clean(Category::Script), task(Script)])
        }
        (Category::Script, _) => task(Script),

        (Category::File, WatchEventKind::Removed) => series([clean(Category::File), task(File)]),
        (Category::File, _) => task(File),

        (Category::Markup, WatchEventKind::Removed) => restyle_and_remarkup(),
        (Category::Markup, _) => task(Markup),

        (Category::Partial | Category::Style, _) => restyle_and_remarkup(),

        (Category::Favicon, _) => series([
            clean(Category::Markup),
            clean(Category::Favicon),
            task(Favicon),
            task(Markup),
            task(FaviconPost),
        ]),
    }
}

fn restyle_and_remarkup() -> Step {
    series([
        task(StageAction::Clean(CleanTarget::Category(Category::Markup))),
        task(StageAction::Clean(CleanTarget::Category(Category::Style))),
        task(StageAction::Style),
        task(StageAction::Markup),
    ])
}

/// Run `step` to completion with the production backend.
pub async fn run_plan(
    step: &Step,
    ctx: &StageContext,
    reason: TriggerReason,
) -> Result<RunSummary> {
    run_plan_with(step, reason, |tx| RealStageBackend::new(ctx.clone(), tx)).await
}

/// Run `step` to completion with the backend built by `make_backend`.
///
/// The backend receives the runtime's event sender and must report one
/// completion per dispatched task.
pub async fn run_plan_with<B, F>(
    step: &Step,
    reason: TriggerReason,
    make_backend: F,
) -> Result<RunSummary>
where
    B: StageBackend,
    F: FnOnce(mpsc::Sender<RuntimeEvent>) -> B,
{
    let plan = TaskPlan::from_step(step)?;
    if plan.is_empty() {
        debug!("empty plan; nothing to run");
        return Ok(RunSummary::default());
    }

    let core = CoreRuntime::new(Scheduler::from_plan(&plan), reason);
    let (tx, rx) = mpsc::channel::<RuntimeEvent>(64);
    let backend = make_backend(tx);
    let summary = Runtime::new(core, rx, backend).run().await?;

    info!(
        succeeded = summary.succeeded.len(),
        failed = summary.failed.len(),
        blocked = summary.blocked.len(),
        "plan finished"
    );
    Ok(summary)
}
