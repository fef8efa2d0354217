// src/exec/stage_runner.rs

use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{error, info};

use crate::dag::ScheduledTask;
use crate::engine::{RuntimeEvent, TaskOutcome};
use crate::stages::{StageContext, run_action};

/// Run one stage and report its outcome.
///
/// The stage itself runs in a child task so that a panic inside it is
/// reported as a failure instead of leaving the plan waiting forever.
pub async fn run_stage_task(
    task: ScheduledTask,
    ctx: StageContext,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) {
    info!(task = %task.name, plan = task.plan_id, "starting stage");
    let started = Instant::now();

    let action = task.action;
    let joined = tokio::spawn(async move { run_action(&ctx, action).await }).await;

    let outcome = match joined {
        Ok(Ok(())) => {
            info!(
                task = %task.name,
                plan = task.plan_id,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "finished stage"
            );
            TaskOutcome::Success
        }
        Ok(Err(err)) => {
            error!(
                task = %task.name,
                plan = task.plan_id,
                error = %format_args!("{err:#}"),
                "stage failed"
            );
            TaskOutcome::Failed
        }
        Err(err) => {
            error!(task = %task.name, plan = task.plan_id, error = %err, "stage panicked");
            TaskOutcome::Failed
        }
    };

    let _ = runtime_tx
        .send(RuntimeEvent::StageFinished {
            task: task.name,
            outcome,
        })
        .await;
}
