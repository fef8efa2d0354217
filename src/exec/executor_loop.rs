// src/exec/executor_loop.rs

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error};

use crate::dag::ScheduledTask;
use crate::engine::RuntimeEvent;
use crate::exec::stage_runner::run_stage_task;
use crate::stages::StageContext;

/// Spawn the executor and return the sender the backend feeds it through.
///
/// Each received task runs in its own Tokio task. The loop ends once the
/// sender is dropped and every spawned stage has returned.
pub fn spawn_executor(
    ctx: StageContext,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> mpsc::Sender<ScheduledTask> {
    let (tx, mut rx) = mpsc::channel::<ScheduledTask>(32);

    tokio::spawn(async move {
        let mut running: JoinSet<()> = JoinSet::new();

        loop {
            tokio::select! {
                received = rx.recv() => match received {
                    Some(task) => {
                        debug!(task = %task.name, plan = task.plan_id, "executor received stage");
                        running.spawn(run_stage_task(task, ctx.clone(), runtime_tx.clone()));
                    }
                    None => break,
                },
                Some(joined) = running.join_next(), if !running.is_empty() => {
                    if let Err(err) = joined {
                        error!(error = %err, "stage runner did not complete");
                    }
                }
            }
        }

        while running.join_next().await.is_some() {}
        debug!("executor loop finished");
    });

    tx
}
