// src/engine/event_handlers.rs

use tracing::info;

use crate::dag::{ScheduledTask, Scheduler, TaskState};
use crate::engine::{RunSummary, TaskName, TaskOutcome, TriggerReason};

/// Something the async shell has to do on behalf of the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Hand these tasks to the stage backend.
    Dispatch(Vec<ScheduledTask>),
    /// The run is over.
    Finish,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
}

impl CoreStep {
    fn from_ready(ready: Vec<ScheduledTask>, finished: bool) -> Self {
        let mut commands = Vec::new();
        if !ready.is_empty() {
            commands.push(CoreCommand::Dispatch(ready));
        }
        if finished {
            commands.push(CoreCommand::Finish);
        }
        Self { commands }
    }

    /// True once the core asked the shell to stop.
    pub fn is_final(&self) -> bool {
        self.commands.contains(&CoreCommand::Finish)
    }

    pub fn dispatched(&self) -> impl Iterator<Item = &ScheduledTask> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                CoreCommand::Dispatch(tasks) => Some(tasks),
                CoreCommand::Finish => None,
            })
            .flatten()
    }
}

pub fn on_start(scheduler: &mut Scheduler, reason: TriggerReason) -> CoreStep {
    info!(plan = scheduler.plan_id(), tasks = scheduler.len(), ?reason, "running plan");
    let roots = scheduler.start();
    CoreStep::from_ready(roots, scheduler.is_finished())
}

pub fn on_stage_finished(
    scheduler: &mut Scheduler,
    summary: &mut RunSummary,
    task: TaskName,
    outcome: TaskOutcome,
) -> CoreStep {
    let accepted = scheduler.state_of(&task) == Some(TaskState::Running);
    let step = scheduler.complete(&task, outcome);

    if accepted {
        match outcome {
            TaskOutcome::Success => summary.succeeded.push(task),
            TaskOutcome::Failed => {
                summary.failed.push(task);
                summary.blocked.extend(step.blocked);
            }
        }
    }

    CoreStep::from_ready(step.ready, step.finished)
}
