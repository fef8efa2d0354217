// src/dag/task_info.rs

//! Per-task bookkeeping for one plan run.

use std::fmt;

use crate::dag::compose::PlannedTask;
use crate::engine::TaskName;
use crate::stages::StageAction;

/// Where a task stands in the current plan run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Waiting for dependencies, or for the run to start.
    Waiting,
    Running,
    Succeeded,
    Failed,
    /// Never started because something upstream failed.
    Blocked,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Succeeded | TaskState::Failed | TaskState::Blocked
        )
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskState::Waiting => "waiting",
            TaskState::Running => "running",
            TaskState::Succeeded => "succeeded",
            TaskState::Failed => "failed",
            TaskState::Blocked => "blocked",
        };
        f.write_str(s)
    }
}

/// A planned task plus its run state.
#[derive(Debug, Clone)]
pub(crate) struct TaskEntry {
    pub action: StageAction,
    pub dependents: Vec<TaskName>,
    /// Dependencies that have not succeeded yet.
    pub unmet: usize,
    pub state: TaskState,
}

impl TaskEntry {
    pub fn new(task: &PlannedTask) -> Self {
        Self {
            action: task.spec.action,
            dependents: Vec::new(),
            unmet: task.after.len(),
            state: TaskState::Waiting,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state == TaskState::Waiting && self.unmet == 0
    }
}

/// A stage the scheduler wants the backend to run now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTask {
    pub name: TaskName,
    pub action: StageAction,
    /// Identifies the plan run this task belongs to, for log correlation
    /// when several handler plans run at once.
    pub plan_id: u64,
}
