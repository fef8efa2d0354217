// src/dag/scheduler_step.rs

use crate::dag::task_info::ScheduledTask;
use crate::engine::TaskName;

/// What changed when the scheduler recorded a completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStep {
    /// Tasks whose last dependency just succeeded, sorted by name.
    pub ready: Vec<ScheduledTask>,
    /// Tasks that will never run because the completed task failed.
    pub blocked: Vec<TaskName>,
    /// The run has no waiting or running task left.
    pub finished: bool,
}
