// src/dag/mod.rs

//! Stage graphs and how a single run of one is scheduled.
//!
//! [`compose`] builds `series` / `parallel` step trees and lowers them to a
//! flat [`TaskPlan`]. A [`Scheduler`] then walks one plan from its roots to
//! the last task, reporting each change as a [`SchedulerStep`].

pub mod compose;
pub mod scheduler;
pub mod scheduler_step;
pub mod task_info;

pub use compose::{PlannedTask, Step, TaskPlan, TaskSpec, parallel, series, task};
pub use scheduler::Scheduler;
pub use scheduler_step::SchedulerStep;
pub use task_info::{ScheduledTask, TaskState};
