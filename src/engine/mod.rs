// src/engine/mod.rs

//! Runs one [`TaskPlan`](crate::dag::TaskPlan) to completion.
//!
//! [`CoreRuntime`] owns the scheduler and the run summary and turns stage
//! completions into commands; it never touches a channel. [`Runtime`] is the
//! async shell that feeds it events and hands dispatched tasks to a
//! [`StageBackend`](crate::exec::StageBackend).

pub type TaskName = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed,
}

/// What started a plan run. Only used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// Full build or explicit clean.
    Manual,
    /// Handler run for a filesystem event.
    FileWatch,
}

/// Events flowing from the backend into the runtime.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    StageFinished {
        task: TaskName,
        outcome: TaskOutcome,
    },
}

/// What happened to every task of a plan run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// In completion order.
    pub succeeded: Vec<TaskName>,
    pub failed: Vec<TaskName>,
    /// Tasks never started because a dependency failed.
    pub blocked: Vec<TaskName>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.blocked.is_empty()
    }
}

pub mod core;
pub mod event_handlers;
pub mod runtime;

pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use runtime::Runtime;
