// src/engine/core.rs

use crate::dag::Scheduler;
use crate::engine::event_handlers::{CoreStep, on_stage_finished, on_start};
use crate::engine::{RunSummary, RuntimeEvent, TriggerReason};

/// Synchronous state of one plan run.
///
/// Holds no channels and does no IO, so tests can drive it event by event.
#[derive(Debug)]
pub struct CoreRuntime {
    scheduler: Scheduler,
    reason: TriggerReason,
    summary: RunSummary,
}

impl CoreRuntime {
    pub fn new(scheduler: Scheduler, reason: TriggerReason) -> Self {
        Self {
            scheduler,
            reason,
            summary: RunSummary::default(),
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn into_summary(self) -> RunSummary {
        self.summary
    }

    /// Dispatch the plan roots. An empty plan finishes immediately.
    pub fn start(&mut self) -> CoreStep {
        on_start(&mut self.scheduler, self.reason)
    }

    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        let RuntimeEvent::StageFinished { task, outcome } = event;
        on_stage_finished(&mut self.scheduler, &mut self.summary, task, outcome)
    }
}
