// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::exec::StageBackend;

use super::core::CoreRuntime;
use super::{CoreCommand, CoreStep, RunSummary, RuntimeEvent};

/// Async shell around [`CoreRuntime`]: receives events, forwards dispatched
/// tasks to the backend, stops when the core says the run is over.
pub struct Runtime<B: StageBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    backend: B,
}

impl<B: StageBackend> fmt::Debug for Runtime<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<B: StageBackend> Runtime<B> {
    pub fn new(core: CoreRuntime, event_rx: mpsc::Receiver<RuntimeEvent>, backend: B) -> Self {
        Self {
            core,
            event_rx,
            backend,
        }
    }

    pub async fn run(mut self) -> Result<RunSummary> {
        let first = self.core.start();
        let mut done = self.apply(first).await?;

        while !done {
            let Some(event) = self.event_rx.recv().await else {
                warn!("runtime event channel closed before the plan finished");
                break;
            };
            debug!(?event, "runtime event");
            let step = self.core.step(event);
            done = self.apply(step).await?;
        }

        Ok(self.core.into_summary())
    }

    /// Carry out the commands of one core step; returns whether it was final.
    async fn apply(&mut self, step: CoreStep) -> Result<bool> {
        let mut done = false;
        for command in step.commands {
            match command {
                CoreCommand::Dispatch(tasks) => {
                    let names: Vec<&str> = tasks.iter().map(|t| t.name.as_str()).collect();
                    debug!(?names, "dispatching stages");
                    self.backend.dispatch(tasks).await?;
                }
                CoreCommand::Finish => done = true,
            }
        }
        Ok(done)
    }
}
