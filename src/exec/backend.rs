// src/exec/backend.rs

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;

use crate::dag::ScheduledTask;
use crate::engine::RuntimeEvent;
use crate::errors::{Error, Result};
use crate::stages::StageContext;

use super::executor_loop::spawn_executor;

pub type DispatchFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Runs the tasks a plan dispatches.
///
/// Every dispatched task must eventually produce exactly one
/// `RuntimeEvent::StageFinished` on the runtime's channel, or the plan run
/// never ends.
pub trait StageBackend: Send {
    fn dispatch(&mut self, tasks: Vec<ScheduledTask>) -> DispatchFuture<'_>;
}

/// Runs stages against a [`StageContext`] on the executor loop.
pub struct RealStageBackend {
    tx: mpsc::Sender<ScheduledTask>,
}

impl RealStageBackend {
    /// Spawns the executor loop right away.
    pub fn new(ctx: StageContext, runtime_tx: mpsc::Sender<RuntimeEvent>) -> Self {
        Self {
            tx: spawn_executor(ctx, runtime_tx),
        }
    }
}

impl StageBackend for RealStageBackend {
    fn dispatch(&mut self, tasks: Vec<ScheduledTask>) -> DispatchFuture<'_> {
        Box::pin(async move {
            for task in tasks {
                self.tx.send(task).await.map_err(Error::from)?;
            }
            Ok(())
        })
    }
}
