// src/exec/mod.rs

//! Where scheduled stages actually run.
//!
//! The runtime only sees a [`StageBackend`]. [`RealStageBackend`] feeds an
//! executor task that spawns one Tokio task per stage and reports each
//! outcome back as `RuntimeEvent::StageFinished`.

pub mod backend;
pub mod executor_loop;
pub mod stage_runner;

pub use backend::{DispatchFuture, RealStageBackend, StageBackend};
pub use executor_loop::spawn_executor;
