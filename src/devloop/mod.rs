// src/devloop/mod.rs

//! Serve-and-watch development loop.
//!
//! The pure state machine lives in [`core`]; [`controller`] is the async
//! shell that owns the watcher, the dev server and the running plan.

pub mod controller;
pub mod core;
pub mod handlers;
pub mod queue;

pub use controller::run_dev_loop;
pub use core::{DevCommand, DevLoopCore, DevLoopState};
pub use handlers::{HandlerBinding, HandlerTable};
pub use queue::EventQueue;
