// src/watch/mod.rs

//! File watching for the dev loop.
//!
//! - [`patterns`] compiles the derived source-side glob sets so a changed
//!   path can be mapped to its category.
//! - [`event_handler`] turns `notify` events into [`WatchEvent`]s.
//! - [`watcher`] wires up the cross-platform watcher.
//!
//! It does not decide what to rebuild; that is the dev loop's handler
//! table.

pub mod event_handler;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use event_handler::{WatchEvent, classify_event};
pub use patterns::CategoryMatchers;
pub use watcher::{WatcherHandle, spawn_watcher};
