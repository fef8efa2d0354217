// src/devloop/core.rs

//! Pure dev-loop state machine.
//!
//! `Idle → Building → Watching`; while watching, each event moves its
//! lane into reprocessing until the handler graph finishes. Events for a
//! busy lane wait in that lane's [`EventQueue`], so handlers sharing a lane
//! never overlap and run in arrival order.
//!
//! Every category has its own lane, except that partials, styles, markup
//! and the favicon share one: all of their handlers end by rewriting the
//! markup output. Other lanes do not wait for each other.
//!
//! Events received during the initial build are queued and dispatched once
//! it finishes.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{info, warn};

use crate::dag::Step;
use crate::devloop::handlers::HandlerTable;
use crate::devloop::queue::EventQueue;
use crate::engine::RunSummary;
use crate::types::Category;
use crate::watch::WatchEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevLoopState {
    Idle,
    Building,
    /// Serving with no handler running.
    Watching,
    /// Serving with at least one handler running.
    Reprocessing,
}

/// Command for the async controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DevCommand {
    /// Run the full build.
    RunBuild,
    /// Run the handler graph for `event`.
    RunHandler { event: WatchEvent, step: Step },
    /// Tell connected browsers to reload.
    Reload,
}

#[derive(Debug)]
pub struct DevLoopCore {
    building: bool,
    started: bool,
    table: HandlerTable,
    /// Keyed by lane.
    queues: BTreeMap<Category, EventQueue>,
    busy: BTreeSet<Category>,
}

/// Queue lane of `category`. The shared markup lane is keyed `Markup`.
pub fn lane_of(category: Category) -> Category {
    match category {
        Category::Partial | Category::Style | Category::Markup | Category::Favicon => {
            Category::Markup
        }
        Category::Script | Category::File => category,
    }
}

impl DevLoopCore {
    pub fn new(table: HandlerTable) -> Self {
        Self {
            building: false,
            started: false,
            table,
            queues: BTreeMap::new(),
            busy: BTreeSet::new(),
        }
    }

    pub fn state(&self) -> DevLoopState {
        if !self.started {
            DevLoopState::Idle
        } else if self.building {
            DevLoopState::Building
        } else if self.busy.is_empty() {
            DevLoopState::Watching
        } else {
            DevLoopState::Reprocessing
        }
    }

    /// Events waiting behind a running handler (or the initial build).
    pub fn pending(&self) -> usize {
        self.queues.values().map(EventQueue::len).sum()
    }

    /// A handler is running in the lane of `category`.
    pub fn is_busy(&self, category: Category) -> bool {
        self.busy.contains(&lane_of(category))
    }

    pub fn start(&mut self) -> Vec<DevCommand> {
        if self.started {
            warn!("dev loop already started");
            return Vec::new();
        }
        self.started = true;
        self.building = true;
        vec![DevCommand::RunBuild]
    }

    /// The initial build finished. Failures were logged by the engine; the
    /// loop keeps serving either way.
    pub fn build_finished(&mut self, summary: &RunSummary) -> Vec<DevCommand> {
        if !summary.is_success() {
            warn!(failed = ?summary.failed, blocked = ?summary.blocked, "initial build had failures");
        }
        self.building = false;

        let mut commands = vec![DevCommand::Reload];
        let waiting: Vec<Category> = self.queues.keys().copied().collect();
        for lane in waiting {
            commands.extend(self.dispatch_next(lane));
        }
        commands
    }

    pub fn on_event(&mut self, event: WatchEvent) -> Vec<DevCommand> {
        info!(
            path = %event.path,
            kind = %event.kind,
            category = %event.category,
            "File changed, processing."
        );

        if self.table.lookup(event.category, event.kind).is_none() {
            warn!(path = %event.path, category = %event.category, "no handler bound; event skipped");
            return Vec::new();
        }

        let lane = lane_of(event.category);
        self.queues.entry(lane).or_default().push(event);

        if self.building || self.busy.contains(&lane) {
            return Vec::new();
        }
        self.dispatch_next(lane).into_iter().collect()
    }

    /// The handler running for `category` finished.
    pub fn handler_finished(&mut self, category: Category, summary: &RunSummary) -> Vec<DevCommand> {
        let lane = lane_of(category);
        if !self.busy.remove(&lane) {
            warn!(%category, "completion for a category with no running handler");
        }
        if !summary.is_success() {
            warn!(
                %category,
                failed = ?summary.failed,
                blocked = ?summary.blocked,
                "handler had failures"
            );
        }

        let mut commands = vec![DevCommand::Reload];
        commands.extend(self.dispatch_next(lane));
        commands
    }

    fn dispatch_next(&mut self, lane: Category) -> Option<DevCommand> {
        let queue = self.queues.get_mut(&lane)?;
        let event = queue.pop()?;
        if queue.is_empty() {
            self.queues.remove(&lane);
        }

        let step = self.table.lookup(event.category, event.kind)?.clone();
        self.busy.insert(lane);
        Some(DevCommand::RunHandler { event, step })
    }
}
