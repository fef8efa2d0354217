// src/devloop/handlers.rs

use std::collections::BTreeMap;

use crate::dag::Step;
use crate::pipeline::handler_step;
use crate::types::{Category, WatchEventKind};

/// What to run for each event kind on one watched category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerBinding {
    pub on_added: Step,
    pub on_changed: Step,
    pub on_removed: Step,
}

impl HandlerBinding {
    pub fn for_category(category: Category) -> Self {
        Self {
            on_added: handler_step(category, WatchEventKind::Added),
            on_changed: handler_step(category, WatchEventKind::Changed),
            on_removed: handler_step(category, WatchEventKind::Removed),
        }
    }

    pub fn step(&self, kind: WatchEventKind) -> &Step {
        match kind {
            WatchEventKind::Added => &self.on_added,
            WatchEventKind::Changed => &self.on_changed,
            WatchEventKind::Removed => &self.on_removed,
        }
    }
}

/// One binding per watched category.
#[derive(Debug, Clone, Default)]
pub struct HandlerTable {
    bindings: BTreeMap<Category, HandlerBinding>,
}

impl HandlerTable {
    pub fn new(categories: impl IntoIterator<Item = Category>) -> Self {
        let bindings = categories
            .into_iter()
            .map(|c| (c, HandlerBinding::for_category(c)))
            .collect();
        Self { bindings }
    }

    pub fn lookup(&self, category: Category, kind: WatchEventKind) -> Option<&Step> {
        self.bindings.get(&category).map(|b| b.step(kind))
    }

    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.bindings.keys().copied()
    }
}
