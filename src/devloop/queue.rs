// src/devloop/queue.rs

use std::collections::VecDeque;

use crate::watch::WatchEvent;

/// FIFO of watch events waiting for their handler. Nothing is coalesced or
/// dropped.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<WatchEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: WatchEvent) {
        self.events.push_back(event);
    }

    pub fn pop(&mut self) -> Option<WatchEvent> {
        self.events.pop_front()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
