// src/dag/scheduler.rs

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info, warn};

use crate::dag::compose::TaskPlan;
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::task_info::{ScheduledTask, TaskEntry, TaskState};
use crate::engine::{TaskName, TaskOutcome};

static NEXT_PLAN_ID: AtomicU64 = AtomicU64::new(1);

/// One run of a [`TaskPlan`].
///
/// Every task keeps a count of dependencies that have not succeeded yet; it
/// is dispatched when that count drops to zero. A failure blocks everything
/// downstream of the failed task and nothing else. A scheduler runs its plan
/// once.
#[derive(Debug)]
pub struct Scheduler {
    plan_id: u64,
    tasks: HashMap<TaskName, TaskEntry>,
    started: bool,
}

impl Scheduler {
    pub fn from_plan(plan: &TaskPlan) -> Self {
        let mut tasks: HashMap<TaskName, TaskEntry> = plan
            .tasks()
            .iter()
            .map(|t| (t.spec.name.clone(), TaskEntry::new(t)))
            .collect();

        for task in plan.tasks() {
            for dep in &task.after {
                if let Some(entry) = tasks.get_mut(dep) {
                    entry.dependents.push(task.spec.name.clone());
                }
            }
        }

        Self {
            plan_id: NEXT_PLAN_ID.fetch_add(1, Ordering::Relaxed),
            tasks,
            started: false,
        }
    }

    pub fn plan_id(&self) -> u64 {
        self.plan_id
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn state_of(&self, task: &str) -> Option<TaskState> {
        self.tasks.get(task).map(|e| e.state)
    }

    /// No task is waiting or running.
    pub fn is_finished(&self) -> bool {
        self.tasks.values().all(|e| e.state.is_terminal())
    }

    /// Start the run; returns the tasks without dependencies.
    pub fn start(&mut self) -> Vec<ScheduledTask> {
        if self.started {
            warn!(plan = self.plan_id, "plan run already started");
            return Vec::new();
        }
        self.started = true;
        debug!(plan = self.plan_id, tasks = self.tasks.len(), "plan run started");
        self.take_ready()
    }

    /// Record the outcome of a running task.
    pub fn complete(&mut self, task: &str, outcome: TaskOutcome) -> SchedulerStep {
        let mut step = SchedulerStep::default();

        match self.tasks.get_mut(task) {
            Some(entry) if entry.state == TaskState::Running => {
                let dependents = entry.dependents.clone();
                match outcome {
                    TaskOutcome::Success => {
                        entry.state = TaskState::Succeeded;
                        for name in &dependents {
                            if let Some(dep) = self.tasks.get_mut(name) {
                                dep.unmet = dep.unmet.saturating_sub(1);
                            }
                        }
                        step.ready = self.take_ready();
                    }
                    TaskOutcome::Failed => {
                        entry.state = TaskState::Failed;
                        step.blocked = self.block_downstream(dependents);
                        warn!(
                            task,
                            plan = self.plan_id,
                            blocked = ?step.blocked,
                            "stage failed; downstream stages will not run"
                        );
                    }
                }
            }
            Some(entry) => {
                warn!(task, state = %entry.state, "completion for a task that is not running; ignored");
            }
            None => {
                warn!(task, "completion for unknown task; ignored");
            }
        }

        step.finished = self.is_finished();
        step
    }

    fn take_ready(&mut self) -> Vec<ScheduledTask> {
        let mut names: Vec<TaskName> = self
            .tasks
            .iter()
            .filter(|(_, e)| e.is_ready())
            .map(|(n, _)| n.clone())
            .collect();
        names.sort();

        let mut ready = Vec::with_capacity(names.len());
        for name in names {
            if let Some(entry) = self.tasks.get_mut(&name) {
                entry.state = TaskState::Running;
                info!(task = %name, plan = self.plan_id, "scheduling stage");
                ready.push(ScheduledTask {
                    action: entry.action,
                    name,
                    plan_id: self.plan_id,
                });
            }
        }
        ready
    }

    fn block_downstream(&mut self, roots: Vec<TaskName>) -> Vec<TaskName> {
        let mut queue: VecDeque<TaskName> = roots.into();
        let mut blocked = Vec::new();

        while let Some(name) = queue.pop_front() {
            let Some(entry) = self.tasks.get_mut(&name) else {
                continue;
            };
            if entry.state != TaskState::Waiting {
                continue;
            }
            entry.state = TaskState::Blocked;
            queue.extend(entry.dependents.iter().cloned());
            blocked.push(name);
        }

        blocked.sort();
        blocked
    }
}
