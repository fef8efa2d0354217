// src/dag/compose.rs

//! `series` / `parallel` composition of stages, lowered to an explicit
//! task graph.
//!
//! A [`Step`] tree is what the pipeline describes; a [`TaskPlan`] is what the
//! scheduler runs. Lowering turns every `Series` edge into an `after`
//! dependency: each child of a series depends on all exit tasks of the child
//! before it, and a parallel group's exits are the union of its members'
//! exits.

use std::collections::HashSet;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::engine::TaskName;
use crate::errors::{Result, SitepipeError};
use crate::stages::StageAction;

/// A named stage invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSpec {
    pub name: TaskName,
    pub action: StageAction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Task(TaskSpec),
    /// Each member starts only after the previous one fully completed.
    Series(Vec<Step>),
    /// Members start together; the group completes with its slowest member.
    Parallel(Vec<Step>),
}

/// Task named after its action, e.g. `task(StageAction::Markup)` is `markup`.
pub fn task(action: StageAction) -> Step {
    Step::Task(TaskSpec {
        name: action.task_name(),
        action,
    })
}

pub fn series(steps: impl IntoIterator<Item = Step>) -> Step {
    Step::Series(steps.into_iter().collect())
}

pub fn parallel(steps: impl IntoIterator<Item = Step>) -> Step {
    Step::Parallel(steps.into_iter().collect())
}

/// A task with its direct dependencies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedTask {
    pub spec: TaskSpec,
    pub after: Vec<TaskName>,
}

impl PlannedTask {
    pub fn name(&self) -> &str {
        &self.spec.name
    }
}

/// Flat, validated task graph. Tasks are kept in lowering order, which is
/// also a valid topological order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPlan {
    tasks: Vec<PlannedTask>,
}

impl TaskPlan {
    /// Lower a step tree into a plan and check that it is acyclic.
    pub fn from_step(step: &Step) -> Result<Self> {
        let mut lowering = Lowering::default();
        lowering.lower(step, &[]);
        let plan = TaskPlan {
            tasks: lowering.tasks,
        };
        plan.validate()?;
        Ok(plan)
    }

    pub fn tasks(&self) -> &[PlannedTask] {
        &self.tasks
    }

    pub fn get(&self, name: &str) -> Option<&PlannedTask> {
        self.tasks.iter().find(|t| t.spec.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Tasks without dependencies.
    pub fn roots(&self) -> Vec<TaskName> {
        self.tasks
            .iter()
            .filter(|t| t.after.is_empty())
            .map(|t| t.spec.name.clone())
            .collect()
    }

    fn validate(&self) -> Result<()> {
        // Edge direction: dep -> task.
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

        for t in &self.tasks {
            graph.add_node(t.spec.name.as_str());
        }

        for t in &self.tasks {
            for dep in &t.after {
                if self.get(dep).is_none() {
                    return Err(SitepipeError::Other(anyhow::anyhow!(
                        "task '{}' depends on unknown task '{}'",
                        t.spec.name,
                        dep
                    )));
                }
                graph.add_edge(dep.as_str(), t.spec.name.as_str(), ());
            }
        }

        match toposort(&graph, None) {
            Ok(_order) => Ok(()),
            Err(cycle) => Err(SitepipeError::DagCycle(format!(
                "cycle detected in build graph involving task '{}'",
                cycle.node_id()
            ))),
        }
    }
}

#[derive(Default)]
struct Lowering {
    tasks: Vec<PlannedTask>,
    names: HashSet<TaskName>,
}

impl Lowering {
    /// Lower `step` so that its entry tasks depend on `preds`; returns the
    /// step's exit tasks.
    fn lower(&mut self, step: &Step, preds: &[TaskName]) -> Vec<TaskName> {
        match step {
            Step::Task(spec) => {
                let name = self.unique_name(&spec.name);
                self.tasks.push(PlannedTask {
                    spec: TaskSpec {
                        name: name.clone(),
                        action: spec.action,
                    },
                    after: preds.to_vec(),
                });
                vec![name]
            }
            Step::Series(steps) => {
                let mut current = preds.to_vec();
                for s in steps {
                    current = self.lower(s, &current);
                }
                current
            }
            Step::Parallel(steps) => {
                if steps.is_empty() {
                    return preds.to_vec();
                }
                let mut exits: Vec<TaskName> = Vec::new();
                for s in steps {
                    for name in self.lower(s, preds) {
                        if !exits.contains(&name) {
                            exits.push(name);
                        }
                    }
                }
                exits
            }
        }
    }

    fn unique_name(&mut self, base: &str) -> TaskName {
        if self.names.insert(base.to_string()) {
            return base.to_string();
        }
        let mut n = 2;
        loop {
            let candidate = format!("{base}#{n}");
            if self.names.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}
