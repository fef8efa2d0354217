use std::collections::HashSet;

use proptest::prelude::*;
use sitepipe::dag::{Scheduler, Step, TaskPlan, parallel, series, task};
use sitepipe::engine::TaskOutcome;
use sitepipe::stages::{CleanTarget, StageAction};
use sitepipe::types::Category;

// Distinct actions, so every generated tree has unique task names.
const ACTIONS: [StageAction; 9] = [
    StageAction::Clean(CleanTarget::All),
    StageAction::Clean(CleanTarget::Category(Category::Markup)),
    StageAction::Script,
    StageAction::Style,
    StageAction::Markup,
    StageAction::File,
    StageAction::Favicon,
    StageAction::ListingCopy,
    StageAction::ListingConfig,
];

/// Random `series` / `parallel` nesting over a prefix of `ACTIONS`.
fn step_strategy() -> impl Strategy<Value = Step> {
    (1..=ACTIONS.len()).prop_flat_map(|n| {
        proptest::collection::vec((any::<bool>(), 1..4usize), n).prop_map(move |shape| {
            let mut groups: Vec<Step> = Vec::new();
            let mut current: Vec<Step> = Vec::new();
            let mut parallel_group = false;

            for (i, (is_parallel, width)) in shape.into_iter().enumerate() {
                if current.is_empty() {
                    parallel_group = is_parallel;
                }
                current.push(task(ACTIONS[i]));
                if current.len() >= width {
                    let members = std::mem::take(&mut current);
                    groups.push(if parallel_group {
                        parallel(members)
                    } else {
                        series(members)
                    });
                }
            }
            if !current.is_empty() {
                groups.push(parallel(current));
            }
            series(groups)
        })
    })
}

proptest! {
    #[test]
    fn every_plan_run_finishes_in_dependency_order(
        step in step_strategy(),
        failing_indices in proptest::collection::vec(0..ACTIONS.len(), 0..3),
    ) {
        let plan = TaskPlan::from_step(&step).unwrap();
        let mut scheduler = Scheduler::from_plan(&plan);

        let failing: HashSet<String> = failing_indices
            .iter()
            .map(|&i| ACTIONS[i].task_name())
            .collect();

        let mut executing: Vec<String> = scheduler.start().into_iter().map(|t| t.name).collect();
        prop_assert!(!executing.is_empty(), "a non-empty plan always has a root");

        let mut finished: Vec<String> = Vec::new();
        let mut steps = 0;
        while let Some(current) = executing.pop() {
            steps += 1;
            prop_assert!(steps <= 100, "scheduler did not settle");

            // Every dependency of a dispatched task already succeeded.
            for dep in &plan.get(&current).unwrap().after {
                prop_assert!(finished.contains(dep), "{current} ran before {dep}");
            }

            let outcome = if failing.contains(&current) {
                TaskOutcome::Failed
            } else {
                finished.push(current.clone());
                TaskOutcome::Success
            };

            let step = scheduler.complete(&current, outcome);
            executing.extend(step.ready.into_iter().map(|t| t.name));
        }

        prop_assert!(scheduler.is_finished(), "tasks left waiting after the run drained");
    }
}
