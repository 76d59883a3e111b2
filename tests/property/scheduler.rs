use std::collections::HashSet;

use proptest::prelude::*;

use assetpipe::dag::{Plan, PlanNode, Scheduler};
use assetpipe::engine::TaskOutcome;
use assetpipe::types::{FailurePolicy, TaskKind};

const KINDS: [TaskKind; 9] = [
    TaskKind::Styles,
    TaskKind::Images,
    TaskKind::Scripts,
    TaskKind::CopyAssets,
    TaskKind::CopyCss,
    TaskKind::Compress,
    TaskKind::Serve,
    TaskKind::Reload,
    TaskKind::Monitor,
];

// Acyclic by construction: node i only depends on nodes 0..i.
fn plan_strategy() -> impl Strategy<Value = Plan> {
    (1..=KINDS.len()).prop_flat_map(|num_tasks| {
        proptest::collection::vec(proptest::collection::vec(any::<usize>(), 0..3), num_tasks)
            .prop_map(move |raw_deps| {
                let nodes = raw_deps
                    .into_iter()
                    .enumerate()
                    .map(|(i, potential)| {
                        let deps: HashSet<TaskKind> = if i == 0 {
                            HashSet::new()
                        } else {
                            potential.into_iter().map(|d| KINDS[d % i]).collect()
                        };
                        let deps: Vec<TaskKind> = deps.into_iter().collect();
                        PlanNode::after(KINDS[i], &deps)
                    })
                    .collect();
                Plan::new("generated", nodes).unwrap()
            })
    })
}

fn policy_strategy() -> impl Strategy<Value = FailurePolicy> {
    prop_oneof![Just(FailurePolicy::Cancel), Just(FailurePolicy::Wait)]
}

proptest! {
    #[test]
    fn scheduler_terminates_and_never_runs_a_task_twice(
        plan in plan_strategy(),
        policy in policy_strategy(),
        failing in proptest::collection::hash_set(0..KINDS.len(), 0..3),
        picks in proptest::collection::vec(any::<usize>(), 32),
    ) {
        let failing: HashSet<TaskKind> = failing.into_iter().map(|i| KINDS[i]).collect();
        let mut sched = Scheduler::from_plan(&plan, policy);

        let mut started: Vec<TaskKind> = Vec::new();
        let mut in_flight: Vec<TaskKind> = Vec::new();

        let start = sched.start();
        for t in &start.newly_scheduled {
            started.push(t.task);
            in_flight.push(t.task);
        }

        let mut picks = picks.into_iter().cycle();
        let mut steps = 0;
        while !in_flight.is_empty() {
            steps += 1;
            prop_assert!(steps <= KINDS.len() * 2, "scheduler did not converge");

            let idx = picks.next().unwrap_or(0) % in_flight.len();
            let task = in_flight.remove(idx);
            let outcome = if failing.contains(&task) {
                TaskOutcome::Failed("induced".into())
            } else {
                TaskOutcome::Success
            };

            let step = sched.step_completion(task, outcome);
            for cancelled in &step.to_cancel {
                in_flight.retain(|t| t != cancelled);
            }
            for t in &step.newly_scheduled {
                prop_assert!(!started.contains(&t.task), "{} scheduled twice", t.task);
                prop_assert!(sched.deps_satisfied(t.task) == Some(true));
                started.push(t.task);
                in_flight.push(t.task);
            }
        }

        prop_assert!(sched.is_finished());

        let failed = sched.failed_tasks();
        if failed.is_empty() && sched.cancelled_tasks().is_empty() {
            prop_assert_eq!(started.len(), plan.nodes().len());
        }
        for node in plan.nodes() {
            if node.after.iter().any(|dep| failed.contains(dep)) {
                prop_assert!(!started.contains(&node.task));
            }
        }
    }
}
