use std::collections::{HashMap, HashSet};
use std::time::Instant;

use proptest::prelude::*;
use runner::engine::Outcome;
use runner::scheduler::{JobState, Scheduler};
use runner::types::AttemptLimit;

/// A run to simulate: how many times each job fails before succeeding, the
/// attempt limit, a desired concurrency, and the order completions arrive in.
#[derive(Debug, Clone)]
struct Plan {
    failures: Vec<u32>,
    max_attempts: Option<u32>,
    desired: usize,
    /// Picks which running job finishes next (index modulo running count).
    picks: Vec<usize>,
    /// Desired-concurrency changes applied along the way.
    resizes: Vec<(usize, i64)>,
}

fn plan_strategy() -> impl Strategy<Value = Plan> {
    (
        proptest::collection::vec(0u32..4, 1..25),
        proptest::option::of(1u32..4),
        1usize..5,
        proptest::collection::vec(any::<usize>(), 1..50),
        proptest::collection::vec((0usize..200, -1i64..6), 0..5),
    )
        .prop_map(|(failures, max_attempts, desired, picks, resizes)| Plan {
            failures,
            max_attempts,
            desired,
            picks,
            resizes,
        })
}

fn job_name(i: usize) -> String {
    format!("job-{i:03}")
}

proptest! {
    #[test]
    fn every_job_ends_terminal_and_slots_stay_bounded(plan in plan_strategy()) {
        let limit = AttemptLimit::from_option(plan.max_attempts);
        let mut scheduler = Scheduler::new(plan.desired, limit);
        let now = Instant::now();

        let names: Vec<String> = (0..plan.failures.len()).map(job_name).collect();
        let mut remaining_failures: HashMap<String, u32> = names
            .iter()
            .cloned()
            .zip(plan.failures.iter().copied())
            .collect();
        let resizes: HashMap<usize, i64> = plan.resizes.iter().copied().collect();

        prop_assert_eq!(scheduler.ingest(names.clone()), names.len());
        // Re-ingesting is a no-op.
        prop_assert_eq!(scheduler.ingest(names.clone()), 0);

        let mut running: Vec<(usize, String)> = Vec::new();
        let mut step = 0usize;

        loop {
            if let Some(&n) = resizes.get(&step) {
                scheduler.set_concurrency(n);
            }
            if scheduler.desired() == 0 && running.is_empty() {
                // Paused with nothing in flight: resume so the run can end.
                scheduler.set_concurrency(1);
            }

            let before = running.len();
            for dispatch in scheduler.tick(now) {
                running.push((dispatch.slot, dispatch.job));
            }
            if running.len() > before {
                prop_assert!(running.len() <= scheduler.desired());
            }
            prop_assert_eq!(running.len(), scheduler.running());

            let slots: HashSet<usize> = running.iter().map(|(slot, _)| *slot).collect();
            prop_assert_eq!(slots.len(), running.len(), "slot indices are unique");

            if running.is_empty() {
                break;
            }

            let pick = plan.picks[step % plan.picks.len()] % running.len();
            let (slot, job) = running.remove(pick);
            let left = remaining_failures.get_mut(&job).expect("known job");
            let outcome = if *left > 0 {
                *left -= 1;
                Outcome::Failed
            } else {
                Outcome::Succeeded
            };
            prop_assert!(scheduler.on_completion(slot, &job, outcome).is_some());

            step += 1;
            prop_assert!(step < 10_000, "run did not converge");
        }

        prop_assert!(scheduler.is_idle());
        let stats = scheduler.stats();
        prop_assert_eq!(stats.completed(), names.len());

        for (name, fails) in names.iter().zip(&plan.failures) {
            let state = scheduler.state_of(name).expect("known job");
            let expected = match plan.max_attempts {
                Some(max) if *fails >= max => JobState::Failed,
                _ => JobState::Succeeded,
            };
            prop_assert_eq!(state, expected, "job {}", name);
        }
    }

    #[test]
    fn dispatch_order_is_fifo_without_failures(count in 1usize..30, desired in 1usize..6) {
        let mut scheduler = Scheduler::new(desired, AttemptLimit::Unbounded);
        let names: Vec<String> = (0..count).map(job_name).collect();
        scheduler.ingest(names.clone());

        let now = Instant::now();
        let mut order = Vec::new();
        let mut running = Vec::new();
        loop {
            for d in scheduler.tick(now) {
                order.push(d.job.clone());
                running.push(d);
            }
            if running.is_empty() {
                break;
            }
            let d = running.remove(0);
            scheduler.on_completion(d.slot, &d.job, Outcome::Succeeded);
        }

        prop_assert_eq!(order, names);
    }
}
