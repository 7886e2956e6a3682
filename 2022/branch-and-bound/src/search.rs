use std::time::{Duration, Instant};

/// A maximisation problem explored by depth-first branch and bound.
///
/// Scores are absolute: a state carries whatever it has already secured, so
/// `value` is the score of stopping right there and `upper_bound` is the best
/// final score any continuation could reach.
///
/// `upper_bound` must never be below the true optimum reachable from the
/// state. A bound that is too tight silently prunes the optimum away; a loose
/// one only costs time.
pub trait Problem {
    type State;
    type Action: Copy;

    /// Time units left. A state with no budget is terminal.
    fn budget(&self, state: &Self::State) -> u32;

    /// Score if nothing more is committed from `state`.
    fn value(&self, state: &Self::State) -> u32;

    fn upper_bound(&self, state: &Self::State) -> u32;

    /// Candidate actions, in the order they should be tried.
    fn actions(&self, state: &Self::State) -> Vec<Self::Action>;

    /// The state after taking `action`, or `None` when it is not feasible now.
    fn apply(&self, state: &Self::State, action: Self::Action) -> Option<Self::State>;

    /// Let one unit of time pass without acting. Only tried when some action
    /// was infeasible; `None` means idling can never help.
    fn wait(&self, _state: &Self::State) -> Option<Self::State> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pruning {
    #[default]
    Enabled,
    /// Treat every bound as infinite. Only useful to check that pruning does
    /// not change answers.
    Disabled,
}

/// Caps on how much work one search may do.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchLimits {
    pub max_nodes: Option<u64>,
    pub deadline: Option<Instant>,
}

impl SearchLimits {
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn with_max_nodes(mut self, nodes: u64) -> Self {
        self.max_nodes = Some(nodes);
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.deadline = Some(Instant::now() + limit);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    /// Best score found, never below the floor the search started with.
    pub score: u32,
    pub nodes: u64,
    pub pruned: u64,
    /// False when a limit cut the search short. `score` is then only the best
    /// score seen so far.
    pub complete: bool,
}

/// What a probe sees each time the search enters a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visit {
    pub depth: u32,
    pub budget: u32,
    pub floor: u32,
}

const DEADLINE_CHECK_INTERVAL: u64 = 1024;

pub struct Search<'a, P: Problem> {
    problem: &'a P,
    limits: SearchLimits,
    pruning: Pruning,
    probe: Option<Box<dyn FnMut(Visit) + 'a>>,
    nodes: u64,
    pruned: u64,
    truncated: bool,
}

impl<'a, P: Problem> Search<'a, P> {
    pub fn new(problem: &'a P) -> Self {
        Self {
            problem,
            limits: SearchLimits::default(),
            pruning: Pruning::default(),
            probe: None,
            nodes: 0,
            pruned: 0,
            truncated: false,
        }
    }

    pub fn limits(mut self, limits: SearchLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn pruning(mut self, pruning: Pruning) -> Self {
        self.pruning = pruning;
        self
    }

    pub fn probe(mut self, probe: impl FnMut(Visit) + 'a) -> Self {
        self.probe = Some(Box::new(probe));
        self
    }

    /// Best score reachable from `state`, or `lower_bound` if nothing beats it.
    #[tracing::instrument(level = "debug", skip(self, state))]
    pub fn best_score(mut self, state: &P::State, lower_bound: u32) -> Outcome {
        let score = self.explore(state, 0, lower_bound);
        let outcome = Outcome {
            score,
            nodes: self.nodes,
            pruned: self.pruned,
            complete: !self.truncated,
        };
        tracing::debug!(
            score,
            nodes = outcome.nodes,
            pruned = outcome.pruned,
            complete = outcome.complete,
            "search finished"
        );
        outcome
    }

    fn explore(&mut self, state: &P::State, depth: u32, floor: u32) -> u32 {
        let mut best = floor.max(self.problem.value(state));
        if self.out_of_limits() {
            return best;
        }
        self.nodes += 1;
        let budget = self.problem.budget(state);
        if let Some(probe) = self.probe.as_mut() {
            probe(Visit {
                depth,
                budget,
                floor,
            });
        }

        if budget == 0 {
            return best;
        }
        if self.pruning == Pruning::Enabled && self.problem.upper_bound(state) <= best {
            self.pruned += 1;
            return best;
        }

        let mut blocked = false;
        for action in self.problem.actions(state) {
            if self.truncated {
                return best;
            }
            match self.problem.apply(state, action) {
                Some(child) => best = self.explore(&child, depth + 1, best),
                None => blocked = true,
            }
        }
        if blocked {
            if let Some(child) = self.problem.wait(state) {
                best = self.explore(&child, depth + 1, best);
            }
        }

        tracing::trace!(depth, budget, best, "node explored");
        best
    }

    /// Checked before entering any node, pruned and terminal ones included.
    /// The clock is read on the first entry and every
    /// `DEADLINE_CHECK_INTERVAL` entries after it.
    fn out_of_limits(&mut self) -> bool {
        if !self.truncated {
            let over_nodes = self.limits.max_nodes.is_some_and(|max| self.nodes >= max);
            let over_time = self.nodes % DEADLINE_CHECK_INTERVAL == 0
                && self.limits.deadline.is_some_and(|at| Instant::now() >= at);
            self.truncated = over_nodes || over_time;
        }
        self.truncated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rstest::rstest;
    use std::cell::RefCell;

    /// Jobs that each pay `rate` for every time unit left after they finish.
    struct Jobs {
        jobs: Vec<(u32, u32)>,
    }

    #[derive(Clone, Copy)]
    struct Progress {
        time: u32,
        todo: u8,
        earned: u32,
    }

    impl Jobs {
        fn random(seed: u64) -> Self {
            let mut rng = StdRng::seed_from_u64(seed);
            let count = rng.gen_range(1..=6);
            let jobs = (0..count)
                .map(|_| (rng.gen_range(1..=4), rng.gen_range(0..=9)))
                .collect();
            Self { jobs }
        }

        fn start(&self, time: u32) -> Progress {
            Progress {
                time,
                todo: ((1u16 << self.jobs.len()) - 1) as u8,
                earned: 0,
            }
        }

        fn payout(&self, job: usize, time: u32) -> Option<u32> {
            let (duration, rate) = self.jobs[job];
            time.checked_sub(duration).map(|left| left * rate)
        }

        /// Tries every order of every subset of jobs.
        fn brute_force(&self, time: u32, todo: u8) -> u32 {
            (0..self.jobs.len())
                .filter(|&job| todo & (1 << job) != 0)
                .filter_map(|job| {
                    let pay = self.payout(job, time)?;
                    let left = time - self.jobs[job].0;
                    Some(pay + self.brute_force(left, todo & !(1 << job)))
                })
                .max()
                .unwrap_or(0)
        }
    }

    impl Problem for Jobs {
        type State = Progress;
        type Action = usize;

        fn budget(&self, state: &Progress) -> u32 {
            state.time
        }

        fn value(&self, state: &Progress) -> u32 {
            state.earned
        }

        fn upper_bound(&self, state: &Progress) -> u32 {
            state.earned
                + self
                    .actions(state)
                    .into_iter()
                    .filter_map(|job| self.payout(job, state.time))
                    .sum::<u32>()
        }

        fn actions(&self, state: &Progress) -> Vec<usize> {
            (0..self.jobs.len())
                .filter(|&job| state.todo & (1 << job) != 0)
                .collect()
        }

        fn apply(&self, state: &Progress, job: usize) -> Option<Progress> {
            let pay = self.payout(job, state.time)?;
            Some(Progress {
                time: state.time - self.jobs[job].0,
                todo: state.todo & !(1 << job),
                earned: state.earned + pay,
            })
        }
    }

    #[rstest]
    fn finds_the_exhaustive_optimum(
        #[values(1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12)] seed: u64,
        #[values(0, 1, 5, 10)] time: u32,
    ) {
        let jobs = Jobs::random(seed);
        let start = jobs.start(time);
        let expected = jobs.brute_force(time, start.todo);

        let pruned = Search::new(&jobs).best_score(&start, 0);
        let unpruned = Search::new(&jobs)
            .pruning(Pruning::Disabled)
            .best_score(&start, 0);

        assert_eq!(expected, pruned.score);
        assert_eq!(expected, unpruned.score);
        assert!(pruned.complete && unpruned.complete);
        assert!(pruned.nodes <= unpruned.nodes);
    }

    #[rstest]
    fn sibling_floors_never_decrease(#[values(21, 22, 23, 24)] seed: u64) {
        let jobs = Jobs::random(seed);
        let visits = RefCell::new(Vec::new());
        Search::new(&jobs)
            .probe(|visit| visits.borrow_mut().push(visit))
            .best_score(&jobs.start(10), 0);

        // Floors of the latest sibling seen at each depth of the current path.
        let mut latest: Vec<u32> = Vec::new();
        for visit in visits.into_inner() {
            let depth = visit.depth as usize;
            latest.truncate(depth + 1);
            if latest.len() == depth + 1 {
                assert!(visit.floor >= latest[depth], "seed {seed}: {visit:?}");
                latest[depth] = visit.floor;
            } else {
                latest.push(visit.floor);
            }
        }
    }

    #[test]
    fn floor_is_returned_when_unbeatable() {
        let jobs = Jobs {
            jobs: vec![(1, 3), (2, 5)],
        };
        let outcome = Search::new(&jobs).best_score(&jobs.start(4), 1_000);
        assert_eq!(1_000, outcome.score);
        assert_eq!(1, outcome.nodes);
        assert_eq!(1, outcome.pruned);
    }

    #[test]
    fn node_budget_degrades_gracefully() {
        let jobs = Jobs {
            jobs: vec![(1, 3), (2, 5), (1, 1), (3, 7), (2, 2), (1, 4)],
        };
        let start = jobs.start(10);
        let limited = Search::new(&jobs)
            .limits(SearchLimits::unlimited().with_max_nodes(3))
            .best_score(&start, 7);
        assert!(!limited.complete);
        assert!(limited.score >= 7);
        assert!(limited.score <= jobs.brute_force(10, start.todo));

        let expired = Search::new(&jobs)
            .limits(SearchLimits::unlimited().with_time_limit(Duration::ZERO))
            .best_score(&start, 0);
        assert!(!expired.complete);
        assert_eq!(0, expired.score);
        assert_eq!(0, expired.nodes);
    }

    /// One slow branch followed by a wide fan of terminal leaves.
    struct Fan {
        leaves: u32,
        stall: Duration,
    }

    impl Problem for Fan {
        type State = u32;
        type Action = u32;

        fn budget(&self, minutes: &u32) -> u32 {
            *minutes
        }

        fn value(&self, _minutes: &u32) -> u32 {
            0
        }

        fn upper_bound(&self, _minutes: &u32) -> u32 {
            u32::MAX
        }

        fn actions(&self, minutes: &u32) -> Vec<u32> {
            if *minutes == 0 {
                return Vec::new();
            }
            (0..self.leaves).collect()
        }

        fn apply(&self, _minutes: &u32, leaf: u32) -> Option<u32> {
            if leaf == 0 {
                std::thread::sleep(self.stall);
            }
            Some(0)
        }
    }

    #[test]
    fn deadline_applies_to_terminal_nodes() {
        let fan = Fan {
            leaves: 5_000,
            stall: Duration::from_millis(50),
        };
        let outcome = Search::new(&fan)
            .limits(SearchLimits::unlimited().with_time_limit(Duration::from_millis(10)))
            .best_score(&1, 0);
        assert!(!outcome.complete);
        assert!(outcome.nodes <= DEADLINE_CHECK_INTERVAL + 1);

        let unlimited = Search::new(&Fan {
            leaves: 5_000,
            stall: Duration::ZERO,
        })
        .best_score(&1, 0);
        assert!(unlimited.complete);
        assert_eq!(5_001, unlimited.nodes);
    }
}
