//! Discrete-event decoder: permutation to total tardiness.
//!
//! A permutation only fixes job priorities. The decoder turns it into a
//! schedule by simulating the shop:
//!
//! 1. Job at position `k` gets priority `k + 1` (lower is served first).
//! 2. In permutation order, every job is assigned to a stage-1 machine by the
//!    least expected workload rule and enters service at once if that
//!    machine is idle.
//! 3. Completion events are processed earliest first (lower stage first on
//!    ties). The finished job is assigned to the next stage; the freed
//!    machine immediately serves the highest-priority job in its buffer.
//! 4. Total tardiness is `sum_j max(0, C_j,m - d_j)`.
//!
//! # Assignment rule
//!
//! For job `j` entering stage `i`, machine `l` scores
//!
//! ```text
//! W_il = sum(p_i,l of jobs in B_il) + p_ij,l + max(0, a_il - t)
//! ```
//!
//! and the first machine with the minimum score wins.
//!
//! # Isolation
//!
//! [`Decoder`] owns a [`SimState`] and resets it before each decode. The raw
//! [`simulate`] entry point takes caller-owned state and requires it to be
//! reset already.
//!
//! # Reference
//! Engin & Döyen (2004), "A new approach to solve hybrid flow shop
//! scheduling problems by artificial immune system"

mod event;
mod state;

pub use event::Event;
pub use state::{JobState, MachineState, SimState};

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::model::{MachineKey, Problem};

/// Result of simulating one permutation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodeOutcome {
    /// Sum of job tardiness. The fitness value, to be minimized.
    pub total_tardiness: f64,
    /// Jobs that finished the last stage before the event queue drained.
    pub jobs_completed: usize,
    /// Latest last-stage completion time.
    pub makespan: f64,
}

impl DecodeOutcome {
    /// `true` if all `num_jobs` jobs completed every stage.
    pub fn is_complete(&self, num_jobs: usize) -> bool {
        self.jobs_completed == num_jobs
    }
}

/// Reusable decoder bound to one problem.
///
/// # Examples
///
/// ```
/// use u_flowshop::decoder::Decoder;
/// use u_flowshop::model::Problem;
///
/// let problem = Problem::builder(vec![1])
///     .job(0, vec![vec![5]])
///     .job(0, vec![vec![3]])
///     .job(0, vec![vec![8]])
///     .build()
///     .unwrap();
///
/// let mut decoder = Decoder::new(&problem);
/// let outcome = decoder.decode(&[2, 1, 3]);
/// assert_eq!(outcome.total_tardiness, 27.0);
/// assert!(outcome.is_complete(3));
/// ```
#[derive(Debug, Clone)]
pub struct Decoder<'p> {
    problem: &'p Problem,
    state: SimState,
    events: BinaryHeap<Reverse<Event>>,
    evaluations: u64,
}

impl<'p> Decoder<'p> {
    pub fn new(problem: &'p Problem) -> Self {
        Self {
            problem,
            state: SimState::new(problem),
            events: BinaryHeap::with_capacity(problem.num_machines()),
            evaluations: 0,
        }
    }

    pub fn problem(&self) -> &'p Problem {
        self.problem
    }

    /// Resets the internal state and simulates `permutation`.
    ///
    /// `permutation` must contain every job id `1..=n` exactly once.
    pub fn decode(&mut self, permutation: &[usize]) -> DecodeOutcome {
        self.state.reset();
        self.events.clear();
        self.evaluations += 1;
        run(permutation, self.problem, &mut self.state, &mut self.events)
    }

    /// Total tardiness of `permutation`.
    #[inline]
    pub fn evaluate(&mut self, permutation: &[usize]) -> f64 {
        self.decode(permutation).total_tardiness
    }

    /// State left behind by the most recent decode.
    pub fn state(&self) -> &SimState {
        &self.state
    }

    /// Number of decodes performed so far.
    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }
}

/// Total tardiness of `permutation` on a fresh simulation state.
pub fn decode(permutation: &[usize], problem: &Problem) -> f64 {
    Decoder::new(problem).evaluate(permutation)
}

/// Simulates `permutation` on caller-owned `state`.
///
/// `state` must be reset (see [`SimState::reset`]); it is left holding the
/// completion times and tardiness of this decode.
pub fn simulate(permutation: &[usize], problem: &Problem, state: &mut SimState) -> DecodeOutcome {
    debug_assert!(state.is_reset(), "simulate requires a reset SimState");
    let mut events = BinaryHeap::with_capacity(problem.num_machines());
    run(permutation, problem, state, &mut events)
}

fn run(
    permutation: &[usize],
    problem: &Problem,
    state: &mut SimState,
    events: &mut BinaryHeap<Reverse<Event>>,
) -> DecodeOutcome {
    debug_assert!(
        problem.check_permutation(permutation).is_ok(),
        "decoder requires a permutation of all job ids"
    );

    let num_jobs = problem.num_jobs();
    let num_stages = problem.num_stages();
    let mut clock = 0.0;
    let mut completed = 0usize;

    for (k, &id) in permutation.iter().enumerate() {
        state.job_mut(id).priority = k + 1;
    }

    for &id in permutation {
        let key = assign(problem, state, id, 1, clock);
        if !state.machine(key).busy {
            if let Some(done) = seize(problem, state, key, clock) {
                events.push(Reverse(Event::new(done, key)));
            }
        }
    }

    while completed < num_jobs {
        let Some(Reverse(event)) = events.pop() else {
            break;
        };
        clock = event.time;
        let key = event.key;

        let Some(finished) = release(state, key, clock) else {
            continue;
        };

        if key.stage < num_stages {
            let next = assign(problem, state, finished, key.stage + 1, clock);
            if !state.machine(next).busy {
                if let Some(done) = seize(problem, state, next, clock) {
                    events.push(Reverse(Event::new(done, next)));
                }
            }
        } else {
            completed += 1;
        }

        if !state.machine(key).buffer.is_empty() {
            if let Some(done) = seize(problem, state, key, clock) {
                events.push(Reverse(Event::new(done, key)));
            }
        }
    }

    if completed < num_jobs {
        tracing::warn!(
            completed,
            num_jobs,
            clock,
            "event queue drained before all jobs completed"
        );
    }

    let mut total_tardiness = 0.0;
    let mut makespan: f64 = 0.0;
    for job in problem.jobs() {
        let js = state.job_mut(job.id());
        let finish = js.completion[num_stages - 1];
        js.tardiness = job.tardiness(finish);
        total_tardiness += js.tardiness;
        makespan = makespan.max(finish);
    }

    DecodeOutcome {
        total_tardiness,
        jobs_completed: completed,
        makespan,
    }
}

/// Puts job `id` into the buffer of the stage machine with the least
/// expected workload and returns that machine.
fn assign(problem: &Problem, state: &mut SimState, id: usize, stage: usize, clock: f64) -> MachineKey {
    let job = problem.job(id);
    let mut best = MachineKey::new(stage, 1);
    let mut best_load = f64::INFINITY;

    for l in 1..=problem.machines_in_stage(stage) {
        let key = MachineKey::new(stage, l);
        let machine = state.machine(key);
        let queued: f64 = machine
            .buffer
            .iter()
            .map(|&b| problem.job(b).processing_time(stage, l) as f64)
            .sum();
        let load = queued
            + job.processing_time(stage, l) as f64
            + (machine.available_time - clock).max(0.0);
        if load < best_load {
            best_load = load;
            best = key;
        }
    }

    state.machine_mut(best).buffer.push(id);
    best
}

/// Starts the highest-priority buffered job on `key`; returns its completion time.
fn seize(problem: &Problem, state: &mut SimState, key: MachineKey, clock: f64) -> Option<f64> {
    let pos = {
        let machine = state.machine(key);
        machine
            .buffer
            .iter()
            .enumerate()
            .min_by_key(|&(_, &id)| state.job(id).priority)
            .map(|(pos, _)| pos)?
    };

    let machine = state.machine_mut(key);
    let id = machine.buffer.swap_remove(pos);
    let done = clock + problem.job(id).processing_time(key.stage, key.machine) as f64;
    machine.available_time = done;
    machine.busy = true;
    machine.current = Some(id);

    state.job_mut(id).completion[key.stage - 1] = done;
    Some(done)
}

/// Ends service on `key` and returns the job that was being processed.
fn release(state: &mut SimState, key: MachineKey, clock: f64) -> Option<usize> {
    let machine = state.machine_mut(key);
    machine.busy = false;
    machine.available_time = clock;
    machine.current.take()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::InstanceGenerator;
    use crate::permutation::random_permutation;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn single_machine() -> Problem {
        Problem::builder(vec![1])
            .job(0, vec![vec![5]])
            .job(0, vec![vec![3]])
            .job(0, vec![vec![8]])
            .build()
            .unwrap()
    }

    #[test]
    fn test_single_machine_serves_in_priority_order() {
        let problem = single_machine();
        let mut decoder = Decoder::new(&problem);
        let outcome = decoder.decode(&[2, 1, 3]);

        let state = decoder.state();
        assert_eq!(state.completion(2, 1), 3.0);
        assert_eq!(state.completion(1, 1), 8.0);
        assert_eq!(state.completion(3, 1), 16.0);
        assert_eq!(outcome.total_tardiness, 27.0);
        assert_eq!(outcome.jobs_completed, 3);
        assert_eq!(outcome.makespan, 16.0);
    }

    #[test]
    fn test_free_function_matches_decoder() {
        let problem = single_machine();
        assert_eq!(decode(&[2, 1, 3], &problem), 27.0);
        assert_eq!(decode(&[1, 2, 3], &problem), 5.0 + 8.0 + 16.0);
    }

    #[test]
    fn test_due_dates_reduce_tardiness() {
        let problem = single_machine().with_due_date(8);
        // completions 3, 8, 16 -> only job 3 is late, by 8
        assert_eq!(decode(&[2, 1, 3], &problem), 8.0);
    }

    #[test]
    fn test_least_workload_assignment() {
        // One stage, two machines. Job 1 prefers machine 1, job 2 then sees
        // machine 1 loaded and goes to machine 2.
        let problem = Problem::builder(vec![2])
            .job(0, vec![vec![4, 9]])
            .job(0, vec![vec![4, 5]])
            .build()
            .unwrap();
        let mut decoder = Decoder::new(&problem);
        let outcome = decoder.decode(&[1, 2]);
        assert_eq!(decoder.state().completion(1, 1), 4.0);
        assert_eq!(decoder.state().completion(2, 1), 5.0);
        assert_eq!(outcome.total_tardiness, 9.0);
    }

    #[test]
    fn test_workload_tie_goes_to_lowest_machine() {
        let problem = Problem::builder(vec![2])
            .job(0, vec![vec![3, 3]])
            .build()
            .unwrap();
        let mut decoder = Decoder::new(&problem);
        let outcome = decoder.decode(&[1]);
        assert_eq!(outcome.total_tardiness, 3.0);
        assert_eq!(decoder.state().completion(1, 1), 3.0);
        // Only the machine that served the job has moved its clock.
        assert_eq!(decoder.state().machine(MachineKey::new(1, 1)).available_time, 3.0);
        assert_eq!(decoder.state().machine(MachineKey::new(1, 2)).available_time, 0.0);
        assert!(decoder.state().machine(MachineKey::new(1, 1)).buffer.is_empty());
    }

    /// At t=6 machine M1.2 (stage 1) and M2.1 (stage 2) finish together.
    /// Processing the stage-1 event first puts job 2 into M2.1's buffer
    /// before M2.1 picks its next job, so job 2 (priority 2) beats job 3
    /// (priority 3), which had been waiting since t=2.
    #[test]
    fn test_simultaneous_events_lower_stage_first() {
        let problem = Problem::builder(vec![2, 1])
            .job(0, vec![vec![1, 100], vec![5]])
            .job(0, vec![vec![100, 6], vec![4]])
            .job(0, vec![vec![1, 100], vec![3]])
            .build()
            .unwrap();
        let mut decoder = Decoder::new(&problem);
        let outcome = decoder.decode(&[1, 2, 3]);
        let state = decoder.state();

        assert_eq!(state.completion(1, 1), 1.0);
        assert_eq!(state.completion(3, 1), 2.0);
        assert_eq!(state.completion(2, 1), 6.0);
        assert_eq!(state.completion(1, 2), 6.0);
        assert_eq!(state.completion(2, 2), 10.0);
        assert_eq!(state.completion(3, 2), 13.0);
        assert_eq!(outcome.total_tardiness, 29.0);
    }

    #[test]
    fn test_decoder_resets_between_decodes() {
        let mut gen = InstanceGenerator::new(11);
        let problem = gen.generate(12, &[2, 3, 2]).unwrap();
        let mut decoder = Decoder::new(&problem);
        let mut rng = StdRng::seed_from_u64(5);

        let a = random_permutation(12, &mut rng);
        let b = random_permutation(12, &mut rng);
        let first = decoder.decode(&a);
        decoder.decode(&b);
        let again = decoder.decode(&a);
        assert_eq!(first, again);
        assert_eq!(decoder.evaluations(), 3);
    }

    #[test]
    fn test_simulate_on_caller_state() {
        let problem = single_machine();
        let mut state = SimState::new(&problem);
        let outcome = simulate(&[2, 1, 3], &problem, &mut state);
        assert_eq!(outcome.total_tardiness, 27.0);
        assert_eq!(state.job(3).tardiness, 16.0);
        assert_eq!(state.job(2).priority, 1);
    }

    #[test]
    fn test_no_jobs() {
        let problem = Problem::builder(vec![1, 2]).build().unwrap();
        let mut decoder = Decoder::new(&problem);
        let outcome = decoder.decode(&[]);
        assert_eq!(outcome.total_tardiness, 0.0);
        assert!(outcome.is_complete(0));
    }

    proptest! {
        #[test]
        fn prop_decode_deterministic_and_non_negative(
            seed in any::<u64>(),
            n in 1usize..15,
            stages in prop::collection::vec(1usize..4, 1..4),
            due in 0u32..200,
        ) {
            let problem = InstanceGenerator::new(seed)
                .with_due_date(due)
                .generate(n, &stages)
                .unwrap();
            let mut rng = StdRng::seed_from_u64(seed ^ 0x5eed);
            let perm = random_permutation(n, &mut rng);

            let mut decoder = Decoder::new(&problem);
            let a = decoder.decode(&perm);
            let b = decode(&perm, &problem);

            prop_assert_eq!(a.total_tardiness, b);
            prop_assert!(a.total_tardiness >= 0.0);
            prop_assert!(a.is_complete(n));
            for id in 1..=n {
                prop_assert!(decoder.state().completion(id, stages.len()) > 0.0);
            }
        }
    }
}
