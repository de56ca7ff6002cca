//! Sale simulation engine: plays a policy tree against random buyers.
//!
//! Each round a fresh buyer draws a valuation v ~ U[0, 1) and accepts the
//! quoted price s iff v ≥ s, i.e. with probability 1 − s, the acceptance
//! model the backward induction assumes. The seller's budget starts at 1 and
//! drops by the quoted price on every acceptance; the payoff of a finished
//! sale is the table's terminal value at (items accepted, 0, final budget).
//! With enough games the mean payoff converges to the root expected value.

use std::time::{Duration, Instant};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::info;

use crate::policy::{Outcome, Policy};
use crate::types::SolvedTable;

/// Result of one simulated sale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SaleOutcome {
    pub accepted: usize,
    pub final_budget: f64,
    pub payoff: f64,
}

/// Aggregates over a batch of sales.
#[derive(Clone, Debug)]
pub struct SimulationResult {
    pub games: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    /// `accepted_histogram[i]` = number of sales that ended with i acceptances.
    pub accepted_histogram: Vec<u64>,
    pub elapsed: Duration,
}

/// Play one sale down the policy tree.
pub fn simulate_sale(policy: &Policy, table: &SolvedTable, rng: &mut SmallRng) -> SaleOutcome {
    let mut node = policy;
    let mut accepted = 0usize;
    let mut budget = 1.0f64;
    while !node.is_leaf() {
        let valuation: f64 = rng.random();
        let outcome = if valuation >= node.value {
            accepted += 1;
            budget -= node.value;
            Outcome::Accept
        } else {
            Outcome::Reject
        };
        match node.child(outcome) {
            Some(child) => node = child,
            None => break,
        }
    }
    let payoff = table.read_value(accepted.min(table.n()), 0, budget);
    SaleOutcome {
        accepted,
        final_budget: budget,
        payoff,
    }
}

/// Play `games` sales in parallel. Game g uses `SmallRng::seed_from_u64(seed + g)`,
/// so results are reproducible regardless of thread count.
pub fn simulate_batch(
    policy: &Policy,
    table: &SolvedTable,
    games: usize,
    seed: u64,
) -> SimulationResult {
    let start = Instant::now();

    let outcomes: Vec<SaleOutcome> = (0..games)
        .into_par_iter()
        .map(|g| {
            let mut rng = SmallRng::seed_from_u64(seed.wrapping_add(g as u64));
            simulate_sale(policy, table, &mut rng)
        })
        .collect();

    let mut accepted_histogram = vec![0u64; table.n() + 1];
    let mut sum = 0.0;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for outcome in &outcomes {
        accepted_histogram[outcome.accepted.min(table.n())] += 1;
        sum += outcome.payoff;
        min = min.min(outcome.payoff);
        max = max.max(outcome.payoff);
    }

    let (mean, std_dev) = if games == 0 {
        (0.0, 0.0)
    } else {
        let mean = sum / games as f64;
        let variance = outcomes
            .iter()
            .map(|o| (o.payoff - mean).powi(2))
            .sum::<f64>()
            / games as f64;
        (mean, variance.sqrt())
    };
    if games == 0 {
        min = 0.0;
        max = 0.0;
    }

    let elapsed = start.elapsed();
    info!(
        games,
        mean,
        std_dev,
        seconds = format_args!("{:.3}", elapsed.as_secs_f64()),
        "simulation complete"
    );

    SimulationResult {
        games,
        mean,
        std_dev,
        min,
        max,
        accepted_histogram,
        elapsed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_computation::{solve, solve_with_config};
    use crate::types::{SolverConfig, TerminalReward};

    #[test]
    fn zero_price_always_sells() {
        let sol = solve(3, 11).unwrap();
        let result = simulate_batch(&sol.policy, &sol.table, 500, 7);
        assert_eq!(result.mean, 3.0);
        assert_eq!(result.std_dev, 0.0);
        assert_eq!(result.accepted_histogram, vec![0, 0, 0, 500]);
    }

    #[test]
    fn deterministic_per_seed() {
        let config =
            SolverConfig::new(3, 9).with_terminal_reward(TerminalReward::ExhaustedBudgetOnly);
        let sol = solve_with_config(&config).unwrap();
        let a = simulate_batch(&sol.policy, &sol.table, 2000, 42);
        let b = simulate_batch(&sol.policy, &sol.table, 2000, 42);
        assert_eq!(a.mean, b.mean);
        assert_eq!(a.accepted_histogram, b.accepted_histogram);
    }

    #[test]
    fn converges_to_expected_value() {
        let config =
            SolverConfig::new(2, 3).with_terminal_reward(TerminalReward::ExhaustedBudgetOnly);
        let sol = solve_with_config(&config).unwrap();
        let result = simulate_batch(&sol.policy, &sol.table, 40_000, 1);
        assert!(
            (result.mean - sol.expected_value).abs() < 0.03,
            "mean={} ev={}",
            result.mean,
            sol.expected_value
        );
    }

    #[test]
    fn empty_batch() {
        let sol = solve(1, 2).unwrap();
        let result = simulate_batch(&sol.policy, &sol.table, 0, 0);
        assert_eq!(result.games, 0);
        assert_eq!(result.mean, 0.0);
        assert_eq!(result.accepted_histogram, vec![0, 0]);
    }
}
