//! Backward induction: fill `value` and `best_price` for every reachable state.
//!
//! Layers are processed in increasing order of rounds remaining, from j = 1 up
//! to j = N−1. Layer j reads only layer j−1, so every (i, budget) state within
//! a layer is independent; each layer is computed with rayon `par_iter`, the
//! results are collected, and then scattered into the table before the next
//! layer starts. The root state (0, N, 1) is solved last on its own.
//!
//! Recurrence for a state (i, j, p), over grid prices s ≤ p:
//!
//! ```text
//! EV(s)            = (1 − s) · V(i+1, j−1, p − s) + s · V(i, j−1, p)
//! best_price(i,j,p) = first argmax of EV in grid order
//! V(i, j, p)        = max EV
//! ```

use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::Result;
use crate::policy::{build_policy, Policy};
use crate::types::{GridTable, SolvedTable, SolverConfig};

/// Everything a caller gets back from one run.
#[derive(Clone, Debug)]
pub struct PricingSolution {
    /// Value at the root state (0, N, 1).
    pub expected_value: f64,
    pub policy: Policy,
    pub table: SolvedTable,
}

/// Progress tracker for the layer loop.
struct ComputeProgress {
    total_states: usize,
    completed_states: usize,
    start_time: Instant,
    states_per_layer: Vec<usize>,
}

impl ComputeProgress {
    fn new(n: usize, m: usize) -> Self {
        // Layer j (1 ≤ j < N) has N−j+1 item counts × M budgets; layer N is the root.
        let mut states_per_layer = vec![0usize; n + 1];
        for (j, count) in states_per_layer.iter_mut().enumerate().take(n).skip(1) {
            *count = (n - j + 1) * m;
        }
        states_per_layer[n] = 1;
        let total_states = states_per_layer.iter().sum();
        Self {
            total_states,
            completed_states: 0,
            start_time: Instant::now(),
            states_per_layer,
        }
    }

    fn finish_layer(&mut self, j: usize, layer_start: Instant) {
        let states = self.states_per_layer[j];
        self.completed_states += states;
        let layer_secs = layer_start.elapsed().as_secs_f64();
        let pct = self.completed_states as f64 / self.total_states as f64 * 100.0;
        info!(
            layer = j,
            states,
            seconds = format_args!("{:.3}", layer_secs),
            progress = format_args!("{:.1}%", pct),
            "layer solved"
        );
    }
}

/// Solve one state by scanning every feasible quoted price.
///
/// Returns `(best_price, value)`. Ties keep the earliest grid price.
#[inline]
fn solve_state(table: &GridTable, i: usize, j: usize, p: f64) -> (f64, f64) {
    let mut best_price = 0.0;
    let mut best_value = f64::NEG_INFINITY;
    for &s in table.prices() {
        if s > p {
            break;
        }
        let ev = (1.0 - s) * table.read_value(i + 1, j - 1, p - s)
            + s * table.read_value(i, j - 1, p);
        if ev > best_value {
            best_value = ev;
            best_price = s;
        }
    }
    (best_price, best_value)
}

/// Fill every layer 1 ≤ j < N, then the root state.
///
/// Consumes a freshly built table (base case installed) and returns it frozen.
pub fn compute_all_state_values(mut table: GridTable) -> SolvedTable {
    let n = table.n();
    let m = table.m();
    let mut progress = ComputeProgress::new(n, m);

    info!(
        rounds = n,
        grid_points = m,
        total_states = progress.total_states,
        "starting backward induction"
    );
    let total_start = Instant::now();

    for j in 1..n {
        let layer_start = Instant::now();

        let state_list: Vec<(usize, usize)> = (0..=n - j)
            .flat_map(|i| (0..m).map(move |k| (i, k)))
            .collect();

        // Layer j only reads layer j−1, so the table is shared read-only here.
        let table_ref = &table;
        let results: Vec<(usize, f64, f64, f64)> = state_list
            .par_iter()
            .map(|&(i, k)| {
                let p = table_ref.grid().price(k);
                let (best_price, value) = solve_state(table_ref, i, j, p);
                (i, p, best_price, value)
            })
            .collect();

        for &(i, p, best_price, value) in &results {
            table.write_best_price(i, j, p, best_price);
            table.write_value(i, j, p, value);
        }

        progress.finish_layer(j, layer_start);
    }

    let root_start = Instant::now();
    let (best_price, value) = solve_state(&table, 0, n, 1.0);
    table.write_best_price(0, n, 1.0, best_price);
    table.write_value(0, n, 1.0, value);
    debug!(best_price, value, "root state solved");
    progress.finish_layer(n, root_start);

    info!(
        seconds = format_args!("{:.3}", total_start.elapsed().as_secs_f64()),
        expected_value = value,
        "backward induction complete"
    );

    table.freeze()
}

/// Solve with the given configuration and materialize the optimal policy tree.
pub fn solve_with_config(config: &SolverConfig) -> Result<PricingSolution> {
    let table = compute_all_state_values(GridTable::new(config)?);
    let policy = build_policy(&table);
    Ok(PricingSolution {
        expected_value: table.expected_value(),
        policy,
        table,
    })
}

/// Solve `n` rounds on an `m`-point grid with the default terminal reward.
pub fn solve(n: usize, m: usize) -> Result<PricingSolution> {
    solve_with_config(&SolverConfig::new(n, m))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TerminalReward;

    #[test]
    fn single_round_two_points() {
        let sol = solve(1, 2).unwrap();
        assert_eq!(sol.expected_value, 1.0);
        assert_eq!(sol.table.read_best_price(0, 1, 1.0), 0.0);
        assert_eq!(sol.policy.value, 0.0);
    }

    #[test]
    fn two_rounds_two_points() {
        let sol = solve(2, 2).unwrap();
        // Layer 1: quoting 0 keeps i+1, quoting 1 keeps i.
        for i in 0..=1 {
            assert_eq!(sol.table.value_at(i, 1, 0), (i + 1) as f64);
            assert_eq!(sol.table.value_at(i, 1, 1), (i + 1) as f64);
            assert_eq!(sol.table.best_price_at(i, 1, 1), 0.0);
        }
        assert_eq!(sol.expected_value, 2.0);
    }

    #[test]
    fn exhausted_budget_only_small_grid() {
        let config =
            SolverConfig::new(2, 3).with_terminal_reward(TerminalReward::ExhaustedBudgetOnly);
        let sol = solve_with_config(&config).unwrap();
        // Layer 1 at budget 0.5: quoting 0.5 pays only on acceptance, (i+1)/2.
        assert_eq!(sol.table.value_at(1, 1, 1), 1.0);
        assert_eq!(sol.table.best_price_at(1, 1, 1), 0.5);
        // Budget 1 cannot be exhausted in one round: every candidate is 0.
        assert_eq!(sol.table.value_at(0, 1, 2), 0.0);
        assert_eq!(sol.table.best_price_at(0, 1, 2), 0.0);
        assert_eq!(sol.expected_value, 0.5);
        assert_eq!(sol.policy.value, 0.5);
    }

    #[test]
    fn progress_counts_layers() {
        let progress = ComputeProgress::new(3, 4);
        assert_eq!(progress.states_per_layer, vec![0, 12, 8, 1]);
        assert_eq!(progress.total_states, 21);
    }

    #[test]
    fn invalid_config_is_reported() {
        assert!(solve(0, 10).is_err());
        assert!(solve(2, 0).is_err());
    }
}
