//! Property-based tests for the grid mapping and the solved tables.

use proptest::prelude::*;

use pricing_dp::constants::VALUE_EPSILON;
use pricing_dp::price_grid::PriceGrid;
use pricing_dp::{solve_with_config, SolverConfig, TerminalReward};

/// Strategy: small (N, M) pairs that solve in well under a millisecond.
fn config_strategy() -> impl Strategy<Value = (usize, usize)> {
    (1..=5usize, 1..=14usize)
}

fn reward_strategy() -> impl Strategy<Value = TerminalReward> {
    prop_oneof![
        Just(TerminalReward::AllBudgets),
        Just(TerminalReward::ExhaustedBudgetOnly),
    ]
}

proptest! {
    // 1. get_index is idempotent on grid points
    #[test]
    fn get_index_idempotent(m in 1..=600usize) {
        let grid = PriceGrid::new(m);
        for (k, &p) in grid.prices().iter().enumerate() {
            prop_assert_eq!(grid.get_index(p), k);
        }
    }

    // 2. get_index is total and returns a nearest point
    #[test]
    fn get_index_nearest(m in 1..=200usize, p in -2.0f64..3.0) {
        let grid = PriceGrid::new(m);
        let k = grid.get_index(p);
        prop_assert!(k < m);
        let d = (grid.price(k) - p).abs();
        for &q in grid.prices() {
            prop_assert!(d <= (q - p).abs() + VALUE_EPSILON, "k={k} p={p}");
        }
    }

    // 3. Arithmetic snap agrees with the linear scan away from exact midpoints
    #[test]
    fn get_index_matches_scan(m in 2..=200usize, p in -0.5f64..1.5) {
        let grid = PriceGrid::new(m);
        let x = p * (m - 1) as f64;
        prop_assume!((x - x.floor() - 0.5).abs() > 1e-9);
        prop_assert_eq!(grid.get_index(p), grid.get_index_scan(p));
    }

    // 4. Base case: value[i, 0, k] == i for every i, k
    #[test]
    fn base_case_holds((n, m) in config_strategy()) {
        let sol = solve_with_config(&SolverConfig::new(n, m)).unwrap();
        for i in 0..=n {
            for k in 0..m {
                prop_assert_eq!(sol.table.value_at(i, 0, k), i as f64);
            }
        }
    }

    // 5. Value is non-decreasing in budget
    #[test]
    fn value_monotone_in_budget((n, m) in config_strategy()) {
        let sol = solve_with_config(&SolverConfig::new(n, m)).unwrap();
        for j in 0..n {
            for i in 0..=(n - j) {
                for k in 1..m {
                    let lo = sol.table.value_at(i, j, k - 1);
                    let hi = sol.table.value_at(i, j, k);
                    prop_assert!(hi + VALUE_EPSILON >= lo, "({i},{j},{k}) {lo} > {hi}");
                }
            }
        }
    }

    // 6. Stored optimum respects s <= p
    #[test]
    fn best_price_feasible((n, m) in config_strategy(), reward in reward_strategy()) {
        let config = SolverConfig::new(n, m).with_terminal_reward(reward);
        let sol = solve_with_config(&config).unwrap();
        let prices = sol.table.prices().to_vec();
        for j in 1..=n {
            for i in 0..=(n - j) {
                for (k, &p) in prices.iter().enumerate() {
                    prop_assert!(sol.table.best_price_at(i, j, k) <= p);
                }
            }
        }
    }

    // 7. Every root-to-leaf path has length N; 2^N leaves
    #[test]
    fn tree_shape((n, m) in config_strategy(), reward in reward_strategy()) {
        let config = SolverConfig::new(n, m).with_terminal_reward(reward);
        let sol = solve_with_config(&config).unwrap();
        prop_assert_eq!(sol.policy.depth_range(), (n, n));
        prop_assert_eq!(sol.policy.leaf_count(), 1usize << n);
        prop_assert_eq!(sol.policy.node_count(), (1usize << (n + 1)) - 1);
    }

    // 8. Identical inputs give bit-identical outputs
    #[test]
    fn deterministic((n, m) in config_strategy(), reward in reward_strategy()) {
        let config = SolverConfig::new(n, m).with_terminal_reward(reward);
        let a = solve_with_config(&config).unwrap();
        let b = solve_with_config(&config).unwrap();
        prop_assert_eq!(a.expected_value.to_bits(), b.expected_value.to_bits());
        let bits = |v: &[f64]| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
        prop_assert_eq!(bits(a.table.best_prices()), bits(b.table.best_prices()));
        prop_assert_eq!(bits(a.table.values()), bits(b.table.values()));
        prop_assert_eq!(a.policy, b.policy);
    }

    // 9. Expected value is bounded by the terminal extremes
    #[test]
    fn expected_value_bounded((n, m) in config_strategy(), reward in reward_strategy()) {
        let config = SolverConfig::new(n, m).with_terminal_reward(reward);
        let sol = solve_with_config(&config).unwrap();
        prop_assert!(sol.expected_value >= -VALUE_EPSILON);
        prop_assert!(sol.expected_value <= n as f64 + VALUE_EPSILON);
    }
}
