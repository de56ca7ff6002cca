//! Core data structures: solver configuration and the two-phase grid table.
//!
//! The central type is [`GridTable`], which owns the price axis and the two
//! state arrays (`value` and `best_price`). It is mutable only while the
//! backward induction fills it; [`GridTable::freeze`] turns it into a
//! [`SolvedTable`], a read-only snapshot used for tree materialization,
//! simulation, and storage.

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{PricingError, Result};
use crate::price_grid::PriceGrid;

/// Terminal payoff at j = 0 (no rounds remaining).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TerminalReward {
    /// `value[i, 0, k] = i` for every budget k.
    #[default]
    AllBudgets,
    /// `value[i, 0, 0] = i`, zero at every other budget: the seller is only
    /// paid when the budget has been fully consumed.
    ExhaustedBudgetOnly,
}

impl TerminalReward {
    pub fn tag(self) -> u32 {
        match self {
            TerminalReward::AllBudgets => 0,
            TerminalReward::ExhaustedBudgetOnly => 1,
        }
    }

    pub fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            0 => Some(TerminalReward::AllBudgets),
            1 => Some(TerminalReward::ExhaustedBudgetOnly),
            _ => None,
        }
    }
}

/// Inputs to one solver run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// N: number of rounds (offers).
    pub rounds: usize,
    /// M: number of grid points on [0, 1].
    pub grid_points: usize,
    pub terminal_reward: TerminalReward,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            rounds: DEFAULT_ROUNDS,
            grid_points: DEFAULT_GRID_POINTS,
            terminal_reward: TerminalReward::default(),
        }
    }
}

impl SolverConfig {
    pub fn new(rounds: usize, grid_points: usize) -> Self {
        Self {
            rounds,
            grid_points,
            terminal_reward: TerminalReward::default(),
        }
    }

    pub fn with_terminal_reward(mut self, terminal_reward: TerminalReward) -> Self {
        self.terminal_reward = terminal_reward;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.rounds < 1 {
            return Err(PricingError::InvalidConfig(format!(
                "rounds must be >= 1, got {}",
                self.rounds
            )));
        }
        if self.grid_points < 1 {
            return Err(PricingError::InvalidConfig(format!(
                "grid_points must be >= 1, got {}",
                self.grid_points
            )));
        }
        if num_states(self.rounds, self.grid_points).is_none() {
            return Err(PricingError::InvalidConfig(format!(
                "state table for rounds={} grid_points={} overflows usize",
                self.rounds, self.grid_points
            )));
        }
        Ok(())
    }
}

const VALUE_WRITTEN: u8 = 1;
const PRICE_WRITTEN: u8 = 2;

/// Value function and optimal-price function over (i, j, budget).
///
/// Layout: both arrays are (N+1) × (N+1) × M, flat in
/// [`state_index`](crate::constants::state_index) order. All price-keyed
/// accessors snap the budget through [`PriceGrid::get_index`].
#[derive(Clone, Debug)]
pub struct GridTable {
    n: usize,
    m: usize,
    terminal_reward: TerminalReward,
    grid: PriceGrid,
    values: Vec<f64>,
    best_prices: Vec<f64>,
    /// Per-state write flags; each array slot is written at most once.
    written: Vec<u8>,
}

impl GridTable {
    /// Allocate zeroed arrays and install the j = 0 base case.
    pub fn new(config: &SolverConfig) -> Result<Self> {
        config.validate()?;
        let (n, m) = (config.rounds, config.grid_points);
        // validate() already checked this fits.
        let total = num_states(n, m).unwrap_or_default();

        let mut table = Self {
            n,
            m,
            terminal_reward: config.terminal_reward,
            grid: PriceGrid::new(m),
            values: vec![0.0; total],
            best_prices: vec![0.0; total],
            written: vec![0; total],
        };

        let budgets = match config.terminal_reward {
            TerminalReward::AllBudgets => m,
            TerminalReward::ExhaustedBudgetOnly => 1,
        };
        for i in 0..=n {
            for k in 0..budgets {
                let idx = state_index(i, 0, k, n, m);
                table.values[idx] = i as f64;
                table.written[idx] |= VALUE_WRITTEN;
            }
        }
        Ok(table)
    }

    #[inline]
    pub fn n(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn m(&self) -> usize {
        self.m
    }

    #[inline]
    pub fn terminal_reward(&self) -> TerminalReward {
        self.terminal_reward
    }

    #[inline]
    pub fn grid(&self) -> &PriceGrid {
        &self.grid
    }

    #[inline]
    pub fn prices(&self) -> &[f64] {
        self.grid.prices()
    }

    #[inline(always)]
    pub fn get_index(&self, p: f64) -> usize {
        self.grid.get_index(p)
    }

    #[inline(always)]
    fn idx(&self, i: usize, j: usize, p: f64) -> usize {
        state_index(i, j, self.grid.get_index(p), self.n, self.m)
    }

    #[inline(always)]
    pub fn read_value(&self, i: usize, j: usize, p: f64) -> f64 {
        self.values[self.idx(i, j, p)]
    }

    #[inline(always)]
    pub fn read_best_price(&self, i: usize, j: usize, p: f64) -> f64 {
        self.best_prices[self.idx(i, j, p)]
    }

    pub fn write_value(&mut self, i: usize, j: usize, p: f64, v: f64) {
        let idx = self.idx(i, j, p);
        debug_assert!(
            self.written[idx] & VALUE_WRITTEN == 0,
            "value({i}, {j}, {p}) written twice"
        );
        self.written[idx] |= VALUE_WRITTEN;
        self.values[idx] = v;
    }

    pub fn write_best_price(&mut self, i: usize, j: usize, p: f64, v: f64) {
        let idx = self.idx(i, j, p);
        debug_assert!(
            self.written[idx] & PRICE_WRITTEN == 0,
            "best_price({i}, {j}, {p}) written twice"
        );
        self.written[idx] |= PRICE_WRITTEN;
        self.best_prices[idx] = v;
    }

    #[inline(always)]
    pub fn value_at(&self, i: usize, j: usize, k: usize) -> f64 {
        self.values[state_index(i, j, k, self.n, self.m)]
    }

    #[inline(always)]
    pub fn best_price_at(&self, i: usize, j: usize, k: usize) -> f64 {
        self.best_prices[state_index(i, j, k, self.n, self.m)]
    }

    /// End the fill phase.
    pub fn freeze(self) -> SolvedTable {
        SolvedTable { inner: self }
    }
}

/// Read-only snapshot of a fully solved [`GridTable`].
#[derive(Clone, Debug)]
pub struct SolvedTable {
    inner: GridTable,
}

impl SolvedTable {
    /// Rebuild a snapshot from raw arrays (used when loading from disk).
    pub fn from_parts(
        config: &SolverConfig,
        values: Vec<f64>,
        best_prices: Vec<f64>,
    ) -> Result<Self> {
        config.validate()?;
        let total = num_states(config.rounds, config.grid_points).unwrap_or_default();
        if values.len() != total || best_prices.len() != total {
            return Err(PricingError::InvalidFormat(format!(
                "expected {} states per array, got {} values and {} prices",
                total,
                values.len(),
                best_prices.len()
            )));
        }
        Ok(Self {
            inner: GridTable {
                n: config.rounds,
                m: config.grid_points,
                terminal_reward: config.terminal_reward,
                grid: PriceGrid::new(config.grid_points),
                values,
                best_prices,
                written: vec![VALUE_WRITTEN | PRICE_WRITTEN; total],
            },
        })
    }

    #[inline]
    pub fn n(&self) -> usize {
        self.inner.n
    }

    #[inline]
    pub fn m(&self) -> usize {
        self.inner.m
    }

    #[inline]
    pub fn terminal_reward(&self) -> TerminalReward {
        self.inner.terminal_reward
    }

    pub fn config(&self) -> SolverConfig {
        SolverConfig {
            rounds: self.inner.n,
            grid_points: self.inner.m,
            terminal_reward: self.inner.terminal_reward,
        }
    }

    #[inline]
    pub fn prices(&self) -> &[f64] {
        self.inner.prices()
    }

    #[inline(always)]
    pub fn get_index(&self, p: f64) -> usize {
        self.inner.get_index(p)
    }

    #[inline(always)]
    pub fn read_value(&self, i: usize, j: usize, p: f64) -> f64 {
        self.inner.read_value(i, j, p)
    }

    #[inline(always)]
    pub fn read_best_price(&self, i: usize, j: usize, p: f64) -> f64 {
        self.inner.read_best_price(i, j, p)
    }

    #[inline(always)]
    pub fn value_at(&self, i: usize, j: usize, k: usize) -> f64 {
        self.inner.value_at(i, j, k)
    }

    #[inline(always)]
    pub fn best_price_at(&self, i: usize, j: usize, k: usize) -> f64 {
        self.inner.best_price_at(i, j, k)
    }

    /// Value at the root state (0, N, budget 1).
    pub fn expected_value(&self) -> f64 {
        self.inner.read_value(0, self.inner.n, 1.0)
    }

    pub fn values(&self) -> &[f64] {
        &self.inner.values
    }

    pub fn best_prices(&self) -> &[f64] {
        &self.inner.best_prices
    }
}
