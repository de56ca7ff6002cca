//! # pricing_dp — Optimal Adaptive Posted-Price Policy
//!
//! A seller makes up to N sequential take-it-or-leave-it offers. A buyer
//! facing price s accepts with probability 1 − s (uniform valuations on
//! [0, 1]). The seller tracks a price budget p ∈ [0, 1]; each accepted offer
//! consumes s of it. This crate computes the optimal expected value and the
//! optimal price for every state (i accepted, j rounds remaining, budget p)
//! by **backward induction**, then materializes the resulting policy as an
//! explicit accept/reject decision tree.
//!
//! ## Algorithm overview
//!
//! | Phase | Rust module | Description |
//! |-------|-------------|-------------|
//! | 0 | [`types::GridTable::new`] | Allocate (N+1)×(N+1)×M arrays, install the j=0 base case |
//! | 1 | [`state_computation`] | Fill layers j = 1..N−1 in parallel, then solve the root (0, N, 1) |
//! | 2 | [`policy`] | Walk the frozen table from the root into a binary policy tree |
//!
//! Prices and budgets live on an M-point grid ([`price_grid`]); every
//! continuous price is snapped to its nearest grid point before it indexes
//! a state array.
//!
//! ```no_run
//! let sol = pricing_dp::solve(3, 500)?;
//! println!("E = {:.6}, first quote = {}", sol.expected_value, sol.policy.value);
//! # Ok::<(), pricing_dp::PricingError>(())
//! ```

pub mod constants;
pub mod env_config;
pub mod error;
pub mod policy;
pub mod price_grid;
pub mod simulation;
pub mod state_computation;
pub mod storage;
pub mod types;

pub use error::PricingError;
pub use policy::{Outcome, Policy};
pub use state_computation::{solve, solve_with_config, PricingSolution};
pub use types::{GridTable, SolvedTable, SolverConfig, TerminalReward};
