//! Monte Carlo play of a materialized policy.
//!
//! - [`engine`]: play G independent sales against uniform-valuation buyers

pub mod engine;

pub use engine::{simulate_batch, simulate_sale, SaleOutcome, SimulationResult};
