use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use pricing_dp::constants::{DEFAULT_GRID_POINTS, DEFAULT_ROUNDS};
use pricing_dp::env_config::{init_base_path, init_rayon_threads, init_tracing};
use pricing_dp::policy::build_policy;
use pricing_dp::simulation::simulate_batch;
use pricing_dp::storage::load_table;
use pricing_dp::{solve_with_config, PricingError, SolverConfig, TerminalReward};

/// Play the optimal policy against random uniform-valuation buyers.
#[derive(Parser, Debug)]
#[command(name = "pricing-simulate", version)]
struct Args {
    #[arg(short = 'n', long, default_value_t = DEFAULT_ROUNDS)]
    rounds: usize,

    #[arg(short = 'm', long, default_value_t = DEFAULT_GRID_POINTS)]
    grid_points: usize,

    #[arg(long, value_enum, default_value_t = TerminalReward::AllBudgets)]
    terminal_reward: TerminalReward,

    /// Load a saved table instead of solving (overrides -n/-m).
    #[arg(long)]
    table: Option<PathBuf>,

    #[arg(short = 'g', long, default_value_t = 100_000)]
    games: usize,

    #[arg(short = 's', long, default_value_t = 42)]
    seed: u64,
}

fn run(args: Args) -> Result<(), PricingError> {
    init_base_path()?;
    init_rayon_threads();

    let table = match &args.table {
        Some(path) => load_table(path)?,
        None => {
            let config = SolverConfig::new(args.rounds, args.grid_points)
                .with_terminal_reward(args.terminal_reward);
            solve_with_config(&config)?.table
        }
    };
    let policy = build_policy(&table);
    let result = simulate_batch(&policy, &table, args.games, args.seed);

    println!("Expected value (DP): {:.6}", table.expected_value());
    println!("Simulated mean:      {:.6}", result.mean);
    println!("Std dev:             {:.6}", result.std_dev);
    println!("Min / max payoff:    {:.4} / {:.4}", result.min, result.max);
    println!("Accepted | Sales");
    for (accepted, count) in result.accepted_histogram.iter().enumerate() {
        println!("{:8} | {}", accepted, count);
    }
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
