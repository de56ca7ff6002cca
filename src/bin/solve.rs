use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use pricing_dp::constants::{DEFAULT_GRID_POINTS, DEFAULT_ROUNDS};
use pricing_dp::env_config::{init_base_path, init_rayon_threads, init_tracing};
use pricing_dp::storage::{save_policy_json, save_table};
use pricing_dp::{solve_with_config, Policy, PricingError, SolverConfig, TerminalReward};

/// Solve the optimal posted-price policy and print the expected value.
#[derive(Parser, Debug)]
#[command(name = "pricing-solve", version)]
struct Args {
    /// Number of rounds (offers), N >= 1.
    #[arg(short = 'n', long, default_value_t = DEFAULT_ROUNDS)]
    rounds: usize,

    /// Number of price grid points on [0, 1], M >= 1.
    #[arg(short = 'm', long, default_value_t = DEFAULT_GRID_POINTS)]
    grid_points: usize,

    /// Terminal payoff rule at j = 0.
    #[arg(long, value_enum, default_value_t = TerminalReward::AllBudgets)]
    terminal_reward: TerminalReward,

    /// Write the solved table to this file.
    #[arg(long)]
    table_out: Option<PathBuf>,

    /// Write the policy tree as JSON to this file.
    #[arg(long)]
    policy_json: Option<PathBuf>,

    /// Print the policy tree to stdout.
    #[arg(long)]
    print_tree: bool,
}

fn print_tree(policy: &Policy) {
    let mut stack = vec![(policy, 0usize, "root")];
    while let Some((node, depth, label)) = stack.pop() {
        println!("{:indent$}{}: quote {:.4}", "", label, node.value, indent = depth * 2);
        if let Some(reject) = node.reject.as_deref() {
            stack.push((reject, depth + 1, "reject"));
        }
        if let Some(accept) = node.accept.as_deref() {
            stack.push((accept, depth + 1, "accept"));
        }
    }
}

fn run(args: Args) -> Result<(), PricingError> {
    init_base_path()?;
    init_rayon_threads();

    let config = SolverConfig::new(args.rounds, args.grid_points)
        .with_terminal_reward(args.terminal_reward);
    let sol = solve_with_config(&config)?;

    if let Some(path) = &args.table_out {
        save_table(path, &sol.table)?;
    }
    if let Some(path) = &args.policy_json {
        save_policy_json(path, &sol.policy)?;
    }
    if args.print_tree {
        print_tree(&sol.policy);
    }

    println!("{}", sol.expected_value);
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
