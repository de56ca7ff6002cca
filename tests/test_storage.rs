//! Table and policy persistence.

use std::io::Write;

use pricing_dp::storage::{load_policy_json, load_table, save_policy_json, save_table};
use pricing_dp::{solve_with_config, PricingError, SolverConfig, TerminalReward};

#[test]
fn table_file_preserves_arrays() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tables/n3_m17.bin");
    let config = SolverConfig::new(3, 17).with_terminal_reward(TerminalReward::ExhaustedBudgetOnly);
    let sol = solve_with_config(&config).unwrap();

    save_table(&path, &sol.table).unwrap();
    let loaded = load_table(&path).unwrap();

    assert_eq!(loaded.config(), config);
    assert_eq!(loaded.values(), sol.table.values());
    assert_eq!(loaded.best_prices(), sol.table.best_prices());
    assert_eq!(loaded.expected_value(), sol.expected_value);
    assert_eq!(pricing_dp::policy::build_policy(&loaded), sol.policy);
}

#[test]
fn truncated_file_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("t.bin");
    let sol = solve_with_config(&SolverConfig::new(2, 5)).unwrap();
    save_table(&path, &sol.table).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    std::fs::write(&path, &bytes[..bytes.len() - 8]).unwrap();
    assert!(matches!(load_table(&path), Err(PricingError::InvalidFormat(_))));
}

#[test]
fn wrong_magic_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("junk.bin");
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(&[0xABu8; 64]).unwrap();
    drop(f);
    assert!(matches!(load_table(&path), Err(PricingError::InvalidFormat(_))));
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        load_table(dir.path().join("absent.bin")),
        Err(PricingError::Io(_))
    ));
}

#[test]
fn policy_json_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("policy.json");
    let sol = solve_with_config(&SolverConfig::new(3, 9)).unwrap();
    save_policy_json(&path, &sol.policy).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert!(json["accept"]["reject"]["value"].is_number());
    assert!(json["accept"]["accept"]["accept"].get("accept").is_none());

    assert_eq!(load_policy_json(&path).unwrap(), sol.policy);
}
