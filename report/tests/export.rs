//! Export and comparison tests over a small seeded run.

use std::fs;

use jpl_engine::{simulate, IntRange, PrizeTier, SimulationConfig, SimulationResult};
use jpl_report::{details_csv, summary_csv, write_run, RunStatistics, TierComparison};
use tempfile::TempDir;

fn config() -> SimulationConfig {
    SimulationConfig {
        num_rounds: 4,
        players_range: IntRange::new(60, 80),
        cards_per_player_range: IntRange::new(1, 2),
        detail_capacity: 25,
        seed: Some(2024),
        ..SimulationConfig::default()
    }
}

#[test]
fn test_summary_csv_layout() {
    let result = simulate(&config()).unwrap();
    let csv = summary_csv(&result.rounds);
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(lines.len(), 5);
    assert!(lines[0].starts_with("round,game_result,num_players"));
    assert!(lines[0].contains("1st_count,1st_amount"));
    assert!(lines[0].ends_with("5th_amount,rtp"));

    let first = &result.rounds[0];
    assert!(lines[1].starts_with(&format!("1,\"{}\",{}", first.winning_numbers, first.num_players)));
}

#[test]
fn test_details_csv_uses_card_ids() {
    let result = simulate(&config()).unwrap();
    let csv = details_csv(&result.details);
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(lines.len(), 26);
    let last = result.details.last().unwrap();
    assert!(lines[25].starts_with(&format!("4,{},P{:04}_C", last.player_id, last.player_id)));
}

#[test]
fn test_write_run_creates_files() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("run");
    let result = simulate(&config()).unwrap();

    let files = write_run(&out, &result).unwrap();
    for path in [&files.summary, &files.details, &files.jackpots, &files.result] {
        assert!(path.exists(), "{} missing", path.display());
    }

    let jackpots = fs::read_to_string(&files.jackpots).unwrap();
    assert_eq!(jackpots.lines().count(), 1 + result.jackpots.len());

    let json = fs::read_to_string(&files.result).unwrap();
    let back: SimulationResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back.seed, 2024);
    assert_eq!(back.rounds.len(), 4);
    assert_eq!(back.config.players_range, IntRange::new(60, 80));
    assert_eq!(back.details.len(), result.details.len());
}

#[test]
fn test_comparison_rows() {
    let config = config();
    let result = simulate(&config).unwrap();
    let stats = RunStatistics::from_result(&result);
    let cmp = TierComparison::new(&stats, &config);

    assert_eq!(cmp.rows.len(), 5);
    assert_eq!(cmp.rows[0].tier, PrizeTier::Jackpot);
    assert_eq!(cmp.rows[0].theoretical_rtp, 0.43);

    // 5th tier: C(6,2)C(36,4)/C(42,6) * 20 / 20
    let fifth = &cmp.rows[4];
    assert!((fifth.theoretical_rtp - 0.168_435_197).abs() < 1e-6);

    let table = cmp.rtp_table();
    assert!(table.lines().last().unwrap().contains("total"));
    assert_eq!(cmp.probability_table().lines().count(), 9);
}
