// Copyright (c) 2024 Botho Foundation
//
//! Whole-run scenarios for the simulation engine.
//!
//! Covers money conservation per round, rollover resets, determinism under a
//! fixed seed, batching equivalence, cancellation and configuration errors.

use std::{thread, time::Duration};

use jpl_engine::{
    simulate, CancelToken, IntRange, LedgerParams, PoolLedger, PoolState, PrizeTier,
    ProgressHandle, Settlement, Simulation, SimulationConfig, SimulationError,
};

// ============================================================================
// Helpers
// ============================================================================

fn small_config(seed: u64) -> SimulationConfig {
    SimulationConfig {
        num_rounds: 8,
        players_range: IntRange::new(80, 120),
        cards_per_player_range: IntRange::new(1, 3),
        detail_capacity: 100,
        batch_size: 3,
        seed: Some(seed),
        ..SimulationConfig::default()
    }
}

fn approx(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

// ============================================================================
// Ledger scenarios
// ============================================================================

#[test]
fn test_reference_contribution() {
    let mut ledger = PoolLedger::new(LedgerParams {
        ticket_price: 20.0,
        pool_insert: 0.43,
        return_pool: 0.9,
        initial_jackpot: 30_000_000.0,
    })
    .unwrap();

    let c = ledger.contribute().unwrap();
    assert!(approx(c.total_insert, 8.6, 1e-9));
    assert!(approx(c.repay_amount, 7.74, 1e-9));
    assert!(approx(c.jackpot_contrib, 0.86, 1e-9));
    assert!(approx(ledger.state().funding_pool, -29_999_992.26, 1e-6));
    assert!(approx(ledger.state().jackpot_pool, 30_000_000.86, 1e-6));
}

#[test]
fn test_multi_winner_split() {
    let params = LedgerParams {
        ticket_price: 20.0,
        pool_insert: 0.43,
        return_pool: 0.9,
        initial_jackpot: 30_000_000.0,
    };
    let state = PoolState {
        jackpot_pool: 45_678_901.23,
        funding_pool: -12_345.0,
    };
    let mut ledger = PoolLedger::with_state(params, state).unwrap();

    let Settlement::Rollover {
        paid,
        share,
        winners,
    } = ledger.settle_round(7).unwrap()
    else {
        panic!("expected a rollover");
    };
    assert_eq!(winners, 7);
    assert_eq!(paid, 45_678_901.23);
    assert!(approx(share * 7.0, paid, 1e-6));
    assert_eq!(ledger.state().jackpot_pool, 30_000_000.0);
    assert_eq!(ledger.state().funding_pool, -30_012_345.0);
}

// ============================================================================
// Round invariants over a run
// ============================================================================

#[test]
fn test_tier_totals_match_payout() {
    let result = simulate(&small_config(1)).unwrap();
    for round in &result.rounds {
        let sum: f64 = round.tiers.iter().map(|(_, stat)| stat.amount).sum();
        assert_eq!(sum, round.total_payout, "round {}", round.round);
    }
}

#[test]
fn test_money_is_conserved_each_round() {
    let config = small_config(2);
    let insert = config.ticket_price * config.pool_insert;
    let result = simulate(&config).unwrap();

    for round in &result.rounds {
        let start = round.jackpot_start + round.funding_start;
        let before = round.jackpot_before_payout + round.funding_before_payout;
        let end = round.jackpot_end + round.funding_end;
        let paid = round.tiers.amount(PrizeTier::Jackpot);

        assert!(
            approx(before - start, insert * round.total_cards as f64, 1e-3),
            "round {} inserted {} for {} cards",
            round.round,
            before - start,
            round.total_cards
        );
        assert!(approx(before - end, paid, 1e-3), "round {}", round.round);
    }
}

#[test]
fn test_pools_chain_between_rounds() {
    let result = simulate(&small_config(3)).unwrap();
    assert_eq!(result.rounds[0].jackpot_start, 30_000_000.0);
    assert_eq!(result.rounds[0].funding_start, -30_000_000.0);
    for pair in result.rounds.windows(2) {
        assert_eq!(pair[1].jackpot_start, pair[0].jackpot_end);
        assert_eq!(pair[1].funding_start, pair[0].funding_end);
    }
}

#[test]
fn test_carryover_and_rollover_rounds() {
    let config = small_config(4);
    let result = simulate(&config).unwrap();
    for round in &result.rounds {
        if round.had_jackpot() {
            assert_eq!(round.jackpot_end, config.initial_jackpot);
            assert_eq!(
                round.funding_end,
                round.funding_before_payout - config.initial_jackpot
            );
        } else {
            assert_eq!(round.jackpot_end, round.jackpot_before_payout);
            assert_eq!(round.funding_end, round.funding_before_payout);
        }
    }

    for record in &result.jackpots {
        let k = f64::from(record.winners_in_round);
        assert!(approx(record.prize_amount * k, record.jackpot_pool, 1e-6));
    }
}

#[test]
fn test_debt_is_repaid_without_overshoot() {
    let config = SimulationConfig {
        initial_jackpot: 1_000.0,
        ..small_config(5)
    };
    let result = simulate(&config).unwrap();

    for round in &result.rounds {
        assert!(round.funding_before_payout <= 0.0);
        assert!(round.funding_end <= 0.0);
    }
    // A few hundred tickets at 7.74 each clear a 1 000 seed.
    let last = result.rounds.last().unwrap();
    assert_eq!(last.funding_end, 0.0);
    assert!(approx(result.ledger.total_repaid, 1_000.0, 1e-6));
}

// ============================================================================
// Determinism and batching
// ============================================================================

#[test]
fn test_same_seed_same_run() {
    let a = simulate(&small_config(77)).unwrap();
    let b = simulate(&small_config(77)).unwrap();
    assert_eq!(a.rounds, b.rounds);
    assert_eq!(a.details, b.details);
    assert_eq!(a.jackpots, b.jackpots);

    let c = simulate(&small_config(78)).unwrap();
    assert_ne!(a.rounds, c.rounds);
}

#[test]
fn test_chunking_does_not_change_results() {
    let config = small_config(9);
    let whole = simulate(&config).unwrap();

    let mut sim = Simulation::new(config).unwrap();
    let mut batches = 0;
    while !sim.run_batch(1).unwrap().is_complete() {
        batches += 1;
    }
    let chunked = sim.finish().unwrap();

    assert_eq!(batches, 7);
    assert_eq!(whole, chunked);
}

#[test]
fn test_unseeded_run_records_its_seed() {
    let mut config = small_config(0);
    config.seed = None;
    config.num_rounds = 2;
    let first = simulate(&config).unwrap();

    let replay = simulate(&config.clone().with_seed(first.seed)).unwrap();
    assert_eq!(first.rounds, replay.rounds);
}

// ============================================================================
// Cancellation and errors
// ============================================================================

#[test]
fn test_cancel_before_start() {
    let cancel = CancelToken::new();
    cancel.cancel();
    let err = Simulation::new(small_config(10))
        .unwrap()
        .with_cancel(cancel)
        .run()
        .unwrap_err();
    assert_eq!(err, SimulationError::Cancelled { completed_rounds: 0 });
}

#[test]
fn test_cancel_from_another_thread() {
    let config = SimulationConfig {
        num_rounds: 1_000_000,
        players_range: IntRange::new(10, 20),
        cards_per_player_range: IntRange::new(1, 1),
        batch_size: 10,
        seed: Some(11),
        ..SimulationConfig::default()
    };
    let progress = ProgressHandle::new();
    let cancel = CancelToken::new();
    let sim = Simulation::new(config)
        .unwrap()
        .with_progress(progress.clone())
        .with_cancel(cancel.clone());

    let worker = thread::spawn(move || sim.run());

    while progress.latest().map_or(0, |s| s.completed_rounds) < 3 {
        thread::sleep(Duration::from_millis(1));
    }
    cancel.cancel();

    match worker.join().unwrap() {
        Err(SimulationError::Cancelled { completed_rounds }) => {
            assert!(completed_rounds >= 3);
            let snapshot = progress.latest().unwrap();
            assert_eq!(snapshot.completed_rounds, completed_rounds);
            assert_eq!(snapshot.latest.round, completed_rounds);
        }
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[test]
fn test_invalid_config_runs_nothing() {
    let config = SimulationConfig {
        pool_insert: 1.2,
        ..small_config(12)
    };
    let err = Simulation::new(config).err().unwrap();
    assert!(err.is_configuration());

    let config = SimulationConfig {
        players_range: IntRange::new(0, 10),
        ..small_config(12)
    };
    assert!(matches!(
        simulate(&config),
        Err(SimulationError::Configuration {
            field: "players_range",
            ..
        })
    ));
}
