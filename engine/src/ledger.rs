// Copyright (c) 2024 Botho Foundation

//! Jackpot and funding pool ledger.
//!
//! The ledger owns the only mutable money state of a run. Each ticket sold
//! calls [`PoolLedger::contribute`]; each round ends with exactly one call to
//! [`PoolLedger::settle_round`]. Both are applied in strict order, so the
//! repayment clamp sees the debt exactly as the previous ticket left it.
//!
//! # Invariants
//!
//! - Balances stay finite and the jackpot pool never goes negative.
//! - A repayment never exceeds the outstanding debt, so a funding pool that
//!   was negative before a contribution is at most zero after it.
//! - After a rollover the jackpot pool equals the seed exactly.
//!
//! A broken invariant is reported as
//! [`SimulationError::ArithmeticInvariantViolation`] and is never clamped.

use tracing::{error, info};

use crate::error::{Result, SimulationError};

/// The two running balances of a run.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolState {
    /// Money available to jackpot winners.
    pub jackpot_pool: f64,
    /// Signed balance of seed capital; negative while the seed is owed.
    pub funding_pool: f64,
}

impl PoolState {
    /// Initial state: the jackpot holds the seed and the funding pool owes it.
    pub fn seeded(initial_jackpot: f64) -> Self {
        Self {
            jackpot_pool: initial_jackpot,
            funding_pool: -initial_jackpot,
        }
    }

    /// Whether seed capital is still owed.
    pub fn in_debt(&self) -> bool {
        self.funding_pool < 0.0
    }

    /// Outstanding debt, zero once repaid.
    pub fn debt(&self) -> f64 {
        (-self.funding_pool).max(0.0)
    }

    /// Sum of both balances.
    pub fn net(&self) -> f64 {
        self.jackpot_pool + self.funding_pool
    }
}

/// Economic parameters of the ledger.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LedgerParams {
    pub ticket_price: f64,
    /// Share of each ticket price inserted into the pools.
    pub pool_insert: f64,
    /// Share of the inserted amount used to repay debt.
    pub return_pool: f64,
    /// Jackpot seed, reinjected as debt on every rollover.
    pub initial_jackpot: f64,
}

impl LedgerParams {
    /// Check the parameters before any money moves.
    pub fn validate(&self) -> Result<()> {
        if !self.ticket_price.is_finite() || self.ticket_price <= 0.0 {
            return Err(SimulationError::config(
                "ticket_price",
                format!("must be a positive amount, got {}", self.ticket_price),
            ));
        }
        if !self.initial_jackpot.is_finite() || self.initial_jackpot < 0.0 {
            return Err(SimulationError::config(
                "initial_jackpot",
                format!("must be a non-negative amount, got {}", self.initial_jackpot),
            ));
        }
        check_fraction("pool_insert", self.pool_insert)?;
        check_fraction("return_pool", self.return_pool)?;
        if self.pool_insert * self.return_pool > 1.0 {
            return Err(SimulationError::config(
                "return_pool",
                "pool_insert * return_pool must not exceed 1",
            ));
        }
        Ok(())
    }

    /// Amount each ticket inserts into the pools.
    pub fn total_insert(&self) -> f64 {
        self.ticket_price * self.pool_insert
    }
}

fn check_fraction(field: &'static str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(SimulationError::config(
            field,
            format!("must lie in [0, 1], got {value}"),
        ));
    }
    Ok(())
}

/// How one ticket's insert was split.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contribution {
    pub total_insert: f64,
    pub repay_amount: f64,
    pub jackpot_contrib: f64,
}

/// Outcome of closing a round.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Settlement {
    /// The jackpot was won and the pools were reseeded.
    Rollover {
        /// Jackpot pool paid out, split over all winners.
        paid: f64,
        /// Amount each winning ticket receives.
        share: f64,
        winners: u32,
    },
    /// Nobody hit the jackpot; balances carry over unchanged.
    Carryover,
}

impl Settlement {
    pub fn paid(&self) -> f64 {
        match self {
            Settlement::Rollover { paid, .. } => *paid,
            Settlement::Carryover => 0.0,
        }
    }

    pub fn is_rollover(&self) -> bool {
        matches!(self, Settlement::Rollover { .. })
    }
}

/// Cumulative money flow through the ledger.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LedgerTotals {
    pub total_inserted: f64,
    pub total_repaid: f64,
    pub total_jackpot_contributed: f64,
    pub total_jackpot_paid: f64,
    pub rollovers: u64,
}

/// Pool state plus the rules that mutate it.
#[derive(Clone, Debug)]
pub struct PoolLedger {
    params: LedgerParams,
    state: PoolState,
    totals: LedgerTotals,
    round: u64,
}

impl PoolLedger {
    /// Create a ledger seeded with `params.initial_jackpot`.
    pub fn new(params: LedgerParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            state: PoolState::seeded(params.initial_jackpot),
            totals: LedgerTotals::default(),
            round: 0,
        })
    }

    /// Create a ledger starting from an arbitrary state.
    pub fn with_state(params: LedgerParams, state: PoolState) -> Result<Self> {
        let mut ledger = Self::new(params)?;
        ledger.state = state;
        ledger.check("initial state")?;
        Ok(ledger)
    }

    pub fn params(&self) -> &LedgerParams {
        &self.params
    }

    pub fn state(&self) -> PoolState {
        self.state
    }

    pub fn totals(&self) -> LedgerTotals {
        self.totals
    }

    /// Round currently being applied, used to label invariant violations.
    pub fn round(&self) -> u64 {
        self.round
    }

    /// Mark the start of a round.
    pub fn begin_round(&mut self, round: u64) {
        self.round = round;
    }

    /// Apply one ticket's contribution.
    ///
    /// The split depends only on the debt outstanding right now, not on the
    /// ticket's own result.
    pub fn contribute(&mut self) -> Result<Contribution> {
        let total_insert = self.params.total_insert();
        let funding_before = self.state.funding_pool;

        let contribution = if funding_before < 0.0 {
            let max_repay = -funding_before;
            let repay_amount = (total_insert * self.params.return_pool).min(max_repay);
            Contribution {
                total_insert,
                repay_amount,
                jackpot_contrib: total_insert - repay_amount,
            }
        } else {
            Contribution {
                total_insert,
                repay_amount: 0.0,
                jackpot_contrib: total_insert,
            }
        };

        if contribution.repay_amount > 0.0 && contribution.repay_amount > -funding_before {
            return Err(self.violation(format!(
                "repayment {} exceeds outstanding debt {}",
                contribution.repay_amount, -funding_before
            )));
        }

        self.state.funding_pool += contribution.repay_amount;
        self.state.jackpot_pool += contribution.jackpot_contrib;

        if funding_before < 0.0 && self.state.funding_pool > 0.0 {
            return Err(self.violation(format!(
                "funding pool overshot zero: {} -> {}",
                funding_before, self.state.funding_pool
            )));
        }
        self.check("contribution")?;

        self.totals.total_inserted += contribution.total_insert;
        self.totals.total_repaid += contribution.repay_amount;
        self.totals.total_jackpot_contributed += contribution.jackpot_contrib;

        Ok(contribution)
    }

    /// Close the round. With at least one jackpot winner the whole pool is
    /// split evenly and the seed is booked again as debt.
    pub fn settle_round(&mut self, winners: u32) -> Result<Settlement> {
        if winners == 0 {
            return Ok(Settlement::Carryover);
        }

        let paid = self.state.jackpot_pool;
        let share = paid / f64::from(winners);

        self.state.jackpot_pool = self.params.initial_jackpot;
        self.state.funding_pool -= self.params.initial_jackpot;
        self.check("rollover")?;

        self.totals.total_jackpot_paid += paid;
        self.totals.rollovers += 1;

        info!(
            round = self.round,
            winners,
            paid,
            share,
            funding_pool = self.state.funding_pool,
            "Jackpot rollover"
        );

        Ok(Settlement::Rollover {
            paid,
            share,
            winners,
        })
    }

    fn check(&self, stage: &str) -> Result<()> {
        let PoolState {
            jackpot_pool,
            funding_pool,
        } = self.state;

        if !jackpot_pool.is_finite() || !funding_pool.is_finite() {
            return Err(self.violation(format!(
                "non-finite balance after {stage}: jackpot {jackpot_pool}, funding {funding_pool}"
            )));
        }
        if jackpot_pool < 0.0 {
            return Err(self.violation(format!(
                "jackpot pool negative after {stage}: {jackpot_pool}"
            )));
        }
        Ok(())
    }

    fn violation(&self, detail: String) -> SimulationError {
        error!(round = self.round, %detail, "Ledger invariant violated");
        SimulationError::ArithmeticInvariantViolation {
            round: self.round,
            detail,
        }
    }
}
