//! Multi-round runs.
//!
//! A [`Simulation`] owns the ledger, the RNG and every record of one run.
//! It can be advanced in batches so a caller may poll progress between
//! them; chunking never changes the outcome.

use std::collections::VecDeque;
use std::time::Instant;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::config::SimulationConfig;
use crate::error::{Result, SimulationError};
use crate::ledger::{LedgerTotals, PoolLedger, PoolState};
use crate::progress::{CancelToken, ProgressHandle, ProgressSnapshot};
use crate::round::{JackpotRecord, RoundSimulator, RoundSink, RoundSummary, TicketRecord};
use crate::tier::{PrizeTier, TierBreakdown};

/// Bounded FIFO of the most recent ticket records.
#[derive(Clone, Debug)]
pub struct DetailBuffer {
    records: VecDeque<TicketRecord>,
    capacity: usize,
}

impl DetailBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity.min(1 << 16)),
            capacity,
        }
    }

    /// Append a record, evicting the oldest one when full.
    pub fn push(&mut self, record: TicketRecord) {
        if self.capacity == 0 {
            return;
        }
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &TicketRecord> {
        self.records.iter()
    }

    pub fn into_vec(self) -> Vec<TicketRecord> {
        self.records.into()
    }
}

/// Ticket-level records collected over a run.
#[derive(Debug)]
struct RunRecords {
    details: DetailBuffer,
    jackpots: Vec<JackpotRecord>,
}

impl RoundSink for RunRecords {
    fn detail_capacity(&self) -> usize {
        self.details.capacity()
    }

    fn record_ticket(&mut self, record: TicketRecord) {
        self.details.push(record);
    }

    fn record_jackpot(&mut self, record: JackpotRecord) {
        self.jackpots.push(record);
    }
}

/// Aggregates over a whole run.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunTotals {
    pub rounds: u64,
    pub players: u64,
    pub tickets: u64,
    pub total_bet: f64,
    pub total_payout: f64,
    pub overall_rtp: f64,
    /// Jackpot-winning tickets.
    pub jackpot_hits: u64,
    /// Rounds with at least one jackpot winner.
    pub jackpot_rounds: u64,
}

impl RunTotals {
    fn add_round(&mut self, summary: &RoundSummary) {
        self.rounds += 1;
        self.players += u64::from(summary.num_players);
        self.tickets += summary.total_cards;
        self.total_bet += summary.total_bet_amount;
        self.total_payout += summary.total_payout;
        self.jackpot_hits += u64::from(summary.jackpot_winners);
        if summary.had_jackpot() {
            self.jackpot_rounds += 1;
        }
        self.overall_rtp = if self.total_bet > 0.0 {
            self.total_payout / self.total_bet
        } else {
            0.0
        };
    }
}

/// Complete output of a run.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationResult {
    /// Seed that reproduces this run.
    pub seed: u64,
    pub config: SimulationConfig,
    pub rounds: Vec<RoundSummary>,
    /// The most recent ticket records, oldest first.
    pub details: Vec<TicketRecord>,
    pub jackpots: Vec<JackpotRecord>,
    pub totals: RunTotals,
    pub final_pools: PoolState,
    pub ledger: LedgerTotals,
}

/// Progress of a run after a batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Rounds executed by this batch.
    pub rounds_run: u64,
    pub completed_rounds: u64,
    pub total_rounds: u64,
}

impl BatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.completed_rounds >= self.total_rounds
    }

    pub fn remaining(&self) -> u64 {
        self.total_rounds - self.completed_rounds
    }
}

/// A run in progress.
pub struct Simulation {
    config: SimulationConfig,
    seed: u64,
    rng: ChaCha8Rng,
    ledger: PoolLedger,
    simulator: RoundSimulator,
    rounds: Vec<RoundSummary>,
    records: RunRecords,
    totals: RunTotals,
    tiers: TierBreakdown,
    progress: ProgressHandle,
    cancel: CancelToken,
    started: Option<Instant>,
    poisoned: bool,
}

impl Simulation {
    /// Validate `config` and prepare a run. No round executes yet.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;

        let seed = config.seed.unwrap_or_else(rand::random);
        let ledger = PoolLedger::new(config.ledger_params())?;
        let simulator = RoundSimulator::new(&config);

        Ok(Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            ledger,
            simulator,
            rounds: Vec::with_capacity(config.num_rounds.min(1 << 20) as usize),
            records: RunRecords {
                details: DetailBuffer::new(config.detail_capacity),
                jackpots: Vec::new(),
            },
            totals: RunTotals::default(),
            tiers: TierBreakdown::new(),
            progress: ProgressHandle::new(),
            cancel: CancelToken::new(),
            started: None,
            poisoned: false,
            config,
        })
    }

    /// Publish snapshots into an existing handle.
    pub fn with_progress(mut self, progress: ProgressHandle) -> Self {
        self.progress = progress;
        self
    }

    /// Observe an existing cancellation token.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn completed_rounds(&self) -> u64 {
        self.rounds.len() as u64
    }

    pub fn is_complete(&self) -> bool {
        self.completed_rounds() >= self.config.num_rounds
    }

    pub fn progress(&self) -> ProgressHandle {
        self.progress.clone()
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn pools(&self) -> PoolState {
        self.ledger.state()
    }

    /// Run up to `max_rounds` further rounds.
    pub fn run_batch(&mut self, max_rounds: u64) -> Result<BatchOutcome> {
        if self.poisoned {
            return Err(SimulationError::Poisoned);
        }

        let started = match self.started {
            Some(started) => started,
            None => {
                info!(
                    seed = self.seed,
                    rounds = self.config.num_rounds,
                    "Starting simulation"
                );
                let now = Instant::now();
                self.started = Some(now);
                now
            }
        };

        let mut rounds_run = 0;
        while rounds_run < max_rounds && !self.is_complete() {
            if self.cancel.is_cancelled() {
                self.poisoned = true;
                info!(completed = self.completed_rounds(), "Simulation cancelled");
                return Err(SimulationError::Cancelled {
                    completed_rounds: self.completed_rounds(),
                });
            }

            let round_no = self.completed_rounds() + 1;
            let summary = match self.simulator.run_round(
                round_no,
                &mut self.ledger,
                &mut self.rng,
                &mut self.records,
            ) {
                Ok(summary) => summary,
                Err(err) => {
                    self.poisoned = true;
                    return Err(err);
                }
            };

            self.totals.add_round(&summary);
            self.tiers.merge(&summary.tiers);
            self.rounds.push(summary);
            self.publish(started);
            rounds_run += 1;
        }

        Ok(BatchOutcome {
            rounds_run,
            completed_rounds: self.completed_rounds(),
            total_rounds: self.config.num_rounds,
        })
    }

    /// Run every remaining round in batches of `config.batch_size`.
    pub fn run(mut self) -> Result<SimulationResult> {
        let batch_size = self.config.batch_size;
        while !self.run_batch(batch_size)?.is_complete() {}
        self.finish()
    }

    /// Collect the result of a completed run.
    pub fn finish(self) -> Result<SimulationResult> {
        if self.poisoned {
            return Err(SimulationError::Poisoned);
        }
        if !self.is_complete() {
            return Err(SimulationError::Incomplete {
                completed: self.completed_rounds(),
                requested: self.config.num_rounds,
            });
        }

        info!(
            seed = self.seed,
            rounds = self.totals.rounds,
            tickets = self.totals.tickets,
            rtp = self.totals.overall_rtp,
            jackpot_hits = self.totals.jackpot_hits,
            "Simulation finished"
        );

        Ok(SimulationResult {
            seed: self.seed,
            final_pools: self.ledger.state(),
            ledger: self.ledger.totals(),
            rounds: self.rounds,
            details: self.records.details.into_vec(),
            jackpots: self.records.jackpots,
            totals: self.totals,
            config: self.config,
        })
    }

    fn publish(&self, started: Instant) {
        let Some(latest) = self.rounds.last() else {
            return;
        };
        let pools = self.ledger.state();
        let completed = self.completed_rounds();

        let mut tier_counts = [0u64; 5];
        for tier in PrizeTier::ALL {
            tier_counts[tier.index()] = self.tiers.count(tier);
        }

        self.progress.publish(ProgressSnapshot {
            completed_rounds: completed,
            total_rounds: self.config.num_rounds,
            completion_percentage: completed as f64 * 100.0 / self.config.num_rounds as f64,
            total_players: self.totals.players,
            total_tickets: self.totals.tickets,
            total_bets: self.totals.total_bet,
            total_payouts: self.totals.total_payout,
            jackpot_hits: self.totals.jackpot_hits,
            tier_counts,
            rtp: self.totals.overall_rtp,
            jackpot_pool: pools.jackpot_pool,
            funding_pool: pools.funding_pool,
            elapsed_ms: started.elapsed().as_millis() as u64,
            latest: latest.clone(),
        });
    }
}

/// Run `config` to completion.
pub fn simulate(config: &SimulationConfig) -> Result<SimulationResult> {
    Simulation::new(config.clone())?.run()
}
