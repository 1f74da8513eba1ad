//! Run configuration, validation and presets.

use std::fmt;
use std::str::FromStr;

use rand::Rng;

use crate::error::{Result, SimulationError};
use crate::ledger::LedgerParams;
use crate::tier::PrizeTable;

/// Inclusive integer range, serialised as `[min, max]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "(u32, u32)", into = "(u32, u32)")
)]
pub struct IntRange {
    pub min: u32,
    pub max: u32,
}

impl IntRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Uniform sample from `min..=max`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        rng.gen_range(self.min..=self.max)
    }

    pub fn contains(&self, value: u32) -> bool {
        (self.min..=self.max).contains(&value)
    }

    pub fn midpoint(&self) -> f64 {
        (f64::from(self.min) + f64::from(self.max)) / 2.0
    }

    fn validate(&self, field: &'static str) -> Result<()> {
        if self.min == 0 {
            return Err(SimulationError::config(field, "minimum must be positive"));
        }
        if self.min > self.max {
            return Err(SimulationError::config(
                field,
                format!("minimum {} exceeds maximum {}", self.min, self.max),
            ));
        }
        Ok(())
    }
}

impl From<(u32, u32)> for IntRange {
    fn from((min, max): (u32, u32)) -> Self {
        Self { min, max }
    }
}

impl From<IntRange> for (u32, u32) {
    fn from(range: IntRange) -> Self {
        (range.min, range.max)
    }
}

impl fmt::Display for IntRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

/// Parameters of one simulation run.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct SimulationConfig {
    /// Number of rounds to simulate.
    pub num_rounds: u64,

    /// Players per round, drawn uniformly each round.
    pub players_range: IntRange,

    /// Tickets per player, drawn uniformly per player.
    pub cards_per_player_range: IntRange,

    pub ticket_price: f64,

    /// Jackpot seed; also the debt booked on every rollover.
    pub initial_jackpot: f64,

    /// Share of the ticket price inserted into the pools.
    pub pool_insert: f64,

    /// Share of the insert that repays outstanding debt.
    pub return_pool: f64,

    /// Fixed amounts for tiers 2 to 5.
    pub prize_table: PrizeTable,

    /// How many of the most recent ticket records to keep.
    pub detail_capacity: usize,

    /// Rounds per batch when running to completion.
    pub batch_size: u64,

    /// RNG seed. A fresh one is drawn when absent.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_rounds: 100,
            players_range: IntRange::new(490_000, 510_000),
            cards_per_player_range: IntRange::new(9, 11),
            ticket_price: 20.0,
            initial_jackpot: 30_000_000.0,
            pool_insert: 0.43,
            return_pool: 0.9,
            prize_table: PrizeTable::default(),
            detail_capacity: 10_000,
            batch_size: 1_000,
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Reject any configuration that would make a run meaningless.
    ///
    /// Called before any round executes.
    pub fn validate(&self) -> Result<()> {
        if self.num_rounds == 0 {
            return Err(SimulationError::config("num_rounds", "must be positive"));
        }
        self.players_range.validate("players_range")?;
        self.cards_per_player_range
            .validate("cards_per_player_range")?;
        self.ledger_params().validate()?;

        for (field, amount) in self.prize_table.entries() {
            if !amount.is_finite() || amount < 0.0 {
                return Err(SimulationError::config(
                    field,
                    format!("must be a non-negative amount, got {amount}"),
                ));
            }
        }

        if self.batch_size == 0 {
            return Err(SimulationError::config("batch_size", "must be positive"));
        }
        Ok(())
    }

    /// The subset of parameters the pool ledger needs.
    pub fn ledger_params(&self) -> LedgerParams {
        LedgerParams {
            ticket_price: self.ticket_price,
            pool_insert: self.pool_insert,
            return_pool: self.return_pool,
            initial_jackpot: self.initial_jackpot,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_rounds(mut self, num_rounds: u64) -> Self {
        self.num_rounds = num_rounds;
        self
    }
}

/// Named parameter sets for the game variants.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum Preset {
    /// Funding pool game with the full five-tier table.
    #[default]
    Standard,
    /// Fixed-table game without debt service.
    LegacyFixed,
    /// Small, fast run.
    Demo,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Standard, Preset::LegacyFixed, Preset::Demo];

    pub fn name(self) -> &'static str {
        match self {
            Preset::Standard => "standard",
            Preset::LegacyFixed => "legacy-fixed",
            Preset::Demo => "demo",
        }
    }

    pub fn config(self) -> SimulationConfig {
        match self {
            Preset::Standard => SimulationConfig::default(),
            Preset::LegacyFixed => SimulationConfig {
                initial_jackpot: 10_000_000.0,
                pool_insert: 0.5,
                return_pool: 0.0,
                prize_table: PrizeTable {
                    match5: 3_000.0,
                    match4: 200.0,
                    match3: 50.0,
                    match2: 5.0,
                },
                ..SimulationConfig::default()
            },
            Preset::Demo => SimulationConfig {
                num_rounds: 50,
                players_range: IntRange::new(900, 1_100),
                cards_per_player_range: IntRange::new(1, 3),
                ..SimulationConfig::default()
            },
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self> {
        Preset::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| {
                SimulationError::config(
                    "preset",
                    format!("unknown preset '{s}' (expected standard, legacy-fixed or demo)"),
                )
            })
    }
}
