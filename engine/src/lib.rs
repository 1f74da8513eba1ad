// Copyright (c) 2024 Botho Foundation

//! Monte-Carlo engine for a pick-6 lottery with a funded jackpot pool.
//!
//! Every ticket sold inserts a fixed share of its price into the prize pools.
//! While the jackpot seed is still owed back to the funding pool, most of that
//! share services the debt; once the debt is cleared the whole share grows the
//! jackpot. When a round produces one or more six-match tickets the jackpot is
//! split evenly, the pool is reseeded and the seed is booked as new debt.
//!
//! ## Ledger rule
//!
//! ```text
//! total_insert    = ticket_price × pool_insert
//! if funding_pool < 0:
//!     repay_amount    = min(total_insert × return_pool, -funding_pool)
//!     jackpot_contrib = total_insert - repay_amount
//! else:
//!     repay_amount    = 0
//!     jackpot_contrib = total_insert
//! ```
//!
//! ## Components
//!
//! | Module     | Role                                                     |
//! |------------|----------------------------------------------------------|
//! | `numbers`  | 6-of-42 selections and uniform draws                     |
//! | `tier`     | Match count to prize tier, fixed prize table             |
//! | `ledger`   | Jackpot / funding pool state machine                     |
//! | `round`    | One round: draw, tickets, contributions, settlement      |
//! | `driver`   | Batched multi-round runs and their collected records     |
//! | `progress` | Round-boundary snapshots for asynchronous pollers        |
//!
//! The pool state has a single linear history: rounds and the tickets inside
//! a round are always applied in order. The only parallel work is ticket
//! number generation (feature `parallel`), which never touches the ledger.

pub mod config;
pub mod driver;
pub mod ledger;
pub mod numbers;
pub mod progress;
pub mod round;
pub mod tier;

mod error;

pub use config::{IntRange, Preset, SimulationConfig};
pub use driver::{simulate, BatchOutcome, DetailBuffer, RunTotals, Simulation, SimulationResult};
pub use error::{Result, SimulationError};
pub use ledger::{Contribution, LedgerParams, LedgerTotals, PoolLedger, PoolState, Settlement};
pub use numbers::{Numbers, MAX_NUMBER, PICK_COUNT};
pub use progress::{CancelToken, ProgressHandle, ProgressSnapshot};
pub use round::{CardId, JackpotRecord, RoundSimulator, RoundSink, RoundSummary, TicketRecord};
pub use tier::{PrizeTable, PrizeTier, TierBreakdown, TierStat};
