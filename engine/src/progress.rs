//! Progress snapshots and cancellation.
//!
//! The driver publishes a snapshot after each completed round, when the
//! ledger has finished mutating. Readers only ever see settled state and
//! never contend with the ledger.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::round::RoundSummary;

/// Cumulative statistics as of the latest completed round.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProgressSnapshot {
    pub completed_rounds: u64,
    pub total_rounds: u64,
    pub completion_percentage: f64,
    pub total_players: u64,
    pub total_tickets: u64,
    pub total_bets: f64,
    pub total_payouts: f64,
    /// Jackpot-winning tickets so far.
    pub jackpot_hits: u64,
    /// Winning tickets per tier, jackpot first.
    pub tier_counts: [u64; 5],
    /// Running return-to-player ratio.
    pub rtp: f64,
    pub jackpot_pool: f64,
    pub funding_pool: f64,
    pub elapsed_ms: u64,
    pub latest: RoundSummary,
}

/// Shared slot holding the latest snapshot.
#[derive(Clone, Debug, Default)]
pub struct ProgressHandle {
    inner: Arc<RwLock<Option<ProgressSnapshot>>>,
}

impl ProgressHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest snapshot, or `None` before the first round completes.
    pub fn latest(&self) -> Option<ProgressSnapshot> {
        self.inner.read().clone()
    }

    pub fn publish(&self, snapshot: ProgressSnapshot) {
        *self.inner.write() = Some(snapshot);
    }

    /// Drop the stored snapshot.
    pub fn reset(&self) {
        *self.inner.write() = None;
    }
}

/// Request to stop a run at the next round boundary.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
