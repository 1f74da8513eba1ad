//! Trends over a sequence of progress snapshots.

use jpl_engine::ProgressSnapshot;
use serde::{Deserialize, Serialize};

/// One tracked quantity over the snapshots.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendSeries {
    /// Completed rounds at each point.
    pub rounds: Vec<u64>,
    pub values: Vec<f64>,
    pub average: Option<f64>,
    pub peak: Option<f64>,
}

impl TrendSeries {
    fn push(&mut self, round: u64, value: f64) {
        self.rounds.push(round);
        self.values.push(value);
    }

    fn finish(&mut self) {
        if self.values.is_empty() {
            return;
        }
        self.average = Some(self.values.iter().sum::<f64>() / self.values.len() as f64);
        self.peak = self.values.iter().copied().reduce(f64::max);
    }
}

/// Running averages of a run as it progressed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysis {
    pub rtp: TrendSeries,
    pub players_per_round: TrendSeries,
    pub bets_per_round: TrendSeries,
    pub payouts_per_round: TrendSeries,
    /// Jackpot-winning tickets per completed round.
    pub jackpot_frequency: TrendSeries,
    /// Wall time between the first and last snapshot.
    pub total_duration_ms: u64,
}

impl TrendAnalysis {
    /// Snapshots taken before any round completed are skipped.
    pub fn from_snapshots(snapshots: &[ProgressSnapshot]) -> Self {
        let mut analysis = Self::default();

        for s in snapshots.iter().filter(|s| s.completed_rounds > 0) {
            let n = s.completed_rounds as f64;
            let round = s.completed_rounds;
            analysis.rtp.push(round, s.rtp);
            analysis.players_per_round.push(round, s.total_players as f64 / n);
            analysis.bets_per_round.push(round, s.total_bets / n);
            analysis.payouts_per_round.push(round, s.total_payouts / n);
            analysis.jackpot_frequency.push(round, s.jackpot_hits as f64 / n);
        }

        for series in analysis.series_mut() {
            series.finish();
        }

        if let (Some(first), Some(last)) = (snapshots.first(), snapshots.last()) {
            analysis.total_duration_ms = last.elapsed_ms.saturating_sub(first.elapsed_ms);
        }
        analysis
    }

    /// Named series, for tabulation.
    pub fn series(&self) -> [(&'static str, &TrendSeries); 5] {
        [
            ("rtp", &self.rtp),
            ("players_per_round", &self.players_per_round),
            ("bets_per_round", &self.bets_per_round),
            ("payouts_per_round", &self.payouts_per_round),
            ("jackpot_frequency", &self.jackpot_frequency),
        ]
    }

    fn series_mut(&mut self) -> [&mut TrendSeries; 5] {
        [
            &mut self.rtp,
            &mut self.players_per_round,
            &mut self.bets_per_round,
            &mut self.payouts_per_round,
            &mut self.jackpot_frequency,
        ]
    }
}
