//! Aggregate statistics over a finished run.

use std::collections::BTreeMap;

use jpl_engine::{PrizeTier, SimulationResult};
use serde::{Deserialize, Serialize};

/// Run-level totals and averages.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total_rounds: u64,
    pub total_tickets: u64,
    pub total_bet_amount: f64,
    pub total_payout: f64,
    pub overall_rtp: f64,
    /// Mean amount bet per round.
    pub avg_bet_amount: f64,
    /// Mean players per round.
    pub avg_players: f64,
}

/// Statistics for one prize tier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrizeStat {
    pub tier: PrizeTier,
    pub match_count: u8,
    pub total_winners: u64,
    pub total_prize_amount: f64,
    pub avg_winners_per_round: f64,
    /// Winning tickets of this tier per ticket sold.
    pub hit_probability: f64,
    /// Tier payout per amount bet.
    pub rtp_contribution: f64,
}

/// Jackpot hits over the run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct JackpotAnalysis {
    /// Jackpot-winning tickets.
    pub hits: u64,
    pub rounds_with_hits: u64,
    pub min_pool_paid: Option<f64>,
    pub mean_pool_paid: Option<f64>,
    pub max_pool_paid: Option<f64>,
    /// Number of rounds keyed by how many tickets shared the jackpot.
    pub winners_per_round: BTreeMap<u32, u64>,
}

/// Funding pool history over the run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FundingAnalysis {
    pub final_funding_pool: f64,
    pub final_jackpot_pool: f64,
    /// Most negative funding balance seen at a round boundary.
    pub deepest_debt: f64,
    pub rounds_ending_in_debt: u64,
    /// First round that ended with all seed capital repaid.
    pub first_debt_free_round: Option<u64>,
    pub total_repaid: f64,
    pub total_jackpot_contributed: f64,
}

/// Everything the reports print about a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    pub summary: SummaryStats,
    pub prize_stats: Vec<PrizeStat>,
    pub jackpot: JackpotAnalysis,
    pub funding: FundingAnalysis,
}

impl RunStatistics {
    pub fn from_result(result: &SimulationResult) -> Self {
        let rounds = &result.rounds;
        let n_rounds = rounds.len() as f64;
        let totals = &result.totals;

        let per_round = |value: f64| if rounds.is_empty() { 0.0 } else { value / n_rounds };
        let per_ticket = |value: f64| {
            if totals.tickets == 0 {
                0.0
            } else {
                value / totals.tickets as f64
            }
        };
        let per_bet = |value: f64| {
            if totals.total_bet > 0.0 {
                value / totals.total_bet
            } else {
                0.0
            }
        };

        let summary = SummaryStats {
            total_rounds: rounds.len() as u64,
            total_tickets: totals.tickets,
            total_bet_amount: totals.total_bet,
            total_payout: totals.total_payout,
            overall_rtp: totals.overall_rtp,
            avg_bet_amount: per_round(totals.total_bet),
            avg_players: per_round(totals.players as f64),
        };

        let prize_stats = PrizeTier::ALL
            .iter()
            .map(|&tier| {
                let (winners, amount) = rounds.iter().fold((0u64, 0.0f64), |(c, a), r| {
                    let stat = r.tiers.get(tier);
                    (c + stat.count, a + stat.amount)
                });
                PrizeStat {
                    tier,
                    match_count: tier.match_count(),
                    total_winners: winners,
                    total_prize_amount: amount,
                    avg_winners_per_round: per_round(winners as f64),
                    hit_probability: per_ticket(winners as f64),
                    rtp_contribution: per_bet(amount),
                }
            })
            .collect();

        Self {
            summary,
            prize_stats,
            jackpot: jackpot_analysis(result),
            funding: funding_analysis(result),
        }
    }

    /// Statistics of one tier.
    pub fn tier(&self, tier: PrizeTier) -> Option<&PrizeStat> {
        self.prize_stats.iter().find(|s| s.tier == tier)
    }

    /// Plain-text report, one section per table.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let s = &self.summary;

        out.push_str("Summary\n");
        out.push_str(&format!("  {:<22} {:>18}\n", "Rounds", s.total_rounds));
        out.push_str(&format!("  {:<22} {:>18}\n", "Tickets", s.total_tickets));
        out.push_str(&format!("  {:<22} {:>18.2}\n", "Total bet", s.total_bet_amount));
        out.push_str(&format!("  {:<22} {:>18.2}\n", "Total payout", s.total_payout));
        out.push_str(&format!("  {:<22} {:>17.4}%\n", "Overall RTP", s.overall_rtp * 100.0));
        out.push_str(&format!("  {:<22} {:>18.2}\n", "Avg bet per round", s.avg_bet_amount));
        out.push_str(&format!("  {:<22} {:>18.1}\n", "Avg players", s.avg_players));

        out.push_str("\nPrize tiers\n");
        out.push_str(&format!(
            "  {:<6} {:>7} {:>12} {:>18} {:>12} {:>10}\n",
            "Tier", "Matches", "Winners", "Amount", "Per round", "RTP"
        ));
        for p in &self.prize_stats {
            out.push_str(&format!(
                "  {:<6} {:>7} {:>12} {:>18.2} {:>12.3} {:>9.4}%\n",
                p.tier.label(),
                p.match_count,
                p.total_winners,
                p.total_prize_amount,
                p.avg_winners_per_round,
                p.rtp_contribution * 100.0
            ));
        }

        let j = &self.jackpot;
        out.push_str("\nJackpot\n");
        out.push_str(&format!("  {:<22} {:>18}\n", "Winning tickets", j.hits));
        out.push_str(&format!("  {:<22} {:>18}\n", "Rounds with hits", j.rounds_with_hits));
        if let (Some(min), Some(mean), Some(max)) = (j.min_pool_paid, j.mean_pool_paid, j.max_pool_paid)
        {
            out.push_str(&format!("  {:<22} {:>18.2}\n", "Min pool paid", min));
            out.push_str(&format!("  {:<22} {:>18.2}\n", "Mean pool paid", mean));
            out.push_str(&format!("  {:<22} {:>18.2}\n", "Max pool paid", max));
        }

        let f = &self.funding;
        out.push_str("\nFunding pool\n");
        out.push_str(&format!("  {:<22} {:>18.2}\n", "Final funding pool", f.final_funding_pool));
        out.push_str(&format!("  {:<22} {:>18.2}\n", "Final jackpot pool", f.final_jackpot_pool));
        out.push_str(&format!("  {:<22} {:>18.2}\n", "Deepest debt", f.deepest_debt));
        out.push_str(&format!("  {:<22} {:>18}\n", "Rounds ending in debt", f.rounds_ending_in_debt));
        match f.first_debt_free_round {
            Some(round) => out.push_str(&format!("  {:<22} {:>18}\n", "First debt-free round", round)),
            None => out.push_str(&format!("  {:<22} {:>18}\n", "First debt-free round", "never")),
        }
        out
    }
}

fn jackpot_analysis(result: &SimulationResult) -> JackpotAnalysis {
    let mut analysis = JackpotAnalysis {
        hits: result.totals.jackpot_hits,
        ..JackpotAnalysis::default()
    };

    let paid: Vec<f64> = result
        .rounds
        .iter()
        .filter(|r| r.had_jackpot())
        .map(|r| {
            *analysis.winners_per_round.entry(r.jackpot_winners).or_insert(0) += 1;
            r.tiers.amount(PrizeTier::Jackpot)
        })
        .collect();

    analysis.rounds_with_hits = paid.len() as u64;
    if !paid.is_empty() {
        analysis.min_pool_paid = paid.iter().copied().reduce(f64::min);
        analysis.max_pool_paid = paid.iter().copied().reduce(f64::max);
        analysis.mean_pool_paid = Some(paid.iter().sum::<f64>() / paid.len() as f64);
    }
    analysis
}

fn funding_analysis(result: &SimulationResult) -> FundingAnalysis {
    let mut analysis = FundingAnalysis {
        final_funding_pool: result.final_pools.funding_pool,
        final_jackpot_pool: result.final_pools.jackpot_pool,
        total_repaid: result.ledger.total_repaid,
        total_jackpot_contributed: result.ledger.total_jackpot_contributed,
        ..FundingAnalysis::default()
    };

    for round in &result.rounds {
        analysis.deepest_debt = analysis.deepest_debt.min(round.funding_start.min(round.funding_end));
        if round.funding_end < 0.0 {
            analysis.rounds_ending_in_debt += 1;
        } else if analysis.first_debt_free_round.is_none() {
            analysis.first_debt_free_round = Some(round.round);
        }
    }
    analysis
}

#[cfg(test)]
mod tests {
    use super::*;
    use jpl_engine::{simulate, IntRange, SimulationConfig};

    fn result() -> SimulationResult {
        simulate(&SimulationConfig {
            num_rounds: 6,
            players_range: IntRange::new(100, 150),
            cards_per_player_range: IntRange::new(1, 2),
            seed: Some(21),
            ..SimulationConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_summary_matches_totals() {
        let result = result();
        let stats = RunStatistics::from_result(&result);

        assert_eq!(stats.summary.total_rounds, 6);
        assert_eq!(stats.summary.total_bet_amount, result.totals.total_bet);
        assert_eq!(stats.summary.avg_bet_amount, result.totals.total_bet / 6.0);
        assert_eq!(stats.prize_stats.len(), 5);

        let winners: u64 = stats.prize_stats.iter().map(|p| p.total_winners).sum();
        let expected: u64 = result.rounds.iter().map(|r| r.tiers.total_count()).sum();
        assert_eq!(winners, expected);

        let rtp: f64 = stats.prize_stats.iter().map(|p| p.rtp_contribution).sum();
        assert!((rtp - stats.summary.overall_rtp).abs() < 1e-9);
    }

    #[test]
    fn test_funding_stays_in_debt_with_large_seed() {
        let stats = RunStatistics::from_result(&result());
        assert_eq!(stats.funding.rounds_ending_in_debt, 6);
        assert_eq!(stats.funding.first_debt_free_round, None);
        assert_eq!(stats.funding.deepest_debt, -30_000_000.0);
    }

    #[test]
    fn test_render_has_sections() {
        let text = RunStatistics::from_result(&result()).render();
        for section in ["Summary", "Prize tiers", "Jackpot", "Funding pool"] {
            assert!(text.contains(section), "missing {section}");
        }
        assert!(text.contains("5th"));
    }
}
