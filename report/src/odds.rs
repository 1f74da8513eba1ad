//! Theoretical odds and the simulated-versus-theoretical comparison.
//!
//! Match counts of a ticket against a draw follow the hypergeometric
//! distribution with population 42, 6 successes and 6 draws.

use jpl_engine::{PrizeTier, SimulationConfig, MAX_NUMBER, PICK_COUNT};
use serde::{Deserialize, Serialize};
use statrs::distribution::{Discrete, Hypergeometric};

use crate::stats::RunStatistics;

/// Probability that a ticket shares exactly `matches` numbers with the draw.
pub fn match_probability(matches: u8) -> f64 {
    Hypergeometric::new(
        u64::from(MAX_NUMBER),
        PICK_COUNT as u64,
        PICK_COUNT as u64,
    )
    .map(|dist| dist.pmf(u64::from(matches)))
    .unwrap_or(0.0)
}

/// Simulated and theoretical figures for one tier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TierComparisonRow {
    pub tier: PrizeTier,
    pub simulated_probability: f64,
    pub theoretical_probability: f64,
    pub simulated_rtp: f64,
    pub theoretical_rtp: f64,
}

/// Per-tier comparison of a run against the closed-form odds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TierComparison {
    pub rows: Vec<TierComparisonRow>,
}

impl TierComparison {
    /// The theoretical jackpot RTP is `pool_insert`, the long-run share of
    /// each ticket paid out through the jackpot.
    pub fn new(stats: &RunStatistics, config: &SimulationConfig) -> Self {
        let rows = PrizeTier::ALL
            .iter()
            .map(|&tier| {
                let theoretical_probability = match_probability(tier.match_count());
                let theoretical_rtp = match config.prize_table.amount(tier) {
                    Some(amount) => theoretical_probability * amount / config.ticket_price,
                    None => config.pool_insert,
                };
                let (simulated_probability, simulated_rtp) = stats
                    .tier(tier)
                    .map(|s| (s.hit_probability, s.rtp_contribution))
                    .unwrap_or_default();

                TierComparisonRow {
                    tier,
                    simulated_probability,
                    theoretical_probability,
                    simulated_rtp,
                    theoretical_rtp,
                }
            })
            .collect();

        Self { rows }
    }

    pub fn total_theoretical_rtp(&self) -> f64 {
        self.rows.iter().map(|r| r.theoretical_rtp).sum()
    }

    pub fn total_simulated_rtp(&self) -> f64 {
        self.rows.iter().map(|r| r.simulated_rtp).sum()
    }

    /// GitHub-markdown table of hit probabilities, with a total row.
    pub fn probability_table(&self) -> String {
        let mut rows: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|r| {
                vec![
                    r.tier.label().to_string(),
                    percent(r.simulated_probability, 8),
                    percent(r.theoretical_probability, 8),
                ]
            })
            .collect();
        rows.push(vec![
            "total".to_string(),
            percent(self.rows.iter().map(|r| r.simulated_probability).sum(), 8),
            percent(self.rows.iter().map(|r| r.theoretical_probability).sum(), 8),
        ]);
        markdown_table(&["Tier", "Simulated Probability", "Theoretical Probability"], &rows)
    }

    /// GitHub-markdown table of per-tier RTP, with a total row.
    pub fn rtp_table(&self) -> String {
        let mut rows: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|r| {
                vec![
                    r.tier.label().to_string(),
                    percent(r.simulated_rtp, 4),
                    percent(r.theoretical_rtp, 4),
                ]
            })
            .collect();
        rows.push(vec![
            "total".to_string(),
            percent(self.total_simulated_rtp(), 4),
            percent(self.total_theoretical_rtp(), 4),
        ]);
        markdown_table(&["Tier", "Simulated RTP", "Theoretical RTP"], &rows)
    }
}

fn percent(value: f64, decimals: usize) -> String {
    format!("{:.*}%", decimals, value * 100.0)
}

/// First column centred, the others right-aligned. The last row is set off
/// by a separator line.
fn markdown_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            rows.iter()
                .map(|r| r[i].len())
                .chain(std::iter::once(h.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |cells: Vec<String>| format!("| {} |\n", cells.join(" | "));
    let sep = line(widths.iter().map(|&w| "-".repeat(w)).collect());
    let row = |r: &Vec<String>| {
        line(
            r.iter()
                .enumerate()
                .map(|(i, c)| {
                    if i == 0 {
                        format!("{:^w$}", c, w = widths[i])
                    } else {
                        format!("{:>w$}", c, w = widths[i])
                    }
                })
                .collect(),
        )
    };

    let mut out = line(
        headers
            .iter()
            .enumerate()
            .map(|(i, h)| format!("{:^w$}", h, w = widths[i]))
            .collect(),
    );
    out.push_str(&sep);
    if let Some((total, body)) = rows.split_last() {
        for r in body {
            out.push_str(&row(r));
        }
        out.push_str(&sep);
        out.push_str(&row(total));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_probabilities() {
        // C(42,6) = 5 245 786
        assert!((match_probability(6) - 1.0 / 5_245_786.0).abs() < 1e-15);
        assert!((match_probability(5) - 216.0 / 5_245_786.0).abs() < 1e-12);
        assert!((match_probability(2) - 0.168_435_197_3).abs() < 1e-9);

        let total: f64 = (0..=6).map(match_probability).sum();
        assert!((total - 1.0).abs() < 1e-10);
        assert_eq!(match_probability(7), 0.0);
    }

    #[test]
    fn test_table_layout() {
        let rows = vec![
            vec!["1st".to_string(), "1.0%".to_string()],
            vec!["total".to_string(), "1.0%".to_string()],
        ];
        let table = markdown_table(&["Tier", "P"], &rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "| Tier  |  P   |");
        assert_eq!(lines[1], "| ----- | ---- |");
        assert_eq!(lines[2], "|  1st  | 1.0% |");
        assert_eq!(lines[3], lines[1]);
        assert_eq!(lines[4], "| total | 1.0% |");
    }
}
