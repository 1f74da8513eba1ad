//! Chart series for plotting front ends.
//!
//! Only the data and labels are produced; rendering is left to the consumer.

use jpl_engine::{PrizeTier, RoundSummary, SimulationResult};
use serde::{Deserialize, Serialize};

use crate::odds::TierComparison;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
}

/// X values of a series: round numbers or category labels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Axis {
    Rounds(Vec<u64>),
    Categories(Vec<String>),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub x: Axis,
    pub y: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub id: String,
    pub title: String,
    pub kind: ChartKind,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<Series>,
}

impl ChartSpec {
    fn line(id: &str, title: &str, y_label: &str, series: Vec<Series>) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            kind: ChartKind::Line,
            x_label: "Round".to_string(),
            y_label: y_label.to_string(),
            series,
        }
    }

    fn bar(id: &str, title: &str, y_label: &str, series: Vec<Series>) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            kind: ChartKind::Bar,
            x_label: "Tier".to_string(),
            y_label: y_label.to_string(),
            series,
        }
    }
}

fn per_round(name: &str, rounds: &[RoundSummary], f: impl Fn(&RoundSummary) -> f64) -> Series {
    Series {
        name: name.to_string(),
        x: Axis::Rounds(rounds.iter().map(|r| r.round).collect()),
        y: rounds.iter().map(f).collect(),
    }
}

fn per_tier(name: &str, values: Vec<f64>) -> Series {
    Series {
        name: name.to_string(),
        x: Axis::Categories(PrizeTier::ALL.iter().map(|t| t.label().to_string()).collect()),
        y: values,
    }
}

/// All charts for a run. Tier bars are included when a comparison is given.
pub fn build_charts(result: &SimulationResult, comparison: Option<&TierComparison>) -> Vec<ChartSpec> {
    let rounds = &result.rounds;
    let mut charts = vec![
        ChartSpec::line(
            "money_comparison",
            "Bets vs payouts",
            "Amount",
            vec![
                per_round("Bets", rounds, |r| r.total_bet_amount),
                per_round("Payouts", rounds, |r| r.total_payout),
            ],
        ),
        ChartSpec::line(
            "jackpot_trend",
            "Jackpot pool",
            "Amount",
            vec![per_round("Jackpot before payout", rounds, |r| {
                r.jackpot_before_payout
            })],
        ),
        ChartSpec::line(
            "funding_trend",
            "Funding pool",
            "Amount",
            vec![per_round("Funding pool", rounds, |r| r.funding_end)],
        ),
        ChartSpec::line(
            "players_trend",
            "Players per round",
            "Players",
            vec![per_round("Players", rounds, |r| f64::from(r.num_players))],
        ),
        ChartSpec::line(
            "rtp_trend",
            "Return to player",
            "RTP",
            vec![per_round("RTP", rounds, |r| r.rtp)],
        ),
    ];

    if let Some(cmp) = comparison {
        charts.push(ChartSpec::bar(
            "tier_probability",
            "Prize tier probability",
            "Probability",
            vec![
                per_tier("Simulated", cmp.rows.iter().map(|r| r.simulated_probability).collect()),
                per_tier("Theoretical", cmp.rows.iter().map(|r| r.theoretical_probability).collect()),
            ],
        ));
        charts.push(ChartSpec::bar(
            "tier_rtp",
            "Prize tier RTP",
            "RTP",
            vec![
                per_tier("Simulated", cmp.rows.iter().map(|r| r.simulated_rtp).collect()),
                per_tier("Theoretical", cmp.rows.iter().map(|r| r.theoretical_rtp).collect()),
            ],
        ));
    }
    charts
}
