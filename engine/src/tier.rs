//! Prize tiers and the fixed prize table.
//!
//! | Matches | Tier    | Prize                         |
//! |---------|---------|-------------------------------|
//! | 6       | Jackpot | Pool share, known at round end |
//! | 5       | Second  | `PrizeTable::match5`          |
//! | 4       | Third   | `PrizeTable::match4`          |
//! | 3       | Fourth  | `PrizeTable::match3`          |
//! | 2       | Fifth   | `PrizeTable::match2`          |
//! | 0-1     | none    | -                             |

use std::fmt;

/// A prize bracket, identified by the number of matched numbers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum PrizeTier {
    Jackpot,
    Second,
    Third,
    Fourth,
    Fifth,
}

impl PrizeTier {
    /// All tiers, jackpot first.
    pub const ALL: [PrizeTier; 5] = [
        PrizeTier::Jackpot,
        PrizeTier::Second,
        PrizeTier::Third,
        PrizeTier::Fourth,
        PrizeTier::Fifth,
    ];

    /// Resolve the tier for a match count. Fewer than 2 matches win nothing.
    pub fn from_matches(matches: u8) -> Option<Self> {
        match matches {
            6 => Some(Self::Jackpot),
            5 => Some(Self::Second),
            4 => Some(Self::Third),
            3 => Some(Self::Fourth),
            2 => Some(Self::Fifth),
            _ => None,
        }
    }

    /// Number of matched numbers this tier requires.
    pub fn match_count(self) -> u8 {
        6 - self.index() as u8
    }

    /// Position in [`PrizeTier::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_jackpot(self) -> bool {
        self == Self::Jackpot
    }

    /// Ordinal label used in reports ("1st" .. "5th").
    pub fn label(self) -> &'static str {
        match self {
            Self::Jackpot => "1st",
            Self::Second => "2nd",
            Self::Third => "3rd",
            Self::Fourth => "4th",
            Self::Fifth => "5th",
        }
    }
}

impl fmt::Display for PrizeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Fixed prize amounts for the non-jackpot tiers.
///
/// A zero amount keeps the tier counted but pays nothing, which is how
/// four-tier variants of the game are expressed.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct PrizeTable {
    pub match5: f64,
    pub match4: f64,
    pub match3: f64,
    pub match2: f64,
}

impl Default for PrizeTable {
    fn default() -> Self {
        Self {
            match5: 50_000.0,
            match4: 1_500.0,
            match3: 60.0,
            match2: 20.0,
        }
    }
}

impl PrizeTable {
    /// Fixed amount for a tier; `None` for the jackpot.
    pub fn amount(&self, tier: PrizeTier) -> Option<f64> {
        match tier {
            PrizeTier::Jackpot => None,
            PrizeTier::Second => Some(self.match5),
            PrizeTier::Third => Some(self.match4),
            PrizeTier::Fourth => Some(self.match3),
            PrizeTier::Fifth => Some(self.match2),
        }
    }

    /// Resolve a match count to its tier and, for fixed tiers, its amount.
    pub fn resolve(&self, matches: u8) -> Option<(PrizeTier, Option<f64>)> {
        PrizeTier::from_matches(matches).map(|tier| (tier, self.amount(tier)))
    }

    pub(crate) fn entries(&self) -> [(&'static str, f64); 4] {
        [
            ("prize_table.match5", self.match5),
            ("prize_table.match4", self.match4),
            ("prize_table.match3", self.match3),
            ("prize_table.match2", self.match2),
        ]
    }
}

/// Win count and payout total for one tier.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TierStat {
    pub count: u64,
    pub amount: f64,
}

/// Per-tier win counts and payout totals.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TierBreakdown {
    tiers: [TierStat; 5],
}

impl TierBreakdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one winning ticket.
    pub fn add(&mut self, tier: PrizeTier, amount: f64) {
        let stat = &mut self.tiers[tier.index()];
        stat.count += 1;
        stat.amount += amount;
    }

    /// Record the jackpot tier in one step: `winners` tickets sharing `paid`.
    pub fn set_jackpot(&mut self, winners: u64, paid: f64) {
        self.tiers[PrizeTier::Jackpot.index()] = TierStat {
            count: winners,
            amount: paid,
        };
    }

    pub fn get(&self, tier: PrizeTier) -> TierStat {
        self.tiers[tier.index()]
    }

    pub fn count(&self, tier: PrizeTier) -> u64 {
        self.get(tier).count
    }

    pub fn amount(&self, tier: PrizeTier) -> f64 {
        self.get(tier).amount
    }

    /// Sum of all tier payouts.
    pub fn total_amount(&self) -> f64 {
        self.tiers.iter().map(|s| s.amount).sum()
    }

    /// Number of winning tickets over all tiers.
    pub fn total_count(&self) -> u64 {
        self.tiers.iter().map(|s| s.count).sum()
    }

    /// Accumulate another breakdown into this one.
    pub fn merge(&mut self, other: &TierBreakdown) {
        for (mine, theirs) in self.tiers.iter_mut().zip(other.tiers.iter()) {
            mine.count += theirs.count;
            mine.amount += theirs.amount;
        }
    }

    /// Iterate tiers with their stats, jackpot first.
    pub fn iter(&self) -> impl Iterator<Item = (PrizeTier, TierStat)> + '_ {
        PrizeTier::ALL.iter().map(move |&t| (t, self.get(t)))
    }
}
