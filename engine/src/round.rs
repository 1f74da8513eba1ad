// Copyright (c) 2024 Botho Foundation

//! Execution of a single round.
//!
//! A round runs in two phases:
//!
//! 1. **Generation**: the winning numbers are drawn and every player's tickets
//!    are generated. Each player draws from its own ChaCha stream keyed by a
//!    per-round seed, so this phase may run in parallel (feature `parallel`)
//!    and still produce the same tickets.
//! 2. **Settlement**: tickets are applied to the ledger strictly in player
//!    and card order, then the round is closed with one rollover check.

use std::fmt;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::config::{IntRange, SimulationConfig};
use crate::error::Result;
use crate::ledger::{PoolLedger, Settlement};
use crate::numbers::Numbers;
use crate::tier::{PrizeTable, PrizeTier, TierBreakdown};

/// Ticket identifier, unique within a round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CardId {
    pub player: u32,
    pub card: u32,
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{:04}_C{:04}", self.player, self.card)
    }
}

/// One ticket and its outcome.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TicketRecord {
    pub round: u64,
    pub player_id: u32,
    pub card_id: CardId,
    pub numbers: Numbers,
    pub winning_numbers: Numbers,
    pub bet_amount: f64,
    pub matches: u8,
    pub prize_tier: Option<PrizeTier>,
    /// Zero for jackpot tickets until the round is settled.
    pub prize_amount: f64,
}

/// A jackpot-winning ticket with its share of the pool.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JackpotRecord {
    pub round: u64,
    pub player_id: u32,
    pub card_id: CardId,
    pub numbers: Numbers,
    pub winning_numbers: Numbers,
    pub bet_amount: f64,
    pub prize_amount: f64,
    /// Jackpot tickets in the same round, all sharing the pool.
    pub winners_in_round: u32,
    /// Pool split between the winners.
    pub jackpot_pool: f64,
}

/// Everything recorded about a finished round.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoundSummary {
    pub round: u64,
    pub winning_numbers: Numbers,
    pub num_players: u32,
    pub total_cards: u64,
    pub total_bet_amount: f64,
    pub tiers: TierBreakdown,
    pub total_payout: f64,

    /// Pools when the round started.
    pub jackpot_start: f64,
    pub funding_start: f64,

    /// Pools after all contributions, before any payout.
    pub jackpot_before_payout: f64,
    pub funding_before_payout: f64,

    /// Pools carried into the next round.
    pub jackpot_end: f64,
    pub funding_end: f64,

    pub jackpot_winners: u32,
    pub rtp: f64,
}

impl RoundSummary {
    pub fn had_jackpot(&self) -> bool {
        self.jackpot_winners > 0
    }
}

/// Receiver for ticket-level records produced by a round.
pub trait RoundSink {
    /// How many of the round's trailing tickets are worth recording.
    fn detail_capacity(&self) -> usize;

    /// A ticket in the trailing window, in ticket order, after settlement.
    fn record_ticket(&mut self, record: TicketRecord);

    /// A jackpot-winning ticket.
    fn record_jackpot(&mut self, record: JackpotRecord);
}

/// Runs rounds for one configuration.
#[derive(Clone, Debug)]
pub struct RoundSimulator {
    players_range: IntRange,
    cards_range: IntRange,
    prize_table: PrizeTable,
    ticket_price: f64,
}

impl RoundSimulator {
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            players_range: config.players_range,
            cards_range: config.cards_per_player_range,
            prize_table: config.prize_table,
            ticket_price: config.ticket_price,
        }
    }

    /// Simulate round `round_no` against `ledger`.
    pub fn run_round<R, S>(
        &self,
        round_no: u64,
        ledger: &mut PoolLedger,
        rng: &mut R,
        sink: &mut S,
    ) -> Result<RoundSummary>
    where
        R: Rng + ?Sized,
        S: RoundSink + ?Sized,
    {
        let winning_numbers = Numbers::draw(rng);
        let num_players = self.players_range.sample(rng);
        let ticket_seed: <ChaCha8Rng as SeedableRng>::Seed = rng.gen();

        let tickets = self.generate_tickets(ticket_seed, num_players);
        self.settle_tickets(round_no, ledger, winning_numbers, &tickets, sink)
    }

    /// Apply generated tickets (one `Vec` per player) to the ledger and close
    /// the round.
    fn settle_tickets<S>(
        &self,
        round_no: u64,
        ledger: &mut PoolLedger,
        winning_numbers: Numbers,
        tickets: &[Vec<Numbers>],
        sink: &mut S,
    ) -> Result<RoundSummary>
    where
        S: RoundSink + ?Sized,
    {
        ledger.begin_round(round_no);
        let start = ledger.state();
        let num_players = tickets.len() as u32;

        let total_cards: u64 = tickets.iter().map(|t| t.len() as u64).sum();
        let detail_from = total_cards.saturating_sub(sink.detail_capacity() as u64);

        let mut tiers = TierBreakdown::new();
        let mut tail = Vec::with_capacity((total_cards - detail_from) as usize);
        let mut jackpot_tickets = Vec::new();
        let mut index = 0u64;

        for (player_idx, cards) in tickets.iter().enumerate() {
            let player_id = player_idx as u32 + 1;
            for (card_idx, &numbers) in cards.iter().enumerate() {
                ledger.contribute()?;

                let matches = numbers.matches(&winning_numbers);
                let resolved = self.prize_table.resolve(matches);
                let prize_amount = match resolved {
                    Some((tier, Some(amount))) => {
                        tiers.add(tier, amount);
                        amount
                    }
                    _ => 0.0,
                };

                let record = TicketRecord {
                    round: round_no,
                    player_id,
                    card_id: CardId {
                        player: player_id,
                        card: card_idx as u32 + 1,
                    },
                    numbers,
                    winning_numbers,
                    bet_amount: self.ticket_price,
                    matches,
                    prize_tier: resolved.map(|(tier, _)| tier),
                    prize_amount,
                };
                if record.prize_tier == Some(PrizeTier::Jackpot) {
                    jackpot_tickets.push(record);
                }
                if index >= detail_from {
                    tail.push(record);
                }
                index += 1;
            }
        }

        let before_payout = ledger.state();
        let winners = jackpot_tickets.len() as u32;
        let settlement = ledger.settle_round(winners)?;
        let end = ledger.state();

        if let Settlement::Rollover { paid, share, .. } = settlement {
            tiers.set_jackpot(u64::from(winners), paid);
            for ticket in &jackpot_tickets {
                sink.record_jackpot(JackpotRecord {
                    round: round_no,
                    player_id: ticket.player_id,
                    card_id: ticket.card_id,
                    numbers: ticket.numbers,
                    winning_numbers,
                    bet_amount: ticket.bet_amount,
                    prize_amount: share,
                    winners_in_round: winners,
                    jackpot_pool: paid,
                });
            }
            for record in tail.iter_mut().filter(|r| r.prize_tier == Some(PrizeTier::Jackpot)) {
                record.prize_amount = share;
            }
        }
        for record in tail {
            sink.record_ticket(record);
        }

        let total_bet_amount = total_cards as f64 * self.ticket_price;
        let total_payout = tiers.total_amount();
        let rtp = if total_bet_amount > 0.0 {
            total_payout / total_bet_amount
        } else {
            0.0
        };

        debug!(
            round = round_no,
            players = num_players,
            cards = total_cards,
            payout = total_payout,
            jackpot_pool = end.jackpot_pool,
            funding_pool = end.funding_pool,
            "Round complete"
        );

        Ok(RoundSummary {
            round: round_no,
            winning_numbers,
            num_players,
            total_cards,
            total_bet_amount,
            tiers,
            total_payout,
            jackpot_start: start.jackpot_pool,
            funding_start: start.funding_pool,
            jackpot_before_payout: before_payout.jackpot_pool,
            funding_before_payout: before_payout.funding_pool,
            jackpot_end: end.jackpot_pool,
            funding_end: end.funding_pool,
            jackpot_winners: winners,
            rtp,
        })
    }

    #[cfg(not(feature = "parallel"))]
    fn generate_tickets(
        &self,
        seed: <ChaCha8Rng as SeedableRng>::Seed,
        num_players: u32,
    ) -> Vec<Vec<Numbers>> {
        (1..=num_players)
            .map(|player| player_tickets(seed, player, self.cards_range))
            .collect()
    }

    #[cfg(feature = "parallel")]
    fn generate_tickets(
        &self,
        seed: <ChaCha8Rng as SeedableRng>::Seed,
        num_players: u32,
    ) -> Vec<Vec<Numbers>> {
        use rayon::prelude::*;

        (1..=num_players)
            .into_par_iter()
            .map(|player| player_tickets(seed, player, self.cards_range))
            .collect()
    }
}

/// Tickets of one player, from the player's own stream of the round seed.
fn player_tickets(
    seed: <ChaCha8Rng as SeedableRng>::Seed,
    player: u32,
    cards_range: IntRange,
) -> Vec<Numbers> {
    let mut rng = ChaCha8Rng::from_seed(seed);
    rng.set_stream(u64::from(player));
    let cards = cards_range.sample(&mut rng);
    (0..cards).map(|_| Numbers::draw(&mut rng)).collect()
}
