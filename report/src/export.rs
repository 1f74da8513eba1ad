//! CSV and JSON export.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use jpl_engine::{JackpotRecord, Numbers, PrizeTier, RoundSummary, SimulationResult, TicketRecord};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Paths written by [`write_run`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportedFiles {
    pub summary: PathBuf,
    pub details: PathBuf,
    pub jackpots: PathBuf,
    pub result: PathBuf,
}

fn quoted(numbers: &Numbers) -> String {
    format!("\"{numbers}\"")
}

fn tier_label(tier: Option<PrizeTier>) -> &'static str {
    tier.map_or("", PrizeTier::label)
}

/// One line per round.
///
/// Amounts are written at full `f64` precision so they parse back to the
/// values in `simulation_results.json`.
pub fn summary_csv(rounds: &[RoundSummary]) -> String {
    let mut csv = String::from(
        "round,game_result,num_players,total_cards,total_bet_amount,\
         jackpot_start,funding_start,jackpot_before_payout,funding_before_payout,\
         jackpot_end,funding_end,jackpot_winners,total_payout",
    );
    for tier in PrizeTier::ALL {
        let _ = write!(csv, ",{0}_count,{0}_amount", tier.label());
    }
    csv.push_str(",rtp\n");

    for r in rounds {
        let _ = write!(
            csv,
            "{},{},{},{},{},{},{},{},{},{},{},{},{}",
            r.round,
            quoted(&r.winning_numbers),
            r.num_players,
            r.total_cards,
            r.total_bet_amount,
            r.jackpot_start,
            r.funding_start,
            r.jackpot_before_payout,
            r.funding_before_payout,
            r.jackpot_end,
            r.funding_end,
            r.jackpot_winners,
            r.total_payout,
        );
        for (_, stat) in r.tiers.iter() {
            let _ = write!(csv, ",{},{}", stat.count, stat.amount);
        }
        let _ = writeln!(csv, ",{}", r.rtp);
    }
    csv
}

/// One line per retained ticket.
pub fn details_csv(details: &[TicketRecord]) -> String {
    let mut csv = String::from(
        "round,player_id,card_id,numbers,winning_numbers,bet_amount,matches,prize_tier,prize_amount\n",
    );
    for t in details {
        let _ = writeln!(
            csv,
            "{},{},{},{},{},{},{},{},{}",
            t.round,
            t.player_id,
            t.card_id,
            quoted(&t.numbers),
            quoted(&t.winning_numbers),
            t.bet_amount,
            t.matches,
            tier_label(t.prize_tier),
            t.prize_amount,
        );
    }
    csv
}

/// One line per jackpot-winning ticket.
pub fn jackpots_csv(jackpots: &[JackpotRecord]) -> String {
    let mut csv = String::from(
        "round,player_id,card_id,numbers,winning_numbers,bet_amount,prize_amount,winners_in_round,jackpot_pool\n",
    );
    for j in jackpots {
        let _ = writeln!(
            csv,
            "{},{},{},{},{},{},{},{},{}",
            j.round,
            j.player_id,
            j.card_id,
            quoted(&j.numbers),
            quoted(&j.winning_numbers),
            j.bet_amount,
            j.prize_amount,
            j.winners_in_round,
            j.jackpot_pool,
        );
    }
    csv
}

fn write_file(path: &Path, contents: &str) -> Result<(), ExportError> {
    fs::write(path, contents).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Write any serialisable value as pretty JSON.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ExportError> {
    let json = serde_json::to_string_pretty(value)?;
    write_file(path, &json)
}

/// Write the standard export set for a run into `dir`.
pub fn write_run(dir: &Path, result: &SimulationResult) -> Result<ExportedFiles, ExportError> {
    fs::create_dir_all(dir).map_err(|source| ExportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let files = ExportedFiles {
        summary: dir.join("summary.csv"),
        details: dir.join("last_bets.csv"),
        jackpots: dir.join("jackpot_bets.csv"),
        result: dir.join("simulation_results.json"),
    };

    write_file(&files.summary, &summary_csv(&result.rounds))?;
    write_file(&files.details, &details_csv(&result.details))?;
    write_file(&files.jackpots, &jackpots_csv(&result.jackpots))?;
    write_json(&files.result, result)?;

    info!(dir = %dir.display(), rounds = result.rounds.len(), "Exported run");
    Ok(files)
}
