// Copyright (c) 2024 Botho Foundation

//! Reporting for jackpool simulation runs.
//!
//! Consumes the records produced by `jpl-engine` and turns them into:
//! - aggregate statistics per run, tier, jackpot and funding pool
//! - trend analysis over progress snapshots
//! - a comparison of simulated and theoretical tier odds
//! - chart series (JSON plot specifications, no rendering)
//! - CSV and JSON export files

pub mod charts;
pub mod export;
pub mod odds;
pub mod stats;
pub mod trend;

pub use charts::{build_charts, Axis, ChartKind, ChartSpec, Series};
pub use export::{
    details_csv, jackpots_csv, summary_csv, write_json, write_run, ExportError, ExportedFiles,
};
pub use odds::{match_probability, TierComparison, TierComparisonRow};
pub use stats::{FundingAnalysis, JackpotAnalysis, PrizeStat, RunStatistics, SummaryStats};
pub use trend::{TrendAnalysis, TrendSeries};
