//! CLI argument definitions for ratefold.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `rates` | Current BCV USD/EUR and P2P rates, with fallback |
//! | `history` | Official history bucketed per day |
//! | `history-page` | One page of the backend's stored rates |
//! | `status` | Backend reachability |
//! | `convert` | Convert an amount at a current rate |
//! | `watch` | Poll rates and log change notices |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--timeout-ms` | config / `10000` | Per-request timeout in ms |
//! | `--log-json` | `false` | Emit logs as JSON on stderr |
//!
//! Endpoints and credentials come from the environment (see `ratefold_core::config`).

use clap::{Args, Parser, Subcommand, ValueEnum};
use ratefold_core::{ConversionMode, Instrument, SortOrder};

/// Currency-rate client with provider fallback.
#[derive(Debug, Parser)]
#[command(
    name = "ratefold",
    author,
    version,
    about = "Currency-rate client with provider fallback and history aggregation"
)]
pub struct Cli {
    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Per-request timeout in milliseconds; overrides RATEFOLD_TIMEOUT_MS.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Emit logs as JSON lines instead of human-readable text.
    #[arg(long, global = true, default_value_t = false)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch current rates (backend first, then official and P2P providers).
    Rates,

    /// Fetch the official history, one row per date, newest first.
    History,

    /// Fetch one page of stored rates from the backend.
    ///
    /// # Examples
    ///
    ///   ratefold history-page --name USDT --limit 20
    ///   ratefold history-page --order asc --from 2024-01-01 --to 2024-01-31
    HistoryPage(HistoryPageArgs),

    /// Check whether the backend is online.
    Status,

    /// Convert an amount at a current rate.
    ///
    /// # Examples
    ///
    ///   ratefold convert 100
    ///   ratefold convert 3650 --instrument usdt --mode bs-to-usd
    Convert(ConvertArgs),

    /// Poll current rates and log a notice whenever a price changes.
    Watch(WatchArgs),
}

#[derive(Debug, Clone, Args)]
pub struct HistoryPageArgs {
    /// Series tag (BCV, BCV_EUR, USDT).
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long, default_value_t = 100)]
    pub limit: usize,

    #[arg(long, default_value_t = 0)]
    pub offset: usize,

    #[arg(long, value_enum, default_value_t = OrderArg::Desc)]
    pub order: OrderArg,

    /// Lower date bound, passed through to the backend.
    #[arg(long)]
    pub from: Option<String>,

    /// Upper date bound, passed through to the backend.
    #[arg(long)]
    pub to: Option<String>,

    /// Only emit the USDT points, optionally restricted by --from/--to.
    #[arg(long, default_value_t = false)]
    pub p2p_only: bool,
}

#[derive(Debug, Clone, Args)]
pub struct ConvertArgs {
    /// Amount to convert; 0 prints the rate itself.
    pub amount: f64,

    #[arg(long, value_enum, default_value_t = InstrumentArg::BcvUsd)]
    pub instrument: InstrumentArg,

    /// Use a configured custom rate instead of a fetched instrument.
    #[arg(long, conflicts_with = "instrument")]
    pub custom: Option<String>,

    #[arg(long, value_enum, default_value_t = ModeArg::UsdToBs)]
    pub mode: ModeArg,
}

#[derive(Debug, Clone, Args)]
pub struct WatchArgs {
    /// Seconds between polls.
    #[arg(long, default_value_t = 300)]
    pub interval_secs: u64,

    /// Stop after this many polls; runs until interrupted when unset.
    #[arg(long)]
    pub cycles: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OrderArg {
    Asc,
    Desc,
}

impl From<OrderArg> for SortOrder {
    fn from(value: OrderArg) -> Self {
        match value {
            OrderArg::Asc => Self::Asc,
            OrderArg::Desc => Self::Desc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InstrumentArg {
    BcvUsd,
    BcvEur,
    Usdt,
}

impl From<InstrumentArg> for Instrument {
    fn from(value: InstrumentArg) -> Self {
        match value {
            InstrumentArg::BcvUsd => Self::BcvUsd,
            InstrumentArg::BcvEur => Self::BcvEur,
            InstrumentArg::Usdt => Self::Usdt,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    UsdToBs,
    BsToUsd,
}

impl From<ModeArg> for ConversionMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::UsdToBs => Self::UsdToBs,
            ModeArg::BsToUsd => Self::BsToUsd,
        }
    }
}
