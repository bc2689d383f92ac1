//! TradeTrack Core — domain types and the position replayer.
//!
//! This crate contains the stateful half of the pipeline:
//! - Domain types (bars, signals, positions, trades)
//! - Per-instrument replay of ENTRY_/EXIT_ signal bars into trades,
//!   enforcing at most one open position per instrument
//!
//! Everything here is pure and single-threaded. Aggregation, scoring and
//! I/O live in `tradetrack-runner`.

pub mod domain;
pub mod replay;

pub use domain::{Bar, Position, Signal, Trade, TradeStatus};
pub use replay::{replay, ReplayError, TRADING_DAYS_PER_YEAR};
