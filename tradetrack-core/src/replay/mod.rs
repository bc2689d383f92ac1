//! Position replayer — converts one instrument's signal bars into trades.
//!
//! Pure function: ordered bars in, trades out. The scan is a fold over the
//! bars with an explicit `ReplayState` accumulator, so there is no hidden
//! state between calls and replaying the same bars twice gives identical
//! trades.
//!
//! State machine per instrument:
//! - `Flat --ENTRY_*--> Open` (entry at that day's close)
//! - `Open --any bar--> Open` (re-mark P&L)
//! - `Open --EXIT_*--> Flat` (emit a closed trade)
//! - `Open --end of data--> emit an OPEN trade`
//!
//! EXIT while flat and ENTRY while open are ignored. The bar that closes a
//! position is never evaluated as a new entry.

pub mod window;

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::position::Position;
use crate::domain::{Bar, Signal, Trade, TradeStatus};

pub use window::{window_stats, WindowStats};

/// Annualization convention for `annualized_return`.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Malformed input that makes an instrument's replay impossible.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReplayError {
    #[error("'{instrument}' has no usable close on {date}")]
    MissingClose { instrument: String, date: NaiveDate },

    #[error("'{instrument}' has non-positive close {close} on {date}")]
    NonPositiveClose {
        instrument: String,
        date: NaiveDate,
        close: f64,
    },

    #[error("'{instrument}' dates are not strictly increasing: {date} follows {previous}")]
    NonMonotonicDate {
        instrument: String,
        previous: NaiveDate,
        date: NaiveDate,
    },

    #[error("bar for '{found}' found while replaying '{expected}'")]
    MixedInstruments { expected: String, found: String },
}

#[derive(Debug, Default)]
enum Phase {
    #[default]
    Flat,
    Open(Position),
}

/// Fold accumulator: current phase plus the trades emitted so far.
#[derive(Debug, Default)]
struct ReplayState {
    phase: Phase,
    trades: Vec<Trade>,
    last_date: Option<NaiveDate>,
}

/// Replay a single instrument's bars (ascending by date) into trades.
///
/// Returns zero or more closed trades followed by at most one `Open` trade.
pub fn replay(bars: &[Bar]) -> Result<Vec<Trade>, ReplayError> {
    let Some(first) = bars.first() else {
        return Ok(Vec::new());
    };
    let instrument = first.instrument_id.as_str();

    let state = bars
        .iter()
        .enumerate()
        .try_fold(ReplayState::default(), |state, (index, bar)| {
            state.step(bars, instrument, index, bar)
        })?;

    Ok(state.finish(bars))
}

impl ReplayState {
    fn step(
        mut self,
        bars: &[Bar],
        instrument: &str,
        index: usize,
        bar: &Bar,
    ) -> Result<Self, ReplayError> {
        if bar.instrument_id != instrument {
            return Err(ReplayError::MixedInstruments {
                expected: instrument.to_string(),
                found: bar.instrument_id.clone(),
            });
        }
        if let Some(previous) = self.last_date {
            if bar.date <= previous {
                return Err(ReplayError::NonMonotonicDate {
                    instrument: instrument.to_string(),
                    previous,
                    date: bar.date,
                });
            }
        }
        let close = usable_close(bar)?;
        self.last_date = Some(bar.date);

        self.phase = match std::mem::take(&mut self.phase) {
            Phase::Flat => match bar.signal() {
                Signal::Entry => {
                    let mut position = Position::open(
                        instrument,
                        index,
                        bar.date,
                        close,
                        bar.stop_loss,
                        bar.trade_summary.clone(),
                    );
                    position.mark(close);
                    Phase::Open(position)
                }
                Signal::Exit | Signal::Hold => Phase::Flat,
            },
            Phase::Open(mut position) => {
                position.mark(close);
                match bar.signal() {
                    Signal::Exit => {
                        let window = &bars[position.entry_index..=index];
                        self.trades.push(build_trade(&position, window, Some(bar)));
                        Phase::Flat
                    }
                    Signal::Entry | Signal::Hold => Phase::Open(position),
                }
            }
        };

        Ok(self)
    }

    fn finish(mut self, bars: &[Bar]) -> Vec<Trade> {
        if let Phase::Open(position) = self.phase {
            let window = &bars[position.entry_index..];
            self.trades.push(build_trade(&position, window, None));
        }
        self.trades
    }
}

fn usable_close(bar: &Bar) -> Result<f64, ReplayError> {
    match bar.close {
        Some(close) if close.is_finite() && close > 0.0 => Ok(close),
        Some(close) if close.is_finite() => Err(ReplayError::NonPositiveClose {
            instrument: bar.instrument_id.clone(),
            date: bar.date,
            close,
        }),
        _ => Err(ReplayError::MissingClose {
            instrument: bar.instrument_id.clone(),
            date: bar.date,
        }),
    }
}

/// Materialize a trade from a position marked to the last bar of `window`.
///
/// `exit` is the closing bar, or `None` when data ended with the position open.
fn build_trade(position: &Position, window: &[Bar], exit: Option<&Bar>) -> Trade {
    let last_date = window
        .last()
        .map(|b| b.date)
        .unwrap_or(position.entry_date);
    let days_held = ((last_date - position.entry_date).num_days() + 1).max(0) as u32;

    let absolute_pl = position.unrealized_pl();
    let (day_return, annualized_return) = if days_held > 0 {
        let day_return = absolute_pl / f64::from(days_held);
        (
            day_return,
            day_return * TRADING_DAYS_PER_YEAR / position.entry_price * 100.0,
        )
    } else {
        (0.0, 0.0)
    };

    let stats = window_stats(window, position.entry_price);

    let status = match exit {
        Some(_) => TradeStatus::from_closed_pnl(position.pnl_pct),
        None => TradeStatus::Open,
    };

    Trade {
        instrument_id: position.instrument_id.clone(),
        status,
        entry_date: position.entry_date,
        entry_price: position.entry_price,
        entry_stop_loss: position.entry_stop_loss,
        entry_summary: position.entry_summary.clone(),
        exit_date: exit.map(|b| b.date),
        exit_price: exit.map(|_| position.last_close),
        exit_stop_loss: exit.and_then(|b| b.stop_loss),
        exit_summary: exit.and_then(|b| b.trade_summary.clone()),
        last_date,
        last_close: position.last_close,
        pnl_pct: position.pnl_pct,
        absolute_pl,
        day_return,
        annualized_return,
        days_held,
        high_water_mark: stats.high_water_mark,
        price_range_pct: stats.price_range_pct,
        price_range_drawdown: stats.max_drawdown_pct,
    }
}
