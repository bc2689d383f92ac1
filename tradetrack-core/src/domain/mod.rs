//! Domain types for TradeTrack

pub mod bar;
pub mod position;
pub mod signal;
pub mod trade;

pub use bar::Bar;
pub use position::Position;
pub use signal::Signal;
pub use trade::{Trade, TradeStatus};

