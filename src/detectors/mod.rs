//! Candlestick pattern detection
//!
//! The scanner looks for one setup: a bullish engulfing candle at the end of a run
//! of red days, filtered by body size and relative volume.

pub mod engulfing;
pub mod helpers;

pub use engulfing::*;
pub use helpers::*;
