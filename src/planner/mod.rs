//! Trade planning around a qualifying engulfing bar
//!
//! Entry is the engulfing close. Targets and stop are ATR multiples:
//!
//! ```text
//! target_quick    = entry + 1.5 * ATR
//! target_extended = entry + 2.5 * ATR
//! stop_loss       = low   - 1.5 * ATR
//! ```
//!
//! Because `low <= close`, the stop sits strictly below entry whenever ATR > 0 and
//! equals it only for a zero ATR on a bar that closed at its low.

pub mod expiration;
pub mod strikes;

pub use expiration::{suggest_expirations, ExpirationWindow, EXPIRATION_WEEKDAY, MAX_EXPIRATION_SCAN_DAYS};
pub use strikes::{strike_increment, suggest_strikes, StrikeTriple};

use chrono::NaiveDate;

use crate::{
    config::{self, ScannerConfig},
    indicators::{EnrichedSeries, Indicator},
    Period, Result, ScanError, OHLCV,
};

/// Derived trade parameters for one signal
#[derive(Debug, Clone, PartialEq)]
pub struct TradePlan {
    pub entry_price: f64,
    pub target_quick: f64,
    pub target_extended: f64,
    pub stop_loss: f64,
    /// Highest high over the resistance window, engulfing bar included
    pub weekly_resistance: f64,
    pub atr: f64,
    pub engulfing_low: f64,
    pub expirations: Vec<NaiveDate>,
    pub strikes: StrikeTriple,
    /// Rough ATM call return if the quick target is hit, percent
    pub expected_profit_pct: f64,
}

#[derive(Debug, Clone)]
pub struct TradePlanner {
    pub target_quick_atr: f64,
    pub target_extended_atr: f64,
    pub stop_atr: f64,
    pub resistance_window: Period,
    pub expiration: ExpirationWindow,
    pub option_leverage: f64,
}

impl Default for TradePlanner {
    fn default() -> Self {
        Self {
            target_quick_atr: config::TARGET_QUICK_ATR,
            target_extended_atr: config::TARGET_EXTENDED_ATR,
            stop_atr: config::STOP_ATR,
            resistance_window: Period::new_const(config::RESISTANCE_WINDOW),
            expiration: ExpirationWindow::QUICK,
            option_leverage: config::OPTION_LEVERAGE,
        }
    }
}

impl TradePlanner {
    pub fn from_config(config: &ScannerConfig) -> Self {
        Self {
            target_quick_atr: config.target_quick_atr,
            target_extended_atr: config.target_extended_atr,
            stop_atr: config.stop_atr,
            resistance_window: config.resistance_window,
            expiration: config.expiration,
            option_leverage: config.option_leverage,
        }
    }

    /// Plan with "today" taken as the date of the bar at `index`.
    pub fn plan<T: OHLCV>(&self, series: &EnrichedSeries<'_, T>, index: usize) -> Result<TradePlan> {
        let bar = series.bars().get(index).ok_or(ScanError::UndefinedIndicator {
            indicator: Indicator::TrueRange,
            index,
        })?;
        self.plan_as_of(series, index, bar.date())
    }

    /// Plan with an explicit "today" for the expiration walk.
    pub fn plan_as_of<T: OHLCV>(
        &self,
        series: &EnrichedSeries<'_, T>,
        index: usize,
        today: NaiveDate,
    ) -> Result<TradePlan> {
        let atr = series.value(Indicator::Atr, index)?;
        let bars = series.bars();
        let bar = &bars[index];

        let entry_price = bar.close();
        let target_quick = entry_price + self.target_quick_atr * atr;
        let target_extended = entry_price + self.target_extended_atr * atr;
        let stop_loss = bar.low() - self.stop_atr * atr;

        let start = (index + 1).saturating_sub(self.resistance_window.get());
        let weekly_resistance = bars[start..=index]
            .iter()
            .map(|b| b.high())
            .fold(f64::NEG_INFINITY, f64::max);

        let expirations = suggest_expirations(today, &self.expiration)?;
        let strikes = suggest_strikes(entry_price);

        Ok(TradePlan {
            entry_price,
            target_quick,
            target_extended,
            stop_loss,
            weekly_resistance,
            atr,
            engulfing_low: bar.low(),
            expirations,
            strikes,
            expected_profit_pct: expected_profit_pct(entry_price, target_quick, self.option_leverage),
        })
    }
}

/// Underlying move to `target` in percent, times `leverage`, rounded to 0.1.
///
/// A fixed leverage approximation for short-dated ATM calls, not an option price.
pub fn expected_profit_pct(entry: f64, target: f64, leverage: f64) -> f64 {
    let stock_move_pct = (target - entry) / entry * 100.0;
    (stock_move_pct * leverage * 10.0).round() / 10.0
}
