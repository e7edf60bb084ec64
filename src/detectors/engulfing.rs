//! Bullish engulfing after a red run
//!
//! Looks only at the trailing `recent_window` bars (5 by default): the bars before
//! the last one must be mostly red, the last bar must be a green candle whose body
//! spans the previous body, and the engulfing day must be large enough in both
//! body size and volume. Each gate short-circuits the rest.

use super::helpers::{count_red, is_bullish_engulfing, pct_change, MA_DISTANCE_UNDEFINED};
use crate::{
    config::{self, ScannerConfig},
    indicators::{EnrichedSeries, Indicator},
    Period, Result, ScanError, OHLCV,
};

/// Why a series did not qualify. Rejections are ordinary outcomes, not errors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rejection {
    TooFewRedDays { found: usize, need: usize },
    NotEngulfing,
    BodyTooSmall { body_size_pct: f64 },
    VolumeTooLow { volume_ratio: f64 },
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::TooFewRedDays { .. } => "too_few_red_days",
            Rejection::NotEngulfing => "not_engulfing",
            Rejection::BodyTooSmall { .. } => "body_too_small",
            Rejection::VolumeTooLow { .. } => "volume_too_low",
        }
    }
}

/// Metrics of a qualifying engulfing day
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngulfingMatch {
    /// Index of the engulfing (most recent) bar
    pub index: usize,
    pub red_days: usize,
    /// `(close - open) / open * 100` of the engulfing bar
    pub body_size_pct: f64,
    /// Engulfing volume over the trailing average volume
    pub volume_ratio: f64,
    /// Percent distance of close from the long moving average, if defined
    pub ma_distance: Option<f64>,
}

impl EngulfingMatch {
    /// MA distance with [`MA_DISTANCE_UNDEFINED`] standing in for a missing average.
    #[inline]
    pub fn distance_from_ma50(&self) -> f64 {
        self.ma_distance.unwrap_or(MA_DISTANCE_UNDEFINED)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PatternOutcome {
    NoPattern(Rejection),
    Qualifies(EngulfingMatch),
}

impl PatternOutcome {
    #[inline]
    pub fn is_match(&self) -> bool {
        matches!(self, PatternOutcome::Qualifies(_))
    }

    pub fn into_match(self) -> Option<EngulfingMatch> {
        match self {
            PatternOutcome::Qualifies(m) => Some(m),
            PatternOutcome::NoPattern(_) => None,
        }
    }
}

/// Red run followed by a bullish engulfing candle.
#[derive(Debug, Clone)]
pub struct EngulfingDetector {
    pub recent_window: Period,
    pub min_red_days: usize,
    pub min_body_pct: f64,
    pub min_volume_ratio: f64,
}

impl Default for EngulfingDetector {
    fn default() -> Self {
        Self {
            recent_window: Period::new_const(config::RECENT_WINDOW),
            min_red_days: config::MIN_RED_DAYS,
            min_body_pct: config::MIN_BODY_PCT,
            min_volume_ratio: config::MIN_VOLUME_RATIO,
        }
    }
}

impl EngulfingDetector {
    pub fn with_defaults() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ScannerConfig) -> Self {
        Self {
            recent_window: config.recent_window,
            min_red_days: config.min_red_days,
            min_body_pct: config.min_body_pct,
            min_volume_ratio: config.min_volume_ratio,
        }
    }

    /// Bars the detector needs to look at
    #[inline]
    pub fn min_bars(&self) -> usize {
        self.recent_window.get()
    }

    /// Run the gates against the most recent bar of `series`.
    ///
    /// Errors only on data sufficiency: too few bars for the recent window, or an
    /// average volume that is not defined at the last bar.
    pub fn detect<T: OHLCV>(&self, series: &EnrichedSeries<'_, T>) -> Result<PatternOutcome> {
        let need = self.min_bars();
        let got = series.len();
        if got < need {
            return Err(ScanError::InsufficientRecentHistory { need, got });
        }

        let bars = series.bars();
        let index = got - 1;
        let last = &bars[index];
        let prev = &bars[index - 1];

        let red_days = count_red(&bars[got - need..index]);
        if red_days < self.min_red_days {
            return Ok(PatternOutcome::NoPattern(Rejection::TooFewRedDays {
                found: red_days,
                need: self.min_red_days,
            }));
        }

        if !is_bullish_engulfing(prev, last) {
            return Ok(PatternOutcome::NoPattern(Rejection::NotEngulfing));
        }

        let body_size_pct = pct_change(last.close(), last.open()).unwrap_or(f64::NAN);
        if !(body_size_pct >= self.min_body_pct) {
            return Ok(PatternOutcome::NoPattern(Rejection::BodyTooSmall { body_size_pct }));
        }

        let avg_volume = series.value(Indicator::AvgVolume, index)?;
        let volume_ratio = last.volume() / avg_volume;
        if !(volume_ratio >= self.min_volume_ratio) {
            return Ok(PatternOutcome::NoPattern(Rejection::VolumeTooLow { volume_ratio }));
        }

        let ma_distance = series
            .row(index)
            .and_then(|row| row.ma_long)
            .and_then(|ma| pct_change(last.close(), ma));

        Ok(PatternOutcome::Qualifies(EngulfingMatch {
            index,
            red_days,
            body_size_pct,
            volume_ratio,
            ma_distance,
        }))
    }
}
