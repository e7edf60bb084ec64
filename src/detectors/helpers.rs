//! Candle predicates and percentage helpers shared by the detectors.

use crate::{OHLCVExt, OHLCV};

/// Sentinel reported for the MA-distance metric when the long moving average is
/// not yet defined at the pattern bar. Scores as "too far below", i.e. zero.
pub const MA_DISTANCE_UNDEFINED: f64 = -999.0;

/// Number of red (close < open) bars in `bars`.
#[inline]
pub fn count_red<T: OHLCV>(bars: &[T]) -> usize {
    bars.iter().filter(|b| b.is_bearish()).count()
}

/// `last` is green and its body spans `prev`'s body: it opens below the previous
/// close and closes above the previous open.
#[inline]
pub fn is_bullish_engulfing<T: OHLCV>(prev: &T, last: &T) -> bool {
    last.open() < prev.close() && last.close() > prev.open() && last.close() > last.open()
}

/// `(value - reference) / reference * 100`, or `None` when the reference is zero
/// or not finite.
#[inline]
pub fn pct_change(value: f64, reference: f64) -> Option<f64> {
    (reference.is_finite() && reference.abs() > f64::EPSILON)
        .then(|| (value - reference) / reference * 100.0)
}
