//! Rolling indicators over a daily bar series
//!
//! Every rolling column is `Option<f64>`: `None` until its window is fully
//! populated, so "not enough history yet" can never be mistaken for a real zero.
//! Windows are trailing and include the current bar.

use std::fmt;

use crate::{config::ScannerConfig, Period, Result, ScanError, OHLCV};

/// Derived columns available on an [`EnrichedSeries`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Indicator {
    /// Short moving average of close (20 by default)
    MaShort,
    /// Long moving average of close (50 by default)
    MaLong,
    TrueRange,
    /// Average true range (14 by default)
    Atr,
    /// Average volume (20 by default)
    AvgVolume,
}

impl Indicator {
    pub fn as_str(self) -> &'static str {
        match self {
            Indicator::MaShort => "ma_short",
            Indicator::MaLong => "ma_long",
            Indicator::TrueRange => "true_range",
            Indicator::Atr => "atr",
            Indicator::AvgVolume => "avg_volume",
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Indicator values at one bar
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IndicatorRow {
    pub ma_short: Option<f64>,
    pub ma_long: Option<f64>,
    /// Always defined; the first bar uses high - low
    pub true_range: f64,
    pub atr: Option<f64>,
    pub avg_volume: Option<f64>,
}

impl IndicatorRow {
    #[inline]
    pub fn get(&self, indicator: Indicator) -> Option<f64> {
        match indicator {
            Indicator::MaShort => self.ma_short,
            Indicator::MaLong => self.ma_long,
            Indicator::TrueRange => Some(self.true_range),
            Indicator::Atr => self.atr,
            Indicator::AvgVolume => self.avg_volume,
        }
    }
}

/// A bar slice together with its per-bar indicator rows (same length).
#[derive(Debug, Clone)]
pub struct EnrichedSeries<'a, T> {
    bars: &'a [T],
    rows: Vec<IndicatorRow>,
}

impl<'a, T: OHLCV> EnrichedSeries<'a, T> {
    #[inline]
    pub fn bars(&self) -> &'a [T] {
        self.bars
    }

    #[inline]
    pub fn rows(&self) -> &[IndicatorRow] {
        &self.rows
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Index of the most recent bar
    #[inline]
    pub fn last_index(&self) -> Option<usize> {
        self.bars.len().checked_sub(1)
    }

    #[inline]
    pub fn row(&self, index: usize) -> Option<&IndicatorRow> {
        self.rows.get(index)
    }

    /// Checked indicator access.
    ///
    /// Fails with [`ScanError::UndefinedIndicator`] when the window is not yet
    /// filled at `index` (or `index` is past the end).
    pub fn value(&self, indicator: Indicator, index: usize) -> Result<f64> {
        self.rows
            .get(index)
            .and_then(|row| row.get(indicator))
            .ok_or(ScanError::UndefinedIndicator { indicator, index })
    }
}

/// Computes the rolling indicator columns the detector and planner consume.
#[derive(Debug, Clone)]
pub struct IndicatorCalculator {
    pub ma_short: Period,
    pub ma_long: Period,
    pub atr: Period,
    pub volume: Period,
    pub min_history: usize,
}

impl Default for IndicatorCalculator {
    fn default() -> Self {
        Self::from_config(&ScannerConfig::default())
    }
}

impl IndicatorCalculator {
    pub fn from_config(config: &ScannerConfig) -> Self {
        Self {
            ma_short: config.ma_short_window,
            ma_long: config.ma_long_window,
            atr: config.atr_window,
            volume: config.volume_window,
            min_history: config.min_history,
        }
    }

    /// Fail with [`ScanError::InsufficientHistory`] for too-short series.
    #[inline]
    pub fn check_history<T>(&self, bars: &[T]) -> Result<()> {
        if bars.len() < self.min_history {
            return Err(ScanError::InsufficientHistory {
                need: self.min_history,
                got: bars.len(),
            });
        }
        Ok(())
    }

    /// Enrich `bars` with every indicator column.
    pub fn enrich<'a, T: OHLCV>(&self, bars: &'a [T]) -> Result<EnrichedSeries<'a, T>> {
        self.check_history(bars)?;

        let closes: Vec<f64> = bars.iter().map(|b| b.close()).collect();
        let volumes: Vec<f64> = bars.iter().map(|b| b.volume()).collect();
        let tr = true_range(bars);

        let ma_short = rolling_mean(&closes, self.ma_short.get());
        let ma_long = rolling_mean(&closes, self.ma_long.get());
        let atr = rolling_mean(&tr, self.atr.get());
        let avg_volume = rolling_mean(&volumes, self.volume.get());

        let rows = (0..bars.len())
            .map(|i| IndicatorRow {
                ma_short: ma_short[i],
                ma_long: ma_long[i],
                true_range: tr[i],
                atr: atr[i],
                avg_volume: avg_volume[i],
            })
            .collect();

        Ok(EnrichedSeries { bars, rows })
    }
}

/// True range series.
///
/// `TR[0] = high[0] - low[0]` (no previous close);
/// `TR[t] = max(high - low, |high - close[t-1]|, |low - close[t-1]|)`.
pub fn true_range<T: OHLCV>(bars: &[T]) -> Vec<f64> {
    let mut tr = Vec::with_capacity(bars.len());
    let mut prev_close: Option<f64> = None;

    for bar in bars {
        let hl = bar.high() - bar.low();
        let value = match prev_close {
            None => hl,
            Some(pc) => hl.max((bar.high() - pc).abs()).max((bar.low() - pc).abs()),
        };
        tr.push(value);
        prev_close = Some(bar.close());
    }

    tr
}

/// Trailing arithmetic mean over `window` values.
///
/// The first `window - 1` entries are `None`; entry `window - 1` is the mean of
/// `values[0..window]`. Each window is summed directly rather than with a running
/// sum, so long series do not accumulate drift.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window == 0 || values.len() < window {
        return out;
    }

    for (offset, slice) in values.windows(window).enumerate() {
        out[offset + window - 1] = Some(slice.iter().sum::<f64>() / window as f64);
    }
    out
}
