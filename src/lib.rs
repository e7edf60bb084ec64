//! # engulfscan - bullish engulfing reversal scanner
//!
//! Flags daily bar series that end in a bullish engulfing candle after a run of
//! red days, rates the setup 1-5 and plans a short-horizon trade around it
//! (ATR targets and stop, resistance, option expirations and strikes).
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::{Days, NaiveDate};
//! use engulfscan::prelude::*;
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let bars: Vec<Bar> = (0..30)
//!     .map(|i| Bar::new(start + Days::new(i), 10.0, 10.5, 9.5, 10.0, 1_000.0))
//!     .collect();
//!
//! let scanner = ScannerBuilder::new().build().unwrap();
//!
//! match scanner.evaluate("AAPL", &bars).unwrap() {
//!     Evaluation::Signal(signal) => println!("{} rated {}", signal.ticker, signal.rating.get()),
//!     Evaluation::NoSignal(reason) => println!("no signal: {}", reason.as_str()),
//! }
//! ```
//!
//! Every evaluation is a pure function of one symbol's bars. Batches fan out with
//! rayon through [`scan_parallel`] or, with an injected [`BarSource`],
//! [`scan_universe`].

pub mod config;
pub mod detectors;
pub mod indicators;
pub mod params;
pub mod planner;
pub mod scoring;

pub mod prelude {
    pub use crate::{
        // Configuration
        config::ScannerConfig,
        // Detection
        detectors::{EngulfingDetector, EngulfingMatch, PatternOutcome, Rejection, MA_DISTANCE_UNDEFINED},
        // Indicators
        indicators::{EnrichedSeries, Indicator, IndicatorCalculator, IndicatorRow},
        // Parameters
        params::{ParamMeta, ParamType, ParameterizedConfig},
        // Planning
        planner::{ExpirationWindow, StrikeTriple, TradePlan, TradePlanner},
        // Parallel
        scan_parallel,
        scan_universe,
        // Scoring
        scoring::{Rating, ScoreBreakdown, SignalScorer},
        // Types
        Bar,
        BarSource,
        Evaluation,
        OHLCVExt,
        Period,
        Result,
        // Errors
        ScanError,
        ScanReport,
        Scanner,
        ScannerBuilder,
        Signal,
        SymbolFailure,
        OHLCV,
    };
}

use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::{
    config::ScannerConfig,
    detectors::{EngulfingDetector, EngulfingMatch, PatternOutcome, Rejection},
    indicators::{Indicator, IndicatorCalculator},
    planner::{ExpirationWindow, StrikeTriple, TradePlan, TradePlanner},
    scoring::{Rating, SignalScorer},
};

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, ScanError>;

/// Errors that can occur while evaluating a symbol
///
/// All of them are scoped to one symbol; a batch scan records them and moves on.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScanError {
    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Insufficient history: need {need} bars, got {got}")]
    InsufficientHistory { need: usize, got: usize },

    #[error("Insufficient recent history: need {need} bars, got {got}")]
    InsufficientRecentHistory { need: usize, got: usize },

    #[error("Indicator {indicator} is undefined at index {index}")]
    UndefinedIndicator { indicator: Indicator, index: usize },

    #[error("No expiration found {min_days}..={max_days} days after {today}")]
    NoExpirationFound {
        today: NaiveDate,
        min_days: u32,
        max_days: u32,
    },

    #[error("Invalid OHLCV at index {index}: {reason}")]
    InvalidBar { index: usize, reason: &'static str },

    #[error("Bar dates not strictly ascending at index {index}")]
    UnorderedDates { index: usize },

    #[error("Data source error: {0}")]
    DataSource(String),
}

impl ScanError {
    /// Not enough bars for a window the pipeline needs
    pub fn is_data_sufficiency(&self) -> bool {
        matches!(
            self,
            ScanError::InsufficientHistory { .. }
                | ScanError::InsufficientRecentHistory { .. }
                | ScanError::UndefinedIndicator { .. }
        )
    }
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Period (must be > 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Period(usize);

impl Period {
    /// Create a new Period, validating value is > 0
    pub fn new(value: usize) -> Result<Self> {
        if value == 0 {
            return Err(ScanError::InvalidValue("Period must be > 0"));
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: usize) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl Serialize for Period {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = usize::deserialize(d)?;
        Period::new(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// OHLCV TRAITS
// ============================================================

/// Daily bar data
pub trait OHLCV {
    fn date(&self) -> NaiveDate;
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;
    fn volume(&self) -> f64;
}

impl<T: OHLCV + ?Sized> OHLCV for &T {
    fn date(&self) -> NaiveDate {
        (**self).date()
    }

    fn open(&self) -> f64 {
        (**self).open()
    }

    fn high(&self) -> f64 {
        (**self).high()
    }

    fn low(&self) -> f64 {
        (**self).low()
    }

    fn close(&self) -> f64 {
        (**self).close()
    }

    fn volume(&self) -> f64 {
        (**self).volume()
    }
}

/// Extension trait with computed properties for OHLCV data
pub trait OHLCVExt: OHLCV {
    #[inline]
    fn body(&self) -> f64 {
        (self.close() - self.open()).abs()
    }

    #[inline]
    fn range(&self) -> f64 {
        self.high() - self.low()
    }

    /// Green candle
    #[inline]
    fn is_bullish(&self) -> bool {
        self.close() > self.open()
    }

    /// Red candle
    #[inline]
    fn is_bearish(&self) -> bool {
        self.close() < self.open()
    }

    /// Validate OHLCV data consistency
    fn validate(&self) -> Result<()> {
        let prices = [self.open(), self.high(), self.low(), self.close()];
        if prices.iter().any(|p| p.is_nan()) || self.volume().is_nan() {
            return Err(ScanError::InvalidBar {
                index: 0,
                reason: "NaN in OHLCV",
            });
        }
        if prices.iter().any(|p| p.is_infinite()) || self.volume().is_infinite() {
            return Err(ScanError::InvalidBar {
                index: 0,
                reason: "Infinite value in OHLCV",
            });
        }
        if self.high() < self.low() {
            return Err(ScanError::InvalidBar {
                index: 0,
                reason: "high < low",
            });
        }
        if prices.iter().any(|p| *p <= 0.0) {
            return Err(ScanError::InvalidBar {
                index: 0,
                reason: "non-positive price",
            });
        }
        if self.volume() < 0.0 {
            return Err(ScanError::InvalidBar {
                index: 0,
                reason: "negative volume",
            });
        }
        Ok(())
    }
}

impl<T: OHLCV + ?Sized> OHLCVExt for T {}

/// One trading day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

impl OHLCV for Bar {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }

    fn volume(&self) -> f64 {
        self.volume
    }
}

// ============================================================
// SIGNAL
// ============================================================

/// A rated, planned engulfing setup for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub ticker: String,
    pub rating: Rating,
    pub current_price: f64,
    pub entry_price: f64,
    /// entry + 1.5 ATR, for a 3-5 day exit
    pub target_quick: f64,
    /// entry + 2.5 ATR, if holding longer
    pub target_extended: f64,
    pub stop_loss: f64,
    pub weekly_resistance: f64,
    pub atr: f64,
    pub body_size_pct: f64,
    pub volume_ratio: f64,
    /// Percent from the 50-day MA, `-999` if that average is undefined
    pub distance_from_ma50: f64,
    pub red_days: usize,
    pub exp_dates: Vec<NaiveDate>,
    pub suggested_strikes: StrikeTriple,
    pub expected_profit_pct: f64,
    pub engulfing_low: f64,
    /// Date of the engulfing bar
    pub date: NaiveDate,
}

impl Signal {
    pub fn new(ticker: &str, rating: Rating, pattern: &EngulfingMatch, plan: TradePlan, date: NaiveDate) -> Self {
        Self {
            ticker: ticker.to_string(),
            rating,
            current_price: plan.entry_price,
            entry_price: plan.entry_price,
            target_quick: plan.target_quick,
            target_extended: plan.target_extended,
            stop_loss: plan.stop_loss,
            weekly_resistance: plan.weekly_resistance,
            atr: plan.atr,
            body_size_pct: pattern.body_size_pct,
            volume_ratio: pattern.volume_ratio,
            distance_from_ma50: pattern.distance_from_ma50(),
            red_days: pattern.red_days,
            exp_dates: plan.expirations,
            suggested_strikes: plan.strikes,
            expected_profit_pct: plan.expected_profit_pct,
            engulfing_low: plan.engulfing_low,
            date,
        }
    }

    /// Percent lost from entry if the stop is hit
    #[inline]
    pub fn risk_pct(&self) -> f64 {
        (self.entry_price / self.stop_loss - 1.0) * 100.0
    }

    /// Percent gained from entry at the quick target
    #[inline]
    pub fn quick_reward_pct(&self) -> f64 {
        (self.target_quick / self.entry_price - 1.0) * 100.0
    }

    /// Quick reward over risk; `None` when the stop is not below entry
    pub fn risk_reward(&self) -> Option<f64> {
        let risk = self.risk_pct();
        (risk > 0.0 && risk.is_finite()).then(|| self.quick_reward_pct() / risk)
    }
}

/// Outcome of evaluating one symbol
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Signal(Box<Signal>),
    NoSignal(Rejection),
}

impl Evaluation {
    pub fn signal(&self) -> Option<&Signal> {
        match self {
            Evaluation::Signal(s) => Some(s),
            Evaluation::NoSignal(_) => None,
        }
    }

    pub fn into_signal(self) -> Option<Signal> {
        match self {
            Evaluation::Signal(s) => Some(*s),
            Evaluation::NoSignal(_) => None,
        }
    }
}

// ============================================================
// SCANNER
// ============================================================

/// Per-symbol pipeline: indicators -> detector -> scorer + planner -> [`Signal`]
#[derive(Debug, Clone)]
pub struct Scanner {
    config: ScannerConfig,
    calculator: IndicatorCalculator,
    detector: EngulfingDetector,
    scorer: SignalScorer,
    planner: TradePlanner,
}

impl Scanner {
    pub fn new(config: ScannerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            calculator: IndicatorCalculator::from_config(&config),
            detector: EngulfingDetector::from_config(&config),
            scorer: SignalScorer,
            planner: TradePlanner::from_config(&config),
            config,
        })
    }

    #[inline]
    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Evaluate one symbol. Expirations are counted from the engulfing bar's date.
    pub fn evaluate<T: OHLCV>(&self, symbol: &str, bars: &[T]) -> Result<Evaluation> {
        self.evaluate_internal(symbol, bars, None)
    }

    /// Evaluate one symbol with an explicit "today" for the expiration walk
    /// (e.g. the wall-clock date at scan time).
    pub fn evaluate_as_of<T: OHLCV>(&self, symbol: &str, bars: &[T], today: NaiveDate) -> Result<Evaluation> {
        self.evaluate_internal(symbol, bars, Some(today))
    }

    fn evaluate_internal<T: OHLCV>(&self, symbol: &str, bars: &[T], today: Option<NaiveDate>) -> Result<Evaluation> {
        self.calculator.check_history(bars)?;
        if self.config.validate_data {
            validate_bars(bars)?;
        }

        let series = self.calculator.enrich(bars)?;
        let pattern = match self.detector.detect(&series)? {
            PatternOutcome::Qualifies(m) => m,
            PatternOutcome::NoPattern(rejection) => {
                trace!(symbol = %symbol, reason = rejection.as_str(), "No pattern");
                return Ok(Evaluation::NoSignal(rejection));
            },
        };

        let rating = self
            .scorer
            .rate(pattern.body_size_pct, pattern.volume_ratio, pattern.distance_from_ma50());
        let date = bars[pattern.index].date();
        let plan = self
            .planner
            .plan_as_of(&series, pattern.index, today.unwrap_or(date))?;

        debug!(
            symbol = %symbol,
            rating = rating.get(),
            body_size_pct = pattern.body_size_pct,
            volume_ratio = pattern.volume_ratio,
            "Signal found"
        );
        Ok(Evaluation::Signal(Box::new(Signal::new(
            symbol, rating, &pattern, plan, date,
        ))))
    }

    /// Run `op` on a dedicated pool when `max_concurrency` is set
    fn install<R: Send>(&self, op: impl FnOnce() -> R + Send) -> Result<R> {
        match self.config.max_concurrency {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| ScanError::InvalidConfig(e.to_string()))?;
                Ok(pool.install(op))
            },
            None => Ok(op()),
        }
    }
}

fn validate_bars<T: OHLCV>(bars: &[T]) -> Result<()> {
    for (i, bar) in bars.iter().enumerate() {
        bar.validate().map_err(|e| match e {
            ScanError::InvalidBar { reason, .. } => ScanError::InvalidBar { index: i, reason },
            other => other,
        })?;
        if i > 0 && bar.date() <= bars[i - 1].date() {
            return Err(ScanError::UnorderedDates { index: i });
        }
    }
    Ok(())
}

// ============================================================
// BUILDER
// ============================================================

/// Builder for creating [`Scanner`] instances
#[derive(Debug, Clone, Default)]
pub struct ScannerBuilder {
    config: ScannerConfig,
}

impl ScannerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing config
    pub fn config(mut self, config: ScannerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn min_history(mut self, bars: usize) -> Self {
        self.config.min_history = bars;
        self
    }

    pub fn min_red_days(mut self, days: usize) -> Self {
        self.config.min_red_days = days;
        self
    }

    pub fn min_body_pct(mut self, pct: f64) -> Self {
        self.config.min_body_pct = pct;
        self
    }

    pub fn min_volume_ratio(mut self, ratio: f64) -> Self {
        self.config.min_volume_ratio = ratio;
        self
    }

    /// ATR multiples for the quick target, extended target and stop
    pub fn atr_multiples(mut self, quick: f64, extended: f64, stop: f64) -> Self {
        self.config.target_quick_atr = quick;
        self.config.target_extended_atr = extended;
        self.config.stop_atr = stop;
        self
    }

    pub fn expiration(mut self, window: ExpirationWindow) -> Self {
        self.config.expiration = window;
        self
    }

    /// Enable/disable data validation
    pub fn validate_data(mut self, enable: bool) -> Self {
        self.config.validate_data = enable;
        self
    }

    /// Bound batch scans to `threads` workers
    pub fn max_concurrency(mut self, threads: usize) -> Self {
        self.config.max_concurrency = Some(threads);
        self
    }

    /// Build the scanner
    pub fn build(self) -> Result<Scanner> {
        Scanner::new(self.config)
    }
}

// ============================================================
// PARALLEL SCANNING
// ============================================================

use rayon::prelude::*;

/// Progress is logged every this many symbols during [`scan_universe`]
pub const PROGRESS_EVERY: usize = 50;

/// A symbol whose evaluation failed
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolFailure {
    pub symbol: String,
    pub error: ScanError,
}

/// Per-symbol outcomes of a batch scan, in no particular order
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub signals: Vec<Signal>,
    pub no_signal: Vec<String>,
    pub failures: Vec<SymbolFailure>,
}

impl ScanReport {
    pub fn from_outcomes(outcomes: impl IntoIterator<Item = (String, Result<Evaluation>)>) -> Self {
        let mut report = Self::default();

        for (symbol, outcome) in outcomes {
            match outcome {
                Ok(Evaluation::Signal(signal)) => report.signals.push(*signal),
                Ok(Evaluation::NoSignal(_)) => report.no_signal.push(symbol),
                Err(error) => {
                    warn!(symbol = %symbol, error = %error, "Symbol skipped");
                    report.failures.push(SymbolFailure { symbol, error });
                },
            }
        }

        info!(
            signals = report.signals.len(),
            no_signal = report.no_signal.len(),
            failures = report.failures.len(),
            "Scan complete"
        );
        report
    }

    pub fn total(&self) -> usize {
        self.signals.len() + self.no_signal.len() + self.failures.len()
    }

    /// Signals by rating, highest first; ties by ticker
    pub fn sorted_signals(&self) -> Vec<&Signal> {
        let mut sorted: Vec<&Signal> = self.signals.iter().collect();
        sorted.sort_by(|a, b| b.rating.cmp(&a.rating).then_with(|| a.ticker.cmp(&b.ticker)));
        sorted
    }
}

/// Parallel scanning of instruments whose bars are already loaded
pub fn scan_parallel<'a, T, I>(scanner: &Scanner, instruments: I) -> Result<ScanReport>
where
    T: OHLCV + Sync + 'a,
    I: IntoParallelIterator<Item = (&'a str, &'a [T])> + Send,
{
    let outcomes = scanner.install(|| {
        instruments
            .into_par_iter()
            .map(|(symbol, bars)| (symbol.to_string(), scanner.evaluate(symbol, bars)))
            .collect::<Vec<_>>()
    })?;
    Ok(ScanReport::from_outcomes(outcomes))
}

/// Synchronous historical-bar provider
pub trait BarSource: Sync {
    type Bar: OHLCV;
    type Error: std::fmt::Display;

    /// Daily bars for `symbol`, oldest first
    fn fetch(&self, symbol: &str) -> std::result::Result<Vec<Self::Bar>, Self::Error>;
}

/// Fetch and evaluate every symbol in parallel.
///
/// Fetch failures are recorded as [`ScanError::DataSource`] for that symbol only.
pub fn scan_universe<S, Sym>(scanner: &Scanner, source: &S, symbols: &[Sym]) -> Result<ScanReport>
where
    S: BarSource,
    Sym: AsRef<str> + Sync,
{
    let total = symbols.len();
    let scanned = AtomicUsize::new(0);
    info!(total, "Scanning universe");

    let outcomes = scanner.install(|| {
        symbols
            .par_iter()
            .map(|symbol| {
                let symbol = symbol.as_ref();
                let outcome = source
                    .fetch(symbol)
                    .map_err(|e| ScanError::DataSource(e.to_string()))
                    .and_then(|bars| scanner.evaluate(symbol, &bars));

                let n = scanned.fetch_add(1, Ordering::Relaxed) + 1;
                if n % PROGRESS_EVERY == 0 {
                    info!(scanned = n, total, "Scan progress");
                }
                (symbol.to_string(), outcome)
            })
            .collect::<Vec<_>>()
    })?;
    Ok(ScanReport::from_outcomes(outcomes))
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;

    fn day(i: u64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Days::new(i)
    }

    fn flat_bars(n: usize) -> Vec<Bar> {
        (0..n)
            .map(|i| Bar::new(day(i as u64), 10.0, 10.5, 9.5, 10.0, 1_000.0))
            .collect()
    }

    /// 25 flat bars, four red days, then a 3x-volume engulfing day
    fn engulfing_bars() -> Vec<Bar> {
        let mut bars = flat_bars(25);
        let tail = [
            (10.4, 10.0, 1_000.0),
            (10.0, 9.5, 1_000.0),
            (9.5, 9.0, 1_000.0),
            (9.0, 8.7, 1_000.0),
            (8.5, 9.3, 3_000.0),
        ];
        for (i, (o, c, v)) in tail.into_iter().enumerate() {
            let date = day(25 + i as u64);
            bars.push(Bar::new(date, o, o.max(c) + 0.2, o.min(c) - 0.2, c, v));
        }
        bars
    }

    #[test]
    fn test_period_validation() {
        assert!(Period::new(1).is_ok());
        assert!(Period::new(0).is_err());
    }

    #[test]
    fn test_ohlcv_ext() {
        let bar = Bar::new(day(0), 100.0, 110.0, 90.0, 105.0, 1.0);
        assert_eq!(bar.body(), 5.0);
        assert_eq!(bar.range(), 20.0);
        assert!(bar.is_bullish());
        assert!(!bar.is_bearish());
        assert!(bar.validate().is_ok());
    }

    #[test]
    fn test_bar_validation() {
        let bad = Bar::new(day(0), 100.0, 90.0, 110.0, 105.0, 1.0);
        assert!(bad.validate().is_err());
        let nan = Bar::new(day(0), f64::NAN, 110.0, 90.0, 105.0, 1.0);
        assert!(nan.validate().is_err());
        let neg = Bar::new(day(0), 100.0, 110.0, 90.0, 105.0, -1.0);
        assert!(neg.validate().is_err());
    }

    #[test]
    fn test_builder_defaults() {
        let scanner = ScannerBuilder::new().build().unwrap();
        assert_eq!(scanner.config(), &ScannerConfig::default());
    }

    #[test]
    fn test_builder_rejects_invalid() {
        assert!(ScannerBuilder::new().min_red_days(9).build().is_err());
        assert!(ScannerBuilder::new().max_concurrency(0).build().is_err());
        assert!(ScannerBuilder::new().atr_multiples(3.0, 2.0, 1.0).build().is_err());
    }

    #[test]
    fn test_insufficient_history() {
        let scanner = ScannerBuilder::new().build().unwrap();
        let err = scanner.evaluate("X", &flat_bars(24)).unwrap_err();
        assert_eq!(err, ScanError::InsufficientHistory { need: 25, got: 24 });
        assert!(err.is_data_sufficiency());
    }

    #[test]
    fn test_flat_series_has_no_signal() {
        let scanner = ScannerBuilder::new().build().unwrap();
        let eval = scanner.evaluate("X", &flat_bars(40)).unwrap();
        assert!(matches!(eval, Evaluation::NoSignal(Rejection::TooFewRedDays { found: 0, .. })));
    }

    #[test]
    fn test_signal_fields() {
        let scanner = ScannerBuilder::new().build().unwrap();
        let bars = engulfing_bars();
        let signal = scanner
            .evaluate("ABC", &bars)
            .unwrap()
            .into_signal()
            .expect("signal");

        assert_eq!(signal.ticker, "ABC");
        assert_eq!(signal.date, day(29));
        assert_eq!(signal.entry_price, 9.3);
        assert_eq!(signal.current_price, 9.3);
        assert_eq!(signal.red_days, 4);
        assert_eq!(signal.distance_from_ma50, -999.0);
        assert!((signal.engulfing_low - 8.3).abs() < 1e-9);
        assert!(signal.target_quick < signal.target_extended);
        assert!(signal.stop_loss < signal.entry_price);
        assert_eq!(signal.suggested_strikes.atm, 10.0);
        // body 9.4% -> 2.0, volume 2.7x -> 2.0, MA undefined -> 0.0
        assert_eq!(signal.rating.get(), 4);
        assert!(!signal.exp_dates.is_empty());
        assert!(signal.risk_reward().is_some());
    }

    #[test]
    fn test_validation_catches_unordered_dates() {
        let scanner = ScannerBuilder::new().build().unwrap();
        let mut bars = flat_bars(30);
        bars[10].date = bars[9].date;
        assert_eq!(scanner.evaluate("X", &bars), Err(ScanError::UnorderedDates { index: 10 }));

        let lenient = ScannerBuilder::new().validate_data(false).build().unwrap();
        assert!(lenient.evaluate("X", &bars).is_ok());
    }

    #[test]
    fn test_validation_reports_bar_index() {
        let scanner = ScannerBuilder::new().build().unwrap();
        let mut bars = flat_bars(30);
        bars[7].high = 1.0;
        assert_eq!(
            scanner.evaluate("X", &bars),
            Err(ScanError::InvalidBar {
                index: 7,
                reason: "high < low"
            })
        );
    }

    #[test]
    fn test_evaluate_as_of() {
        let scanner = ScannerBuilder::new().build().unwrap();
        let bars = engulfing_bars();
        // 2024-07-01 is a Monday
        let monday = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        let signal = scanner
            .evaluate_as_of("ABC", &bars, monday)
            .unwrap()
            .into_signal()
            .unwrap();
        assert_eq!(
            signal.exp_dates,
            vec![
                NaiveDate::from_ymd_opt(2024, 7, 5).unwrap(),
                NaiveDate::from_ymd_opt(2024, 7, 12).unwrap()
            ]
        );
        assert_eq!(signal.date, day(29));
    }

    #[test]
    fn test_parallel_scan() {
        let scanner = ScannerBuilder::new().build().unwrap();
        let hit = engulfing_bars();
        let flat = flat_bars(40);
        let short = flat_bars(10);

        let instruments: Vec<(&str, &[Bar])> = vec![("HIT", &hit), ("FLAT", &flat), ("SHORT", &short)];
        let report = scan_parallel(&scanner, instruments).unwrap();

        assert_eq!(report.total(), 3);
        assert_eq!(report.signals.len(), 1);
        assert_eq!(report.signals[0].ticker, "HIT");
        assert_eq!(report.no_signal, vec!["FLAT".to_string()]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].symbol, "SHORT");
    }

    #[test]
    fn test_parallel_scan_bounded_pool() {
        let scanner = ScannerBuilder::new().max_concurrency(2).build().unwrap();
        let hit = engulfing_bars();
        let instruments: Vec<(&str, &[Bar])> = (0..8).map(|_| ("HIT", hit.as_slice())).collect();
        let report = scan_parallel(&scanner, instruments).unwrap();
        assert_eq!(report.signals.len(), 8);
    }

    #[test]
    fn test_sorted_signals() {
        let scanner = ScannerBuilder::new().build().unwrap();
        let base = scanner
            .evaluate("A", &engulfing_bars())
            .unwrap()
            .into_signal()
            .unwrap();

        let mut report = ScanReport::default();
        for (ticker, rating) in [("B", 2), ("A", 5), ("C", 5), ("D", 3)] {
            let mut s = base.clone();
            s.ticker = ticker.to_string();
            s.rating = Rating::new(rating).unwrap();
            report.signals.push(s);
        }

        let order: Vec<&str> = report.sorted_signals().iter().map(|s| s.ticker.as_str()).collect();
        assert_eq!(order, vec!["A", "C", "D", "B"]);
    }
}
