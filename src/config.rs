//! Scanner configuration
//!
//! Every threshold the pipeline depends on lives in [`ScannerConfig`]. A config is
//! validated once when a [`Scanner`](crate::Scanner) is built and then shared
//! read-only by all per-symbol evaluations.
//!
//! # Example
//!
//! ```rust
//! use engulfscan::config::ScannerConfig;
//!
//! let config = ScannerConfig::from_toml_str(
//!   r#"
//!     min_volume_ratio = 1.5
//!
//!     [expiration]
//!     min_days = 10
//!     max_days = 35
//!     count = 3
//!   "#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.min_volume_ratio, 1.5);
//! assert_eq!(config.min_red_days, 3);
//! ```

use serde::{Deserialize, Serialize};

use crate::{planner::ExpirationWindow, Period, Result, ScanError};

// ============================================================
// DEFAULTS
// ============================================================

/// Bars required before a symbol is evaluated at all
pub const MIN_HISTORY: usize = 25;
/// Trailing bars inspected by the pattern detector (4 setup bars + the engulfing bar)
pub const RECENT_WINDOW: usize = 5;
/// Red days required among the setup bars
pub const MIN_RED_DAYS: usize = 3;
/// Minimum engulfing body, percent of open
pub const MIN_BODY_PCT: f64 = 1.0;
/// Minimum engulfing-day volume over the trailing average
pub const MIN_VOLUME_RATIO: f64 = 1.2;

pub const MA_SHORT_WINDOW: usize = 20;
pub const MA_LONG_WINDOW: usize = 50;
pub const ATR_WINDOW: usize = 14;
pub const VOLUME_WINDOW: usize = 20;
/// Trailing bars scanned for the weekly resistance high
pub const RESISTANCE_WINDOW: usize = 20;

/// Quick target: entry + 1.5 ATR
pub const TARGET_QUICK_ATR: f64 = 1.5;
/// Extended target: entry + 2.5 ATR
pub const TARGET_EXTENDED_ATR: f64 = 2.5;
/// Stop: engulfing low - 1.5 ATR
pub const STOP_ATR: f64 = 1.5;
/// Rough ATM option leverage over the underlying move
pub const OPTION_LEVERAGE: f64 = 2.5;

// ============================================================
// CONFIG
// ============================================================

/// All tunable thresholds of the scanner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
  pub min_history: usize,
  pub recent_window: Period,
  pub min_red_days: usize,
  pub min_body_pct: f64,
  pub min_volume_ratio: f64,

  pub ma_short_window: Period,
  pub ma_long_window: Period,
  pub atr_window: Period,
  pub volume_window: Period,
  pub resistance_window: Period,

  pub target_quick_atr: f64,
  pub target_extended_atr: f64,
  pub stop_atr: f64,
  pub option_leverage: f64,

  /// Expiration profile used for `Signal::exp_dates`
  pub expiration: ExpirationWindow,

  /// Check bars for NaN, high < low and date ordering before evaluating
  pub validate_data: bool,
  /// Worker threads for batch scans; `None` uses the global rayon pool
  pub max_concurrency: Option<usize>,
}

impl Default for ScannerConfig {
  fn default() -> Self {
    Self {
      min_history: MIN_HISTORY,
      recent_window: Period::new_const(RECENT_WINDOW),
      min_red_days: MIN_RED_DAYS,
      min_body_pct: MIN_BODY_PCT,
      min_volume_ratio: MIN_VOLUME_RATIO,
      ma_short_window: Period::new_const(MA_SHORT_WINDOW),
      ma_long_window: Period::new_const(MA_LONG_WINDOW),
      atr_window: Period::new_const(ATR_WINDOW),
      volume_window: Period::new_const(VOLUME_WINDOW),
      resistance_window: Period::new_const(RESISTANCE_WINDOW),
      target_quick_atr: TARGET_QUICK_ATR,
      target_extended_atr: TARGET_EXTENDED_ATR,
      stop_atr: STOP_ATR,
      option_leverage: OPTION_LEVERAGE,
      expiration: ExpirationWindow::QUICK,
      validate_data: true,
      max_concurrency: None,
    }
  }
}

impl ScannerConfig {
  /// Parse a config from TOML. Missing keys keep their defaults.
  pub fn from_toml_str(input: &str) -> Result<Self> {
    let config: Self = toml::from_str(input).map_err(|e| ScanError::InvalidConfig(e.to_string()))?;
    config.validate()?;
    Ok(config)
  }

  /// Check cross-field consistency.
  pub fn validate(&self) -> Result<()> {
    let recent = self.recent_window.get();
    if recent < 2 {
      return Err(ScanError::InvalidConfig(format!(
        "recent_window must cover at least 2 bars, got {recent}"
      )));
    }
    if self.min_history < recent {
      return Err(ScanError::InvalidConfig(format!(
        "min_history ({}) must be >= recent_window ({recent})",
        self.min_history
      )));
    }
    if self.min_red_days > recent - 1 {
      return Err(ScanError::OutOfRange {
        field: "min_red_days",
        value: self.min_red_days as f64,
        min: 0.0,
        max: (recent - 1) as f64,
      });
    }

    non_negative("min_body_pct", self.min_body_pct)?;
    non_negative("min_volume_ratio", self.min_volume_ratio)?;
    non_negative("target_quick_atr", self.target_quick_atr)?;
    non_negative("target_extended_atr", self.target_extended_atr)?;
    non_negative("stop_atr", self.stop_atr)?;
    non_negative("option_leverage", self.option_leverage)?;

    if self.target_quick_atr >= self.target_extended_atr {
      return Err(ScanError::InvalidConfig(format!(
        "target_quick_atr ({}) must be below target_extended_atr ({})",
        self.target_quick_atr, self.target_extended_atr
      )));
    }

    self.expiration.validate()?;

    if self.max_concurrency == Some(0) {
      return Err(ScanError::InvalidValue("max_concurrency must be > 0"));
    }
    Ok(())
  }
}

fn non_negative(field: &'static str, value: f64) -> Result<()> {
  if !value.is_finite() {
    return Err(ScanError::InvalidValue("threshold cannot be NaN or infinite"));
  }
  if value < 0.0 {
    return Err(ScanError::OutOfRange { field, value, min: 0.0, max: f64::MAX });
  }
  Ok(())
}

// ============================================================
// TESTS
// ============================================================
