//! Parameter metadata for the scanner thresholds
//!
//! This module describes the tunable thresholds of [`ScannerConfig`], enabling:
//! - Grid search over threshold combinations
//! - Parameter documentation
//! - Building configs from flat key/value maps
//!
//! # Example
//!
//! ```rust
//! use engulfscan::params::{ParamMeta, ParameterizedConfig};
//! use engulfscan::config::ScannerConfig;
//!
//! for param in ScannerConfig::param_meta() {
//!     println!("{}: {:?} (default: {})", param.name, param.param_type, param.default);
//! }
//! ```

use std::collections::HashMap;

use crate::{config::ScannerConfig, Result, ScanError};

// ============================================================
// PARAMETER TYPES
// ============================================================

/// Type of parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
  /// Non-negative real threshold or multiplier
  Threshold,
  /// Non-negative integer count
  Count,
}

/// Metadata for a single tunable parameter
#[derive(Debug, Clone)]
pub struct ParamMeta {
  /// Parameter name, matching the `ScannerConfig` field (e.g., "min_volume_ratio")
  pub name: &'static str,
  pub param_type: ParamType,
  pub default: f64,
  /// Range for optimization: (min, max, step)
  pub range: (f64, f64, f64),
  pub description: &'static str,
}

impl ParamMeta {
  pub const fn threshold(
    name: &'static str,
    default: f64,
    range: (f64, f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Threshold, default, range, description }
  }

  pub const fn count(
    name: &'static str,
    default: f64,
    range: (f64, f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Count, default, range, description }
  }

  /// Generate all values for grid search
  pub fn generate_grid(&self) -> Vec<f64> {
    let (min, max, step) = self.range;
    let mut values = Vec::new();
    let mut i = 0u32;
    loop {
      let v = min + step * f64::from(i);
      if v > max + 1e-9 {
        break;
      }
      values.push(v);
      i += 1;
    }
    values
  }

  /// Validate a value for this parameter
  pub fn validate(&self, value: f64) -> Result<()> {
    let (min, max, _) = self.range;
    if value.is_nan() || value < min || value > max {
      return Err(ScanError::OutOfRange { field: self.name, value, min, max });
    }
    match self.param_type {
      ParamType::Threshold => Ok(()),
      ParamType::Count => {
        if value.fract() != 0.0 {
          return Err(ScanError::InvalidValue("Count must be a whole number"));
        }
        Ok(())
      },
    }
  }
}

// ============================================================
// PARAMETERIZED CONFIG TRAIT
// ============================================================

/// Types whose thresholds can be discovered and overridden by name.
pub trait ParameterizedConfig: Sized {
  /// Returns metadata for all tunable parameters
  fn param_meta() -> &'static [ParamMeta];

  /// Creates a config from a flat map; missing parameters use their defaults.
  fn with_params(params: &HashMap<&str, f64>) -> Result<Self>;
}

static SCANNER_PARAMS: &[ParamMeta] = &[
  ParamMeta::count("min_red_days", 3.0, (2.0, 4.0, 1.0), "Red setup days required before the engulfing bar"),
  ParamMeta::threshold("min_body_pct", 1.0, (0.5, 3.0, 0.5), "Minimum engulfing body, percent of open"),
  ParamMeta::threshold("min_volume_ratio", 1.2, (1.0, 2.0, 0.1), "Minimum volume over 20-day average"),
  ParamMeta::threshold("target_quick_atr", 1.5, (1.0, 2.0, 0.25), "Quick target distance in ATR"),
  ParamMeta::threshold("target_extended_atr", 2.5, (2.0, 4.0, 0.25), "Extended target distance in ATR"),
  ParamMeta::threshold("stop_atr", 1.5, (0.5, 3.0, 0.25), "Stop distance below the engulfing low in ATR"),
  ParamMeta::threshold("option_leverage", 2.5, (1.0, 4.0, 0.5), "Option move over underlying move"),
];

impl ParameterizedConfig for ScannerConfig {
  fn param_meta() -> &'static [ParamMeta] {
    SCANNER_PARAMS
  }

  fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
    if let Some(unknown) = params.keys().find(|k| !SCANNER_PARAMS.iter().any(|m| m.name == **k)) {
      return Err(ScanError::InvalidConfig(format!("unknown parameter: {unknown}")));
    }

    let defaults = ScannerConfig::default();
    let config = ScannerConfig {
      min_red_days: get_count(params, "min_red_days", defaults.min_red_days)?,
      min_body_pct: get_threshold(params, "min_body_pct", defaults.min_body_pct)?,
      min_volume_ratio: get_threshold(params, "min_volume_ratio", defaults.min_volume_ratio)?,
      target_quick_atr: get_threshold(params, "target_quick_atr", defaults.target_quick_atr)?,
      target_extended_atr: get_threshold(params, "target_extended_atr", defaults.target_extended_atr)?,
      stop_atr: get_threshold(params, "stop_atr", defaults.stop_atr)?,
      option_leverage: get_threshold(params, "option_leverage", defaults.option_leverage)?,
      ..defaults
    };
    config.validate()?;
    Ok(config)
  }
}

// ============================================================
// PARAMETER VALUE HELPERS
// ============================================================

fn meta(key: &str) -> Option<&'static ParamMeta> {
  SCANNER_PARAMS.iter().find(|m| m.name == key)
}

/// Helper to get a threshold from params with default fallback
pub fn get_threshold(params: &HashMap<&str, f64>, key: &str, default: f64) -> Result<f64> {
  match params.get(key).copied() {
    Some(value) => {
      if let Some(m) = meta(key) {
        m.validate(value)?;
      }
      Ok(value)
    },
    None => Ok(default),
  }
}

/// Helper to get a count from params with default fallback
pub fn get_count(params: &HashMap<&str, f64>, key: &str, default: usize) -> Result<usize> {
  match params.get(key).copied() {
    Some(value) => {
      if let Some(m) = meta(key) {
        m.validate(value)?;
      } else if value < 0.0 || value.fract() != 0.0 {
        return Err(ScanError::InvalidValue("Count must be a whole number"));
      }
      Ok(value as usize)
    },
    None => Ok(default),
  }
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_param_meta_defaults_match_config() {
    let config = ScannerConfig::default();
    for m in ScannerConfig::param_meta() {
      let actual = match m.name {
        "min_red_days" => config.min_red_days as f64,
        "min_body_pct" => config.min_body_pct,
        "min_volume_ratio" => config.min_volume_ratio,
        "target_quick_atr" => config.target_quick_atr,
        "target_extended_atr" => config.target_extended_atr,
        "stop_atr" => config.stop_atr,
        "option_leverage" => config.option_leverage,
        other => panic!("unexpected param {other}"),
      };
      assert_eq!(m.default, actual, "{}", m.name);
    }
  }

  #[test]
  fn test_generate_grid() {
    let meta = ParamMeta::threshold("test", 1.2, (1.0, 1.4, 0.2), "Test");

    let grid = meta.generate_grid();
    assert_eq!(grid.len(), 3);
    assert!((grid[0] - 1.0).abs() < 1e-12);
    assert!((grid[1] - 1.2).abs() < 1e-12);
    assert!((grid[2] - 1.4).abs() < 1e-12);
  }

  #[test]
  fn test_validate_threshold() {
    let meta = ParamMeta::threshold("test", 1.2, (1.0, 2.0, 0.1), "Test");

    assert!(meta.validate(1.0).is_ok());
    assert!(meta.validate(2.0).is_ok());
    assert!(meta.validate(0.9).is_err());
    assert!(meta.validate(f64::NAN).is_err());
  }

  #[test]
  fn test_validate_count() {
    let meta = ParamMeta::count("test", 3.0, (2.0, 4.0, 1.0), "Test");

    assert!(meta.validate(3.0).is_ok());
    assert!(meta.validate(3.5).is_err());
    assert!(meta.validate(5.0).is_err());
  }

  #[test]
  fn test_with_params_overrides() {
    let mut params = HashMap::new();
    params.insert("min_volume_ratio", 1.5);
    params.insert("min_red_days", 4.0);

    let config = ScannerConfig::with_params(&params).unwrap();
    assert_eq!(config.min_volume_ratio, 1.5);
    assert_eq!(config.min_red_days, 4);
    assert_eq!(config.min_body_pct, 1.0);
  }

  #[test]
  fn test_with_params_rejects_unknown_key() {
    let mut params = HashMap::new();
    params.insert("min_bodysize", 2.0);
    assert!(matches!(ScannerConfig::with_params(&params), Err(ScanError::InvalidConfig(_))));
  }

  #[test]
  fn test_with_params_rejects_out_of_range() {
    let mut params = HashMap::new();
    params.insert("stop_atr", 10.0);
    assert!(ScannerConfig::with_params(&params).is_err());
  }

  #[test]
  fn test_grid_values_build_valid_configs() {
    for m in ScannerConfig::param_meta() {
      for v in m.generate_grid() {
        let mut params = HashMap::new();
        params.insert(m.name, v);
        assert!(ScannerConfig::with_params(&params).is_ok(), "{} = {v}", m.name);
      }
    }
  }
}
