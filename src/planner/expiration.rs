//! Option expiration suggestions
//!
//! Standard listed equity options expire on Fridays. A window profile says how far
//! out (in calendar days from "today") an expiration may land and how many to
//! suggest. Two profiles are used: [`ExpirationWindow::QUICK`] for 3-5 day holds
//! and [`ExpirationWindow::EXTENDED`] for positions held toward the 2.5 ATR target.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::{Result, ScanError};

/// Weekday of standard listed-option expirations
pub const EXPIRATION_WEEKDAY: Weekday = Weekday::Fri;

/// Forward scan bound. A window reaching past it is a configuration error.
pub const MAX_EXPIRATION_SCAN_DAYS: u32 = 60;

/// Inclusive day-offset window and number of expirations to suggest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpirationWindow {
    pub min_days: u32,
    pub max_days: u32,
    pub count: usize,
}

impl ExpirationWindow {
    /// 1-2 weeks out, next two Fridays
    pub const QUICK: Self = Self {
        min_days: 3,
        max_days: 14,
        count: 2,
    };

    /// 10-35 days out, up to three Fridays
    pub const EXTENDED: Self = Self {
        min_days: 10,
        max_days: 35,
        count: 3,
    };

    pub fn validate(&self) -> Result<()> {
        if self.count == 0 {
            return Err(ScanError::InvalidConfig(
                "expiration count must be > 0".to_string(),
            ));
        }
        if self.min_days > self.max_days {
            return Err(ScanError::InvalidConfig(format!(
                "expiration window {}..={} is empty",
                self.min_days, self.max_days
            )));
        }
        if self.max_days > MAX_EXPIRATION_SCAN_DAYS {
            return Err(ScanError::OutOfRange {
                field: "expiration.max_days",
                value: f64::from(self.max_days),
                min: f64::from(self.min_days),
                max: f64::from(MAX_EXPIRATION_SCAN_DAYS),
            });
        }
        Ok(())
    }

    #[inline]
    pub fn contains(&self, offset: u32) -> bool {
        (self.min_days..=self.max_days).contains(&offset)
    }
}

impl Default for ExpirationWindow {
    fn default() -> Self {
        Self::QUICK
    }
}

/// Suggest expiration dates after `today` inside `window`.
///
/// Walks forward one calendar day at a time, keeping every expiration weekday whose
/// offset lies in the window, until `window.count` dates are found or the offset
/// leaves the window. Dates are strictly increasing. Fails with
/// [`ScanError::NoExpirationFound`] if the walk collects nothing, which only happens
/// for windows narrower than a week that miss every Friday.
pub fn suggest_expirations(today: NaiveDate, window: &ExpirationWindow) -> Result<Vec<NaiveDate>> {
    let not_found = || ScanError::NoExpirationFound {
        today,
        min_days: window.min_days,
        max_days: window.max_days,
    };

    let mut dates = Vec::with_capacity(window.count);
    let last_offset = window.max_days.min(MAX_EXPIRATION_SCAN_DAYS);

    for offset in 1..=last_offset {
        if dates.len() >= window.count {
            break;
        }
        let Some(date) = today.checked_add_days(Days::new(u64::from(offset))) else {
            break;
        };
        if date.weekday() == EXPIRATION_WEEKDAY && window.contains(offset) {
            dates.push(date);
        }
    }

    if dates.is_empty() {
        return Err(not_found());
    }
    Ok(dates)
}
