//! Signal strength rating
//!
//! Three independent sub-scores are summed and bucketed into a 1-5 rating:
//!
//! | component      | tiers                                          | max |
//! |----------------|------------------------------------------------|-----|
//! | volume ratio   | >=1.5: 2.0, >=1.3: 1.5, >=1.2: 1.0             | 2.0 |
//! | body size %    | >=3.0: 2.0, >=2.0: 1.5, >=1.5: 1.0, >=1.0: 0.5 | 2.0 |
//! | MA50 distance  | >-10: 1.0, >-15: 0.7, >-20: 0.4                | 1.0 |
//!
//! Points are kept in tenths so bucket boundaries compare exactly.

use serde::{Deserialize, Serialize};

use crate::{Result, ScanError};

/// (minimum volume ratio, points in tenths), checked top-down, inclusive
pub const VOLUME_TIERS: [(f64, u32); 3] = [(1.5, 20), (1.3, 15), (1.2, 10)];

/// (minimum body size %, points in tenths), checked top-down, inclusive
pub const BODY_TIERS: [(f64, u32); 4] = [(3.0, 20), (2.0, 15), (1.5, 10), (1.0, 5)];

/// (exclusive lower bound on MA50 distance %, points in tenths), checked top-down
pub const MA_DISTANCE_TIERS: [(f64, u32); 3] = [(-10.0, 10), (-15.0, 7), (-20.0, 4)];

/// (minimum total in tenths, rating), checked top-down; anything lower rates 1
pub const RATING_THRESHOLDS: [(u32, u8); 4] = [(45, 5), (35, 4), (25, 3), (15, 2)];

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// Signal rating in 1..=5
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rating(u8);

impl Rating {
    pub fn new(value: u8) -> Result<Self> {
        if !(MIN_RATING..=MAX_RATING).contains(&value) {
            return Err(ScanError::OutOfRange {
                field: "Rating",
                value: f64::from(value),
                min: f64::from(MIN_RATING),
                max: f64::from(MAX_RATING),
            });
        }
        Ok(Self(value))
    }

    #[inline]
    pub fn get(self) -> u8 {
        self.0
    }

    /// One star per rating point
    pub fn stars(self) -> String {
        "\u{2b50}".repeat(usize::from(self.0))
    }
}

impl Serialize for Rating {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> Deserialize<'de> for Rating {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = u8::deserialize(d)?;
        Rating::new(value).map_err(serde::de::Error::custom)
    }
}

/// Per-component points behind a rating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreBreakdown {
    volume: u32,
    body: u32,
    ma_distance: u32,
}

impl ScoreBreakdown {
    #[inline]
    pub fn volume(&self) -> f64 {
        f64::from(self.volume) / 10.0
    }

    #[inline]
    pub fn body(&self) -> f64 {
        f64::from(self.body) / 10.0
    }

    #[inline]
    pub fn ma_distance(&self) -> f64 {
        f64::from(self.ma_distance) / 10.0
    }

    /// Total score in 0.0..=5.0
    #[inline]
    pub fn total(&self) -> f64 {
        f64::from(self.total_tenths()) / 10.0
    }

    #[inline]
    fn total_tenths(&self) -> u32 {
        self.volume + self.body + self.ma_distance
    }

    pub fn rating(&self) -> Rating {
        let total = self.total_tenths();
        let value = RATING_THRESHOLDS
            .iter()
            .find(|(min, _)| total >= *min)
            .map_or(MIN_RATING, |(_, rating)| *rating);
        Rating(value)
    }
}

/// Maps the engulfing-day metrics to a [`Rating`]. Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalScorer;

impl SignalScorer {
    pub fn breakdown(&self, body_size_pct: f64, volume_ratio: f64, distance_from_ma50: f64) -> ScoreBreakdown {
        ScoreBreakdown {
            volume: tier_points(&VOLUME_TIERS, |min| volume_ratio >= min),
            body: tier_points(&BODY_TIERS, |min| body_size_pct >= min),
            ma_distance: tier_points(&MA_DISTANCE_TIERS, |bound| distance_from_ma50 > bound),
        }
    }

    #[inline]
    pub fn rate(&self, body_size_pct: f64, volume_ratio: f64, distance_from_ma50: f64) -> Rating {
        self.breakdown(body_size_pct, volume_ratio, distance_from_ma50)
            .rating()
    }
}

// NaN fails every comparison and scores zero.
#[inline]
fn tier_points(tiers: &[(f64, u32)], passes: impl Fn(f64) -> bool) -> u32 {
    tiers
        .iter()
        .find(|(bound, _)| passes(*bound))
        .map_or(0, |(_, points)| *points)
}
