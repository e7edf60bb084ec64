//! Option strike suggestions around the entry price.

use serde::{Deserialize, Serialize};

/// Below this price strikes are listed every 2.5
pub const LOW_PRICE_TIER: f64 = 50.0;
/// Below this price (and at or above [`LOW_PRICE_TIER`]) strikes are listed every 5
pub const MID_PRICE_TIER: f64 = 200.0;

pub const LOW_TIER_INCREMENT: f64 = 2.5;
pub const MID_TIER_INCREMENT: f64 = 5.0;
pub const HIGH_TIER_INCREMENT: f64 = 10.0;

/// In-the-money, at-the-money and out-of-the-money call strikes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrikeTriple {
    #[serde(rename = "ITM")]
    pub itm: f64,
    #[serde(rename = "ATM")]
    pub atm: f64,
    #[serde(rename = "OTM")]
    pub otm: f64,
    pub increment: f64,
}

/// Strike spacing for a given underlying price.
#[inline]
pub fn strike_increment(price: f64) -> f64 {
    if price < LOW_PRICE_TIER {
        LOW_TIER_INCREMENT
    } else if price < MID_PRICE_TIER {
        MID_TIER_INCREMENT
    } else {
        HIGH_TIER_INCREMENT
    }
}

/// Suggest strikes around `price`.
///
/// ATM is the nearest multiple of the tier increment, ties rounding to the even
/// multiple (62.5 at increment 5 gives 60, 67.5 gives 70). ATM never goes below two
/// increments so ITM stays a positive strike for very cheap underlyings.
pub fn suggest_strikes(price: f64) -> StrikeTriple {
    let increment = strike_increment(price);
    let steps = (price / increment).round_ties_even().max(2.0);
    let atm = steps * increment;

    StrikeTriple {
        itm: round_cents(atm - increment),
        atm: round_cents(atm),
        otm: round_cents(atm + increment),
        increment,
    }
}

#[inline]
pub(crate) fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
