//! Property tests for scoring, planning and the evaluation gates.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use engulfscan::planner::{strike_increment, suggest_expirations, suggest_strikes};
use engulfscan::prelude::*;
use proptest::prelude::*;

fn bar(i: usize, o: f64, c: f64, v: f64) -> Bar {
    let date = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap() + Days::new(i as u64);
    Bar::new(date, o, o.max(c) * 1.02, o.min(c) * 0.98, c, v)
}

/// Flat history then four red days and an engulfing day, all scaled by `k`
fn scaled_setup(k: f64, volume: f64) -> Vec<Bar> {
    let mut specs: Vec<(f64, f64, f64)> = (0..25).map(|_| (10.0, 10.0, 1_000.0)).collect();
    specs.extend([
        (10.4, 10.0, 1_000.0),
        (10.0, 9.5, 1_000.0),
        (9.5, 9.0, 1_000.0),
        (9.0, 8.7, 1_000.0),
        (8.5, 9.3, volume),
    ]);
    specs
        .into_iter()
        .enumerate()
        .map(|(i, (o, c, v))| bar(i, o * k, c * k, v))
        .collect()
}

proptest! {
    #[test]
    fn rating_in_range(body in -5.0f64..20.0, volume in 0.0f64..10.0, distance in -60.0f64..60.0) {
        let r = SignalScorer.rate(body, volume, distance).get();
        prop_assert!((1..=5).contains(&r));
    }

    #[test]
    fn rating_monotonic_in_each_input(
        body in 0.0f64..5.0,
        volume in 0.0f64..3.0,
        distance in -30.0f64..10.0,
        bump in 0.0f64..5.0,
    ) {
        let s = SignalScorer;
        let base = s.rate(body, volume, distance);
        prop_assert!(s.rate(body + bump, volume, distance) >= base);
        prop_assert!(s.rate(body, volume + bump, distance) >= base);
        prop_assert!(s.rate(body, volume, distance + bump) >= base);
    }

    #[test]
    fn strikes_ordered_on_increment_grid(price in 0.5f64..5_000.0) {
        let strikes = suggest_strikes(price);
        let inc = strike_increment(price);
        prop_assert_eq!(strikes.increment, inc);
        prop_assert!(strikes.itm < strikes.atm);
        prop_assert!(strikes.atm < strikes.otm);
        prop_assert!(strikes.itm > 0.0);
        let steps = strikes.atm / inc;
        prop_assert!((steps - steps.round()).abs() < 1e-9);
        prop_assert!((strikes.otm - strikes.atm - inc).abs() < 1e-9);
        prop_assert!((strikes.atm - strikes.itm - inc).abs() < 1e-9);
    }

    #[test]
    fn expirations_are_fridays_in_window(offset in 0u64..3_650) {
        let today = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + Days::new(offset);
        for window in [ExpirationWindow::QUICK, ExpirationWindow::EXTENDED] {
            let dates = suggest_expirations(today, &window).unwrap();
            prop_assert!(!dates.is_empty());
            prop_assert!(dates.len() <= window.count);
            for d in &dates {
                prop_assert_eq!(d.weekday(), Weekday::Fri);
                let days = (*d - today).num_days();
                prop_assert!(days >= i64::from(window.min_days) && days <= i64::from(window.max_days));
            }
            prop_assert!(dates.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn short_series_never_evaluates(n in 0usize..25) {
        let scanner = ScannerBuilder::new().build().unwrap();
        let bars: Vec<Bar> = (0..n).map(|i| bar(i, 10.0, 10.0, 1_000.0)).collect();
        prop_assert_eq!(
            scanner.evaluate("X", &bars),
            Err(ScanError::InsufficientHistory { need: 25, got: n })
        );
    }

    #[test]
    fn price_scale_keeps_signal(k in 0.1f64..500.0) {
        let scanner = ScannerBuilder::new().build().unwrap();
        let bars = scaled_setup(k, 3_000.0);
        let signal = scanner.evaluate("K", &bars).unwrap().into_signal();
        prop_assert!(signal.is_some());
        let signal = signal.unwrap();
        prop_assert!(signal.target_quick < signal.target_extended);
        prop_assert!(signal.stop_loss < signal.entry_price);
        prop_assert!(signal.weekly_resistance >= signal.entry_price);
        prop_assert_eq!(signal.rating.get(), 4);
        prop_assert!(signal.risk_reward().is_some());
    }

    #[test]
    fn weak_volume_never_signals(volume in 0.0f64..1_200.0) {
        // ratio = v / ((19 * 1000 + v) / 20) < 1.2 for v < 1200
        let scanner = ScannerBuilder::new().build().unwrap();
        let eval = scanner.evaluate("V", &scaled_setup(1.0, volume)).unwrap();
        let is_volume_rejection = matches!(eval, Evaluation::NoSignal(Rejection::VolumeTooLow { .. }));
        prop_assert!(is_volume_rejection);
    }
}
