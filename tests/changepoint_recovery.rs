//! End-to-end inference on synthetic series with a known structural break.

use brent_changepoint::core::PriceSeries;
use brent_changepoint::ingest::events::curated_events;
use brent_changepoint::model::{detect_changepoint, SamplerConfig};
use chrono::NaiveDate;
use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::SeedableRng;
use statrs::distribution::Normal;

/// Build a daily price series whose log-returns switch regime at
/// analysis index `break_index`.
fn synthetic_series(
    n_before: usize,
    n_after: usize,
    quiet_sd: f64,
    wild_sd: f64,
    seed: u64,
) -> PriceSeries {
    let mut rng = StdRng::seed_from_u64(seed);
    let quiet = Normal::new(0.0005, quiet_sd).unwrap();
    let wild = Normal::new(-0.002, wild_sd).unwrap();

    let mut returns: Vec<f64> = (0..n_before).map(|_| quiet.sample(&mut rng)).collect();
    returns.extend((0..n_after).map(|_| wild.sample(&mut rng)));

    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let mut prices = vec![50.0];
    for r in &returns {
        let last = *prices.last().unwrap();
        prices.push(last * r.exp());
    }
    let dates = (0..prices.len())
        .map(|i| start + chrono::Days::new(i as u64))
        .collect();

    PriceSeries::new(dates, prices).unwrap()
}

#[test]
fn recovers_break_location_and_volatility_shift() {
    let series = synthetic_series(80, 80, 0.01, 0.04, 42);
    let config = SamplerConfig::new(400)
        .with_tune(300)
        .with_chains(2)
        .with_seed(7);

    let summary = detect_changepoint(&series, &[], &config).unwrap();

    assert!(
        summary.change_point_index >= 72 && summary.change_point_index <= 88,
        "detected index {} far from true break at 80",
        summary.change_point_index
    );
    assert!(summary.volatility_after > summary.volatility_before);
    assert!(
        summary.prob_vol_increase > 0.9,
        "prob_vol_increase {} should be near 1",
        summary.prob_vol_increase
    );
    assert!(summary.prob_mean_increase >= 0.0 && summary.prob_mean_increase <= 1.0);
    assert!(summary.volatility_change_pct > 100.0);
}

#[test]
fn associates_curated_event_near_the_break() {
    // Break at analysis index 80 lands around 2020-03-22, within the
    // association window of the COVID outbreak event (2020-03-08).
    let series = synthetic_series(80, 80, 0.01, 0.05, 3);
    let config = SamplerConfig::new(300)
        .with_tune(300)
        .with_chains(2)
        .with_seed(11);

    let summary = detect_changepoint(&series, &curated_events(), &config).unwrap();

    let event = summary
        .associated_event
        .expect("an event should fall within the window");
    assert!(event.contains("2020-"), "unexpected event: {event}");
}

#[test]
fn deterministic_summary_under_fixed_seed() {
    let series = synthetic_series(60, 60, 0.01, 0.04, 9);
    let config = SamplerConfig::new(200).with_tune(200).with_seed(5);

    let a = detect_changepoint(&series, &[], &config).unwrap();
    let b = detect_changepoint(&series, &[], &config).unwrap();

    assert_eq!(a, b);
}

#[test]
fn too_short_series_aborts() {
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let dates: Vec<NaiveDate> = (0..4).map(|i| start + chrono::Days::new(i)).collect();
    let series = PriceSeries::new(dates, vec![50.0, 51.0, 50.5, 50.8]).unwrap();

    // Only 3 analysis returns; the model needs at least 4.
    let result = detect_changepoint(&series, &[], &SamplerConfig::new(50).with_tune(50));
    assert!(matches!(
        result,
        Err(brent_changepoint::AnalysisError::InsufficientData { needed: 4, got: 3 })
    ));
}
