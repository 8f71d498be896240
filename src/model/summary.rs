//! Reduction of posterior draws to the change-point summary artifact.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::PriceSeries;
use crate::error::{AnalysisError, Result};
use crate::ingest::events::{nearest_event, KeyEvent};
use crate::model::switchpoint::Trace;

/// The change-point summary served by `/api/change_points`.
///
/// All derived quantities are plain numbers; formatting is left to the
/// consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangePointSummary {
    /// Calendar date of the detected structural break.
    pub change_point_date: NaiveDate,
    /// Posterior-mean switch index into the analysis-return series.
    pub change_point_index: usize,
    /// Average daily price change before the break, in percent:
    /// `(exp(mu_before) - 1) * 100`.
    pub mean_log_return_before_pct: f64,
    /// Average daily price change after the break, in percent.
    pub mean_log_return_after_pct: f64,
    /// Shift in average daily change across the break, in percentage points.
    pub mean_change_pct: f64,
    /// Posterior-mean volatility (log-return standard deviation) before.
    pub volatility_before: f64,
    /// Posterior-mean volatility after.
    pub volatility_after: f64,
    /// Relative volatility change across the break, in percent.
    pub volatility_change_pct: f64,
    /// Posterior probability that the mean return increased.
    pub prob_mean_increase: f64,
    /// Posterior probability that the volatility increased.
    pub prob_vol_increase: f64,
    /// Nearest curated event to the detected date, as a hypothesis for the
    /// break, if one falls within the association window.
    pub associated_event: Option<String>,
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Fraction of paired draws where `after` exceeds `before`.
fn prob_greater(after: &[f64], before: &[f64]) -> f64 {
    let hits = after
        .iter()
        .zip(before)
        .filter(|(a, b)| a > b)
        .count();
    hits as f64 / after.len() as f64
}

/// Reduce a posterior trace to the summary artifact.
///
/// The index estimate is the floor of the pooled posterior mean of `tau`,
/// mapped back through the dropped first return to a calendar date.
pub fn summarize(
    trace: &Trace,
    series: &PriceSeries,
    events: &[KeyEvent],
    event_window_days: i64,
) -> Result<ChangePointSummary> {
    if trace.is_empty() {
        return Err(AnalysisError::EmptyData);
    }

    let tau = trace.pooled_tau();
    let tau_mean = tau.iter().sum::<usize>() as f64 / tau.len() as f64;
    let change_point_index = tau_mean as usize;
    let change_point_date = series.date_for_analysis_index(change_point_index)?;

    let mu_before = trace.pooled_mu_before();
    let mu_after = trace.pooled_mu_after();
    let sigma_before = trace.pooled_sigma_before();
    let sigma_after = trace.pooled_sigma_after();

    let mu_before_mean = mean(&mu_before);
    let mu_after_mean = mean(&mu_after);
    let sigma_before_mean = mean(&sigma_before);
    let sigma_after_mean = mean(&sigma_after);

    let mean_before_pct = (mu_before_mean.exp() - 1.0) * 100.0;
    let mean_after_pct = (mu_after_mean.exp() - 1.0) * 100.0;
    let volatility_change_pct =
        (sigma_after_mean - sigma_before_mean) / sigma_before_mean * 100.0;

    let associated_event = nearest_event(events, change_point_date, event_window_days)
        .map(|e| format!("{}: {} ({})", e.date, e.description, e.impact));

    Ok(ChangePointSummary {
        change_point_date,
        change_point_index,
        mean_log_return_before_pct: mean_before_pct,
        mean_log_return_after_pct: mean_after_pct,
        mean_change_pct: mean_after_pct - mean_before_pct,
        volatility_before: sigma_before_mean,
        volatility_after: sigma_after_mean,
        volatility_change_pct,
        prob_mean_increase: prob_greater(&mu_after, &mu_before),
        prob_vol_increase: prob_greater(&sigma_after, &sigma_before),
        associated_event,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::events::curated_events;
    use crate::model::switchpoint::ChainDraws;
    use approx::assert_relative_eq;

    fn make_series(n: usize) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let dates = (0..n)
            .map(|i| start + chrono::Days::new(i as u64))
            .collect();
        let prices = (0..n).map(|i| 50.0 + i as f64).collect();
        PriceSeries::new(dates, prices).unwrap()
    }

    fn constant_trace(tau: usize, n_obs: usize) -> Trace {
        let draws = 100;
        let chain = ChainDraws {
            tau: vec![tau; draws],
            mu_before: vec![0.001; draws],
            mu_after: vec![-0.002; draws],
            sigma_before: vec![0.01; draws],
            sigma_after: vec![0.03; draws],
        };
        Trace {
            chains: vec![chain.clone(), chain],
            n_observations: n_obs,
        }
    }

    #[test]
    fn summary_reduces_constant_draws_exactly() {
        let series = make_series(20);
        let trace = constant_trace(10, 19);
        let summary = summarize(&trace, &series, &[], 90).unwrap();

        assert_eq!(summary.change_point_index, 10);
        // Analysis index 10 maps to observation 11.
        assert_eq!(summary.change_point_date, series.dates()[11]);

        assert_relative_eq!(
            summary.mean_log_return_before_pct,
            (0.001f64.exp() - 1.0) * 100.0,
            epsilon = 1e-12
        );
        assert_relative_eq!(summary.volatility_before, 0.01, epsilon = 1e-12);
        assert_relative_eq!(summary.volatility_after, 0.03, epsilon = 1e-12);
        assert_relative_eq!(summary.volatility_change_pct, 200.0, epsilon = 1e-9);

        // mu_after < mu_before in every draw; sigma_after > sigma_before.
        assert_relative_eq!(summary.prob_mean_increase, 0.0, epsilon = 1e-12);
        assert_relative_eq!(summary.prob_vol_increase, 1.0, epsilon = 1e-12);
        assert!(summary.associated_event.is_none());
    }

    #[test]
    fn summary_associates_a_nearby_event() {
        // Series spanning early 2020: the COVID outbreak event is in window.
        let start = NaiveDate::from_ymd_opt(2020, 2, 20).unwrap();
        let dates: Vec<NaiveDate> = (0..40)
            .map(|i| start + chrono::Days::new(i as u64))
            .collect();
        let prices = (0..40).map(|i| 60.0 - i as f64).collect();
        let series = PriceSeries::new(dates, prices).unwrap();

        let trace = constant_trace(15, 39);
        let summary = summarize(&trace, &series, &curated_events(), 90).unwrap();

        let event = summary.associated_event.unwrap();
        assert!(event.contains("COVID-19"), "unexpected event: {event}");
    }

    #[test]
    fn empty_trace_is_an_error() {
        let series = make_series(10);
        let trace = Trace {
            chains: vec![],
            n_observations: 9,
        };
        assert!(matches!(
            summarize(&trace, &series, &[], 90),
            Err(AnalysisError::EmptyData)
        ));
    }

    #[test]
    fn summary_serializes_stable_field_names() {
        let series = make_series(20);
        let trace = constant_trace(10, 19);
        let summary = summarize(&trace, &series, &[], 90).unwrap();

        let json = serde_json::to_value(&summary).unwrap();
        for key in [
            "change_point_date",
            "change_point_index",
            "mean_log_return_before_pct",
            "mean_log_return_after_pct",
            "volatility_before",
            "volatility_after",
            "volatility_change_pct",
            "prob_mean_increase",
            "prob_vol_increase",
        ] {
            assert!(json.get(key).is_some(), "missing field {key}");
        }
    }
}
