//! Convergence diagnostics for posterior chains.

use crate::error::{AnalysisError, Result};
use crate::model::switchpoint::Trace;

/// Split R-hat for one monitored parameter.
#[derive(Debug, Clone)]
pub struct RhatReport {
    pub parameter: &'static str,
    pub rhat: f64,
}

/// Gelman-Rubin potential scale reduction with split chains.
///
/// Each chain is split in half; the statistic compares between-half and
/// within-half variance. Values near 1.0 indicate the chains are sampling
/// the same distribution. Returns 1.0 for degenerate (near-constant) chains.
pub fn split_rhat(chains: &[Vec<f64>]) -> f64 {
    let mut halves: Vec<&[f64]> = Vec::with_capacity(chains.len() * 2);
    for chain in chains {
        let mid = chain.len() / 2;
        if mid < 2 {
            continue;
        }
        halves.push(&chain[..mid]);
        halves.push(&chain[mid..mid * 2]);
    }
    if halves.len() < 2 {
        return f64::NAN;
    }

    let len = halves.iter().map(|h| h.len()).min().unwrap_or(0) as f64;
    let means: Vec<f64> = halves
        .iter()
        .map(|h| h.iter().sum::<f64>() / h.len() as f64)
        .collect();
    let grand_mean = means.iter().sum::<f64>() / means.len() as f64;

    let between = len / (halves.len() as f64 - 1.0)
        * means.iter().map(|m| (m - grand_mean).powi(2)).sum::<f64>();
    let within = halves
        .iter()
        .zip(&means)
        .map(|(h, m)| {
            h.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (h.len() as f64 - 1.0)
        })
        .sum::<f64>()
        / halves.len() as f64;

    if within < 1e-12 {
        return 1.0;
    }

    let var_plus = (len - 1.0) / len * within + between / len;
    (var_plus / within).sqrt()
}

/// Check split R-hat for every continuous parameter of the trace.
///
/// Returns the per-parameter reports, or aborts with [`AnalysisError::NotConverged`]
/// naming the worst offender if any exceeds `threshold`.
pub fn check_convergence(trace: &Trace, threshold: f64) -> Result<Vec<RhatReport>> {
    let monitored: [(&'static str, Vec<Vec<f64>>); 4] = [
        (
            "mu_before",
            trace.chains.iter().map(|c| c.mu_before.clone()).collect(),
        ),
        (
            "mu_after",
            trace.chains.iter().map(|c| c.mu_after.clone()).collect(),
        ),
        (
            "sigma_before",
            trace.chains.iter().map(|c| c.sigma_before.clone()).collect(),
        ),
        (
            "sigma_after",
            trace.chains.iter().map(|c| c.sigma_after.clone()).collect(),
        ),
    ];

    let mut reports = Vec::with_capacity(monitored.len());
    let mut worst: Option<RhatReport> = None;

    for (parameter, chains) in monitored {
        let rhat = split_rhat(&chains);
        let report = RhatReport { parameter, rhat };
        if rhat.is_nan() || rhat > threshold {
            let is_worse = worst
                .as_ref()
                .map(|w| rhat.is_nan() || rhat > w.rhat)
                .unwrap_or(true);
            if is_worse {
                worst = Some(report.clone());
            }
        }
        reports.push(report);
    }

    if let Some(worst) = worst {
        return Err(AnalysisError::NotConverged {
            parameter: worst.parameter,
            rhat: worst.rhat,
        });
    }
    Ok(reports)
}
