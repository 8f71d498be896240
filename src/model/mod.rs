//! Single change-point inference over log-returns.
//!
//! The model partitions the return series into a "before" and "after"
//! regime at a discrete switch index `tau`, each regime with its own mean
//! and volatility:
//!
//! - `tau ~ DiscreteUniform(0, n - 1)`
//! - `mu_before, mu_after ~ Normal(0, 0.1)`
//! - `sigma_before, sigma_after ~ HalfNormal(0.1)`
//! - `r_i ~ Normal(mu_before, sigma_before)` for `i < tau`, else
//!   `Normal(mu_after, sigma_after)`
//!
//! Posterior samples are drawn by Metropolis-within-Gibbs (exact conditional
//! draws for the regime means and the switch index, random-walk Metropolis
//! on the log scale for the regime volatilities) and reduced to point
//! estimates, derived percentage changes, and posterior probabilities.
//!
//! # Example
//!
//! ```no_run
//! use brent_changepoint::core::PriceSeries;
//! use brent_changepoint::ingest::events::curated_events;
//! use brent_changepoint::model::{detect_changepoint, SamplerConfig};
//!
//! # fn run(series: PriceSeries) -> brent_changepoint::Result<()> {
//! let config = SamplerConfig::default().with_seed(42);
//! let summary = detect_changepoint(&series, &curated_events(), &config)?;
//! println!("break at {}", summary.change_point_date);
//! # Ok(())
//! # }
//! ```

pub mod diagnostics;
pub mod summary;
pub mod switchpoint;

pub use diagnostics::{check_convergence, split_rhat, RhatReport};
pub use summary::{summarize, ChangePointSummary};
pub use switchpoint::{sample_posterior, ChainDraws, SamplerConfig, Trace};

use crate::core::PriceSeries;
use crate::error::Result;
use crate::ingest::events::KeyEvent;

/// Days either side of the detected date searched for an associated event.
pub const EVENT_WINDOW_DAYS: i64 = 90;

/// Run the full inference pass: sample the posterior, verify convergence,
/// and reduce the draws to a change-point summary.
///
/// This is a single batch job; any failure (insufficient data, a
/// non-convergent chain) aborts with an error and produces no partial
/// results.
pub fn detect_changepoint(
    series: &PriceSeries,
    events: &[KeyEvent],
    config: &SamplerConfig,
) -> Result<ChangePointSummary> {
    let returns = series.analysis_returns();
    let trace = sample_posterior(&returns, config)?;

    let reports = check_convergence(&trace, config.rhat_threshold)?;
    for report in &reports {
        tracing::debug!(parameter = report.parameter, rhat = report.rhat, "chain converged");
    }

    summarize(&trace, series, events, EVENT_WINDOW_DAYS)
}
