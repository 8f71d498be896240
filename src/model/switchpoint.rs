//! Metropolis-within-Gibbs sampler for the single-switchpoint model.

use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use statrs::distribution::Normal;

use crate::error::{AnalysisError, Result};

/// Configuration for the posterior sampler.
///
/// Defaults mirror the reference analysis run: 2000 kept draws after 1000
/// tuning sweeps, two chains, seed 42.
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// Number of kept draws per chain.
    pub draws: usize,
    /// Number of tuning (burn-in) sweeps per chain, discarded.
    pub tune: usize,
    /// Number of independent chains.
    pub chains: usize,
    /// Random seed (None for entropy). Chain `c` uses `seed + c`.
    pub seed: Option<u64>,
    /// Prior standard deviation of the regime means.
    pub mu_prior_sigma: f64,
    /// Scale of the half-normal prior on the regime volatilities.
    pub sigma_prior_sigma: f64,
    /// Split R-hat threshold above which the run is aborted.
    pub rhat_threshold: f64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            draws: 2000,
            tune: 1000,
            chains: 2,
            seed: Some(42),
            mu_prior_sigma: 0.1,
            sigma_prior_sigma: 0.1,
            rhat_threshold: 1.05,
        }
    }
}

impl SamplerConfig {
    /// Create a config with the given number of kept draws.
    pub fn new(draws: usize) -> Self {
        Self {
            draws,
            ..Default::default()
        }
    }

    /// Set the number of tuning sweeps.
    pub fn with_tune(mut self, tune: usize) -> Self {
        self.tune = tune;
        self
    }

    /// Set the number of chains.
    pub fn with_chains(mut self, chains: usize) -> Self {
        self.chains = chains.max(1);
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the split R-hat abort threshold.
    pub fn with_rhat_threshold(mut self, threshold: f64) -> Self {
        self.rhat_threshold = threshold;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.draws == 0 {
            return Err(AnalysisError::InvalidParameter(
                "draws must be positive".to_string(),
            ));
        }
        if self.mu_prior_sigma <= 0.0 || self.sigma_prior_sigma <= 0.0 {
            return Err(AnalysisError::InvalidParameter(
                "prior scales must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Posterior draws from a single chain.
#[derive(Debug, Clone)]
pub struct ChainDraws {
    pub tau: Vec<usize>,
    pub mu_before: Vec<f64>,
    pub mu_after: Vec<f64>,
    pub sigma_before: Vec<f64>,
    pub sigma_after: Vec<f64>,
}

impl ChainDraws {
    fn with_capacity(n: usize) -> Self {
        Self {
            tau: Vec::with_capacity(n),
            mu_before: Vec::with_capacity(n),
            mu_after: Vec::with_capacity(n),
            sigma_before: Vec::with_capacity(n),
            sigma_after: Vec::with_capacity(n),
        }
    }
}

/// Posterior draws across all chains.
#[derive(Debug, Clone)]
pub struct Trace {
    pub chains: Vec<ChainDraws>,
    /// Length of the observed return series.
    pub n_observations: usize,
}

impl Trace {
    /// Total number of kept draws across chains.
    pub fn len(&self) -> usize {
        self.chains.iter().map(|c| c.tau.len()).sum()
    }

    /// Whether the trace holds no draws.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pool the before-regime mean draws across chains.
    pub fn pooled_mu_before(&self) -> Vec<f64> {
        self.chains
            .iter()
            .flat_map(|c| c.mu_before.iter().copied())
            .collect()
    }

    /// Pool the after-regime mean draws across chains.
    pub fn pooled_mu_after(&self) -> Vec<f64> {
        self.chains
            .iter()
            .flat_map(|c| c.mu_after.iter().copied())
            .collect()
    }

    /// Pool the before-regime volatility draws across chains.
    pub fn pooled_sigma_before(&self) -> Vec<f64> {
        self.chains
            .iter()
            .flat_map(|c| c.sigma_before.iter().copied())
            .collect()
    }

    /// Pool the after-regime volatility draws across chains.
    pub fn pooled_sigma_after(&self) -> Vec<f64> {
        self.chains
            .iter()
            .flat_map(|c| c.sigma_after.iter().copied())
            .collect()
    }

    /// Pool the switch-index draws across chains.
    pub fn pooled_tau(&self) -> Vec<usize> {
        self.chains
            .iter()
            .flat_map(|c| c.tau.iter().copied())
            .collect()
    }
}

/// Prefix sums of the return series, for O(1) segment statistics.
struct SegmentSums {
    /// sums[t] = sum of returns[0..t]
    sums: Vec<f64>,
    /// sq_sums[t] = sum of squared returns[0..t]
    sq_sums: Vec<f64>,
}

impl SegmentSums {
    fn new(returns: &[f64]) -> Self {
        let mut sums = Vec::with_capacity(returns.len() + 1);
        let mut sq_sums = Vec::with_capacity(returns.len() + 1);
        let (mut acc, mut sq_acc) = (0.0, 0.0);
        sums.push(0.0);
        sq_sums.push(0.0);
        for &r in returns {
            acc += r;
            sq_acc += r * r;
            sums.push(acc);
            sq_sums.push(sq_acc);
        }
        Self { sums, sq_sums }
    }

    /// (count, sum, sum of squares) over returns[start..end].
    fn segment(&self, start: usize, end: usize) -> (f64, f64, f64) {
        (
            (end - start) as f64,
            self.sums[end] - self.sums[start],
            self.sq_sums[end] - self.sq_sums[start],
        )
    }
}

/// Sum of squared deviations from `mu` over a segment, from its sums.
fn segment_sse(n: f64, sum: f64, sq_sum: f64, mu: f64) -> f64 {
    sq_sum - 2.0 * mu * sum + n * mu * mu
}

/// Mutable state of one chain.
struct ChainState {
    tau: usize,
    mu: [f64; 2],
    sigma: [f64; 2],
    /// Log-scale random-walk step size for each sigma, adapted during tuning.
    step: [f64; 2],
}

/// Draw posterior samples for the switchpoint model over `returns`.
///
/// Chains run sequentially; with a fixed seed the output is deterministic.
pub fn sample_posterior(returns: &[f64], config: &SamplerConfig) -> Result<Trace> {
    config.validate()?;

    let n = returns.len();
    if n == 0 {
        return Err(AnalysisError::EmptyData);
    }
    if n < 4 {
        return Err(AnalysisError::InsufficientData { needed: 4, got: n });
    }
    if returns.iter().any(|r| !r.is_finite()) {
        return Err(AnalysisError::MissingValues);
    }

    let sums = SegmentSums::new(returns);
    let std_normal = Normal::new(0.0, 1.0)
        .map_err(|e| AnalysisError::ComputationError(e.to_string()))?;

    let mut chains = Vec::with_capacity(config.chains);
    for chain in 0..config.chains {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed + chain as u64),
            None => StdRng::from_entropy(),
        };
        chains.push(run_chain(returns, &sums, config, &std_normal, &mut rng));
    }

    Ok(Trace {
        chains,
        n_observations: n,
    })
}

fn run_chain(
    returns: &[f64],
    sums: &SegmentSums,
    config: &SamplerConfig,
    std_normal: &Normal,
    rng: &mut StdRng,
) -> ChainDraws {
    let n = returns.len();
    let mut state = init_state(returns, n);
    let mut draws = ChainDraws::with_capacity(config.draws);

    // Acceptance bookkeeping for step-size adaptation during tuning.
    let mut accepted = [0usize; 2];
    let mut attempted = [0usize; 2];
    const ADAPT_WINDOW: usize = 50;

    for sweep in 0..(config.tune + config.draws) {
        let tuning = sweep < config.tune;

        update_means(&mut state, sums, config, std_normal, rng);
        for regime in 0..2 {
            let accept =
                update_sigma(&mut state, regime, sums, config, std_normal, rng);
            if tuning {
                attempted[regime] += 1;
                if accept {
                    accepted[regime] += 1;
                }
                if attempted[regime] == ADAPT_WINDOW {
                    let rate = accepted[regime] as f64 / ADAPT_WINDOW as f64;
                    if rate > 0.5 {
                        state.step[regime] *= 1.1;
                    } else if rate < 0.3 {
                        state.step[regime] *= 0.9;
                    }
                    accepted[regime] = 0;
                    attempted[regime] = 0;
                }
            }
        }
        update_tau(&mut state, sums, n, rng);

        if !tuning {
            draws.tau.push(state.tau);
            draws.mu_before.push(state.mu[0]);
            draws.mu_after.push(state.mu[1]);
            draws.sigma_before.push(state.sigma[0]);
            draws.sigma_after.push(state.sigma[1]);
        }
    }

    draws
}

fn init_state(returns: &[f64], n: usize) -> ChainState {
    let tau = n / 2;
    let seg_stats = |slice: &[f64]| -> (f64, f64) {
        let count = slice.len().max(1) as f64;
        let mean = slice.iter().sum::<f64>() / count;
        let var = slice.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / count;
        (mean, var.sqrt().max(1e-4))
    };
    let (mu0, sd0) = seg_stats(&returns[..tau]);
    let (mu1, sd1) = seg_stats(&returns[tau..]);

    ChainState {
        tau,
        mu: [mu0, mu1],
        sigma: [sd0, sd1],
        step: [0.1, 0.1],
    }
}

/// Exact conjugate draw of each regime mean given its volatility and `tau`.
fn update_means(
    state: &mut ChainState,
    sums: &SegmentSums,
    config: &SamplerConfig,
    std_normal: &Normal,
    rng: &mut StdRng,
) {
    let n_total = sums.sums.len() - 1;
    let bounds = [(0, state.tau), (state.tau, n_total)];

    for regime in 0..2 {
        let (start, end) = bounds[regime];
        let (count, sum, _) = sums.segment(start, end);
        let prior_precision = 1.0 / (config.mu_prior_sigma * config.mu_prior_sigma);
        let sigma_sq = state.sigma[regime] * state.sigma[regime];

        let precision = count / sigma_sq + prior_precision;
        let mean = (sum / sigma_sq) / precision;
        let sd = (1.0 / precision).sqrt();

        state.mu[regime] = mean + sd * std_normal.sample(rng);
    }
}

/// Log posterior density of one regime's volatility (up to a constant),
/// including the half-normal prior.
fn sigma_log_target(sigma: f64, count: f64, sse: f64, prior_sigma: f64) -> f64 {
    -count * sigma.ln() - sse / (2.0 * sigma * sigma)
        - (sigma * sigma) / (2.0 * prior_sigma * prior_sigma)
}

/// Random-walk Metropolis update on the log scale. Returns whether the
/// proposal was accepted.
fn update_sigma(
    state: &mut ChainState,
    regime: usize,
    sums: &SegmentSums,
    config: &SamplerConfig,
    std_normal: &Normal,
    rng: &mut StdRng,
) -> bool {
    let n_total = sums.sums.len() - 1;
    let (start, end) = if regime == 0 {
        (0, state.tau)
    } else {
        (state.tau, n_total)
    };
    let (count, sum, sq_sum) = sums.segment(start, end);
    let sse = segment_sse(count, sum, sq_sum, state.mu[regime]);

    let current = state.sigma[regime];
    let proposal = current * (state.step[regime] * std_normal.sample(rng)).exp();

    // Jacobian of the log-scale proposal: + ln(sigma) on each side.
    let log_ratio = sigma_log_target(proposal, count, sse, config.sigma_prior_sigma)
        - sigma_log_target(current, count, sse, config.sigma_prior_sigma)
        + proposal.ln()
        - current.ln();

    if log_ratio >= 0.0 || rng.gen::<f64>().ln() < log_ratio {
        state.sigma[regime] = proposal;
        true
    } else {
        false
    }
}

/// Exact draw of `tau` from its discrete full conditional.
///
/// The uniform prior is constant and cancels; each candidate's log weight is
/// the sum of both segments' Gaussian log-likelihoods, computed from prefix
/// sums in O(n) total.
fn update_tau(state: &mut ChainState, sums: &SegmentSums, n: usize, rng: &mut StdRng) {
    let [mu0, mu1] = state.mu;
    let [s0, s1] = state.sigma;
    let (ln_s0, ln_s1) = (s0.ln(), s1.ln());
    let (inv0, inv1) = (1.0 / (2.0 * s0 * s0), 1.0 / (2.0 * s1 * s1));

    let mut log_weights = Vec::with_capacity(n);
    let mut max_weight = f64::NEG_INFINITY;

    for t in 0..n {
        let (c0, sum0, sq0) = sums.segment(0, t);
        let (c1, sum1, sq1) = sums.segment(t, n);

        let before = -c0 * ln_s0 - segment_sse(c0, sum0, sq0, mu0) * inv0;
        let after = -c1 * ln_s1 - segment_sse(c1, sum1, sq1, mu1) * inv1;
        let w = before + after;

        if w > max_weight {
            max_weight = w;
        }
        log_weights.push(w);
    }

    let weights: Vec<f64> = log_weights.iter().map(|w| (w - max_weight).exp()).collect();
    let total: f64 = weights.iter().sum();

    let mut target = rng.gen::<f64>() * total;
    for (t, &w) in weights.iter().enumerate() {
        target -= w;
        if target <= 0.0 {
            state.tau = t;
            return;
        }
    }
    // Floating-point underflow in the final subtraction.
    state.tau = n - 1;
}
