//! # brent-changepoint
//!
//! Offline Bayesian change-point analysis over Brent crude oil daily prices.
//!
//! Detects a single structural break in the mean and volatility of
//! log-returns via posterior sampling over a discrete-switchpoint model,
//! reduces the draws to a summary artifact, and serves the precomputed
//! results (plus curated historical-event annotations) through a small
//! read-only HTTP API.

pub mod api;
pub mod cli;
pub mod core;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod model;

pub use error::{AnalysisError, Result};

pub mod prelude {
    pub use crate::core::{PriceSeries, ProcessedRecord};
    pub use crate::error::{AnalysisError, Result};
    pub use crate::ingest::events::KeyEvent;
    pub use crate::model::{detect_changepoint, ChangePointSummary, SamplerConfig};
}
