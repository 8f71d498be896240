//! Error types for the brent-changepoint crate.

use thiserror::Error;

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors that can occur during preprocessing, sampling, or serving setup.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Input data is empty after filtering.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Date-related error (ordering, out-of-range index mapping).
    #[error("date error: {0}")]
    DateError(String),

    /// Missing values (NaN/Inf) detected in the return series.
    #[error("missing values detected in data")]
    MissingValues,

    /// The sampler did not converge; the run is aborted, no partial results.
    #[error("sampler failed to converge: {parameter} has split R-hat {rhat:.3}")]
    NotConverged { parameter: &'static str, rhat: f64 },

    /// Numerical failure inside the sampler or reduction.
    #[error("computation error: {0}")]
    ComputationError(String),

    /// IO error reading or writing an artifact.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing error.
    #[error("CSV processing error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        let err = AnalysisError::EmptyData;
        assert_eq!(err.to_string(), "empty input data");

        let err = AnalysisError::InsufficientData { needed: 4, got: 2 };
        assert_eq!(err.to_string(), "insufficient data: need at least 4, got 2");

        let err = AnalysisError::NotConverged {
            parameter: "sigma_after",
            rhat: 1.25,
        };
        assert_eq!(
            err.to_string(),
            "sampler failed to converge: sigma_after has split R-hat 1.250"
        );
    }
}
