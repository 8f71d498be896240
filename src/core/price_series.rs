//! PriceSeries data structure for daily price observations.

use crate::error::{AnalysisError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An ordered univariate series of daily prices.
///
/// Construction validates that dates are strictly increasing and that every
/// price is finite and positive (prices are log-transformed downstream).
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    dates: Vec<NaiveDate>,
    prices: Vec<f64>,
}

/// One observation in the processed-series artifact.
///
/// Field names match the JSON records the front-end consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedRecord {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Price")]
    pub price: f64,
    #[serde(rename = "Log_Price")]
    pub log_price: f64,
    #[serde(rename = "Log_Return")]
    pub log_return: f64,
}

impl PriceSeries {
    /// Create a new series from parallel date and price vectors.
    pub fn new(dates: Vec<NaiveDate>, prices: Vec<f64>) -> Result<Self> {
        if dates.len() != prices.len() {
            return Err(AnalysisError::InvalidParameter(format!(
                "dates ({}) and prices ({}) must have equal length",
                dates.len(),
                prices.len()
            )));
        }
        if dates.is_empty() {
            return Err(AnalysisError::EmptyData);
        }
        for w in dates.windows(2) {
            if w[1] <= w[0] {
                return Err(AnalysisError::DateError(
                    "dates must be strictly increasing".to_string(),
                ));
            }
        }
        for &p in &prices {
            if !p.is_finite() || p <= 0.0 {
                return Err(AnalysisError::InvalidParameter(format!(
                    "prices must be finite and positive, got {p}"
                )));
            }
        }
        Ok(Self { dates, prices })
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the series holds no observations.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Observation dates.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Observation prices.
    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    /// Date at a specific index.
    pub fn date_at(&self, index: usize) -> Result<NaiveDate> {
        self.dates
            .get(index)
            .copied()
            .ok_or_else(|| AnalysisError::DateError(format!(
                "index {index} out of range for series of length {}",
                self.len()
            )))
    }

    /// Natural log of each price.
    pub fn log_prices(&self) -> Vec<f64> {
        self.prices.iter().map(|p| p.ln()).collect()
    }

    /// First difference of log-prices. The first element is 0.0 so the
    /// returned vector is index-aligned with the observations.
    pub fn log_returns(&self) -> Vec<f64> {
        let log_prices = self.log_prices();
        let mut returns = Vec::with_capacity(log_prices.len());
        returns.push(0.0);
        for w in log_prices.windows(2) {
            returns.push(w[1] - w[0]);
        }
        returns
    }

    /// The return series the switchpoint model observes: log-returns with the
    /// padded first element dropped. Analysis index `j` corresponds to the
    /// return realized on `dates()[j + 1]`.
    pub fn analysis_returns(&self) -> Vec<f64> {
        let mut returns = self.log_returns();
        if !returns.is_empty() {
            returns.remove(0);
        }
        returns
    }

    /// Map an analysis-return index back to its calendar date.
    pub fn date_for_analysis_index(&self, index: usize) -> Result<NaiveDate> {
        self.date_at(index + 1)
    }

    /// Serialize every observation into artifact records.
    pub fn to_records(&self) -> Vec<ProcessedRecord> {
        let log_prices = self.log_prices();
        let log_returns = self.log_returns();
        self.dates
            .iter()
            .enumerate()
            .map(|(i, &date)| ProcessedRecord {
                date,
                price: self.prices[i],
                log_price: log_prices[i],
                log_return: log_returns[i],
            })
            .collect()
    }

    /// Rebuild a series from artifact records (dates and prices only; the
    /// derived columns are recomputed on demand).
    pub fn from_records(records: &[ProcessedRecord]) -> Result<Self> {
        let dates = records.iter().map(|r| r.date).collect();
        let prices = records.iter().map(|r| r.price).collect();
        Self::new(dates, prices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn make_dates(n: usize) -> Vec<NaiveDate> {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        (0..n)
            .map(|i| start + chrono::Days::new(i as u64))
            .collect()
    }

    #[test]
    fn constructs_valid_series() {
        let series = PriceSeries::new(make_dates(3), vec![20.0, 21.0, 19.5]).unwrap();
        assert_eq!(series.len(), 3);
        assert!(!series.is_empty());
        assert_eq!(series.prices(), &[20.0, 21.0, 19.5]);
    }

    #[test]
    fn rejects_empty_series() {
        let result = PriceSeries::new(vec![], vec![]);
        assert!(matches!(result, Err(AnalysisError::EmptyData)));
    }

    #[test]
    fn rejects_length_mismatch() {
        let result = PriceSeries::new(make_dates(3), vec![20.0, 21.0]);
        assert!(matches!(result, Err(AnalysisError::InvalidParameter(_))));
    }

    #[test]
    fn rejects_non_increasing_dates() {
        let mut dates = make_dates(3);
        dates.swap(1, 2);
        let result = PriceSeries::new(dates, vec![20.0, 21.0, 19.5]);
        assert!(matches!(result, Err(AnalysisError::DateError(_))));

        // Duplicate dates
        let dates = vec![make_dates(1)[0], make_dates(1)[0]];
        let result = PriceSeries::new(dates, vec![20.0, 21.0]);
        assert!(matches!(result, Err(AnalysisError::DateError(_))));
    }

    #[test]
    fn rejects_non_positive_prices() {
        let result = PriceSeries::new(make_dates(2), vec![20.0, -1.0]);
        assert!(matches!(result, Err(AnalysisError::InvalidParameter(_))));

        let result = PriceSeries::new(make_dates(2), vec![20.0, f64::NAN]);
        assert!(matches!(result, Err(AnalysisError::InvalidParameter(_))));
    }

    #[test]
    fn log_returns_first_element_is_zero() {
        let series = PriceSeries::new(make_dates(3), vec![100.0, 110.0, 99.0]).unwrap();
        let returns = series.log_returns();

        assert_eq!(returns.len(), 3);
        assert_relative_eq!(returns[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(returns[1], (110.0f64 / 100.0).ln(), epsilon = 1e-12);
        assert_relative_eq!(returns[2], (99.0f64 / 110.0).ln(), epsilon = 1e-12);
    }

    #[test]
    fn analysis_returns_drop_the_padding() {
        let series = PriceSeries::new(make_dates(4), vec![100.0, 110.0, 99.0, 102.0]).unwrap();
        let analysis = series.analysis_returns();

        assert_eq!(analysis.len(), 3);
        assert_relative_eq!(analysis[0], (110.0f64 / 100.0).ln(), epsilon = 1e-12);

        // Analysis index 0 maps to the second observation date.
        assert_eq!(
            series.date_for_analysis_index(0).unwrap(),
            series.dates()[1]
        );
    }

    #[test]
    fn records_round_trip() {
        let series = PriceSeries::new(make_dates(3), vec![100.0, 110.0, 99.0]).unwrap();
        let records = series.to_records();

        assert_eq!(records.len(), 3);
        assert_relative_eq!(records[1].log_price, 110.0f64.ln(), epsilon = 1e-12);
        assert_relative_eq!(records[0].log_return, 0.0, epsilon = 1e-12);

        let rebuilt = PriceSeries::from_records(&records).unwrap();
        assert_eq!(rebuilt, series);
    }

    #[test]
    fn record_serializes_artifact_field_names() {
        let series = PriceSeries::new(make_dates(1), vec![100.0]).unwrap();
        let json = serde_json::to_value(&series.to_records()[0]).unwrap();

        assert_eq!(json["Date"], "2020-01-01");
        assert_eq!(json["Price"], 100.0);
        assert!(json.get("Log_Price").is_some());
        assert!(json.get("Log_Return").is_some());
    }

    #[test]
    fn date_at_out_of_range() {
        let series = PriceSeries::new(make_dates(2), vec![1.0, 2.0]).unwrap();
        assert!(series.date_at(1).is_ok());
        assert!(matches!(series.date_at(2), Err(AnalysisError::DateError(_))));
    }
}
