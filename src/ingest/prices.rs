//! Raw Brent price CSV loading and processed-series artifact IO.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::core::{PriceSeries, ProcessedRecord};
use crate::error::{AnalysisError, Result};

/// Date formats observed in the historical Brent dataset. The file mixes
/// `20-May-87` style rows with `Apr 22, 2020` style rows.
const DATE_FORMATS: &[&str] = &["%d-%b-%y", "%b %d, %Y", "%Y-%m-%d", "%d/%m/%Y"];

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Price")]
    price: String,
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Load raw prices from a `Date,Price` CSV.
///
/// Rows with unparseable dates or non-numeric prices are dropped; remaining
/// rows are sorted by date and de-duplicated (first occurrence wins).
pub fn load_raw_prices<P: AsRef<Path>>(path: P) -> Result<PriceSeries> {
    let mut reader = csv::Reader::from_path(path.as_ref())?;
    let mut rows: Vec<(NaiveDate, f64)> = Vec::new();
    let mut dropped = 0usize;

    for record in reader.deserialize::<RawRow>() {
        let row = record?;
        let date = parse_date(&row.date);
        let price = row.price.trim().parse::<f64>().ok();
        match (date, price) {
            (Some(date), Some(price)) if price.is_finite() && price > 0.0 => {
                rows.push((date, price));
            }
            _ => {
                dropped += 1;
                tracing::debug!(date = %row.date, price = %row.price, "dropping unparseable row");
            }
        }
    }

    if rows.is_empty() {
        return Err(AnalysisError::EmptyData);
    }
    if dropped > 0 {
        tracing::warn!(dropped, kept = rows.len(), "dropped unparseable rows");
    }

    rows.sort_by_key(|(date, _)| *date);
    rows.dedup_by_key(|(date, _)| *date);

    let (dates, prices) = rows.into_iter().unzip();
    PriceSeries::new(dates, prices)
}

/// Write the processed-series artifact (a JSON records array).
pub fn write_processed_json<P: AsRef<Path>>(series: &PriceSeries, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = BufWriter::new(File::create(path)?);
    serde_json::to_writer(file, &series.to_records())?;
    Ok(())
}

/// Load the processed-series artifact.
pub fn load_processed_json<P: AsRef<Path>>(path: P) -> Result<Vec<ProcessedRecord>> {
    let file = BufReader::new(File::open(path.as_ref())?);
    let records: Vec<ProcessedRecord> = serde_json::from_reader(file)?;
    Ok(records)
}
