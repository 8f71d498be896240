//! Core data structures.

pub mod price_series;

pub use price_series::{PriceSeries, ProcessedRecord};
