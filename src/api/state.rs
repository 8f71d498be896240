//! Shared read-only state, loaded once at process start.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::ProcessedRecord;
use crate::ingest::events::{load_events_csv, KeyEvent};
use crate::ingest::prices::load_processed_json;
use crate::model::summary::ChangePointSummary;

/// Locations of the three serving artifacts.
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub processed: PathBuf,
    pub change_points: PathBuf,
    pub events: PathBuf,
}

impl DataPaths {
    /// Conventional layout: results under `results_dir`, events CSV alongside.
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(results_dir: P, events: Q) -> Self {
        let results_dir = results_dir.as_ref();
        Self {
            processed: results_dir.join("oil_price_data_processed.json"),
            change_points: results_dir.join("detected_change_points.json"),
            events: events.as_ref().to_path_buf(),
        }
    }
}

/// In-memory copies of the artifacts. Never mutated after load.
#[derive(Debug, Clone, Default)]
pub struct AppData {
    pub prices: Vec<ProcessedRecord>,
    pub change_points: Option<ChangePointSummary>,
    pub events: Vec<KeyEvent>,
}

impl AppData {
    /// Load every artifact, degrading to empty defaults on failure.
    ///
    /// A missing or unreadable file is logged as a warning; the server still
    /// starts and the corresponding endpoint serves its empty default.
    pub fn load(paths: &DataPaths) -> Self {
        let prices = match load_processed_json(&paths.processed) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(
                    path = %paths.processed.display(),
                    error = %e,
                    "processed series unavailable, serving empty list; \
                     run the analysis pipeline first"
                );
                Vec::new()
            }
        };

        let change_points = match load_summary(&paths.change_points) {
            Ok(summary) => Some(summary),
            Err(e) => {
                tracing::warn!(
                    path = %paths.change_points.display(),
                    error = %e,
                    "change-point summary unavailable, serving empty object"
                );
                None
            }
        };

        let events = match load_events_csv(&paths.events) {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!(
                    path = %paths.events.display(),
                    error = %e,
                    "key events unavailable, serving empty list"
                );
                Vec::new()
            }
        };

        tracing::info!(
            prices = prices.len(),
            events = events.len(),
            has_change_points = change_points.is_some(),
            "artifacts loaded"
        );

        Self {
            prices,
            change_points,
            events,
        }
    }
}

fn load_summary(path: &Path) -> crate::Result<ChangePointSummary> {
    let file = std::io::BufReader::new(std::fs::File::open(path)?);
    let summary = serde_json::from_reader(file)?;
    Ok(summary)
}

/// Cloneable handle over the immutable app data.
#[derive(Debug, Clone)]
pub struct ApiState {
    data: Arc<AppData>,
}

impl ApiState {
    pub fn new(data: AppData) -> Self {
        Self {
            data: Arc::new(data),
        }
    }

    pub fn data(&self) -> &AppData {
        &self.data
    }
}
