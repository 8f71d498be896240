//! Curated historical events affecting the oil market.

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// One curated historical event. Field names match the events CSV header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyEvent {
    #[serde(rename = "EventDate")]
    pub date: NaiveDate,
    #[serde(rename = "EventType")]
    pub event_type: String,
    #[serde(rename = "EventDescription")]
    pub description: String,
    #[serde(rename = "ImpactType")]
    pub impact: String,
}

impl KeyEvent {
    fn new(date: &str, event_type: &str, description: &str, impact: &str) -> Self {
        // All curated dates are compile-time literals in ISO format.
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap_or_else(|_| panic!("invalid curated event date: {date}"));
        Self {
            date,
            event_type: event_type.to_string(),
            description: description.to_string(),
            impact: impact.to_string(),
        }
    }
}

/// The built-in curated event list, Gulf War 1990 through OPEC+ cuts 2022.
pub fn curated_events() -> Vec<KeyEvent> {
    vec![
        KeyEvent::new(
            "1990-08-02",
            "Geopolitical",
            "Iraq invades Kuwait (Gulf War begins)",
            "Supply_Shock_Price_Surge",
        ),
        KeyEvent::new(
            "1997-07-02",
            "Economic",
            "Asian Financial Crisis begins",
            "Demand_Shock_Price_Decrease",
        ),
        KeyEvent::new(
            "2001-09-11",
            "Geopolitical",
            "September 11 Attacks",
            "Volatility_Increase_Temporary_Fall",
        ),
        KeyEvent::new(
            "2008-09-15",
            "Economic",
            "Lehman Brothers Collapse (Global Financial Crisis)",
            "Demand_Shock_Price_Collapse",
        ),
        KeyEvent::new(
            "2014-06-01",
            "Supply",
            "US Shale Boom / OPEC Production Stance",
            "Oversupply_Price_Decrease",
        ),
        KeyEvent::new(
            "2015-07-14",
            "Political",
            "Iran Nuclear Deal (JCPOA) Signed",
            "Potential_Supply_Increase",
        ),
        KeyEvent::new(
            "2016-02-11",
            "Economic",
            "Global Economic Slowdown Concerns / Oversupply",
            "Price_Low",
        ),
        KeyEvent::new(
            "2016-11-30",
            "OPEC",
            "OPEC+ agrees to production cuts",
            "Price_Support",
        ),
        KeyEvent::new(
            "2018-05-08",
            "Political",
            "US withdraws from Iran Nuclear Deal (sanctions reimposed)",
            "Supply_Concerns_Price_Rise",
        ),
        KeyEvent::new(
            "2018-10-01",
            "Economic",
            "US-China Trade War Escalates",
            "Demand_Concerns_Price_Decrease",
        ),
        KeyEvent::new(
            "2019-09-14",
            "Geopolitical",
            "Attacks on Saudi Aramco Facilities",
            "Supply_Shock_Temporary_Spike",
        ),
        KeyEvent::new(
            "2020-03-08",
            "Pandemic",
            "COVID-19 Outbreak & Global Lockdowns",
            "Demand_Shock_Price_Collapse",
        ),
        KeyEvent::new(
            "2020-04-20",
            "Market_Anomaly",
            "WTI Futures go Negative (Extreme Demand Collapse)",
            "Extreme_Price_Collapse",
        ),
        KeyEvent::new(
            "2022-02-24",
            "Geopolitical",
            "Russia-Ukraine War Begins",
            "Supply_Shock_Price_Surge",
        ),
        KeyEvent::new(
            "2022-06-01",
            "Economic",
            "Global Recession Fears / Central Bank Rate Hikes",
            "Demand_Concerns_Price_Decrease",
        ),
        KeyEvent::new(
            "2022-09-05",
            "OPEC",
            "OPEC+ announces modest production cut",
            "Supply_Tightening_Price_Support",
        ),
    ]
}

/// Write an event list to CSV.
pub fn write_events_csv<P: AsRef<Path>>(events: &[KeyEvent], path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    for event in events {
        writer.serialize(event)?;
    }
    writer.flush()?;
    Ok(())
}

/// Load an event list from CSV.
pub fn load_events_csv<P: AsRef<Path>>(path: P) -> Result<Vec<KeyEvent>> {
    let mut reader = csv::Reader::from_path(path.as_ref())?;
    let mut events = Vec::new();
    for record in reader.deserialize::<KeyEvent>() {
        events.push(record?);
    }
    if events.is_empty() {
        return Err(AnalysisError::EmptyData);
    }
    Ok(events)
}

/// Find the curated event closest to `date`, within `window_days` of it.
pub fn nearest_event(events: &[KeyEvent], date: NaiveDate, window_days: i64) -> Option<&KeyEvent> {
    events
        .iter()
        .map(|e| ((e.date - date).num_days().abs(), e))
        .filter(|(distance, _)| *distance <= window_days)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, e)| e)
}
