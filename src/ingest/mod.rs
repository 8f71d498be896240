//! Data loading and artifact IO.

pub mod events;
pub mod prices;

pub use events::{curated_events, load_events_csv, nearest_event, write_events_csv, KeyEvent};
pub use prices::{load_processed_json, load_raw_prices, write_processed_json};
