// src/lib.rs

//! Daily load-forecast loader: pulls the grid operator's hour-by-day forecast
//! table, normalizes it into `Year, Month, Day, 1..24` records and merges it
//! into a master record where history is kept and the future is replaced.

pub mod archive;
pub mod config;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod process;
pub mod record;
pub mod store;
pub mod table;

pub use error::ForecastError;
pub use record::{DailyRecord, DateKey, RecordSet};
