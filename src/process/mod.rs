// src/process/mod.rs

pub mod date_parser;
pub mod merge;
pub mod normalize;
pub mod utils;

pub use merge::{merge, merge_with_stats, MergeStats};
pub use normalize::{normalize, normalize_with_report, HourColumns, NormalizeReport, Normalized};
