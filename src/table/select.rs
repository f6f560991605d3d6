// src/table/select.rs

use tracing::{debug, trace};

use super::RawTable;
use crate::error::ForecastError;
use crate::process::date_parser;
use crate::process::utils::clean_str;
use crate::record::HOURS;

/// Header labels that mark a date column when no configuration says otherwise.
pub const DEFAULT_DATE_LABELS: &[&str] = &["Дата", "Date"];

type Criterion = fn(&TableSelector, &RawTable) -> usize;

/// Picks the forecast grid out of the tables found on a page.
///
/// Each candidate is scored by an ordered list of criteria; scores compare
/// lexicographically, so a later criterion only breaks ties of the earlier
/// ones: a labeled grid beats everything, then the most numeric columns,
/// then the most rows dated in the first column. Equal scores keep the
/// earliest candidate, which also makes "first
/// table" the fallback when nothing scores.
#[derive(Clone, Debug)]
pub struct TableSelector {
    date_labels: Vec<String>,
}

impl Default for TableSelector {
    fn default() -> Self {
        Self::new(DEFAULT_DATE_LABELS.iter().map(|s| s.to_string()))
    }
}

impl TableSelector {
    const CRITERIA: &'static [(&'static str, Criterion)] = &[
        ("labeled_grid", labeled_grid_score),
        ("numeric_columns", numeric_columns_score),
        ("dated_rows", dated_rows_score),
    ];

    pub fn new(date_labels: impl IntoIterator<Item = String>) -> Self {
        Self {
            date_labels: date_labels
                .into_iter()
                .map(|l| clean_str(&l).to_lowercase())
                .filter(|l| !l.is_empty())
                .collect(),
        }
    }

    pub fn score(&self, table: &RawTable) -> Vec<usize> {
        Self::CRITERIA.iter().map(|(_, f)| f(self, table)).collect()
    }

    /// Index of the winning candidate, `None` for an empty slice.
    pub fn best_index(&self, candidates: &[RawTable]) -> Option<usize> {
        let mut best: Option<(usize, Vec<usize>)> = None;
        for (i, table) in candidates.iter().enumerate() {
            let score = self.score(table);
            trace!(index = i, ?score, columns = table.column_count(), "scored candidate");
            let better = match &best {
                Some((_, top)) => score > *top,
                None => true,
            };
            if better {
                best = Some((i, score));
            }
        }
        best.map(|(i, _)| i)
    }

    pub fn select(&self, candidates: Vec<RawTable>) -> Result<RawTable, ForecastError> {
        let total = candidates.len();
        let idx = self
            .best_index(&candidates)
            .ok_or(ForecastError::NoTableFound)?;
        debug!(index = idx, candidates = total, "selected forecast table");
        candidates
            .into_iter()
            .nth(idx)
            .ok_or(ForecastError::NoTableFound)
    }

    /// Header carries a date label and every hour label `1`..`24`.
    pub fn is_labeled_grid(&self, table: &RawTable) -> bool {
        let labels: Vec<String> = table.headers.iter().map(|h| clean_str(h)).collect();
        let has_date = labels.iter().any(|l| {
            let l = l.to_lowercase();
            self.date_labels.iter().any(|d| l.contains(d.as_str()))
        });
        has_date && (1..=HOURS).all(|h| labels.iter().any(|l| *l == h.to_string()))
    }
}

fn labeled_grid_score(sel: &TableSelector, table: &RawTable) -> usize {
    usize::from(sel.is_labeled_grid(table))
}

fn numeric_columns_score(_: &TableSelector, table: &RawTable) -> usize {
    numeric_column_count(table)
}

fn dated_rows_score(_: &TableSelector, table: &RawTable) -> usize {
    dated_row_count(table)
}

/// Columns where most non-empty body cells parse as numbers. A stray bad
/// cell does not disqualify a column.
pub fn numeric_column_count(table: &RawTable) -> usize {
    (0..table.column_count())
        .filter(|&c| {
            let (mut filled, mut numeric) = (0usize, 0usize);
            for cell in table.rows.iter().filter_map(|r| r.get(c)) {
                if cell.is_empty() {
                    continue;
                }
                filled += 1;
                if cell.as_f64().is_some() {
                    numeric += 1;
                }
            }
            numeric > 0 && numeric * 2 > filled
        })
        .count()
}

/// Body rows whose first cell is a `DD.MM.YYYY` date.
pub fn dated_row_count(table: &RawTable) -> usize {
    table
        .rows
        .iter()
        .filter(|r| {
            r.first()
                .and_then(|c| date_parser::parse_dmy(&c.to_label()))
                .is_some()
        })
        .count()
}

/// Select with the default date labels.
pub fn select(candidates: Vec<RawTable>) -> Result<RawTable, ForecastError> {
    TableSelector::default().select(candidates)
}
