// src/table/mod.rs

pub mod html;
pub mod json;
pub mod select;

pub use select::{select, TableSelector};

use crate::process::{date_parser, utils};
use crate::record::DailyRecord;

/// An untyped scalar as it appeared in the source document.
#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    /// Wrap extracted text; blank text becomes `Empty`.
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Numeric reading of the cell, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(n) if n.is_finite() => Some(*n),
            Cell::Number(_) | Cell::Empty => None,
            Cell::Text(s) => utils::parse_number(s),
        }
    }

    pub fn to_label(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => utils::clean_str(s),
            Cell::Number(n) if n.fract() == 0.0 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
        }
    }
}

/// One tabular block pulled out of a source document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawTable {
    /// Header labels as the document states them. Empty when the block has no
    /// header row.
    pub headers: Vec<String>,
    /// Body rows. Rows may differ in length.
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { headers, rows }
    }

    /// Widest of the header row and every body row.
    pub fn column_count(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0)
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Render records back into the source shape: a `Date` column in
    /// `DD.MM.YYYY` followed by hour columns `1..24`. Absent hours become
    /// empty cells.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a DailyRecord>) -> Self {
        let headers = std::iter::once("Date".to_string())
            .chain((1..=crate::record::HOURS).map(|h| h.to_string()))
            .collect();
        let rows = records
            .into_iter()
            .map(|r| {
                std::iter::once(Cell::Text(date_parser::format_dmy(&r.key())))
                    .chain(r.hours.iter().map(|h| match h {
                        Some(v) => Cell::Number(*v as f64),
                        None => Cell::Empty,
                    }))
                    .collect()
            })
            .collect();
        Self { headers, rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_numeric_reading() {
        assert_eq!(Cell::Number(12.5).as_f64(), Some(12.5));
        assert_eq!(Cell::Number(f64::NAN).as_f64(), None);
        assert_eq!(Cell::text(" 4 312 ").as_f64(), Some(4312.0));
        assert_eq!(Cell::text("n/a").as_f64(), None);
        assert!(Cell::text("   ").is_empty());
    }

    #[test]
    fn labels_of_numeric_cells() {
        assert_eq!(Cell::Number(7.0).to_label(), "7");
        assert_eq!(Cell::Number(7.25).to_label(), "7.25");
        assert_eq!(Cell::text(" Дата ").to_label(), "Дата");
    }

    #[test]
    fn column_count_uses_widest_row() {
        let t = RawTable::new(
            vec!["a".into(), "b".into()],
            vec![vec![Cell::Empty; 3], vec![Cell::Empty]],
        );
        assert_eq!(t.column_count(), 3);
        assert_eq!(RawTable::default().column_count(), 0);
    }
}
