// src/process/normalize.rs

use tracing::{debug, trace, warn};

use crate::error::ForecastError;
use crate::process::{date_parser, utils};
use crate::record::{DailyRecord, RecordSet, HOURS};
use crate::table::{Cell, RawTable};

/// How the 24 hour columns were located in the table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HourColumns {
    /// Header labels `1`..`24`, each present exactly once.
    Labeled([usize; HOURS]),
    /// The 24 columns right after the date column.
    Positional,
}

impl HourColumns {
    /// Labeled columns take precedence when unambiguous; otherwise position.
    pub fn resolve(headers: &[String]) -> Self {
        let labels: Vec<String> = headers.iter().map(|h| utils::clean_str(h)).collect();
        let mut idx = [0usize; HOURS];
        for (h, slot) in idx.iter_mut().enumerate() {
            let want = (h + 1).to_string();
            let mut hits = labels
                .iter()
                .enumerate()
                .skip(1)
                .filter(|(_, l)| **l == want)
                .map(|(i, _)| i);
            match (hits.next(), hits.next()) {
                (Some(i), None) => *slot = i,
                _ => return HourColumns::Positional,
            }
        }
        HourColumns::Labeled(idx)
    }

    fn index(&self, hour: usize) -> usize {
        match self {
            HourColumns::Labeled(idx) => idx[hour],
            HourColumns::Positional => hour + 1,
        }
    }
}

/// What the normalizer dropped on the way. None of this is an error; the
/// caller reports it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub rows_seen: usize,
    pub blank_rows: usize,
    /// Rows without a cell for every hour column.
    pub short_rows: usize,
    /// Rows with an hour cell that is empty, non-numeric or negative.
    pub invalid_rows: usize,
    /// Later rows for a date already seen in the same table.
    pub duplicate_dates: usize,
}

impl NormalizeReport {
    pub fn dropped(&self) -> usize {
        self.short_rows + self.invalid_rows
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Normalized {
    pub records: RecordSet,
    pub report: NormalizeReport,
    pub hour_columns: HourColumns,
}

enum RowHours {
    Complete([u64; HOURS]),
    Short,
    Invalid(usize),
}

fn read_hours(row: &[Cell], columns: &HourColumns) -> RowHours {
    let mut hours = [0u64; HOURS];
    for (h, slot) in hours.iter_mut().enumerate() {
        let cell = match row.get(columns.index(h)) {
            Some(c) => c,
            None => return RowHours::Short,
        };
        match cell.as_f64().and_then(utils::to_load) {
            Some(v) => *slot = v,
            None => return RowHours::Invalid(h + 1),
        }
    }
    RowHours::Complete(hours)
}

/// Convert the selected forecast table into daily records.
///
/// The first column is the date column whatever its label says, and must be
/// `DD.MM.YYYY`: any other date aborts with [`ForecastError::DateParse`].
/// A day with a missing or unusable hour value is dropped as a whole and
/// counted in the report. Blank rows are skipped. Fails with
/// [`ForecastError::NoValidRows`] when nothing survives.
pub fn normalize_with_report(table: &RawTable) -> Result<Normalized, ForecastError> {
    let hour_columns = HourColumns::resolve(&table.headers);
    debug!(?hour_columns, rows = table.rows.len(), "normalizing forecast table");

    let mut report = NormalizeReport::default();
    let mut records = Vec::with_capacity(table.rows.len());

    for (i, row) in table.rows.iter().enumerate() {
        report.rows_seen += 1;
        if row.iter().all(Cell::is_empty) {
            report.blank_rows += 1;
            continue;
        }

        let raw_date = row.first().map(Cell::to_label).unwrap_or_default();
        let key = date_parser::parse_dmy(&raw_date).ok_or_else(|| ForecastError::DateParse {
            row: i,
            value: raw_date.clone(),
        })?;

        match read_hours(row, &hour_columns) {
            RowHours::Complete(hours) => {
                trace!(row = i, date = %key, "row accepted");
                records.push(DailyRecord::complete(key, hours));
            }
            RowHours::Short => {
                debug!(row = i, date = %key, cells = row.len(), "dropping short row");
                report.short_rows += 1;
            }
            RowHours::Invalid(hour) => {
                debug!(row = i, date = %key, hour, "dropping row with unusable hour value");
                report.invalid_rows += 1;
            }
        }
    }

    let accepted = records.len();
    let records = RecordSet::from_records(records);
    report.duplicate_dates = accepted - records.len();
    if report.duplicate_dates > 0 {
        warn!(duplicates = report.duplicate_dates, "table repeats dates; keeping last rows");
    }

    if records.is_empty() {
        return Err(ForecastError::NoValidRows {
            dropped: report.dropped(),
        });
    }

    Ok(Normalized {
        records,
        report,
        hour_columns,
    })
}

pub fn normalize(table: &RawTable) -> Result<RecordSet, ForecastError> {
    normalize_with_report(table).map(|n| n.records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::DateKey;

    fn header(date_label: &str) -> Vec<String> {
        std::iter::once(date_label.to_string())
            .chain((1..=24).map(|h| h.to_string()))
            .collect()
    }

    fn row(date: &str, base: u64) -> Vec<Cell> {
        std::iter::once(Cell::text(date))
            .chain((0..24).map(|h| Cell::text((base + h).to_string())))
            .collect()
    }

    #[test]
    fn normalizes_known_day_exactly() {
        let table = RawTable::new(header("Дата/Час"), vec![row("15.03.2024", 100)]);
        let set = normalize(&table).unwrap();
        assert_eq!(set.len(), 1);
        let rec = &set.as_slice()[0];
        assert_eq!((rec.year, rec.month, rec.day), (2024, 3, 15));
        let expected: Vec<Option<u64>> = (100..124).map(Some).collect();
        assert_eq!(rec.hours.to_vec(), expected);
    }

    #[test]
    fn renormalizing_canonical_output_is_idempotent() {
        let table = RawTable::new(
            header("Дата"),
            vec![row("16.03.2024", 200), row("15.03.2024", 100)],
        );
        let first = normalize(&table).unwrap();
        let again = normalize(&RawTable::from_records(&first)).unwrap();
        assert_eq!(first, again);
    }

    #[test]
    fn one_bad_row_among_ten_yields_nine() {
        let mut rows: Vec<_> = (1..=10)
            .map(|d| row(&format!("{:02}.03.2024", d), 1000))
            .collect();
        rows[4][7] = Cell::text("n/a");
        let table = RawTable::new(header("Дата"), rows);

        let out = normalize_with_report(&table).unwrap();
        assert_eq!(out.records.len(), 9);
        assert_eq!(out.report.invalid_rows, 1);
        assert!(out.records.get(&DateKey::new(2024, 3, 5)).is_none());
    }

    #[test]
    fn short_row_is_dropped_silently() {
        let mut short = row("02.03.2024", 10);
        short.truncate(20);
        let table = RawTable::new(header("Дата"), vec![row("01.03.2024", 10), short]);
        let out = normalize_with_report(&table).unwrap();
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.report.short_rows, 1);
    }

    #[test]
    fn empty_hour_cell_invalidates_day() {
        let mut gap = row("02.03.2024", 10);
        gap[24] = Cell::Empty;
        let table = RawTable::new(header("Дата"), vec![row("01.03.2024", 10), gap]);
        let out = normalize_with_report(&table).unwrap();
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.report.invalid_rows, 1);
    }

    #[test]
    fn bad_date_fails_fast_with_raw_value() {
        let table = RawTable::new(
            header("Дата"),
            vec![row("01.03.2024", 10), row("2024-03-02", 10)],
        );
        match normalize(&table) {
            Err(ForecastError::DateParse { row, value }) => {
                assert_eq!(row, 1);
                assert_eq!(value, "2024-03-02");
            }
            other => panic!("expected DateParse, got {other:?}"),
        }
    }

    #[test]
    fn no_surviving_rows_is_fatal() {
        let mut bad = row("01.03.2024", 10);
        bad[3] = Cell::text("-");
        let table = RawTable::new(header("Дата"), vec![bad]);
        assert!(matches!(
            normalize(&table),
            Err(ForecastError::NoValidRows { dropped: 1 })
        ));

        let empty = RawTable::new(header("Дата"), vec![]);
        assert!(matches!(
            normalize(&empty),
            Err(ForecastError::NoValidRows { dropped: 0 })
        ));
    }

    #[test]
    fn labeled_columns_beat_position() {
        // hours are laid out in reverse, with an extra column in between
        let mut headers = vec!["Дата".to_string(), "Total".to_string()];
        headers.extend((1..=24).rev().map(|h| h.to_string()));
        let mut cells = vec![Cell::text("15.03.2024"), Cell::text("99999")];
        cells.extend((1..=24u64).rev().map(|h| Cell::Number(h as f64 * 10.0)));
        let table = RawTable::new(headers, vec![cells]);

        let out = normalize_with_report(&table).unwrap();
        assert!(matches!(out.hour_columns, HourColumns::Labeled(_)));
        let rec = &out.records.as_slice()[0];
        assert_eq!(rec.hour(1), Some(10));
        assert_eq!(rec.hour(24), Some(240));
    }

    #[test]
    fn ambiguous_or_missing_labels_fall_back_to_position() {
        let mut dup = header("Дата");
        dup[5] = "1".to_string();
        assert_eq!(HourColumns::resolve(&dup), HourColumns::Positional);

        let unlabeled: Vec<String> = (0..25).map(|c| format!("Unnamed: {c}")).collect();
        assert_eq!(HourColumns::resolve(&unlabeled), HourColumns::Positional);
        assert_eq!(HourColumns::resolve(&[]), HourColumns::Positional);

        let table = RawTable::new(unlabeled, vec![row("15.03.2024", 500)]);
        let rec = normalize(&table).unwrap().into_vec().remove(0);
        assert_eq!(rec.hour(1), Some(500));
        assert_eq!(rec.hour(24), Some(523));
    }

    #[test]
    fn fractional_values_are_rounded() {
        let mut r = row("15.03.2024", 0);
        r[1] = Cell::Number(4312.5);
        r[2] = Cell::text("4312,4");
        let table = RawTable::new(header("Дата"), vec![r]);
        let rec = normalize(&table).unwrap().into_vec().remove(0);
        assert_eq!(rec.hour(1), Some(4313));
        assert_eq!(rec.hour(2), Some(4312));
    }

    #[test]
    fn blank_rows_and_duplicate_dates() {
        let table = RawTable::new(
            header("Дата"),
            vec![
                row("01.03.2024", 10),
                vec![Cell::Empty; 25],
                row("01.03.2024", 20),
            ],
        );
        let out = normalize_with_report(&table).unwrap();
        assert_eq!(out.report.blank_rows, 1);
        assert_eq!(out.report.duplicate_dates, 1);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records.as_slice()[0].hour(1), Some(20));
    }
}
