// src/store/mod.rs

pub mod csv_file;
pub mod parquet_file;
pub mod xlsx_file;

use anyhow::{bail, Context, Result};
use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument, warn};

use crate::process::utils;
use crate::record::{DailyRecord, DateKey, RecordSet, HOURS};

/// Worksheet used when none is configured.
pub const DEFAULT_SHEET: &str = "Sheet1";

/// On-disk layout of the master record, chosen by file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MasterFormat {
    /// Excel workbook; the master lives on one named worksheet.
    Xlsx,
    /// Spreadsheet-compatible text, one row per day.
    Csv,
    Parquet,
}

impl MasterFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("xlsx") => Ok(MasterFormat::Xlsx),
            Some("csv") => Ok(MasterFormat::Csv),
            Some("parquet") => Ok(MasterFormat::Parquet),
            _ => bail!(
                "unsupported master file `{}`: expected .xlsx, .csv or .parquet",
                path.display()
            ),
        }
    }
}

/// Rows of a master file before keying, plus how many had to be skipped.
#[derive(Debug, Default)]
pub struct MasterRows {
    pub records: Vec<DailyRecord>,
    pub skipped: usize,
}

/// Positions of the master columns in a header row, matched by trimmed label
/// ignoring ASCII case. Extra or reordered columns are fine; a missing hour
/// column reads as absent.
pub(crate) struct ColumnMap {
    pub year: Option<usize>,
    pub month: Option<usize>,
    pub day: Option<usize>,
    pub hours: Vec<Option<usize>>,
}

impl ColumnMap {
    pub fn from_headers<S: AsRef<str>>(headers: &[S]) -> Self {
        let labels: Vec<String> = headers.iter().map(|h| utils::clean_str(h.as_ref())).collect();
        let col = |name: &str| labels.iter().position(|l| l.eq_ignore_ascii_case(name));
        Self {
            year: col("Year"),
            month: col("Month"),
            day: col("Day"),
            hours: (1..=HOURS).map(|h| col(&h.to_string())).collect(),
        }
    }

    /// Build a record from one row, reading each cell through `num`.
    pub fn record<F>(&self, num: F) -> Option<DailyRecord>
    where
        F: Fn(usize) -> Option<f64>,
    {
        let get = |i: Option<usize>| i.and_then(&num);
        record_from_fields(
            get(self.year),
            get(self.month),
            get(self.day),
            self.hours.iter().map(|&c| get(c)),
        )
    }
}

/// Year/Month/Day must be whole numbers in range; hours may be absent.
pub(crate) fn record_from_fields(
    year: Option<f64>,
    month: Option<f64>,
    day: Option<f64>,
    hours: impl Iterator<Item = Option<f64>>,
) -> Option<DailyRecord> {
    let whole = |v: Option<f64>| v.filter(|x| x.fract() == 0.0);
    let year = whole(year).filter(|y| (1.0..=9999.0).contains(y))? as i32;
    let month = whole(month).filter(|m| (1.0..=12.0).contains(m))? as u32;
    let day = whole(day).filter(|d| (1.0..=31.0).contains(d))? as u32;

    let mut slots = [None; HOURS];
    for (slot, v) in slots.iter_mut().zip(hours) {
        *slot = v.and_then(utils::to_load);
    }
    Some(DailyRecord::new(DateKey::new(year, month, day), slots))
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(".tmp");
    PathBuf::from(s)
}

/// Load the master record from [`DEFAULT_SHEET`] when it is a workbook.
pub fn read_master(path: &Path) -> Result<RecordSet> {
    read_master_sheet(path, DEFAULT_SHEET)
}

/// Load the master record. A missing file is an empty master. `sheet` only
/// matters for `.xlsx`.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn read_master_sheet(path: &Path, sheet: &str) -> Result<RecordSet> {
    if !path.exists() {
        info!("no master file yet; starting empty");
        return Ok(RecordSet::new());
    }
    let rows = match MasterFormat::from_path(path)? {
        MasterFormat::Xlsx => xlsx_file::read(path, sheet),
        MasterFormat::Csv => csv_file::read(path),
        MasterFormat::Parquet => parquet_file::read(path),
    }
    .with_context(|| format!("reading master {}", path.display()))?;

    if rows.skipped > 0 {
        warn!(skipped = rows.skipped, "master rows without a usable date were skipped");
    }
    let total = rows.records.len();
    let set = RecordSet::from_records(rows.records);
    if set.len() < total {
        warn!(duplicates = total - set.len(), "master repeats dates; keeping last rows");
    }
    let gaps = set.iter().filter(|r| !r.is_complete()).count();
    if gaps > 0 {
        debug!(days = gaps, "master has days with missing hours");
    }
    debug!(rows = set.len(), "loaded master");
    Ok(set)
}

/// Write the master, to [`DEFAULT_SHEET`] when it is a workbook.
pub fn write_master(path: &Path, records: &RecordSet) -> Result<()> {
    write_master_sheet(path, records, DEFAULT_SHEET)
}

/// Replace the master file atomically: write `<path>.tmp`, sync, rename.
#[instrument(level = "info", skip_all, fields(path = %path.display(), rows = records.len()))]
pub fn write_master_sheet(path: &Path, records: &RecordSet, sheet: &str) -> Result<()> {
    let format = MasterFormat::from_path(path)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }

    let tmp = tmp_path(path);
    let written = File::create(&tmp)
        .with_context(|| format!("creating {}", tmp.display()))
        .and_then(|file| match format {
            MasterFormat::Xlsx => xlsx_file::write(file, records, sheet),
            MasterFormat::Csv => csv_file::write(file, records),
            MasterFormat::Parquet => parquet_file::write(file, records),
        })
        .and_then(|file| file.sync_all().context("syncing master file"));

    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(e.context(format!("writing master {}", path.display())));
    }

    fs::rename(&tmp, path)
        .with_context(|| format!("renaming {} to {}", tmp.display(), path.display()))?;
    debug!("master written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> RecordSet {
        let mut gap = DailyRecord::complete(DateKey::new(2024, 3, 16), [5000; HOURS]);
        gap.hours[11] = None;
        RecordSet::from_records(vec![
            DailyRecord::complete(DateKey::new(2024, 3, 15), std::array::from_fn(|h| 4000 + h as u64)),
            gap,
        ])
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(MasterFormat::from_path(Path::new("a/b.CSV")).unwrap(), MasterFormat::Csv);
        assert_eq!(
            MasterFormat::from_path(Path::new("b.parquet")).unwrap(),
            MasterFormat::Parquet
        );
        assert_eq!(
            MasterFormat::from_path(Path::new("data/plexos_load_master.xlsx")).unwrap(),
            MasterFormat::Xlsx
        );
        assert!(MasterFormat::from_path(Path::new("b.xls")).is_err());
        assert!(MasterFormat::from_path(Path::new("b")).is_err());
    }

    #[test]
    fn missing_master_is_empty() -> Result<()> {
        let dir = tempdir()?;
        assert!(read_master(&dir.path().join("none.csv"))?.is_empty());
        Ok(())
    }

    #[test]
    fn every_format_preserves_gaps() -> Result<()> {
        let dir = tempdir()?;
        for name in ["nested/master.xlsx", "nested/master.csv", "nested/master.parquet"] {
            let path = dir.path().join(name);
            write_master(&path, &sample())?;
            assert!(!tmp_path(&path).exists());
            let back = read_master(&path)?;
            assert_eq!(back, sample(), "{name}");
            assert_eq!(back.as_slice()[1].hour(12), None);
        }
        Ok(())
    }

    #[test]
    fn workbook_keeps_configured_sheet() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("master.xlsx");
        write_master_sheet(&path, &sample(), "Прогноза")?;
        assert_eq!(read_master_sheet(&path, "Прогноза")?, sample());
        assert!(read_master_sheet(&path, DEFAULT_SHEET).is_err());
        Ok(())
    }

    #[test]
    fn column_map_matches_labels_loosely() {
        let map = ColumnMap::from_headers(&[" day ", "YEAR", "Note", "Month", "2"]);
        assert_eq!((map.year, map.month, map.day), (Some(1), Some(3), Some(0)));
        assert_eq!(map.hours[1], Some(4));
        assert_eq!(map.hours[0], None);

        let cells = [Some(15.0), Some(2024.0), None, Some(3.0), Some(4312.0)];
        let rec = map.record(|i| cells[i]).unwrap();
        assert_eq!(rec.key(), DateKey::new(2024, 3, 15));
        assert_eq!(rec.hour(2), Some(4312));
        assert!(!rec.is_complete());
    }

    #[test]
    fn rewrite_replaces_previous_content() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("master.csv");
        write_master(&path, &sample())?;
        let smaller = RecordSet::from_records(vec![sample().into_vec().remove(0)]);
        write_master(&path, &smaller)?;
        assert_eq!(read_master(&path)?, smaller);
        Ok(())
    }

    #[test]
    fn record_fields_validation() {
        let hours = || std::iter::repeat(Some(1.0)).take(HOURS);
        assert!(record_from_fields(Some(2024.0), Some(3.0), Some(15.0), hours()).is_some());
        assert!(record_from_fields(None, Some(3.0), Some(15.0), hours()).is_none());
        assert!(record_from_fields(Some(2024.0), Some(13.0), Some(15.0), hours()).is_none());
        assert!(record_from_fields(Some(2024.5), Some(3.0), Some(15.0), hours()).is_none());

        let short = record_from_fields(Some(2024.0), Some(3.0), Some(15.0), hours().take(3)).unwrap();
        assert_eq!(short.hour(3), Some(1));
        assert_eq!(short.hour(4), None);
    }
}
