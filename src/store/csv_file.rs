// src/store/csv_file.rs

use anyhow::{anyhow, Context, Result};
use csv::{ReaderBuilder, Trim, WriterBuilder};
use std::{fs::File, io::BufWriter, path::Path};

use super::{ColumnMap, MasterRows};
use crate::process::utils;
use crate::record::{master_columns, RecordSet, HOURS};

/// Read a CSV master. Columns are found by (trimmed) header label, so extra
/// or reordered columns are fine; a missing hour column reads as absent.
pub fn read(path: &Path) -> Result<MasterRows> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let columns = ColumnMap::from_headers(
        &rdr.headers()
            .context("reading CSV header")?
            .iter()
            .collect::<Vec<_>>(),
    );

    let mut out = MasterRows::default();
    for rec in rdr.records() {
        let rec = rec.context("reading CSV row")?;
        match columns.record(|i| rec.get(i).and_then(utils::parse_number)) {
            Some(r) => out.records.push(r),
            None => out.skipped += 1,
        }
    }
    Ok(out)
}

/// Write `Year, Month, Day, 1..24`; absent hours are empty fields.
pub fn write(file: File, records: &RecordSet) -> Result<File> {
    let mut wtr = WriterBuilder::new().from_writer(BufWriter::new(file));
    wtr.write_record(master_columns())
        .context("writing CSV header")?;
    for r in records {
        let mut row = Vec::with_capacity(3 + HOURS);
        row.push(r.year.to_string());
        row.push(r.month.to_string());
        row.push(r.day.to_string());
        row.extend(
            r.hours
                .iter()
                .map(|h| h.map(|v| v.to_string()).unwrap_or_default()),
        );
        wtr.write_record(&row)
            .with_context(|| format!("writing CSV row for {}", r.key()))?;
    }
    let buf = wtr
        .into_inner()
        .map_err(|e| anyhow!("flushing CSV writer: {}", e.error()))?;
    buf.into_inner()
        .map_err(|e| e.into_error())
        .context("flushing CSV buffer")
}
