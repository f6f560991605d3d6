// src/store/xlsx_file.rs

use anyhow::{Context, Result};
use calamine::{open_workbook, Data, Reader, Xlsx};
use rust_xlsxwriter::Workbook;
use std::{fs::File, io::Write, path::Path};

use super::{ColumnMap, MasterRows};
use crate::process::utils;
use crate::record::{master_columns, RecordSet};

fn label(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => utils::clean_str(s),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

fn number(cell: &Data) -> Option<f64> {
    match cell {
        Data::Int(i) => Some(*i as f64),
        Data::Float(f) if f.is_finite() => Some(*f),
        Data::String(s) => utils::parse_number(s),
        _ => None,
    }
}

/// Read the master from worksheet `sheet`. The first used row is the header.
pub fn read(path: &Path, sheet: &str) -> Result<MasterRows> {
    let mut workbook: Xlsx<_> =
        open_workbook(path).with_context(|| format!("opening workbook {}", path.display()))?;
    let range = workbook
        .worksheet_range(sheet)
        .with_context(|| format!("reading worksheet `{}`", sheet))?;

    let mut rows = range.rows();
    let columns = match rows.next() {
        Some(header) => ColumnMap::from_headers(&header.iter().map(label).collect::<Vec<_>>()),
        None => return Ok(MasterRows::default()),
    };

    let mut out = MasterRows::default();
    for row in rows {
        if row.iter().all(|c| matches!(c, Data::Empty)) {
            continue;
        }
        match columns.record(|i| row.get(i).and_then(number)) {
            Some(r) => out.records.push(r),
            None => out.skipped += 1,
        }
    }
    Ok(out)
}

/// Write `Year, Month, Day, 1..24` to worksheet `sheet`; absent hours are
/// blank cells.
pub fn write(mut file: File, records: &RecordSet, sheet: &str) -> Result<File> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(sheet)
        .with_context(|| format!("invalid worksheet name `{}`", sheet))?;

    for (col, name) in master_columns().into_iter().enumerate() {
        worksheet
            .write_string(0, col as u16, name)
            .context("writing header row")?;
    }
    for (i, r) in records.iter().enumerate() {
        let row = u32::try_from(i + 1).context("too many rows for a worksheet")?;
        worksheet.write_number(row, 0, f64::from(r.year))?;
        worksheet.write_number(row, 1, f64::from(r.month))?;
        worksheet.write_number(row, 2, f64::from(r.day))?;
        for (h, value) in r.hours.iter().enumerate() {
            if let Some(v) = value {
                worksheet
                    .write_number(row, (h + 3) as u16, *v as f64)
                    .with_context(|| format!("writing {} hour {}", r.key(), h + 1))?;
            }
        }
    }

    let buf = workbook.save_to_buffer().context("serializing workbook")?;
    file.write_all(&buf).context("writing workbook")?;
    Ok(file)
}
