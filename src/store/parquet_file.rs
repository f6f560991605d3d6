// src/store/parquet_file.rs

use anyhow::{Context, Result};
use arrow::{
    array::{Array, ArrayRef, Int64Array},
    compute::cast,
    datatypes::{DataType as ArrowDataType, Field, Schema as ArrowSchema},
    record_batch::RecordBatch,
};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::{fs::File, path::Path, sync::Arc};

use super::{record_from_fields, MasterRows};
use crate::record::{master_columns, RecordSet, HOURS};

/// `Year, Month, Day` non-null, hour columns nullable, all Int64.
pub fn master_schema() -> ArrowSchema {
    let fields = master_columns()
        .into_iter()
        .enumerate()
        .map(|(i, name)| Field::new(name, ArrowDataType::Int64, i >= 3))
        .collect::<Vec<_>>();
    ArrowSchema::new(fields)
}

pub fn write(file: File, records: &RecordSet) -> Result<File> {
    let schema = Arc::new(master_schema());

    let mut columns: Vec<ArrayRef> = Vec::with_capacity(3 + HOURS);
    columns.push(Arc::new(Int64Array::from_iter_values(
        records.iter().map(|r| r.year as i64),
    )));
    columns.push(Arc::new(Int64Array::from_iter_values(
        records.iter().map(|r| r.month as i64),
    )));
    columns.push(Arc::new(Int64Array::from_iter_values(
        records.iter().map(|r| r.day as i64),
    )));
    for h in 0..HOURS {
        let values = records
            .iter()
            .map(|r| {
                r.hours[h]
                    .map(i64::try_from)
                    .transpose()
                    .with_context(|| format!("{} hour {} does not fit in Int64", r.key(), h + 1))
            })
            .collect::<Result<Int64Array>>()?;
        columns.push(Arc::new(values));
    }

    let batch = RecordBatch::try_new(schema.clone(), columns).context("building master batch")?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer =
        ArrowWriter::try_new(file, schema, Some(props)).context("creating Arrow writer")?;
    writer.write(&batch).context("writing master batch")?;
    writer.into_inner().context("closing Arrow writer")
}

/// Column `name` of `batch` as Int64, casting other numeric types.
fn int_column(batch: &RecordBatch, name: &str) -> Result<Option<Int64Array>> {
    let idx = match batch.schema().index_of(name) {
        Ok(i) => i,
        Err(_) => return Ok(None),
    };
    let col = cast(batch.column(idx), &ArrowDataType::Int64)
        .with_context(|| format!("casting column `{}` to Int64", name))?;
    Ok(col.as_any().downcast_ref::<Int64Array>().cloned())
}

fn value(col: &Option<Int64Array>, row: usize) -> Option<f64> {
    col.as_ref()
        .filter(|c| c.is_valid(row))
        .map(|c| c.value(row) as f64)
}

pub fn read(path: &Path) -> Result<MasterRows> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?
        .with_batch_size(1024)
        .build()?;

    let mut out = MasterRows::default();
    for batch in reader {
        let batch = batch.context("reading master batch")?;
        let year = int_column(&batch, "Year")?;
        let month = int_column(&batch, "Month")?;
        let day = int_column(&batch, "Day")?;
        let hours = (1..=HOURS)
            .map(|h| int_column(&batch, &h.to_string()))
            .collect::<Result<Vec<_>>>()?;

        for row in 0..batch.num_rows() {
            match record_from_fields(
                value(&year, row),
                value(&month, row),
                value(&day, row),
                hours.iter().map(|c| value(c, row)),
            ) {
                Some(r) => out.records.push(r),
                None => out.skipped += 1,
            }
        }
    }
    Ok(out)
}
