// src/pipeline.rs

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::PathBuf;
use tracing::{info, instrument, warn};

use crate::archive::Archive;
use crate::config::Config;
use crate::error::ForecastError;
use crate::fetch::{fetch_document, Document};
use crate::process::{merge_with_stats, normalize_with_report, MergeStats, NormalizeReport};
use crate::record::RecordSet;
use crate::store::{read_master_sheet, write_master_sheet};
use crate::table::TableSelector;

/// Result of the pure part of a run: extract → select → normalize → merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutcome {
    pub merged: RecordSet,
    pub incoming: usize,
    pub report: NormalizeReport,
    pub stats: MergeStats,
}

/// Turn a fetched document into the next master record. No I/O.
pub fn process_document(
    doc: &Document,
    existing: &RecordSet,
    today: NaiveDate,
    selector: &TableSelector,
) -> Result<ProcessOutcome, ForecastError> {
    let candidates = doc.tables()?;
    let table = selector.select(candidates)?;
    let normalized = normalize_with_report(&table)?;
    let (merged, stats) = merge_with_stats(existing, &normalized.records, today);
    Ok(ProcessOutcome {
        merged,
        incoming: normalized.records.len(),
        report: normalized.report,
        stats,
    })
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub rows_before: usize,
    pub rows_after: usize,
    /// Dates new to the master.
    pub added: usize,
    /// Dates already in the master whose values changed.
    pub replaced: usize,
    pub incoming: usize,
    pub report: NormalizeReport,
    pub stats: MergeStats,
    pub written: bool,
    pub snapshot: Option<PathBuf>,
    pub swept: Vec<PathBuf>,
}

fn diff_counts(before: &RecordSet, after: &RecordSet) -> (usize, usize) {
    let mut added = 0;
    let mut replaced = 0;
    for rec in after {
        match before.get(&rec.key()) {
            None => added += 1,
            Some(old) if old != rec => replaced += 1,
            Some(_) => {}
        }
    }
    (added, replaced)
}

fn persist(cfg: &Config, merged: &RecordSet, today: NaiveDate) -> Result<(PathBuf, Vec<PathBuf>)> {
    write_master_sheet(&cfg.output, merged, &cfg.sheet_name)?;
    info!(path = %cfg.output.display(), "master saved");

    let archive =
        Archive::for_master(&cfg.output, cfg.archive_dir())?.with_sheet(cfg.sheet_name.as_str());
    let snapshot = archive.write_snapshot(merged, today)?;
    let swept = archive.sweep(today, cfg.retention_days)?;
    Ok((snapshot, swept))
}

/// One full run: fetch the source, merge it into the master, save, archive.
///
/// Any failure before the write leaves the master file untouched.
#[instrument(level = "info", skip(cfg), fields(output = %cfg.output.display()))]
pub async fn run(cfg: &Config, today: NaiveDate, dry_run: bool) -> Result<RunSummary> {
    // ─── 1) fetch ────────────────────────────────────────────────────
    let doc = fetch_document(cfg).await?;

    // ─── 2) current master ───────────────────────────────────────────
    let output = cfg.output.clone();
    let sheet = cfg.sheet_name.clone();
    let existing =
        tokio::task::spawn_blocking(move || read_master_sheet(&output, &sheet)).await??;

    // ─── 3) select → normalize → merge ───────────────────────────────
    let outcome = process_document(&doc, &existing, today, &cfg.selector())
        .with_context(|| format!("processing {}", doc.source))?;

    let report = outcome.report;
    if report.dropped() > 0 {
        warn!(
            short = report.short_rows,
            invalid = report.invalid_rows,
            "dropped incomplete forecast rows"
        );
    }

    let (added, replaced) = diff_counts(&existing, &outcome.merged);
    let mut summary = RunSummary {
        rows_before: existing.len(),
        rows_after: outcome.merged.len(),
        added,
        replaced,
        incoming: outcome.incoming,
        report,
        stats: outcome.stats,
        ..RunSummary::default()
    };
    info!(
        "Rows: {} -> {} (added: {}, replaced: {})",
        summary.rows_before, summary.rows_after, summary.added, summary.replaced
    );

    if dry_run {
        info!("dry run; nothing written");
        return Ok(summary);
    }

    // ─── 4) save + archive ───────────────────────────────────────────
    let merged = outcome.merged;
    let persist_cfg = cfg.clone();
    let (snapshot, swept) =
        tokio::task::spawn_blocking(move || persist(&persist_cfg, &merged, today)).await??;

    summary.written = true;
    summary.snapshot = Some(snapshot);
    summary.swept = swept;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::DocumentKind;
    use crate::record::{DailyRecord, DateKey};

    fn html_doc(rows: &[(&str, u64)]) -> Document {
        let head: String = (1..=24).map(|h| format!("<th>{h}</th>")).collect();
        let body: String = rows
            .iter()
            .map(|(d, base)| {
                let cells: String = (0..24).map(|h| format!("<td>{}</td>", base + h)).collect();
                format!("<tr><td>{d}</td>{cells}</tr>")
            })
            .collect();
        let html = format!(
            "<table><tr><td>menu</td><td>1</td></tr></table>\
             <table><thead><tr><th>Дата</th>{head}</tr></thead><tbody>{body}</tbody></table>"
        );
        Document::new("test", DocumentKind::Html, html)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn processes_document_into_master() {
        let existing = RecordSet::from_records(vec![
            DailyRecord::complete(DateKey::new(2024, 3, 14), [1; 24]),
            DailyRecord::complete(DateKey::new(2024, 3, 15), [1; 24]),
        ]);
        let doc = html_doc(&[("15.03.2024", 100), ("16.03.2024", 200)]);
        let out = process_document(&doc, &existing, day(15), &TableSelector::default()).unwrap();

        assert_eq!(out.incoming, 2);
        assert_eq!(out.merged.len(), 3);
        assert_eq!(out.merged.as_slice()[0], existing.as_slice()[0]);
        assert_eq!(out.merged.as_slice()[1].hour(1), Some(100));
        assert_eq!(out.stats.discarded_future, 1);

        assert_eq!(diff_counts(&existing, &out.merged), (1, 1));
    }

    #[test]
    fn fatal_errors_surface_unchanged() {
        let empty = Document::new("test", DocumentKind::Html, "<p>no tables</p>");
        let err = process_document(&empty, &RecordSet::new(), day(1), &TableSelector::default())
            .unwrap_err();
        assert!(matches!(err, ForecastError::NoTableFound));

        let bad_date = html_doc(&[("2024/03/15", 1)]);
        let err = process_document(&bad_date, &RecordSet::new(), day(1), &TableSelector::default())
            .unwrap_err();
        assert!(matches!(err, ForecastError::DateParse { .. }));
    }
}
