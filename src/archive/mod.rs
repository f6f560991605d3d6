// src/archive/mod.rs

use anyhow::{anyhow, Context, Result};
use chrono::{Duration, NaiveDate};
use glob::{glob, Pattern};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument, warn};

use crate::record::RecordSet;
use crate::store::{write_master_sheet, MasterFormat, DEFAULT_SHEET};

/// Dated copies of the master record: `<dir>/<stem>_<YYYYMMDD>.<ext>`.
pub struct Archive {
    dir: PathBuf,
    stem: String,
    ext: String,
    sheet: String,
}

impl Archive {
    /// Snapshots of `master` (same stem and format) kept in `dir`.
    pub fn for_master(master: &Path, dir: impl Into<PathBuf>) -> Result<Self> {
        MasterFormat::from_path(master)?;
        let stem = master
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| anyhow!("master path `{}` has no file stem", master.display()))?;
        let ext = master
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| anyhow!("master path `{}` has no extension", master.display()))?;
        Ok(Self {
            dir: dir.into(),
            stem: stem.to_string(),
            ext: ext.to_string(),
            sheet: DEFAULT_SHEET.to_string(),
        })
    }

    /// Worksheet used for `.xlsx` snapshots.
    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = sheet.into();
        self
    }

    pub fn snapshot_path(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("{}_{}.{}", self.stem, date.format("%Y%m%d"), self.ext))
    }

    /// Write today's snapshot; a same-day rerun overwrites it.
    #[instrument(level = "info", skip(self, records), fields(dir = %self.dir.display()))]
    pub fn write_snapshot(&self, records: &RecordSet, today: NaiveDate) -> Result<PathBuf> {
        let path = self.snapshot_path(today);
        write_master_sheet(&path, records, &self.sheet)
            .with_context(|| format!("writing snapshot {}", path.display()))?;
        info!(path = %path.display(), rows = records.len(), "snapshot written");
        Ok(path)
    }

    fn snapshot_date(&self, path: &Path) -> Option<NaiveDate> {
        let name = path.file_name()?.to_str()?;
        let stamp = name
            .strip_prefix(&format!("{}_", self.stem))?
            .strip_suffix(&format!(".{}", self.ext))?;
        if stamp.len() != 8 || !stamp.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        NaiveDate::parse_from_str(stamp, "%Y%m%d").ok()
    }

    /// Existing snapshots, oldest first.
    pub fn snapshots(&self) -> Result<Vec<(NaiveDate, PathBuf)>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }
        let pattern = format!(
            "{}/{}_*.{}",
            Pattern::escape(&self.dir.display().to_string()),
            Pattern::escape(&self.stem),
            Pattern::escape(&self.ext)
        );
        let mut out = Vec::new();
        for entry in glob(&pattern).context("invalid glob pattern for snapshots")? {
            let path = match entry {
                Ok(p) => p,
                Err(e) => {
                    warn!(error = %e, "cannot read snapshot entry");
                    continue;
                }
            };
            if !path.is_file() {
                continue;
            }
            match self.snapshot_date(&path) {
                Some(d) => out.push((d, path)),
                None => debug!(path = %path.display(), "not a snapshot; ignoring"),
            }
        }
        out.sort();
        Ok(out)
    }

    /// Delete snapshots dated before `today - retention_days`. A retention of
    /// zero keeps everything. Returns the removed paths.
    #[instrument(level = "info", skip(self), fields(dir = %self.dir.display()))]
    pub fn sweep(&self, today: NaiveDate, retention_days: u32) -> Result<Vec<PathBuf>> {
        if retention_days == 0 {
            return Ok(Vec::new());
        }
        let cutoff = today - Duration::days(i64::from(retention_days));
        let mut removed = Vec::new();
        for (date, path) in self.snapshots()? {
            if date >= cutoff {
                continue;
            }
            fs::remove_file(&path)
                .with_context(|| format!("removing snapshot {}", path.display()))?;
            debug!(path = %path.display(), %date, "snapshot expired");
            removed.push(path);
        }
        if !removed.is_empty() {
            info!(removed = removed.len(), %cutoff, "swept old snapshots");
        }
        Ok(removed)
    }
}
