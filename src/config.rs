// src/config.rs

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::store::DEFAULT_SHEET;
use crate::table::{select::DEFAULT_DATE_LABELS, TableSelector};

pub const DEFAULT_SOURCE: &str = "https://www.eso.bg/doc?37=";
pub const DEFAULT_OUTPUT: &str = "data/plexos_load_master.xlsx";

/// HTTP settings for fetching the source page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 3,
            initial_backoff_ms: 500,
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                         AppleWebKit/537.36 (KHTML, like Gecko) \
                         Chrome/120.0 Safari/537.36"
                .to_string(),
        }
    }
}

/// Everything one run needs. Defaults, then an optional YAML file, then
/// environment/command-line overrides (see [`Cli`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// `http(s)://` URL, or a local file path.
    pub source: String,
    /// Master record; `.xlsx`, `.csv` or `.parquet`.
    pub output: PathBuf,
    /// Worksheet holding the master when `output` is a workbook.
    pub sheet_name: String,
    /// Dated snapshots go here. Defaults to `archive/` next to `output`.
    pub archive_dir: Option<PathBuf>,
    /// Snapshots older than this many days are swept; 0 keeps everything.
    pub retention_days: u32,
    /// Header labels that identify the date column of the forecast grid.
    pub date_labels: Vec<String>,
    pub http: HttpConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: DEFAULT_SOURCE.to_string(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            sheet_name: DEFAULT_SHEET.to_string(),
            archive_dir: None,
            retention_days: 30,
            date_labels: DEFAULT_DATE_LABELS.iter().map(|s| s.to_string()).collect(),
            http: HttpConfig::default(),
        }
    }
}

impl Config {
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        serde_yaml::from_str(s).context("parsing YAML config")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_yaml_str(&text).with_context(|| format!("in {}", path.display()))
    }

    pub fn archive_dir(&self) -> PathBuf {
        match &self.archive_dir {
            Some(dir) => dir.clone(),
            None => self
                .output
                .parent()
                .map(|p| p.join("archive"))
                .unwrap_or_else(|| PathBuf::from("archive")),
        }
    }

    pub fn selector(&self) -> TableSelector {
        TableSelector::new(self.date_labels.iter().cloned())
    }
}

/// Fetch the grid operator's load forecast and merge it into the master record.
#[derive(Debug, Parser)]
#[command(name = "esoload", version)]
pub struct Cli {
    /// YAML config file.
    #[arg(long, short, env = "ESO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Source page: URL or local file.
    #[arg(long, env = "ESO_URL")]
    pub source: Option<String>,

    /// Master record path (.xlsx, .csv or .parquet).
    #[arg(long, short, env = "OUT_PATH")]
    pub output: Option<PathBuf>,

    /// Worksheet of an .xlsx master.
    #[arg(long, env = "SHEET_NAME")]
    pub sheet_name: Option<String>,

    #[arg(long, env = "ARCHIVE_DIR")]
    pub archive_dir: Option<PathBuf>,

    #[arg(long, env = "RETENTION_DAYS")]
    pub retention_days: Option<u32>,

    /// Reference date (YYYY-MM-DD); days before it are history. Defaults to today.
    #[arg(long)]
    pub today: Option<NaiveDate>,

    /// Fetch and merge, but write nothing.
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    /// Layer the config file and overrides over the defaults.
    pub fn resolve(&self) -> Result<Config> {
        let mut cfg = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(source) = &self.source {
            cfg.source = source.clone();
        }
        if let Some(output) = &self.output {
            cfg.output = output.clone();
        }
        if let Some(sheet) = &self.sheet_name {
            cfg.sheet_name = sheet.clone();
        }
        if let Some(dir) = &self.archive_dir {
            cfg.archive_dir = Some(dir.clone());
        }
        if let Some(days) = self.retention_days {
            cfg.retention_days = days;
        }
        Ok(cfg)
    }
}
