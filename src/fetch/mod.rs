// src/fetch/mod.rs

pub mod http;

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{info, instrument};
use url::Url;

use crate::config::Config;
use crate::error::ForecastError;
use crate::table::{html::tables_from_html, json::tables_from_json, RawTable};

/// Encoding of the source document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentKind {
    Html,
    Json,
}

/// A retrieved source document, not yet parsed.
#[derive(Clone, Debug)]
pub struct Document {
    pub source: String,
    pub kind: DocumentKind,
    pub body: String,
}

impl Document {
    pub fn new(source: impl Into<String>, kind: DocumentKind, body: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            kind,
            body: body.into(),
        }
    }

    /// Candidate tables for the selector.
    pub fn tables(&self) -> Result<Vec<RawTable>, ForecastError> {
        match self.kind {
            DocumentKind::Html => Ok(tables_from_html(&self.body)),
            DocumentKind::Json => tables_from_json(&self.body),
        }
    }
}

/// `Content-Type` first, then a `.json` extension, then the first
/// non-blank character of the body.
pub fn detect_kind(content_type: Option<&str>, location: &str, body: &str) -> DocumentKind {
    if let Some(ct) = content_type {
        let ct = ct.to_ascii_lowercase();
        if ct.contains("json") {
            return DocumentKind::Json;
        }
        if ct.contains("html") {
            return DocumentKind::Html;
        }
    }
    let path = Url::parse(location)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| location.to_string());
    if path.to_ascii_lowercase().ends_with(".json") {
        return DocumentKind::Json;
    }
    match body.trim_start().chars().next() {
        Some('{') | Some('[') => DocumentKind::Json,
        _ => DocumentKind::Html,
    }
}

/// `Some(url)` when `source` should go over the network.
pub fn remote_url(source: &str) -> Option<Url> {
    Url::parse(source)
        .ok()
        .filter(|u| matches!(u.scheme(), "http" | "https"))
}

/// Filesystem path of a non-remote source; `file://` URLs are accepted.
pub fn local_path(source: &str) -> PathBuf {
    Url::parse(source)
        .ok()
        .filter(|u| u.scheme() == "file")
        .and_then(|u| u.to_file_path().ok())
        .unwrap_or_else(|| PathBuf::from(source))
}

/// Retrieve the configured source: over HTTP(S) with retries, or from disk.
#[instrument(level = "info", skip(cfg), fields(source = %cfg.source))]
pub async fn fetch_document(cfg: &Config) -> Result<Document> {
    let doc = match remote_url(&cfg.source) {
        Some(url) => {
            let client = http::build_client(&cfg.http)?;
            let fetched = http::get_text_with_retry(&client, &url, &cfg.http).await?;
            let kind = detect_kind(fetched.content_type.as_deref(), &cfg.source, &fetched.body);
            Document::new(cfg.source.clone(), kind, fetched.body)
        }
        None => {
            let path = local_path(&cfg.source);
            let body = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("reading source file {}", path.display()))?;
            let kind = detect_kind(None, &cfg.source, &body);
            Document::new(cfg.source.clone(), kind, body)
        }
    };
    info!(kind = ?doc.kind, bytes = doc.body.len(), "fetched source document");
    Ok(doc)
}
