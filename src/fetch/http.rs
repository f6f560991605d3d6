// src/fetch/http.rs

use anyhow::{Context, Result};
use reqwest::{header, Client};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, warn};
use url::Url;

use crate::config::HttpConfig;

/// Body and `Content-Type` of a successful response.
pub struct Fetched {
    pub body: String,
    pub content_type: Option<String>,
}

pub fn build_client(cfg: &HttpConfig) -> Result<Client> {
    let mut headers = header::HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        header::HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,application/json;q=0.9,*/*;q=0.8",
        ),
    );
    Client::builder()
        .user_agent(cfg.user_agent.clone())
        .default_headers(headers)
        .timeout(Duration::from_secs(cfg.timeout_secs))
        .gzip(true)
        .build()
        .context("building HTTP client")
}

async fn get_text_core(client: &Client, url: &Url) -> Result<Fetched> {
    debug!("Fetching text from {}", url);
    let resp = client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("GET {} failed", url))?
        .error_for_status()
        .with_context(|| format!("Non-success status {}", url))?;
    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = resp
        .text()
        .await
        .with_context(|| format!("Reading text from {}", url))?;
    Ok(Fetched { body, content_type })
}

/// GET with exponential backoff: `initial_backoff_ms * 2^(attempt-1)`.
pub async fn get_text_with_retry(client: &Client, url: &Url, cfg: &HttpConfig) -> Result<Fetched> {
    let mut attempts = 0;
    loop {
        match get_text_core(client, url).await {
            Ok(t) => return Ok(t),
            Err(e) if attempts < cfg.max_retries => {
                attempts += 1;
                let backoff = backoff_ms(cfg.initial_backoff_ms, attempts);
                warn!(%url, attempt = attempts, delay_ms = backoff, error = %e, "Retrying");
                sleep(Duration::from_millis(backoff)).await;
            }
            Err(e) => {
                error!(%url, error = %e, "Exhausted retries");
                return Err(e);
            }
        }
    }
}

fn backoff_ms(initial: u64, attempt: u32) -> u64 {
    initial.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)))
}
