use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, CONTENT_TYPE, REFERER};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::db::{self, PageRow};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";
const TIMEOUT_SECS: u64 = 30;
const MAX_RETRIES: u32 = 3;
const BASE_BACKOFF_MS: u64 = 2000;

pub struct Fetched {
    pub html: String,
    pub status: i32,
    pub content_type: Option<String>,
}

/// The cache key: trailing path segment of the page URL. Opaque to the
/// extractor; only the cache and the CLI care about it.
pub fn external_id(url: &str) -> String {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or("")
        .to_string()
}

/// Cache-first page access. Stored HTML wins unless `fresh` forces a
/// download; a fresh result (or its error) is persisted either way.
pub async fn fetch_or_cached(conn: &Connection, url: &str, fresh: bool) -> Result<(String, String)> {
    let id = external_id(url);
    if !fresh {
        if let Some(page) = db::load_page(conn, &id)? {
            info!("Using cached HTML for {} (fetched {})", id, page.fetched_at);
            return Ok((page.html, id));
        }
    }

    match fetch_page(url).await {
        Ok(fetched) => {
            db::save_page(
                conn,
                &PageRow {
                    external_id: id.clone(),
                    url: url.to_string(),
                    html: Some(fetched.html.clone()),
                    status: Some(fetched.status),
                    content_type: fetched.content_type,
                    error: None,
                },
            )?;
            info!("Fetched {} ({} bytes)", url, fetched.html.len());
            Ok((fetched.html, id))
        }
        Err(e) => {
            db::save_page(
                conn,
                &PageRow {
                    external_id: id.clone(),
                    url: url.to_string(),
                    html: None,
                    status: None,
                    content_type: None,
                    error: Some(e.to_string()),
                },
            )?;
            Err(e)
        }
    }
}

/// Download one page, retrying 429/5xx with exponential backoff.
pub async fn fetch_page(url: &str) -> Result<Fetched> {
    let client = client()?;
    let mut attempt = 0;
    loop {
        match try_fetch(&client, url).await {
            Ok(fetched) => return Ok(fetched),
            Err(e) if attempt < MAX_RETRIES && retryable(&e) => {
                let backoff = Duration::from_millis(BASE_BACKOFF_MS * 2u64.pow(attempt));
                warn!(
                    "Fetch failed for {} (attempt {}/{}), backing off {:.1}s: {}",
                    url,
                    attempt + 1,
                    MAX_RETRIES,
                    backoff.as_secs_f64(),
                    e
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

fn client() -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-IN,en;q=0.9"));
    headers.insert(REFERER, HeaderValue::from_static("https://www.google.com/"));
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .timeout(Duration::from_secs(TIMEOUT_SECS))
        .build()
        .context("Failed to build HTTP client")
}

async fn try_fetch(client: &reqwest::Client, url: &str) -> Result<Fetched> {
    let resp = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Request failed: {}", url))?;

    let status = resp.status();
    let content_type = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    if !status.is_success() {
        anyhow::bail!("HTTP {} for {}", status.as_u16(), url);
    }

    let html = resp
        .text()
        .await
        .with_context(|| format!("Failed to read body: {}", url))?;

    Ok(Fetched {
        html,
        status: status.as_u16() as i32,
        content_type,
    })
}

fn retryable(e: &anyhow::Error) -> bool {
    let msg = e.to_string();
    msg.contains("429")
        || msg.contains("500")
        || msg.contains("502")
        || msg.contains("503")
        || msg.contains("timed out")
}

// ── Tests ──
