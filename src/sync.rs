//! HTTP access to the library server's progress and bookmark endpoints.
//!
//! The wire contract is small: one GET to restore a position, one JSON POST
//! to save it, and one form-encoded POST for bookmarks. Every write carries
//! the anti-forgery token the host page embedded. Callers decide what a
//! failure means; this module only reports it.

use crate::config::{BookEnv, BookFormat};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const CSRF_HEADER: &str = "X-CSRFToken";
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Server-side persistence for reading positions and bookmarks.
///
/// The production implementation is [`SyncClient`]; tests substitute
/// recording doubles.
pub trait ProgressStore {
    /// Saved position token for (book, format), if any.
    fn fetch_progress(&self, book_id: u64, format: BookFormat) -> Result<Option<String>>;
    fn save_progress(&self, update: &ProgressUpdate) -> Result<()>;
    /// Persist the single bookmark; the empty string clears it.
    fn save_bookmark(&self, location: &str) -> Result<()>;
}

/// Body of the save POST, matching the server's expected fields exactly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressUpdate {
    pub book_id: u64,
    pub format: BookFormat,
    /// Opaque positional token, always stringified on the wire.
    pub progress: String,
    /// Derived display percentage, 0-100.
    pub progress_percent: u8,
}

#[derive(Debug, Deserialize)]
struct ProgressResponse {
    status: String,
    #[serde(default)]
    progress: Option<serde_json::Value>,
}

/// Blocking HTTP client bound to one book environment.
pub struct SyncClient {
    http: reqwest::blocking::Client,
    base_url: String,
    content_url: String,
    bookmark_url: String,
    csrf_token: String,
}

impl SyncClient {
    pub fn new(env: &BookEnv) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(SyncClient {
            http,
            base_url: env.server_url.trim_end_matches('/').to_string(),
            content_url: env.content_url.clone(),
            bookmark_url: env.bookmark_url.clone(),
            csrf_token: env.csrf_token.clone(),
        })
    }

    /// Fetch the document body the host renders into the viewport. Used by
    /// the text paginator; the EPUB engine streams its own content.
    pub fn fetch_content(&self) -> Result<String> {
        self.http
            .get(&self.content_url)
            .send()
            .with_context(|| format!("content request to {} failed", self.content_url))?
            .error_for_status()
            .with_context(|| format!("content request to {} rejected", self.content_url))?
            .text()
            .with_context(|| format!("content from {} was not readable text", self.content_url))
    }

    fn get_progress_url(&self, book_id: u64, format: BookFormat) -> String {
        format!("{}/ajax/get_progress/{}/{}", self.base_url, book_id, format)
    }

    fn save_progress_url(&self) -> String {
        format!("{}/ajax/save_progress", self.base_url)
    }
}

impl ProgressStore for SyncClient {
    fn fetch_progress(&self, book_id: u64, format: BookFormat) -> Result<Option<String>> {
        let url = self.get_progress_url(book_id, format);
        let response = self
            .http
            .get(&url)
            .send()
            .with_context(|| format!("progress request to {url} failed"))?
            .error_for_status()
            .with_context(|| format!("progress request to {url} rejected"))?;
        let body: ProgressResponse = response
            .json()
            .with_context(|| format!("malformed progress JSON from {url}"))?;
        if body.status != "success" {
            return Ok(None);
        }
        Ok(body.progress.and_then(token_from_value))
    }

    fn save_progress(&self, update: &ProgressUpdate) -> Result<()> {
        let url = self.save_progress_url();
        self.http
            .post(&url)
            .header(CSRF_HEADER, &self.csrf_token)
            .json(update)
            .send()
            .with_context(|| format!("save request to {url} failed"))?
            .error_for_status()
            .with_context(|| format!("save request to {url} rejected"))?;
        Ok(())
    }

    fn save_bookmark(&self, location: &str) -> Result<()> {
        self.http
            .post(&self.bookmark_url)
            .header(CSRF_HEADER, &self.csrf_token)
            .form(&[("bookmark", location)])
            .send()
            .with_context(|| format!("bookmark request to {} failed", self.bookmark_url))?
            .error_for_status()
            .with_context(|| format!("bookmark request to {} rejected", self.bookmark_url))?;
        Ok(())
    }
}

/// The token is stored stringified, but older rows may echo back raw
/// numbers; normalize either shape to a string.
fn token_from_value(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(token) => Some(token).filter(|t| !t.is_empty()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}
