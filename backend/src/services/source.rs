//! Job timeline sources.
//!
//! The poller only knows the [`Fetcher`] trait. Two implementations ship with
//! the crate: [`HttpFetcher`] for a remote JSON endpoint (feature
//! `http-source`) and [`FileFetcher`] for a job map exported to disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::models::TimelineSnapshot;

/// Errors a fetch can end with.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The fetch was abandoned by a newer tick or a stop. Not a failure.
    #[error("Fetch cancelled")]
    Cancelled,

    /// The source answered with a non-success status.
    #[error("Source returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request never got an answer (connect, timeout, read).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The body was not a job map.
    #[error("Invalid job map: {0}")]
    Decode(String),
}

impl FetchError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

pub type FetchResult<T> = Result<T, FetchError>;

/// Supplier of job timeline snapshots.
///
/// # Thread Safety
/// Implementations must be `Send + Sync`; the poller calls them from a
/// spawned task.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the current job map.
    async fn fetch(&self) -> FetchResult<TimelineSnapshot>;

    /// Short description used in log lines.
    fn describe(&self) -> String;
}

/// Reads a job map from a JSON file on every fetch.
#[derive(Debug, Clone)]
pub struct FileFetcher {
    path: PathBuf,
}

impl FileFetcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Fetcher for FileFetcher {
    async fn fetch(&self) -> FetchResult<TimelineSnapshot> {
        let body = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            FetchError::Transport(format!("Failed to read {}: {}", self.path.display(), e))
        })?;
        serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

/// Fetches the job map with a GET request.
#[cfg(feature = "http-source")]
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    url: String,
}

#[cfg(feature = "http-source")]
impl HttpFetcher {
    pub fn new(url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        use anyhow::Context;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[cfg(feature = "http-source")]
#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self) -> FetchResult<TimelineSnapshot> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<empty response>".to_string());
            return Err(FetchError::Http {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }

    fn describe(&self) -> String {
        format!("GET {}", self.url)
    }
}

/// Pick a fetcher for a configured source: `http(s)://` URLs go over the
/// network, anything else is treated as a file path.
pub fn fetcher_for_source(source: &str, request_timeout: Duration) -> anyhow::Result<Arc<dyn Fetcher>> {
    if source.starts_with("http://") || source.starts_with("https://") {
        return http_fetcher(source, request_timeout);
    }
    let path = source.strip_prefix("file://").unwrap_or(source);
    Ok(Arc::new(FileFetcher::new(path)))
}

#[cfg(feature = "http-source")]
fn http_fetcher(url: &str, timeout: Duration) -> anyhow::Result<Arc<dyn Fetcher>> {
    Ok(Arc::new(HttpFetcher::new(url, timeout)?))
}

#[cfg(not(feature = "http-source"))]
fn http_fetcher(url: &str, _timeout: Duration) -> anyhow::Result<Arc<dyn Fetcher>> {
    anyhow::bail!("HTTP sources require the `http-source` feature: {}", url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_file_fetcher_reads_job_map() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"JOB-1": {{"starting_date": "2024-01-01", "ending_date": "2024-01-02"}}}}"#
        )
        .unwrap();

        let fetcher = FileFetcher::new(file.path());
        let snapshot = fetcher.fetch().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert!(fetcher.describe().starts_with("file "));
    }

    #[tokio::test]
    async fn test_file_fetcher_errors() {
        let missing = FileFetcher::new("/definitely/not/here.json");
        assert!(matches!(
            missing.fetch().await,
            Err(FetchError::Transport(_))
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[1, 2]").unwrap();
        let bad = FileFetcher::new(file.path());
        assert!(matches!(bad.fetch().await, Err(FetchError::Decode(_))));
    }

    #[test]
    fn test_fetch_error_cancelled() {
        assert!(FetchError::Cancelled.is_cancelled());
        assert!(!FetchError::Transport("x".into()).is_cancelled());
        let http = FetchError::Http {
            status: 503,
            body: "busy".into(),
        };
        assert_eq!(http.to_string(), "Source returned HTTP 503: busy");
    }

    #[test]
    fn test_fetcher_for_file_source() {
        let fetcher = fetcher_for_source("file:///tmp/jobs.json", Duration::from_secs(1)).unwrap();
        assert_eq!(fetcher.describe(), "file /tmp/jobs.json");
    }

    #[cfg(feature = "http-source")]
    #[test]
    fn test_fetcher_for_http_source() {
        let fetcher =
            fetcher_for_source("http://127.0.0.1:9/jobs", Duration::from_secs(1)).unwrap();
        assert_eq!(fetcher.describe(), "GET http://127.0.0.1:9/jobs");
    }
}
