//! Generic page fetching behind the `PageFetcher` seam.
//!
//! The default implementation is a plain HTTP GET. Deployments that need
//! JavaScript rendering plug a headless-browser fetcher into the same trait;
//! the pipeline does not care which one it gets.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from page fetching.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Page request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Page fetch returned status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Page fetch returned empty content for {0}")]
    Empty(String),
}

/// The page-scraper collaborator seam.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<String, ScrapeError>;
}

const USER_AGENT: &str = "Mozilla/5.0 (compatible; JobHunter/1.0)";

/// Plain HTTP fetcher; good enough for server-rendered career pages.
pub struct HttpPageFetcher {
    http: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();
        Self { http }
    }
}

impl Default for HttpPageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String, ScrapeError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(ScrapeError::Empty(url.to_string()));
        }
        Ok(body)
    }
}
