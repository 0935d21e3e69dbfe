//! ATS API clients.
//!
//! Each client pairs a hostname pattern with an API endpoint template. The
//! pattern does double duty: `detect` answers "is this board yours?" and the
//! same capture group yields the slug substituted into the endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use jobhound_protocol::{AtsType, Company, ScrapeStrategy};

use crate::browser::PageFetcher;

mod ashby;
mod greenhouse;
mod lever;
mod workday;

pub use ashby::AshbyClient;
pub use greenhouse::GreenhouseClient;
pub use lever::LeverClient;
pub use workday::WorkdayClient;

/// Errors from ATS API calls.
#[derive(Debug, Error)]
pub enum AtsError {
    #[error("ATS request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{ats} API returned status {status} for {url}")]
    Status {
        ats: AtsType,
        status: u16,
        url: String,
    },

    #[error("No board slug found in URL: {0}")]
    NoSlug(String),

    #[error("Unexpected {ats} response shape: {message}")]
    BadShape { ats: AtsType, message: String },

    #[error("Page scrape failed: {0}")]
    Scrape(#[from] crate::browser::ScrapeError),
}

/// One ATS strategy: URL detection plus job fetching.
#[async_trait]
pub trait AtsClient: Send + Sync {
    /// Which family this client serves.
    fn ats_type(&self) -> AtsType;

    /// Pure hostname-pattern match.
    fn detect(&self, career_url: &str) -> bool;

    /// Fetch the raw job records for a company's board. Returns an empty
    /// list when the board has no openings; that is not an error.
    async fn fetch_jobs(&self, company: &Company) -> Result<Vec<Value>, AtsError>;
}

/// Detect the ATS family of a career URL.
///
/// Fixed order: Greenhouse, Lever, Ashby, Workday; the first match wins and
/// selects the API strategy. No match falls back to the crawler.
pub fn detect_ats(career_url: &str) -> (AtsType, ScrapeStrategy) {
    let probes: [(&dyn Fn(&str) -> bool, AtsType); 4] = [
        (&greenhouse::matches_url, AtsType::Greenhouse),
        (&lever::matches_url, AtsType::Lever),
        (&ashby::matches_url, AtsType::Ashby),
        (&workday::matches_url, AtsType::Workday),
    ];
    for (probe, ats_type) in probes {
        if probe(career_url) {
            return (ats_type, ScrapeStrategy::Api);
        }
    }
    (AtsType::Unknown, ScrapeStrategy::Crawler)
}

/// Build the client for a detected ATS family, if it has one.
pub fn ats_client_for(
    ats_type: AtsType,
    fetcher: Arc<dyn PageFetcher>,
) -> Option<Box<dyn AtsClient>> {
    match ats_type {
        AtsType::Greenhouse => Some(Box::new(GreenhouseClient::new())),
        AtsType::Lever => Some(Box::new(LeverClient::new())),
        AtsType::Ashby => Some(Box::new(AshbyClient::new())),
        AtsType::Workday => Some(Box::new(WorkdayClient::new(fetcher))),
        _ => None,
    }
}

/// Seam for obtaining ATS clients; lets tests substitute fixtures for the
/// live APIs.
pub trait AtsClientFactory: Send + Sync {
    fn client_for(&self, ats_type: AtsType) -> Option<Box<dyn AtsClient>>;
}

/// Production factory wiring the real API clients.
pub struct LiveAtsClientFactory {
    fetcher: Arc<dyn PageFetcher>,
}

impl LiveAtsClientFactory {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }
}

impl AtsClientFactory for LiveAtsClientFactory {
    fn client_for(&self, ats_type: AtsType) -> Option<Box<dyn AtsClient>> {
        ats_client_for(ats_type, Arc::clone(&self.fetcher))
    }
}

pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detection_order_and_fallback() {
        assert_eq!(
            detect_ats("https://boards.greenhouse.io/acme"),
            (AtsType::Greenhouse, ScrapeStrategy::Api)
        );
        assert_eq!(
            detect_ats("https://jobs.lever.co/acme-co"),
            (AtsType::Lever, ScrapeStrategy::Api)
        );
        assert_eq!(
            detect_ats("https://jobs.ashbyhq.com/acme"),
            (AtsType::Ashby, ScrapeStrategy::Api)
        );
        assert_eq!(
            detect_ats("https://acme.wd1.myworkdayjobs.com/External"),
            (AtsType::Workday, ScrapeStrategy::Api)
        );
        assert_eq!(
            detect_ats("https://acme.com/careers"),
            (AtsType::Unknown, ScrapeStrategy::Crawler)
        );
    }
}
