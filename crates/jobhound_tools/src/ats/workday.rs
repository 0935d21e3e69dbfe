//! Workday ATS client.
//!
//! Workday has no public job-board API; this client detects the hostname and
//! fetches the career page itself, returning a single record wrapping the
//! page content.

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use tracing::info;

use jobhound_protocol::{AtsType, Company};

use super::{AtsClient, AtsError};
use crate::browser::PageFetcher;

static HOST_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)myworkdayjobs\.com|workday\.com/en-US").expect("valid regex"));

pub(crate) fn matches_url(career_url: &str) -> bool {
    HOST_PATTERN.is_match(career_url)
}

/// Crawler-backed client for Workday career pages.
pub struct WorkdayClient {
    fetcher: Arc<dyn PageFetcher>,
}

impl WorkdayClient {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl AtsClient for WorkdayClient {
    fn ats_type(&self) -> AtsType {
        AtsType::Workday
    }

    fn detect(&self, career_url: &str) -> bool {
        matches_url(career_url)
    }

    async fn fetch_jobs(&self, company: &Company) -> Result<Vec<Value>, AtsError> {
        let url = &company.career_page.url;
        let content = self.fetcher.fetch_page(url).await?;
        info!(
            company = %company.name,
            content_length = content.len(),
            "workday page fetched"
        );
        Ok(vec![json!({
            "raw_content": content,
            "source_url": url,
        })])
    }
}
