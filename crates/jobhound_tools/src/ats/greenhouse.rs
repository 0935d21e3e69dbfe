//! Greenhouse ATS client.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::info;

use jobhound_protocol::{AtsType, Company};

use super::{http_client, AtsClient, AtsError};

static BOARD_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)boards\.greenhouse\.io/(\w+)").expect("valid regex"));

const API_URL: &str = "https://boards-api.greenhouse.io/v1/boards/{slug}/jobs";

pub(crate) fn matches_url(career_url: &str) -> bool {
    BOARD_PATTERN.is_match(career_url)
}

fn extract_slug(career_url: &str) -> Option<String> {
    BOARD_PATTERN
        .captures(career_url)
        .map(|caps| caps[1].to_string())
}

/// Client for the Greenhouse public job-board API.
pub struct GreenhouseClient {
    http: reqwest::Client,
}

impl GreenhouseClient {
    pub fn new() -> Self {
        Self {
            http: http_client(),
        }
    }
}

impl Default for GreenhouseClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AtsClient for GreenhouseClient {
    fn ats_type(&self) -> AtsType {
        AtsType::Greenhouse
    }

    fn detect(&self, career_url: &str) -> bool {
        matches_url(career_url)
    }

    async fn fetch_jobs(&self, company: &Company) -> Result<Vec<Value>, AtsError> {
        let url = &company.career_page.url;
        let slug = extract_slug(url).ok_or_else(|| AtsError::NoSlug(url.clone()))?;

        let api_url = API_URL.replace("{slug}", &slug);
        let response = self.http.get(&api_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AtsError::Status {
                ats: AtsType::Greenhouse,
                status: status.as_u16(),
                url: api_url,
            });
        }

        let data: Value = response.json().await?;
        let jobs = match data.get("jobs") {
            Some(Value::Array(jobs)) => jobs.clone(),
            _ => {
                return Err(AtsError::BadShape {
                    ats: AtsType::Greenhouse,
                    message: "expected object with a 'jobs' array".to_string(),
                })
            }
        };

        info!(company = %company.name, count = jobs.len(), "greenhouse jobs fetched");
        Ok(jobs)
    }
}
