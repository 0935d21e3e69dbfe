//! Lever ATS client.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::info;

use jobhound_protocol::{AtsType, Company};

use super::{http_client, AtsClient, AtsError};

static BOARD_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)jobs\.lever\.co/(\w[\w-]*)").expect("valid regex"));

const API_URL: &str = "https://api.lever.co/v0/postings/{slug}";

pub(crate) fn matches_url(career_url: &str) -> bool {
    BOARD_PATTERN.is_match(career_url)
}

fn extract_slug(career_url: &str) -> Option<String> {
    BOARD_PATTERN
        .captures(career_url)
        .map(|caps| caps[1].to_string())
}

/// Client for the Lever public postings API.
pub struct LeverClient {
    http: reqwest::Client,
}

impl LeverClient {
    pub fn new() -> Self {
        Self {
            http: http_client(),
        }
    }
}

impl Default for LeverClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AtsClient for LeverClient {
    fn ats_type(&self) -> AtsType {
        AtsType::Lever
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
                ats: AtsType::Lever,
                status: status.as_u16(),
                url: api_url,
            });
        }

        // Lever returns a bare top-level array.
        let data: Value = response.json().await?;
        let jobs = match data {
            Value::Array(jobs) => jobs,
            _ => {
                return Err(AtsError::BadShape {
                    ats: AtsType::Lever,
                    message: "expected a top-level array".to_string(),
                })
            }
        };

        info!(company = %company.name, count = jobs.len(), "lever jobs fetched");
        Ok(jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_board_urls() {
        assert!(matches_url("https://jobs.lever.co/acme"));
        assert!(matches_url("https://jobs.lever.co/acme-robotics"));
        assert!(!matches_url("https://boards.greenhouse.io/acme"));
        assert!(!matches_url("https://lever.co/about"));
    }

    #[test]
    fn slug_keeps_hyphens() {
        assert_eq!(
            extract_slug("https://jobs.lever.co/acme-robotics/f00").as_deref(),
            Some("acme-robotics")
        );
    }
}
