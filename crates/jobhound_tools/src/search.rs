//! Career-page discovery over a generic web-search provider.
//!
//! The provider itself (Tavily, DuckDuckGo, a fixture) sits behind
//! `SearchProvider`; the scoring that turns raw results into one career URL
//! lives here and is the part worth testing.

use async_trait::async_trait;
use tracing::{info, warn};

/// A single web-search result.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub content: String,
}

/// The web-search collaborator seam.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> anyhow::Result<Vec<SearchResult>>;
}

// Job aggregators rarely lead to a direct apply URL.
const AGGREGATOR_DOMAINS: &[&str] = &[
    "indeed.com",
    "glassdoor.com",
    "linkedin.com",
    "naukri.com",
    "internshala.com",
    "monster.com",
    "ziprecruiter.com",
    "angel.co",
    "wellfound.com",
    "simplyhired.com",
    "shine.com",
    "foundit.in",
];

// ATS hostnames are high-signal for direct career pages.
const ATS_DOMAINS: &[&str] = &[
    "greenhouse.io",
    "lever.co",
    "ashbyhq.com",
    "workday.com",
    "myworkdayjobs.com",
    "smartrecruiters.com",
    "icims.com",
];

const CAREER_KEYWORDS: &[&str] = &["career", "jobs", "hiring", "work", "openings"];

/// Minimum score a URL needs in strict mode.
const STRICT_MIN_SCORE: f64 = 2.0;

fn is_aggregator(url: &str) -> bool {
    let url = url.to_lowercase();
    AGGREGATOR_DOMAINS.iter().any(|domain| url.contains(domain))
}

fn is_ats_url(url: &str) -> bool {
    let url = url.to_lowercase();
    ATS_DOMAINS.iter().any(|domain| url.contains(domain))
}

fn matches_company_domain(url: &str, company_name: &str) -> bool {
    let normalized: String = company_name
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    let short = company_name
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_lowercase();
    let url = url.to_lowercase();
    url.contains(&normalized) || (short.len() >= 3 && url.contains(&short))
}

/// Finds the official career page for a company via web search.
pub struct CareerPageFinder {
    provider: std::sync::Arc<dyn SearchProvider>,
}

impl CareerPageFinder {
    pub fn new(provider: std::sync::Arc<dyn SearchProvider>) -> Self {
        Self { provider }
    }

    /// Search for a company's career page URL, or `None` when nothing
    /// qualifies.
    pub async fn find_career_page(&self, company_name: &str) -> anyhow::Result<Option<String>> {
        let queries = [
            format!("\"{company_name}\" careers hiring apply"),
            format!("\"{company_name}\" jobs greenhouse OR lever OR ashby OR workday"),
            format!("{company_name} careers jobs official site"),
        ];

        let mut all_results: Vec<SearchResult> = Vec::new();
        let mut seen_urls: Vec<String> = Vec::new();

        for query in &queries {
            let results = self.provider.search(query, 5).await?;
            for result in results {
                if !seen_urls.contains(&result.url) {
                    seen_urls.push(result.url.clone());
                    all_results.push(result);
                }
            }

            // Stop early once a strict-mode candidate shows up.
            if let Some(url) = pick_best_career_url(&all_results, company_name, true) {
                info!(company = company_name, url = %url, "career page found");
                return Ok(Some(url));
            }
        }

        let fallback = pick_best_career_url(&all_results, company_name, false);
        match &fallback {
            Some(url) => info!(company = company_name, url = %url, "career page found (fallback)"),
            None => warn!(company = company_name, "career page not found"),
        }
        Ok(fallback)
    }
}

/// Score and pick the best career-page URL from search results.
///
/// Aggregators are dropped outright. ATS hostnames score +4, career keywords
/// +3, a company-name match +2. Strict mode requires at least 2.0.
fn pick_best_career_url(
    results: &[SearchResult],
    company_name: &str,
    strict: bool,
) -> Option<String> {
    let mut scored: Vec<(f64, &str)> = Vec::new();

    for result in results {
        if is_aggregator(&result.url) {
            continue;
        }

        let url_lower = result.url.to_lowercase();
        let mut score = 0.0;
        if CAREER_KEYWORDS.iter().any(|kw| url_lower.contains(kw)) {
            score += 3.0;
        }
        if is_ats_url(&result.url) {
            score += 4.0;
        }
        if matches_company_domain(&result.url, company_name) {
            score += 2.0;
        }
        scored.push((score, &result.url));
    }

    // Stable sort keeps search order for equal scores.
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    let (best_score, best_url) = scored.first()?;

    if strict && *best_score < STRICT_MIN_SCORE {
        return None;
    }
    Some(best_url.to_string())
}

/// Web search via the Tavily HTTP API.
pub struct TavilySearch {
    api_key: String,
    http: reqwest::Client,
}

impl TavilySearch {
    pub fn new(api_key: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            api_key: api_key.into(),
            http,
        }
    }
}

#[async_trait]
impl SearchProvider for TavilySearch {
    async fn search(&self, query: &str, max_results: usize) -> anyhow::Result<Vec<SearchResult>> {
        let body = serde_json::json!({
            "api_key": self.api_key,
            "query": query,
            "max_results": max_results,
        });
        let response = self
            .http
            .post("https://api.tavily.com/search")
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("search API returned status {status}");
        }

        let data: serde_json::Value = response.json().await?;
        let mut results = Vec::new();
        if let Some(items) = data.get("results").and_then(|v| v.as_array()) {
            for item in items {
                results.push(SearchResult {
                    title: item
                        .get("title")
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string(),
                    url: item
                        .get("url")
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string(),
                    content: item
                        .get("content")
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string(),
                });
            }
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(url: &str) -> SearchResult {
        SearchResult {
            title: String::new(),
            url: url.to_string(),
            content: String::new(),
        }
    }

    #[test]
    fn aggregators_are_dropped() {
        let results = vec![
            result("https://www.linkedin.com/company/acme/jobs"),
            result("https://www.indeed.com/cmp/acme"),
        ];
        assert_eq!(pick_best_career_url(&results, "Acme", false), None);
    }

    #[test]
    fn ats_urls_win_over_plain_career_pages() {
        let results = vec![
            result("https://acme.com/careers"),
            result("https://boards.greenhouse.io/acme"),
        ];
        let best = pick_best_career_url(&results, "Acme", true).unwrap();
        // ats +4, name +2 = 6 beats keyword +3, name +2 = 5
        assert_eq!(best, "https://boards.greenhouse.io/acme");
    }

    #[test]
    fn strict_mode_requires_signal() {
        let results = vec![result("https://random-blog.example/post")];
        assert_eq!(pick_best_career_url(&results, "Acme", true), None);
        assert_eq!(
            pick_best_career_url(&results, "Acme", false).as_deref(),
            Some("https://random-blog.example/post")
        );
    }

    #[test]
    fn company_domain_match_handles_spaces_and_hyphens() {
        assert!(matches_company_domain("https://acmecorp.com/jobs", "Acme Corp"));
        assert!(matches_company_domain("https://acme.io/careers", "Acme Corp"));
        assert!(!matches_company_domain("https://other.com", "Acme Corp"));
    }
}
