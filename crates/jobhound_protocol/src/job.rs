//! Job listings: raw scrape artifacts, normalized records, scored results.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::company::ScrapeStrategy;

/// Deduplication fingerprint: SHA-256 hex of
/// `company_name|title|description[:500]`.
///
/// The 500-char cut is by characters, not bytes, so multi-byte descriptions
/// never split a codepoint.
pub fn content_fingerprint(company_name: &str, title: &str, description: &str) -> String {
    let head: String = description.chars().take(500).collect();
    let mut hasher = Sha256::new();
    hasher.update(format!("{company_name}|{title}|{head}").as_bytes());
    hex_digest(hasher)
}

/// SHA-256 hex of an arbitrary text blob (resume hashing).
pub fn text_sha256(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex_digest(hasher)
}

fn hex_digest(hasher: Sha256) -> String {
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

// ============================================================================
// Raw jobs
// ============================================================================

/// Payload of one scraped artifact: structured JSON from an ATS API, or the
/// HTML/markdown body of a crawled page. Exactly one of the two.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawPayload {
    RawJson(Value),
    RawHtml(String),
}

/// One scraped artifact, before normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawJob {
    pub id: Uuid,
    pub company_id: Uuid,
    /// Denormalized for fingerprinting and error messages.
    pub company_name: String,
    pub payload: RawPayload,
    pub source_url: String,
    pub scrape_strategy: ScrapeStrategy,
    /// Confidence in data quality, 0.0-1.0.
    pub source_confidence: f64,
    pub scraped_at: DateTime<Utc>,
}

impl RawJob {
    pub fn from_api(company_id: Uuid, company_name: &str, json: Value, source_url: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            company_id,
            company_name: company_name.to_string(),
            payload: RawPayload::RawJson(json),
            source_url: source_url.to_string(),
            scrape_strategy: ScrapeStrategy::Api,
            source_confidence: 0.95,
            scraped_at: Utc::now(),
        }
    }

    pub fn from_crawl(company_id: Uuid, company_name: &str, html: String, source_url: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            company_id,
            company_name: company_name.to_string(),
            payload: RawPayload::RawHtml(html),
            source_url: source_url.to_string(),
            scrape_strategy: ScrapeStrategy::Crawler,
            source_confidence: 0.7,
            scraped_at: Utc::now(),
        }
    }
}

// ============================================================================
// Normalized jobs
// ============================================================================

/// Coarse location classification for a posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RemoteType {
    Onsite,
    Hybrid,
    Remote,
    #[default]
    Unknown,
}

impl RemoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteType::Onsite => "onsite",
            RemoteType::Hybrid => "hybrid",
            RemoteType::Remote => "remote",
            RemoteType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RemoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Canonical job record after normalization.
///
/// Invariant: within a single run no two normalized jobs share a
/// `content_hash`; `salary_min <= salary_max` when both are set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedJob {
    pub id: Uuid,
    pub raw_job_id: Uuid,
    pub company_id: Uuid,
    pub company_name: String,
    pub title: String,
    pub jd_text: String,
    pub apply_url: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub remote_type: RemoteType,
    #[serde(default)]
    pub posted_date: Option<NaiveDate>,
    #[serde(default)]
    pub salary_min: Option<u64>,
    #[serde(default)]
    pub salary_max: Option<u64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub preferred_skills: Vec<String>,
    #[serde(default)]
    pub required_experience_years: Option<f64>,
    #[serde(default)]
    pub seniority_level: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    pub content_hash: String,
    pub processed_at: DateTime<Utc>,
}

// ============================================================================
// Scoring
// ============================================================================

/// Overall recommendation bucket for a scored job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    StrongMatch,
    GoodMatch,
    Stretch,
    Mismatch,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::StrongMatch => "strong_match",
            Recommendation::GoodMatch => "good_match",
            Recommendation::Stretch => "stretch",
            Recommendation::Mismatch => "mismatch",
        }
    }

    /// Lenient mapping for LLM output; unrecognized labels become `Stretch`.
    pub fn from_llm(raw: &str) -> Self {
        match raw.trim() {
            "strong_match" => Recommendation::StrongMatch,
            "good_match" => Recommendation::GoodMatch,
            "mismatch" => Recommendation::Mismatch,
            _ => Recommendation::Stretch,
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fit analysis between the candidate and one job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitReport {
    /// Overall fit score 0-100.
    pub score: u8,
    pub skill_overlap: Vec<String>,
    pub skill_gaps: Vec<String>,
    pub seniority_match: bool,
    pub location_match: bool,
    pub org_type_match: bool,
    pub summary: String,
    pub recommendation: Recommendation,
    /// Confidence in this assessment, 0.0-1.0.
    pub confidence: f64,
}

/// A normalized job with its fit report and 1-based rank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredJob {
    pub job: NormalizedJob,
    pub fit_report: FitReport,
    #[serde(default)]
    pub rank: Option<u32>,
    pub scored_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_deterministic() {
        let a = content_fingerprint("Acme", "ML Engineer", "Build models");
        let b = content_fingerprint("Acme", "ML Engineer", "Build models");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn fingerprint_differs_by_any_component() {
        let base = content_fingerprint("Acme", "ML Engineer", "Build models");
        assert_ne!(base, content_fingerprint("Acme2", "ML Engineer", "Build models"));
        assert_ne!(base, content_fingerprint("Acme", "Data Engineer", "Build models"));
        assert_ne!(base, content_fingerprint("Acme", "ML Engineer", "Ship models"));
    }

    #[test]
    fn fingerprint_ignores_description_past_500_chars() {
        let head = "x".repeat(500);
        let a = content_fingerprint("Acme", "Role", &head);
        let b = content_fingerprint("Acme", "Role", &format!("{head}tail"));
        assert_eq!(a, b);
    }

    #[test]
    fn fingerprint_survives_multibyte_descriptions() {
        // 600 multi-byte chars; byte-slicing at 500 would panic mid-codepoint.
        let desc = "é".repeat(600);
        let fp = content_fingerprint("Acme", "Role", &desc);
        assert_eq!(fp.len(), 64);
    }

    #[test]
    fn recommendation_coercion() {
        assert_eq!(Recommendation::from_llm("strong_match"), Recommendation::StrongMatch);
        assert_eq!(Recommendation::from_llm("excellent"), Recommendation::Stretch);
        assert_eq!(Recommendation::from_llm(""), Recommendation::Stretch);
    }

    #[test]
    fn raw_payload_serde_tags() {
        let raw = RawJob::from_api(
            Uuid::new_v4(),
            "Acme",
            serde_json::json!({"title": "SRE"}),
            "https://boards.greenhouse.io/acme",
        );
        let json = serde_json::to_value(&raw).unwrap();
        assert!(json["payload"]["raw_json"]["title"].is_string());
        assert!((raw.source_confidence - 0.95).abs() < f64::EPSILON);
    }
}
