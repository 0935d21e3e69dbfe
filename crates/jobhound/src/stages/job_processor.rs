//! Job normalization stage.
//!
//! Two paths by payload shape: ATS JSON maps fields directly; crawled HTML
//! goes through the LLM extractor. Both converge on `NormalizedJob` and
//! deduplicate by content fingerprint within the stage.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use jobhound_llm::{ChatMessage, CompletionClient};
use jobhound_protocol::{
    content_fingerprint, AgentError, AgentFailure, NormalizedJob, RawJob, RawPayload,
    RemoteType, Settings,
};

use crate::cost::CostTracker;
use crate::prompts;
use crate::state::PipelineState;
use crate::trace::SpanHook;

use super::{call_structured, log_stage_end, log_stage_start, LlmCallError, Stage};

/// Minimum trimmed length for crawled content to be worth an LLM call.
const MIN_HTML_CONTENT_LEN: usize = 100;

/// Crawled content is truncated to this many characters for extraction.
const HTML_EXTRACT_WINDOW: usize = 8_000;

// ============================================================================
// Remote-type aliases
// ============================================================================

const REMOTE_TYPE_ALIASES: &[(&str, RemoteType)] = &[
    ("onsite", RemoteType::Onsite),
    ("on-site", RemoteType::Onsite),
    ("on_site", RemoteType::Onsite),
    ("in-office", RemoteType::Onsite),
    ("in_office", RemoteType::Onsite),
    ("office", RemoteType::Onsite),
    ("hybrid", RemoteType::Hybrid),
    ("remote", RemoteType::Remote),
    ("fully remote", RemoteType::Remote),
    ("fully_remote", RemoteType::Remote),
    ("work from home", RemoteType::Remote),
    ("wfh", RemoteType::Remote),
    ("unknown", RemoteType::Unknown),
];

fn normalize_remote_type(raw: &str) -> RemoteType {
    let needle = raw.trim().to_lowercase();
    REMOTE_TYPE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == needle)
        .map(|(_, rt)| *rt)
        .unwrap_or(RemoteType::Unknown)
}

// ============================================================================
// Date parsing
// ============================================================================

/// Parse `YYYY-MM-DD` from the leading component of an ISO 8601 string.
fn parse_date_string(value: &str) -> Option<NaiveDate> {
    let date_part = value
        .split('T')
        .next()?
        .split('+')
        .next()?
        .trim();
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Extract a posted date from ATS JSON, trying known fields in priority
/// order. Numeric values are unix timestamps: seconds past 1e9, millis past
/// 1e12.
fn extract_posted_date(data: &Value) -> Option<NaiveDate> {
    const DATE_FIELDS: &[&str] = &[
        "updated_at",
        "publishedAt",
        "published_at",
        "created_at",
        "date_posted",
        "createdAt",
    ];

    for field in DATE_FIELDS {
        let Some(value) = data.get(field) else {
            continue;
        };
        if let Some(number) = value.as_f64() {
            if number > 1_000_000_000.0 {
                let seconds = if number > 1_000_000_000_000.0 {
                    number / 1000.0
                } else {
                    number
                };
                if let Some(ts) = DateTime::<Utc>::from_timestamp(seconds as i64, 0) {
                    return Some(ts.date_naive());
                }
            }
        }
        if let Some(text) = value.as_str() {
            if let Some(date) = parse_date_string(text) {
                return Some(date);
            }
        }
    }
    None
}

// ============================================================================
// LLM extraction (HTML path)
// ============================================================================

#[derive(Debug, Deserialize)]
struct ExtractedJob {
    title: String,
    jd_text: String,
    #[serde(default = "default_true")]
    is_valid_posting: bool,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    remote_type: Option<String>,
    #[serde(default)]
    salary_min: Option<u64>,
    #[serde(default)]
    salary_max: Option<u64>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    posted_date: Option<String>,
    #[serde(default)]
    apply_url: Option<String>,
    #[serde(default)]
    required_skills: Vec<String>,
    #[serde(default)]
    preferred_skills: Vec<String>,
    #[serde(default)]
    required_experience_years: Option<f64>,
    #[serde(default)]
    seniority_level: Option<String>,
    #[serde(default)]
    department: Option<String>,
}

fn default_true() -> bool {
    true
}

fn extraction_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "title": {"type": "string"},
            "jd_text": {"type": "string"},
            "is_valid_posting": {"type": "boolean"},
            "location": {"type": ["string", "null"]},
            "remote_type": {"type": ["string", "null"]},
            "salary_min": {"type": ["integer", "null"]},
            "salary_max": {"type": ["integer", "null"]},
            "currency": {"type": ["string", "null"]},
            "posted_date": {"type": ["string", "null"]},
            "apply_url": {"type": ["string", "null"]},
            "required_skills": {"type": "array", "items": {"type": "string"}},
            "preferred_skills": {"type": "array", "items": {"type": "string"}},
            "required_experience_years": {"type": ["number", "null"]},
            "seniority_level": {"type": ["string", "null"]},
            "department": {"type": ["string", "null"]}
        },
        "required": ["title", "jd_text", "is_valid_posting"]
    })
}

// ============================================================================
// Stage
// ============================================================================

/// Normalize raw jobs into deduplicated `NormalizedJob` records.
pub struct JobProcessor {
    settings: Settings,
    llm: Arc<dyn CompletionClient>,
    cost: Arc<CostTracker>,
    spans: Arc<dyn SpanHook>,
}

impl JobProcessor {
    pub fn new(
        settings: Settings,
        llm: Arc<dyn CompletionClient>,
        cost: Arc<CostTracker>,
        spans: Arc<dyn SpanHook>,
    ) -> Self {
        Self {
            settings,
            llm,
            cost,
            spans,
        }
    }

    /// Direct field mapping from ATS JSON. No LLM involved.
    fn process_from_json(raw_job: &RawJob, data: &Value) -> Option<NormalizedJob> {
        let title = data
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        if title.is_empty() {
            return None;
        }

        let jd_text = data
            .get("content")
            .or_else(|| data.get("description"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let location = data
            .get("location")
            .and_then(|loc| loc.get("name"))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let apply_url = ["absolute_url", "applyUrl", "applicationUrl", "apply_url"]
            .iter()
            .find_map(|key| data.get(*key).and_then(Value::as_str))
            .unwrap_or(&raw_job.source_url)
            .to_string();

        let posted_date = extract_posted_date(data);

        // API records often have no description; fingerprint on the apply
        // URL so a company's jobs do not all collapse into one.
        let hash_input = if jd_text.is_empty() { &apply_url } else { &jd_text };
        let content_hash = content_fingerprint(&raw_job.company_name, &title, hash_input);

        Some(NormalizedJob {
            id: uuid::Uuid::new_v4(),
            raw_job_id: raw_job.id,
            company_id: raw_job.company_id,
            company_name: raw_job.company_name.clone(),
            title,
            jd_text,
            apply_url,
            location,
            remote_type: RemoteType::Unknown,
            posted_date,
            salary_min: None,
            salary_max: None,
            currency: None,
            required_skills: Vec::new(),
            preferred_skills: Vec::new(),
            required_experience_years: None,
            seniority_level: None,
            department: None,
            content_hash,
            processed_at: Utc::now(),
        })
    }

    /// LLM extraction from crawled page content.
    async fn process_from_html(
        &self,
        state: &mut PipelineState,
        raw_job: &RawJob,
        content: &str,
    ) -> Result<Option<NormalizedJob>, LlmCallError> {
        let trimmed = content.trim();
        if trimmed.len() < MIN_HTML_CONTENT_LEN {
            warn!(
                company = %raw_job.company_name,
                content_length = trimmed.len(),
                "skipping near-empty crawled content"
            );
            return Ok(None);
        }

        let window: String = content.chars().take(HTML_EXTRACT_WINDOW).collect();
        let messages = vec![
            ChatMessage::system(prompts::JOB_PROCESSOR_SYSTEM),
            ChatMessage::user(prompts::job_processor_user(
                &raw_job.company_name,
                &raw_job.source_url,
                &window,
            )),
        ];
        let content = call_structured(
            self.llm.as_ref(),
            &self.cost,
            self.spans.as_ref(),
            state,
            crate::pipeline::PROCESS_JOBS,
            messages,
            &self.settings.fast_model,
            extraction_schema(),
        )
        .await?;

        let extracted: ExtractedJob = serde_json::from_value(content)
            .map_err(|e| LlmCallError::Llm(jobhound_llm::LlmError::MalformedOutput {
                attempts: 1,
                message: e.to_string(),
            }))?;

        if !extracted.is_valid_posting {
            warn!(
                company = %raw_job.company_name,
                title = %extracted.title,
                "skipping non-posting content"
            );
            return Ok(None);
        }

        let (salary_min, salary_max) = match (extracted.salary_min, extracted.salary_max) {
            // An inverted range is extraction noise; drop it.
            (Some(min), Some(max)) if min > max => (None, None),
            pair => pair,
        };

        let content_hash = content_fingerprint(
            &raw_job.company_name,
            &extracted.title,
            &extracted.jd_text,
        );
        Ok(Some(NormalizedJob {
            id: uuid::Uuid::new_v4(),
            raw_job_id: raw_job.id,
            company_id: raw_job.company_id,
            company_name: raw_job.company_name.clone(),
            title: extracted.title,
            jd_text: extracted.jd_text.clone(),
            apply_url: extracted
                .apply_url
                .unwrap_or_else(|| raw_job.source_url.clone()),
            location: extracted.location,
            remote_type: extracted
                .remote_type
                .as_deref()
                .map(normalize_remote_type)
                .unwrap_or(RemoteType::Unknown),
            posted_date: extracted.posted_date.as_deref().and_then(parse_date_string),
            salary_min,
            salary_max,
            currency: extracted.currency,
            required_skills: extracted.required_skills,
            preferred_skills: extracted.preferred_skills,
            required_experience_years: extracted.required_experience_years,
            seniority_level: extracted.seniority_level,
            department: extracted.department,
            content_hash,
            processed_at: Utc::now(),
        }))
    }
}

#[async_trait]
impl Stage for JobProcessor {
    fn name(&self) -> &'static str {
        crate::pipeline::PROCESS_JOBS
    }

    async fn run(&self, state: &mut PipelineState) -> Result<(), AgentFailure> {
        log_stage_start(self.name());
        let started = Instant::now();

        let mut seen_hashes: HashSet<String> = HashSet::new();
        let raw_jobs = state.raw_jobs.clone();

        for raw_job in &raw_jobs {
            let processed = match &raw_job.payload {
                RawPayload::RawJson(data) => Ok(Self::process_from_json(raw_job, data)),
                RawPayload::RawHtml(content) => {
                    self.process_from_html(state, raw_job, content).await
                }
            };

            match processed {
                Ok(Some(normalized)) => {
                    // Second occurrence of a fingerprint is dropped silently.
                    if seen_hashes.insert(normalized.content_hash.clone()) {
                        state.normalized_jobs.push(normalized);
                    }
                }
                Ok(None) => {}
                Err(LlmCallError::Abort(failure)) => return Err(failure),
                Err(LlmCallError::Llm(err)) => {
                    state.record_error(
                        AgentError::new(self.name(), "ExtractionError", err.to_string())
                            .for_company(&raw_job.company_name)
                            .for_job(raw_job.id),
                    );
                }
            }
        }

        info!(normalized_count = state.normalized_jobs.len(), "jobs normalized");
        log_stage_end(self.name(), started);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn raw(company: &str, data: Value) -> RawJob {
        RawJob::from_api(Uuid::new_v4(), company, data, "https://src.example/jobs")
    }

    #[test]
    fn remote_type_aliases_collapse() {
        assert_eq!(normalize_remote_type("On-Site"), RemoteType::Onsite);
        assert_eq!(normalize_remote_type("fully remote"), RemoteType::Remote);
        assert_eq!(normalize_remote_type("WFH"), RemoteType::Remote);
        assert_eq!(normalize_remote_type("hybrid "), RemoteType::Hybrid);
        assert_eq!(normalize_remote_type("flexible"), RemoteType::Unknown);
    }

    #[test]
    fn date_parsing_iso_and_unix() {
        assert_eq!(
            parse_date_string("2025-01-15T00:00:00Z"),
            NaiveDate::from_ymd_opt(2025, 1, 15)
        );
        assert_eq!(
            parse_date_string("2025-01-15"),
            NaiveDate::from_ymd_opt(2025, 1, 15)
        );
        assert_eq!(parse_date_string("January 5"), None);

        // Lever-style unix millis, and plain seconds.
        let millis = extract_posted_date(&json!({"createdAt": 1736899200000_i64}));
        assert_eq!(millis, NaiveDate::from_ymd_opt(2025, 1, 15));
        let seconds = extract_posted_date(&json!({"created_at": 1736899200}));
        assert_eq!(seconds, NaiveDate::from_ymd_opt(2025, 1, 15));
    }

    #[test]
    fn date_fields_checked_in_priority_order() {
        let data = json!({
            "created_at": "2024-06-01T00:00:00Z",
            "updated_at": "2025-01-15T00:00:00Z"
        });
        assert_eq!(
            extract_posted_date(&data),
            NaiveDate::from_ymd_opt(2025, 1, 15)
        );
    }

    #[test]
    fn json_path_maps_greenhouse_fields() {
        let raw_job = raw(
            "Acme",
            json!({
                "title": "ML Engineer",
                "content": "Build models",
                "absolute_url": "https://boards.greenhouse.io/acme/jobs/123",
                "location": {"name": "Remote"},
                "updated_at": "2025-01-15T00:00:00Z"
            }),
        );
        let job = JobProcessor::process_from_json(&raw_job, match &raw_job.payload {
            RawPayload::RawJson(v) => v,
            _ => unreachable!(),
        })
        .unwrap();
        assert_eq!(job.title, "ML Engineer");
        assert_eq!(job.location.as_deref(), Some("Remote"));
        assert_eq!(job.apply_url, "https://boards.greenhouse.io/acme/jobs/123");
        assert_eq!(job.posted_date, NaiveDate::from_ymd_opt(2025, 1, 15));
    }

    #[test]
    fn json_path_requires_title() {
        let raw_job = raw("Acme", json!({"content": "No title here"}));
        let data = match &raw_job.payload {
            RawPayload::RawJson(v) => v,
            _ => unreachable!(),
        };
        assert!(JobProcessor::process_from_json(&raw_job, data).is_none());
    }

    #[test]
    fn empty_description_fingerprints_on_apply_url() {
        let a = raw(
            "Acme",
            json!({"title": "SRE", "absolute_url": "https://acme/jobs/1"}),
        );
        let b = raw(
            "Acme",
            json!({"title": "SRE", "absolute_url": "https://acme/jobs/2"}),
        );
        let job_a = JobProcessor::process_from_json(&a, match &a.payload {
            RawPayload::RawJson(v) => v,
            _ => unreachable!(),
        })
        .unwrap();
        let job_b = JobProcessor::process_from_json(&b, match &b.payload {
            RawPayload::RawJson(v) => v,
            _ => unreachable!(),
        })
        .unwrap();
        // Same title, both empty descriptions: different URLs keep them apart.
        assert_ne!(job_a.content_hash, job_b.content_hash);
    }

    #[test]
    fn lever_apply_url_fallback_chain() {
        let raw_job = raw(
            "Acme",
            json!({"title": "SRE", "applyUrl": "https://jobs.lever.co/acme/1/apply"}),
        );
        let data = match &raw_job.payload {
            RawPayload::RawJson(v) => v,
            _ => unreachable!(),
        };
        let job = JobProcessor::process_from_json(&raw_job, data).unwrap();
        assert_eq!(job.apply_url, "https://jobs.lever.co/acme/1/apply");

        let no_urls = raw("Acme", json!({"title": "SRE"}));
        let data = match &no_urls.payload {
            RawPayload::RawJson(v) => v,
            _ => unreachable!(),
        };
        let job = JobProcessor::process_from_json(&no_urls, data).unwrap();
        assert_eq!(job.apply_url, "https://src.example/jobs");
    }
}
