//! Batched scoring stage.
//!
//! Scores normalized jobs against the candidate in fixed-size batches, then
//! sorts, filters by threshold, and assigns ranks. The sort is stable so
//! equal scores keep insertion order.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use jobhound_llm::{ChatMessage, CompletionClient};
use jobhound_protocol::{
    AgentError, AgentFailure, CandidateProfile, FitReport, NormalizedJob, Recommendation,
    ScoredJob, SearchPreferences, Settings,
};

use crate::cost::CostTracker;
use crate::prompts;
use crate::state::PipelineState;
use crate::trace::SpanHook;

use super::{call_structured, join_or, log_stage_end, log_stage_start, LlmCallError, Stage};

/// Jobs per scoring batch.
pub const BATCH_SIZE: usize = 5;

const CURRENCY_SYMBOLS: &[(&str, &str)] = &[
    ("USD", "$"),
    ("INR", "\u{20b9}"),
    ("EUR", "\u{20ac}"),
    ("GBP", "\u{a3}"),
    ("CAD", "C$"),
    ("AUD", "A$"),
    ("SGD", "S$"),
];

/// Symbol for a currency code; unknown codes prefix with the code itself.
fn currency_symbol(currency: &str) -> String {
    let upper = currency.to_uppercase();
    CURRENCY_SYMBOLS
        .iter()
        .find(|(code, _)| *code == upper)
        .map(|(_, symbol)| symbol.to_string())
        .unwrap_or_else(|| format!("{currency} "))
}

fn format_salary(min: Option<u64>, max: Option<u64>, currency: &str) -> String {
    let symbol = currency_symbol(currency);
    match (min, max) {
        (Some(min), Some(max)) => format!("{symbol}{min}-{symbol}{max} {currency}"),
        (Some(min), None) => format!("{symbol}{min}+ {currency}"),
        _ => "Not specified".to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct JobScore {
    job_index: i64,
    score: u8,
    #[serde(default)]
    skill_overlap: Vec<String>,
    #[serde(default)]
    skill_gaps: Vec<String>,
    #[serde(default = "default_true")]
    seniority_match: bool,
    #[serde(default = "default_true")]
    location_match: bool,
    #[serde(default = "default_true")]
    org_type_match: bool,
    summary: String,
    recommendation: String,
    #[serde(default = "default_confidence")]
    confidence: f64,
}

fn default_true() -> bool {
    true
}

fn default_confidence() -> f64 {
    0.8
}

#[derive(Debug, Deserialize)]
struct BatchScoreResult {
    scores: Vec<JobScore>,
}

fn batch_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "scores": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "job_index": {"type": "integer"},
                        "score": {"type": "integer", "minimum": 0, "maximum": 100},
                        "skill_overlap": {"type": "array", "items": {"type": "string"}},
                        "skill_gaps": {"type": "array", "items": {"type": "string"}},
                        "seniority_match": {"type": "boolean"},
                        "location_match": {"type": "boolean"},
                        "org_type_match": {"type": "boolean"},
                        "summary": {"type": "string"},
                        "recommendation": {
                            "type": "string",
                            "enum": ["strong_match", "good_match", "stretch", "mismatch"]
                        },
                        "confidence": {"type": "number", "minimum": 0, "maximum": 1}
                    },
                    "required": ["job_index", "score", "summary", "recommendation"]
                }
            }
        },
        "required": ["scores"]
    })
}

/// Score normalized jobs against the candidate profile.
pub struct JobsScorer {
    settings: Settings,
    llm: Arc<dyn CompletionClient>,
    cost: Arc<CostTracker>,
    spans: Arc<dyn SpanHook>,
}

impl JobsScorer {
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

    fn format_jobs_block(jobs: &[NormalizedJob]) -> String {
        let mut blocks: Vec<String> = Vec::with_capacity(jobs.len());
        for (i, job) in jobs.iter().enumerate() {
            let currency = job.currency.as_deref().unwrap_or("USD");
            let salary = if job.salary_min.is_some() && job.salary_max.is_some() {
                format_salary(job.salary_min, job.salary_max, currency)
            } else {
                "Not specified".to_string()
            };
            let description: String = job.jd_text.chars().take(1000).collect();

            blocks.push(format!(
                "<job index=\"{i}\">\n\
                 Company: {company}\n\
                 Title: {title}\n\
                 Location: {location}\n\
                 Remote: {remote}\n\
                 Salary: {salary}\n\
                 Required Skills: {required}\n\
                 Preferred Skills: {preferred}\n\
                 Experience: {experience}\n\
                 Seniority: {seniority}\n\
                 Description: {description}\n\
                 </job>",
                company = job.company_name,
                title = job.title,
                location = job.location.as_deref().unwrap_or("Not specified"),
                remote = job.remote_type,
                required = join_or(&job.required_skills, "Not specified"),
                preferred = join_or(&job.preferred_skills, "None"),
                experience = job
                    .required_experience_years
                    .map(|y| format!("{y} years"))
                    .unwrap_or_else(|| "Not specified".to_string()),
                seniority = job.seniority_level.as_deref().unwrap_or("Not specified"),
            ));
        }
        blocks.join("\n\n")
    }

    fn build_prompt(
        profile: &CandidateProfile,
        prefs: &SearchPreferences,
        jobs: &[NormalizedJob],
    ) -> String {
        let skills: Vec<String> = profile.skills.iter().map(|s| s.name.clone()).collect();
        let salary_range = format_salary(prefs.min_salary, prefs.max_salary, &prefs.currency);
        prompts::job_scorer_user(
            &profile.name,
            profile.current_title.as_deref().unwrap_or("Not specified"),
            profile.years_of_experience,
            profile
                .seniority_level
                .map(|s| s.as_str())
                .unwrap_or("Not specified"),
            &join_or(&skills, "Not specified"),
            &join_or(&profile.industries, "Not specified"),
            profile.location.as_deref().unwrap_or("Not specified"),
            prefs.remote_preference.as_str(),
            &join_or(&prefs.org_types, "any"),
            &salary_range,
            &Self::format_jobs_block(jobs),
        )
    }

    async fn score_batch(
        &self,
        state: &mut PipelineState,
        profile: &CandidateProfile,
        prefs: &SearchPreferences,
        batch: &[NormalizedJob],
    ) -> Result<Vec<ScoredJob>, LlmCallError> {
        let messages = vec![
            ChatMessage::system(prompts::JOB_SCORER_SYSTEM),
            ChatMessage::user(Self::build_prompt(profile, prefs, batch)),
        ];
        let content = call_structured(
            self.llm.as_ref(),
            &self.cost,
            self.spans.as_ref(),
            state,
            crate::pipeline::SCORE_JOBS,
            messages,
            &self.settings.quality_model,
            batch_schema(),
        )
        .await?;

        let result: BatchScoreResult = serde_json::from_value(content).map_err(|e| {
            LlmCallError::Llm(jobhound_llm::LlmError::MalformedOutput {
                attempts: 1,
                message: e.to_string(),
            })
        })?;

        let mut scored: Vec<ScoredJob> = Vec::new();
        for entry in result.scores {
            // An index outside the batch is dropped silently.
            let Ok(idx) = usize::try_from(entry.job_index) else {
                continue;
            };
            let Some(job) = batch.get(idx) else {
                warn!(job_index = entry.job_index, "score for out-of-range job index dropped");
                continue;
            };

            let fit_report = FitReport {
                score: entry.score.min(100),
                skill_overlap: entry.skill_overlap,
                skill_gaps: entry.skill_gaps,
                seniority_match: entry.seniority_match,
                location_match: entry.location_match,
                org_type_match: entry.org_type_match,
                summary: entry.summary,
                recommendation: Recommendation::from_llm(&entry.recommendation),
                confidence: entry.confidence.clamp(0.0, 1.0),
            };
            scored.push(ScoredJob {
                job: job.clone(),
                fit_report,
                rank: None,
                scored_at: Utc::now(),
            });
        }
        Ok(scored)
    }
}

/// Stable sort by score descending, drop below-threshold entries, assign
/// 1-based ranks.
pub fn rank_and_filter(mut scored: Vec<ScoredJob>, min_score: u8) -> Vec<ScoredJob> {
    scored.sort_by(|a, b| b.fit_report.score.cmp(&a.fit_report.score));
    scored.retain(|s| s.fit_report.score >= min_score);
    for (i, job) in scored.iter_mut().enumerate() {
        job.rank = Some(i as u32 + 1);
    }
    scored
}

#[async_trait]
impl Stage for JobsScorer {
    fn name(&self) -> &'static str {
        crate::pipeline::SCORE_JOBS
    }

    async fn run(&self, state: &mut PipelineState) -> Result<(), AgentFailure> {
        log_stage_start(self.name());
        let started = Instant::now();

        let (Some(profile), Some(prefs)) = (state.profile.clone(), state.preferences.clone())
        else {
            warn!("scorer skipped: profile or preferences missing");
            return Ok(());
        };

        let jobs = state.normalized_jobs.clone();
        let mut scored: Vec<ScoredJob> = Vec::new();

        for batch in jobs.chunks(BATCH_SIZE) {
            match self.score_batch(state, &profile, &prefs, batch).await {
                Ok(batch_scored) => scored.extend(batch_scored),
                Err(LlmCallError::Abort(failure)) => return Err(failure),
                Err(LlmCallError::Llm(err)) => {
                    state.record_error(AgentError::new(
                        self.name(),
                        "ScoringError",
                        err.to_string(),
                    ));
                }
            }
        }

        let total_scored = scored.len();
        state.scored_jobs = rank_and_filter(scored, self.settings.min_score_threshold);

        info!(
            scored_count = total_scored,
            above_threshold = state.scored_jobs.len(),
            "jobs scored"
        );
        log_stage_end(self.name(), started);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobhound_protocol::{content_fingerprint, RemoteType};
    use uuid::Uuid;

    fn job(company: &str, title: &str) -> NormalizedJob {
        NormalizedJob {
            id: Uuid::new_v4(),
            raw_job_id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            company_name: company.to_string(),
            title: title.to_string(),
            jd_text: "desc".to_string(),
            apply_url: "https://x/apply".to_string(),
            location: None,
            remote_type: RemoteType::Unknown,
            posted_date: None,
            salary_min: None,
            salary_max: None,
            currency: None,
            required_skills: vec![],
            preferred_skills: vec![],
            required_experience_years: None,
            seniority_level: None,
            department: None,
            content_hash: content_fingerprint(company, title, "desc"),
            processed_at: Utc::now(),
        }
    }

    fn scored(company: &str, title: &str, score: u8) -> ScoredJob {
        ScoredJob {
            job: job(company, title),
            fit_report: FitReport {
                score,
                skill_overlap: vec![],
                skill_gaps: vec![],
                seniority_match: true,
                location_match: true,
                org_type_match: true,
                summary: String::new(),
                recommendation: Recommendation::GoodMatch,
                confidence: 0.8,
            },
            rank: None,
            scored_at: Utc::now(),
        }
    }

    #[test]
    fn currency_symbols_and_fallback() {
        assert_eq!(currency_symbol("USD"), "$");
        assert_eq!(currency_symbol("inr"), "\u{20b9}");
        assert_eq!(currency_symbol("CHF"), "CHF ");
    }

    #[test]
    fn salary_formatting() {
        assert_eq!(
            format_salary(Some(100_000), Some(150_000), "USD"),
            "$100000-$150000 USD"
        );
        assert_eq!(format_salary(Some(90_000), None, "EUR"), "\u{20ac}90000+ EUR");
        assert_eq!(format_salary(None, None, "USD"), "Not specified");
    }

    #[test]
    fn ranks_are_monotone_and_threshold_is_honored() {
        let out = rank_and_filter(
            vec![
                scored("A", "a", 55),
                scored("B", "b", 90),
                scored("C", "c", 70),
            ],
            60,
        );
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].fit_report.score, 90);
        assert_eq!(out[0].rank, Some(1));
        assert_eq!(out[1].fit_report.score, 70);
        assert_eq!(out[1].rank, Some(2));
    }

    #[test]
    fn equal_scores_keep_insertion_order() {
        let out = rank_and_filter(
            vec![
                scored("First", "x", 80),
                scored("Second", "y", 80),
                scored("Third", "z", 80),
            ],
            60,
        );
        assert_eq!(out[0].job.company_name, "First");
        assert_eq!(out[1].job.company_name, "Second");
        assert_eq!(out[2].job.company_name, "Third");
    }

    #[test]
    fn jobs_block_indexes_within_batch() {
        let jobs = vec![job("Acme", "SRE"), job("Globex", "SWE")];
        let block = JobsScorer::format_jobs_block(&jobs);
        assert!(block.contains("<job index=\"0\">"));
        assert!(block.contains("<job index=\"1\">"));
        assert!(block.contains("Company: Globex"));
    }

    #[test]
    fn out_of_range_index_parses_but_would_be_dropped() {
        let entry: JobScore = serde_json::from_value(json!({
            "job_index": 7,
            "score": 88,
            "summary": "s",
            "recommendation": "good_match"
        }))
        .unwrap();
        assert_eq!(entry.job_index, 7);
        // 7 is outside a BATCH_SIZE=5 batch; score_batch drops it.
        assert!(usize::try_from(entry.job_index).unwrap() >= BATCH_SIZE);
    }
}
