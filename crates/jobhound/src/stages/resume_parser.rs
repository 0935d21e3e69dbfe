//! Resume parsing stage: raw text in, structured profile out.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use jobhound_llm::{ChatMessage, CompletionClient};
use jobhound_protocol::{text_sha256, AgentFailure, CandidateProfile, SeniorityLevel, Settings, Skill};

use crate::cost::CostTracker;
use crate::prompts;
use crate::state::PipelineState;
use crate::trace::SpanHook;

use super::{call_structured, log_stage_end, log_stage_start, LlmCallError, Stage};

/// Resume text extraction seam. The PDF extractor is an external
/// collaborator; the built-in implementation reads plain-text files.
#[async_trait]
pub trait ResumeExtractor: Send + Sync {
    async fn extract_text(&self, path: &Path) -> anyhow::Result<String>;
}

/// Reads the resume as UTF-8 text straight from disk.
pub struct PlainTextExtractor;

#[async_trait]
impl ResumeExtractor for PlainTextExtractor {
    async fn extract_text(&self, path: &Path) -> anyhow::Result<String> {
        let text = tokio::fs::read_to_string(path).await?;
        Ok(text)
    }
}

#[derive(Debug, Deserialize)]
struct ProfileDraft {
    name: String,
    email: String,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    current_title: Option<String>,
    #[serde(default)]
    years_of_experience: f64,
    #[serde(default)]
    skills: Vec<Skill>,
    #[serde(default)]
    industries: Vec<String>,
    #[serde(default)]
    seniority_level: Option<String>,
    #[serde(default)]
    tech_stack: Vec<String>,
}

fn profile_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "name": {"type": "string"},
            "email": {"type": "string"},
            "location": {"type": ["string", "null"]},
            "current_title": {"type": ["string", "null"]},
            "years_of_experience": {"type": "number", "minimum": 0},
            "skills": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": {"type": "string"},
                        "level": {"type": ["string", "null"]},
                        "years": {"type": ["number", "null"]}
                    },
                    "required": ["name"]
                }
            },
            "industries": {"type": "array", "items": {"type": "string"}},
            "seniority_level": {
                "type": ["string", "null"],
                "enum": ["intern", "junior", "mid", "senior", "staff",
                         "principal", "director", "vp", "c-level", null]
            },
            "tech_stack": {"type": "array", "items": {"type": "string"}}
        },
        "required": ["name", "email", "years_of_experience", "skills"]
    })
}

/// Parse the resume into a `CandidateProfile`.
pub struct ResumeParser {
    settings: Settings,
    llm: Arc<dyn CompletionClient>,
    cost: Arc<CostTracker>,
    spans: Arc<dyn SpanHook>,
    extractor: Arc<dyn ResumeExtractor>,
}

impl ResumeParser {
    pub fn new(
        settings: Settings,
        llm: Arc<dyn CompletionClient>,
        cost: Arc<CostTracker>,
        spans: Arc<dyn SpanHook>,
        extractor: Arc<dyn ResumeExtractor>,
    ) -> Self {
        Self {
            settings,
            llm,
            cost,
            spans,
            extractor,
        }
    }
}

#[async_trait]
impl Stage for ResumeParser {
    fn name(&self) -> &'static str {
        crate::pipeline::PARSE_RESUME
    }

    async fn run(&self, state: &mut PipelineState) -> Result<(), AgentFailure> {
        log_stage_start(self.name());
        let started = Instant::now();

        let raw_text = self
            .extractor
            .extract_text(&state.config.resume_path)
            .await
            .map_err(|e| AgentFailure::fatal(self.name(), format!("Resume extraction failed: {e}")))?;
        if raw_text.trim().is_empty() {
            return Err(AgentFailure::fatal(self.name(), "Resume text is empty"));
        }
        let content_hash = text_sha256(&raw_text);

        let messages = vec![
            ChatMessage::system(prompts::RESUME_PARSER_SYSTEM),
            ChatMessage::user(prompts::resume_parser_user(&raw_text)),
        ];
        let content = call_structured(
            self.llm.as_ref(),
            &self.cost,
            self.spans.as_ref(),
            state,
            crate::pipeline::PARSE_RESUME,
            messages,
            &self.settings.fast_model,
            profile_schema(),
        )
        .await
        .map_err(|e| match e {
            LlmCallError::Abort(failure) => failure,
            LlmCallError::Llm(err) => {
                AgentFailure::fatal(crate::pipeline::PARSE_RESUME, err.to_string())
            }
        })?;

        let draft: ProfileDraft = serde_json::from_value(content).map_err(|e| {
            AgentFailure::fatal(self.name(), format!("Unusable profile from LLM: {e}"))
        })?;

        let profile = CandidateProfile {
            name: draft.name,
            email: draft.email,
            location: draft.location,
            current_title: draft.current_title,
            years_of_experience: draft.years_of_experience.max(0.0),
            skills: draft.skills,
            industries: draft.industries,
            seniority_level: draft
                .seniority_level
                .as_deref()
                .and_then(|s| s.parse::<SeniorityLevel>().ok()),
            tech_stack: draft.tech_stack,
            raw_text,
            parsed_at: Utc::now(),
            content_hash,
        };

        info!(
            name = %profile.name,
            skills_count = profile.skills.len(),
            "resume parsed"
        );
        state.profile = Some(profile);
        log_stage_end(self.name(), started);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_draft_tolerates_missing_optionals() {
        let draft: ProfileDraft = serde_json::from_value(json!({
            "name": "Jane Doe",
            "email": "jane@example.com",
            "years_of_experience": 5,
            "skills": [{"name": "Rust"}]
        }))
        .unwrap();
        assert_eq!(draft.name, "Jane Doe");
        assert_eq!(draft.skills.len(), 1);
        assert!(draft.seniority_level.is_none());
    }

    #[test]
    fn bad_seniority_is_dropped_not_fatal() {
        let parsed = "superhero".parse::<SeniorityLevel>().ok();
        assert!(parsed.is_none());
    }

    #[tokio::test]
    async fn plain_text_extractor_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.txt");
        tokio::fs::write(&path, "Jane Doe\njane@example.com").await.unwrap();
        let text = PlainTextExtractor.extract_text(&path).await.unwrap();
        assert!(text.contains("Jane Doe"));
    }
}
