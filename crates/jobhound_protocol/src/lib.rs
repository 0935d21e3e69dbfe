//! Shared data model for the jobhound pipeline.
//!
//! Everything that crosses a crate boundary lives here: the candidate
//! profile, search preferences, discovered companies, raw/normalized/scored
//! jobs, run configuration and results, the checkpoint record, the settings
//! envelope, and the pipeline error taxonomy.

pub mod candidate;
pub mod company;
pub mod config;
pub mod error;
pub mod job;
pub mod run;

pub use candidate::{CandidateProfile, RemotePreference, SearchPreferences, SeniorityLevel, Skill};
pub use company::{AtsType, CareerPage, Company, CompanyTier, ScrapeStrategy};
pub use config::{RunConfig, Settings};
pub use error::AgentFailure;
pub use job::{
    content_fingerprint, text_sha256, FitReport, NormalizedJob, RawJob, RawPayload,
    Recommendation, RemoteType, ScoredJob,
};
pub use run::{AgentError, PipelineCheckpoint, RunResult, RunStatus};
