//! Settings envelope shared by the pipeline and its collaborators.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use crate::run::RunConfig;

// Defaults; every field can be overridden via a JOBHOUND_* environment
// variable (see `Settings::from_env`).
pub const DEFAULT_MAX_CONCURRENT_SCRAPERS: usize = 5;
pub const DEFAULT_AGENT_TIMEOUT_SECONDS: u64 = 300;
pub const DEFAULT_MAX_COST_PER_RUN_USD: f64 = 5.0;
pub const DEFAULT_WARN_COST_THRESHOLD_USD: f64 = 2.0;
pub const DEFAULT_MIN_SCORE_THRESHOLD: u8 = 60;
pub const DEFAULT_MIN_RECOMMENDED_JOBS: usize = 10;
pub const DEFAULT_MAX_DISCOVERY_ITERATIONS: usize = 3;
pub const DEFAULT_FAST_MODEL: &str = "claude-haiku-4-5-20251001";
pub const DEFAULT_QUALITY_MODEL: &str = "claude-sonnet-4-5-20250514";

/// Central configuration for a jobhound deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Model id for fast/cheap LLM calls (parsing, extraction).
    pub fast_model: String,
    /// Model id for high-quality LLM calls (discovery, scoring).
    pub quality_model: String,
    /// Scraping fan-out bound.
    pub max_concurrent_scrapers: usize,
    /// Per-stage timeout.
    pub agent_timeout_seconds: u64,
    /// Cost hard stop (USD).
    pub max_cost_per_run_usd: f64,
    /// Cost soft warn (USD).
    pub warn_cost_threshold_usd: f64,
    /// Minimum score to include in output.
    pub min_score_threshold: u8,
    /// Adaptive loop target.
    pub min_recommended_jobs: usize,
    /// Adaptive loop budget.
    pub max_discovery_iterations: usize,
    /// Gate for checkpoint writes/reads.
    pub checkpoint_enabled: bool,
    /// Where checkpoints live.
    pub checkpoint_dir: PathBuf,
    /// Where result files land.
    pub output_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fast_model: DEFAULT_FAST_MODEL.to_string(),
            quality_model: DEFAULT_QUALITY_MODEL.to_string(),
            max_concurrent_scrapers: DEFAULT_MAX_CONCURRENT_SCRAPERS,
            agent_timeout_seconds: DEFAULT_AGENT_TIMEOUT_SECONDS,
            max_cost_per_run_usd: DEFAULT_MAX_COST_PER_RUN_USD,
            warn_cost_threshold_usd: DEFAULT_WARN_COST_THRESHOLD_USD,
            min_score_threshold: DEFAULT_MIN_SCORE_THRESHOLD,
            min_recommended_jobs: DEFAULT_MIN_RECOMMENDED_JOBS,
            max_discovery_iterations: DEFAULT_MAX_DISCOVERY_ITERATIONS,
            checkpoint_enabled: true,
            checkpoint_dir: PathBuf::from("./output/checkpoints"),
            output_dir: PathBuf::from("./output"),
        }
    }
}

impl Settings {
    /// Build settings from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let mut settings = Settings::default();
        if let Some(v) = env_var("JOBHOUND_FAST_MODEL") {
            settings.fast_model = v;
        }
        if let Some(v) = env_var("JOBHOUND_QUALITY_MODEL") {
            settings.quality_model = v;
        }
        env_parse("JOBHOUND_MAX_CONCURRENT_SCRAPERS", &mut settings.max_concurrent_scrapers);
        env_parse("JOBHOUND_AGENT_TIMEOUT_SECONDS", &mut settings.agent_timeout_seconds);
        env_parse("JOBHOUND_MAX_COST_PER_RUN_USD", &mut settings.max_cost_per_run_usd);
        env_parse("JOBHOUND_WARN_COST_THRESHOLD_USD", &mut settings.warn_cost_threshold_usd);
        env_parse("JOBHOUND_MIN_SCORE_THRESHOLD", &mut settings.min_score_threshold);
        env_parse("JOBHOUND_MIN_RECOMMENDED_JOBS", &mut settings.min_recommended_jobs);
        env_parse("JOBHOUND_MAX_DISCOVERY_ITERATIONS", &mut settings.max_discovery_iterations);
        env_parse("JOBHOUND_CHECKPOINT_ENABLED", &mut settings.checkpoint_enabled);
        if let Some(v) = env_var("JOBHOUND_CHECKPOINT_DIR") {
            settings.checkpoint_dir = PathBuf::from(v);
        }
        if let Some(v) = env_var("JOBHOUND_OUTPUT_DIR") {
            settings.output_dir = PathBuf::from(v);
        }
        settings
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: FromStr>(key: &str, slot: &mut T) {
    if let Some(raw) = env_var(key) {
        if let Ok(value) = raw.trim().parse::<T>() {
            *slot = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_envelope() {
        let s = Settings::default();
        assert_eq!(s.max_concurrent_scrapers, 5);
        assert_eq!(s.agent_timeout_seconds, 300);
        assert!((s.max_cost_per_run_usd - 5.0).abs() < f64::EPSILON);
        assert!((s.warn_cost_threshold_usd - 2.0).abs() < f64::EPSILON);
        assert_eq!(s.min_score_threshold, 60);
        assert_eq!(s.min_recommended_jobs, 10);
        assert_eq!(s.max_discovery_iterations, 3);
        assert!(s.checkpoint_enabled);
    }
}
