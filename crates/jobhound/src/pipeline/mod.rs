//! Sequential staged pipeline with checkpoint-based crash recovery.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{error, info};

use jobhound_llm::CompletionClient;
use jobhound_protocol::{
    AgentFailure, RunConfig, RunResult, RunStatus, Settings,
};
use jobhound_tools::{AtsClientFactory, CareerPageFinder, PageFetcher, SearchProvider};

use crate::checkpoint::{load_latest_checkpoint, save_checkpoint};
use crate::cost::CostTracker;
use crate::report::log_run_summary;
use crate::stages::{
    Aggregator, CompanyFinder, JobProcessor, JobsScorer, JobsScraper, Notifier, NotifierStage,
    PrefsParser, ResumeExtractor, ResumeParser, Stage,
};
use crate::state::PipelineState;
use crate::trace::SpanHook;

pub mod adaptive;

// Stage names. Order is total and strict.
pub const PARSE_RESUME: &str = "parse_resume";
pub const PARSE_PREFS: &str = "parse_prefs";
pub const FIND_COMPANIES: &str = "find_companies";
pub const SCRAPE_JOBS: &str = "scrape_jobs";
pub const PROCESS_JOBS: &str = "process_jobs";
pub const SCORE_JOBS: &str = "score_jobs";
pub const AGGREGATE: &str = "aggregate";
pub const NOTIFY: &str = "notify";

pub const PIPELINE_STEPS: [&str; 8] = [
    PARSE_RESUME,
    PARSE_PREFS,
    FIND_COMPANIES,
    SCRAPE_JOBS,
    PROCESS_JOBS,
    SCORE_JOBS,
    AGGREGATE,
    NOTIFY,
];

/// One-time setup steps (before the adaptive loop).
pub const SETUP_STEPS: [&str; 2] = [PARSE_RESUME, PARSE_PREFS];
/// Discovery steps (repeated each adaptive iteration).
pub const DISCOVERY_STEPS: [&str; 4] = [FIND_COMPANIES, SCRAPE_JOBS, PROCESS_JOBS, SCORE_JOBS];
/// Output steps (after the adaptive loop).
pub const OUTPUT_STEPS: [&str; 2] = [AGGREGATE, NOTIFY];

/// External collaborators the pipeline is wired with.
pub struct Toolbox {
    pub llm: Arc<dyn CompletionClient>,
    pub search: Arc<dyn SearchProvider>,
    pub ats_factory: Arc<dyn AtsClientFactory>,
    pub fetcher: Arc<dyn PageFetcher>,
    pub resume_extractor: Arc<dyn ResumeExtractor>,
    pub notifier: Arc<dyn Notifier>,
    pub spans: Arc<dyn SpanHook>,
}

/// Outcome of running a single step.
pub(crate) enum StepOutcome {
    Continue,
    /// The run is over; stop here with this result.
    Terminal(RunResult),
}

/// Sequential async pipeline with crash recovery via checkpoint files.
pub struct Pipeline {
    settings: Settings,
    spans: Arc<dyn SpanHook>,
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new(settings: Settings, toolbox: Toolbox) -> Self {
        let cost = Arc::new(CostTracker::new(
            settings.max_cost_per_run_usd,
            settings.warn_cost_threshold_usd,
        ));
        let finder = Arc::new(CareerPageFinder::new(Arc::clone(&toolbox.search)));

        let stages: Vec<Box<dyn Stage>> = vec![
            Box::new(ResumeParser::new(
                settings.clone(),
                Arc::clone(&toolbox.llm),
                Arc::clone(&cost),
                Arc::clone(&toolbox.spans),
                Arc::clone(&toolbox.resume_extractor),
            )),
            Box::new(PrefsParser::new(
                settings.clone(),
                Arc::clone(&toolbox.llm),
                Arc::clone(&cost),
                Arc::clone(&toolbox.spans),
            )),
            Box::new(CompanyFinder::new(
                settings.clone(),
                Arc::clone(&toolbox.llm),
                Arc::clone(&cost),
                Arc::clone(&toolbox.spans),
                finder,
            )),
            Box::new(JobsScraper::new(
                settings.clone(),
                Arc::clone(&toolbox.ats_factory),
                Arc::clone(&toolbox.fetcher),
            )),
            Box::new(JobProcessor::new(
                settings.clone(),
                Arc::clone(&toolbox.llm),
                Arc::clone(&cost),
                Arc::clone(&toolbox.spans),
            )),
            Box::new(JobsScorer::new(
                settings.clone(),
                Arc::clone(&toolbox.llm),
                Arc::clone(&cost),
                Arc::clone(&toolbox.spans),
            )),
            Box::new(Aggregator::new(settings.clone())),
            Box::new(NotifierStage::new(Arc::clone(&toolbox.notifier))),
        ];

        Self {
            settings,
            spans: toolbox.spans,
            stages,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub(crate) fn stage(&self, name: &str) -> &dyn Stage {
        self.stages
            .iter()
            .find(|s| s.name() == name)
            .map(|s| s.as_ref())
            .unwrap_or_else(|| panic!("unknown stage: {name}"))
    }

    /// Execute the full pipeline.
    ///
    /// Terminal statuses come back as `Ok`; only checkpoint corruption (and
    /// other unrecoverable persistence failures) surface as `Err`.
    pub async fn run(&self, config: RunConfig) -> Result<RunResult, AgentFailure> {
        let start = Instant::now();
        let mut state = self.load_or_create_state(config).await?;
        info!(run_id = %state.config.run_id, "pipeline start");

        let root = self.spans.start_span("pipeline.run");
        self.spans.set_attr(root, "pipeline.run_id", &state.config.run_id);

        for step_name in PIPELINE_STEPS {
            if state.is_step_completed(step_name) {
                info!(step = step_name, "step skipped");
                continue;
            }

            match self.run_step(step_name, &mut state, start).await {
                Ok(StepOutcome::Continue) => {}
                Ok(StepOutcome::Terminal(result)) => {
                    self.finish_root_span(root, result.status);
                    return Ok(result);
                }
                Err(failure) => {
                    self.finish_root_span(root, RunStatus::Failed);
                    return Err(failure);
                }
            }
        }

        self.finish_root_span(root, RunStatus::Success);
        let duration = start.elapsed().as_secs_f64();
        log_run_summary(&state, duration);

        if let Some(mut result) = state.run_result.clone() {
            result.duration_seconds = duration;
            return Ok(result);
        }
        Ok(state.build_result(RunStatus::Success, duration, Vec::new(), false))
    }

    fn finish_root_span(&self, root: crate::trace::SpanId, status: RunStatus) {
        self.spans.set_attr(root, "pipeline.status", status.as_str());
        self.spans.end_span(root);
    }

    /// Run one step under the stage timeout, checkpoint on success, and map
    /// aborting failures to terminal results.
    pub(crate) async fn run_step(
        &self,
        step_name: &'static str,
        state: &mut PipelineState,
        pipeline_start: Instant,
    ) -> Result<StepOutcome, AgentFailure> {
        let stage = self.stage(step_name);
        let timeout = Duration::from_secs(self.settings.agent_timeout_seconds);

        let span = self.spans.start_span(&format!("stage.{step_name}"));
        let outcome = tokio::time::timeout(timeout, stage.run(state)).await;
        self.spans.end_span(span);

        let failure = match outcome {
            Ok(Ok(())) => {
                if self.settings.checkpoint_enabled {
                    let checkpoint = state.to_checkpoint(step_name)?;
                    save_checkpoint(&checkpoint, &self.settings.checkpoint_dir).await?;
                }
                return Ok(StepOutcome::Continue);
            }
            Ok(Err(failure)) => failure,
            Err(_) => AgentFailure::Timeout {
                stage: step_name.to_string(),
                timeout_secs: self.settings.agent_timeout_seconds,
            },
        };

        let duration = pipeline_start.elapsed().as_secs_f64();
        let status = match &failure {
            AgentFailure::CostLimitExceeded { .. } => {
                error!(step = step_name, error = %failure, "cost limit exceeded");
                RunStatus::Partial
            }
            AgentFailure::Fatal { .. } => {
                error!(step = step_name, error = %failure, "fatal stage error");
                RunStatus::Failed
            }
            AgentFailure::Timeout { .. } => {
                error!(step = step_name, error = %failure, "stage timeout");
                RunStatus::Failed
            }
            // Persistence problems propagate; nothing to salvage here.
            AgentFailure::Checkpoint(_) => return Err(failure),
        };

        log_run_summary(state, duration);
        Ok(StepOutcome::Terminal(state.build_result(
            status,
            duration,
            Vec::new(),
            false,
        )))
    }

    /// Load from checkpoint if available, otherwise create fresh state.
    pub(crate) async fn load_or_create_state(
        &self,
        config: RunConfig,
    ) -> Result<PipelineState, AgentFailure> {
        if self.settings.checkpoint_enabled {
            if let Some(checkpoint) =
                load_latest_checkpoint(&config.run_id, &self.settings.checkpoint_dir).await?
            {
                info!(step = %checkpoint.completed_step, "resuming from checkpoint");
                return PipelineState::from_checkpoint(checkpoint);
            }
        }
        Ok(PipelineState::new(config))
    }
}
