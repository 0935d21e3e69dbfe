//! Command-line front end.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use jobhound_llm::{GatewayClient, GatewayConfig};
use jobhound_protocol::{RunConfig, RunStatus, Settings};
use jobhound_tools::{HttpPageFetcher, LiveAtsClientFactory, TavilySearch};

use crate::pipeline::{Pipeline, Toolbox};
use crate::report::render_result;
use crate::stages::{LogNotifier, PlainTextExtractor};
use crate::trace::NoopSpans;
use crate::AdaptivePipeline;

#[derive(Parser, Debug)]
#[command(name = "jobhound", about = "Autonomous job discovery pipeline")]
pub struct Cli {
    /// Path to the resume file
    #[arg(long)]
    pub resume: PathBuf,

    /// Freeform job preferences text
    #[arg(long)]
    pub prefs: Option<String>,

    /// Read preferences from a file instead of --prefs
    #[arg(long)]
    pub prefs_file: Option<PathBuf>,

    /// Run identifier (used for checkpoints); generated if omitted
    #[arg(long)]
    pub run_id: Option<String>,

    /// Skip notification, generate files only
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Cap companies per discovery iteration
    #[arg(long)]
    pub company_limit: Option<usize>,

    /// Run the plain sequential pipeline instead of the adaptive loop
    #[arg(long, default_value_t = false)]
    pub no_adaptive: bool,

    /// Verbose console logging
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl Cli {
    fn preferences_text(&self) -> Result<String> {
        if let Some(text) = &self.prefs {
            return Ok(text.clone());
        }
        if let Some(path) = &self.prefs_file {
            return std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read preferences file {}", path.display()));
        }
        anyhow::bail!("one of --prefs or --prefs-file is required")
    }

    fn run_config(&self) -> Result<RunConfig> {
        let mut config = RunConfig::new(&self.resume, self.preferences_text()?);
        if let Some(run_id) = &self.run_id {
            config = config.with_run_id(run_id.clone());
        }
        config.dry_run = self.dry_run;
        config.company_limit = self.company_limit;
        Ok(config)
    }
}

fn default_toolbox() -> Result<Toolbox> {
    let api_key = std::env::var("ANTHROPIC_API_KEY")
        .context("ANTHROPIC_API_KEY must be set to run the pipeline")?;
    let search_key = std::env::var("TAVILY_API_KEY")
        .context("TAVILY_API_KEY must be set for career-page discovery")?;
    let llm = GatewayClient::new(GatewayConfig::new(api_key))?;
    let fetcher: Arc<HttpPageFetcher> = Arc::new(HttpPageFetcher::new());

    Ok(Toolbox {
        llm: Arc::new(llm),
        search: Arc::new(TavilySearch::new(search_key)),
        ats_factory: Arc::new(LiveAtsClientFactory::new(fetcher.clone())),
        fetcher,
        resume_extractor: Arc::new(PlainTextExtractor),
        notifier: Arc::new(LogNotifier),
        spans: Arc::new(NoopSpans::new()),
    })
}

/// Entry point for the binary.
pub async fn run(cli: Cli) -> Result<i32> {
    let settings = Settings::from_env();
    let config = cli.run_config()?;
    let toolbox = default_toolbox()?;

    info!(run_id = %config.run_id, adaptive = !cli.no_adaptive, "starting run");

    let pipeline = Pipeline::new(settings, toolbox);
    let result = if cli.no_adaptive {
        pipeline.run(config).await?
    } else {
        AdaptivePipeline::new(pipeline).run(config).await?
    };

    print!("{}", render_result(&result));
    Ok(match result.status {
        RunStatus::Success => 0,
        _ => 1,
    })
}
