//! Scraping coordinator stage.
//!
//! Fans out one task per company under a counting semaphore, dispatching to
//! the matching ATS API client or the crawler fallback. Per-company failures
//! are isolated: they become error records, never a stage failure.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::info;

use jobhound_protocol::{AgentError, AgentFailure, Company, RawJob, ScrapeStrategy, Settings};
use jobhound_tools::{AtsClientFactory, PageFetcher};

use crate::state::PipelineState;

use super::{log_stage_end, log_stage_start, Stage};

/// Scrape raw job listings from every company's career page.
pub struct JobsScraper {
    settings: Settings,
    ats_factory: Arc<dyn AtsClientFactory>,
    fetcher: Arc<dyn PageFetcher>,
}

impl JobsScraper {
    pub fn new(
        settings: Settings,
        ats_factory: Arc<dyn AtsClientFactory>,
        fetcher: Arc<dyn PageFetcher>,
    ) -> Self {
        Self {
            settings,
            ats_factory,
            fetcher,
        }
    }
}

async fn scrape_company(
    company: Company,
    ats_factory: Arc<dyn AtsClientFactory>,
    fetcher: Arc<dyn PageFetcher>,
) -> Result<Vec<RawJob>, String> {
    match company.career_page.scrape_strategy {
        ScrapeStrategy::Api => scrape_via_api(&company, ats_factory.as_ref(), fetcher.as_ref()).await,
        ScrapeStrategy::Crawler => scrape_via_crawler(&company, fetcher.as_ref()).await,
    }
}

async fn scrape_via_api(
    company: &Company,
    ats_factory: &dyn AtsClientFactory,
    fetcher: &dyn PageFetcher,
) -> Result<Vec<RawJob>, String> {
    let ats_type = company.career_page.ats_type;
    let Some(client) = ats_factory.client_for(ats_type) else {
        // Detection said "api" but no client serves this family; crawl instead.
        return scrape_via_crawler(company, fetcher).await;
    };

    let records = client
        .fetch_jobs(company)
        .await
        .map_err(|e| e.to_string())?;
    Ok(records
        .into_iter()
        .map(|record| RawJob::from_api(company.id, &company.name, record, &company.career_page.url))
        .collect())
}

async fn scrape_via_crawler(
    company: &Company,
    fetcher: &dyn PageFetcher,
) -> Result<Vec<RawJob>, String> {
    let url = &company.career_page.url;
    let content = fetcher.fetch_page(url).await.map_err(|e| e.to_string())?;
    Ok(vec![RawJob::from_crawl(
        company.id,
        &company.name,
        content,
        url,
    )])
}

#[async_trait]
impl Stage for JobsScraper {
    fn name(&self) -> &'static str {
        crate::pipeline::SCRAPE_JOBS
    }

    async fn run(&self, state: &mut PipelineState) -> Result<(), AgentFailure> {
        log_stage_start(self.name());
        let started = Instant::now();

        let semaphore = Arc::new(Semaphore::new(self.settings.max_concurrent_scrapers.max(1)));
        let mut tasks: JoinSet<(String, Result<Vec<RawJob>, String>)> = JoinSet::new();

        for company in state.companies.clone() {
            let semaphore = Arc::clone(&semaphore);
            let ats_factory = Arc::clone(&self.ats_factory);
            let fetcher = Arc::clone(&self.fetcher);
            tasks.spawn(async move {
                // Closed only if the stage is dropped mid-flight.
                let _permit = semaphore.acquire_owned().await;
                let name = company.name.clone();
                (name, scrape_company(company, ats_factory, fetcher).await)
            });
        }

        // Gather all outcomes; the state mutation stays on this task.
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(raw_jobs))) => state.raw_jobs.extend(raw_jobs),
                Ok((company_name, Err(message))) => {
                    state.record_error(
                        AgentError::new(self.name(), "ScrapeError", message)
                            .for_company(company_name),
                    );
                }
                Err(join_error) => {
                    state.record_error(AgentError::new(
                        self.name(),
                        "TaskPanic",
                        join_error.to_string(),
                    ));
                }
            }
        }

        info!(raw_jobs_count = state.raw_jobs.len(), "scraping complete");
        log_stage_end(self.name(), started);
        Ok(())
    }
}
