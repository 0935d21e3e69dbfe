//! Notification stage.
//!
//! Delivery (email, chat, whatever) is an external collaborator behind the
//! `Notifier` trait; the default implementation just logs the summary.

use std::time::Instant;

use async_trait::async_trait;
use tracing::info;

use jobhound_protocol::{AgentError, AgentFailure, RunResult};

use crate::state::PipelineState;

use super::{log_stage_end, log_stage_start, Stage};

/// The notification collaborator seam. Returns `true` when the result was
/// actually delivered somewhere.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, recipient: &str, result: &RunResult) -> anyhow::Result<bool>;
}

/// Logs the run summary instead of delivering it.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, recipient: &str, result: &RunResult) -> anyhow::Result<bool> {
        info!(
            recipient,
            run_id = %result.run_id,
            status = %result.status,
            jobs_in_output = result.jobs_in_output,
            "run summary (delivery disabled)"
        );
        Ok(false)
    }
}

/// Deliver the run result to the candidate.
pub struct NotifierStage {
    notifier: std::sync::Arc<dyn Notifier>,
}

impl NotifierStage {
    pub fn new(notifier: std::sync::Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl Stage for NotifierStage {
    fn name(&self) -> &'static str {
        crate::pipeline::NOTIFY
    }

    async fn run(&self, state: &mut PipelineState) -> Result<(), AgentFailure> {
        log_stage_start(self.name());
        let started = Instant::now();

        if state.config.dry_run {
            info!("dry run: notification skipped");
            log_stage_end(self.name(), started);
            return Ok(());
        }

        let Some(result) = state.run_result.clone() else {
            // Aggregate did not run; nothing to deliver.
            log_stage_end(self.name(), started);
            return Ok(());
        };
        let recipient = state
            .profile
            .as_ref()
            .map(|p| p.email.clone())
            .unwrap_or_default();

        match self.notifier.notify(&recipient, &result).await {
            Ok(sent) => {
                if let Some(run_result) = state.run_result.as_mut() {
                    run_result.email_sent = sent;
                }
            }
            Err(e) => {
                state.record_error(AgentError::new(self.name(), "DeliveryError", e.to_string()));
            }
        }

        log_stage_end(self.name(), started);
        Ok(())
    }
}
